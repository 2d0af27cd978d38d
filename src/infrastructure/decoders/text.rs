use anyhow::Result;

use super::DocumentDecoder;

pub struct PlainText {}

impl DocumentDecoder for PlainText {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let text = String::from_utf8_lossy(bytes);
        return Ok(text.trim_start_matches('\u{feff}').to_string());
    }
}
