#[cfg(test)]
#[path = "decoders_test.rs"]
mod tests;

mod docx;
mod pdf;
mod text;
mod xlsx;

use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::FileKind;

/// Turns the raw bytes of one document into plain text.
pub trait DocumentDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String>;
}

pub type DecoderBox = Arc<dyn DocumentDecoder + Send + Sync>;

/// One decoder per text-bearing format. Hosts with better converters can
/// swap any of them out.
#[derive(Clone)]
pub struct Decoders {
    pub pdf: DecoderBox,
    pub word: DecoderBox,
    pub spreadsheet: DecoderBox,
    pub text: DecoderBox,
}

impl Default for Decoders {
    fn default() -> Decoders {
        return Decoders {
            pdf: Arc::new(pdf::PdfToText::default()),
            word: Arc::new(docx::Docx {}),
            spreadsheet: Arc::new(xlsx::Xlsx {}),
            text: Arc::new(text::PlainText {}),
        };
    }
}

impl Decoders {
    pub fn get(&self, kind: FileKind) -> Option<DecoderBox> {
        match kind {
            FileKind::Pdf => return Some(self.pdf.clone()),
            FileKind::Word => return Some(self.word.clone()),
            FileKind::Spreadsheet => return Some(self.spreadsheet.clone()),
            FileKind::Text => return Some(self.text.clone()),
            FileKind::Image | FileKind::Unknown => return None,
        }
    }
}

pub(crate) fn unescape_xml(text: &str) -> String {
    return text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
}
