use std::io::Cursor;
use std::io::Read;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use super::unescape_xml;
use super::DocumentDecoder;

static TAG: Lazy<Regex> = Lazy::new(|| return Regex::new(r"<[^>]+>").unwrap());

/// Word-processing documents in the OOXML package format.
pub struct Docx {}

impl DocumentDecoder for Docx {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")?
            .read_to_string(&mut xml)?;

        let marked = xml
            .replace("</w:p>", "\n")
            .replace("<w:br/>", "\n")
            .replace("<w:tab/>", "\t");
        let stripped = TAG.replace_all(&marked, "");

        let text = unescape_xml(&stripped)
            .lines()
            .map(|line| return line.trim_end())
            .collect::<Vec<&str>>()
            .join("\n");

        return Ok(text.trim().to_string());
    }
}
