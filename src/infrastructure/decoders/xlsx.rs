use std::io::Cursor;
use std::io::Read;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use super::unescape_xml;
use super::DocumentDecoder;

static SHARED_STRING: Lazy<Regex> = Lazy::new(|| return Regex::new(r"(?s)<si>(.*?)</si>").unwrap());
static TEXT_RUN: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").unwrap());
static ROW: Lazy<Regex> = Lazy::new(|| return Regex::new(r"(?s)<row[^>]*>(.*?)</row>").unwrap());
static CELL: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"(?s)<c((?:\s[^>]*?)?)(?:/>|>(.*?)</c>)").unwrap());
static VALUE: Lazy<Regex> = Lazy::new(|| return Regex::new(r"(?s)<v>(.*?)</v>").unwrap());
static SHEET_NAME: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"^xl/worksheets/sheet(\d+)\.xml$").unwrap());

fn read_entry(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    let mut xml = String::new();
    archive.by_name(name)?.read_to_string(&mut xml)?;
    return Ok(xml);
}

fn text_runs(xml: &str) -> String {
    return TEXT_RUN
        .captures_iter(xml)
        .map(|cap| return unescape_xml(&cap[1]))
        .collect::<Vec<String>>()
        .join("");
}

fn cell_text(attrs: &str, body: &str, shared: &[String]) -> String {
    if attrs.contains(r#"t="inlineStr""#) {
        return text_runs(body);
    }

    let value = VALUE
        .captures(body)
        .map(|cap| return unescape_xml(&cap[1]))
        .unwrap_or_default();

    if attrs.contains(r#"t="s""#) {
        return value
            .parse::<usize>()
            .ok()
            .and_then(|idx| return shared.get(idx).cloned())
            .unwrap_or_default();
    }

    return value;
}

/// Spreadsheets in the OOXML package format. Every sheet is rendered as tab
/// separated rows under a `# Sheet N` header.
pub struct Xlsx {}

impl DocumentDecoder for Xlsx {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

        let shared = match read_entry(&mut archive, "xl/sharedStrings.xml") {
            Ok(xml) => SHARED_STRING
                .captures_iter(&xml)
                .map(|cap| return text_runs(&cap[1]))
                .collect::<Vec<String>>(),
            Err(_) => vec![],
        };

        let mut sheets = archive
            .file_names()
            .filter_map(|name| {
                let number = SHEET_NAME.captures(name)?[1].parse::<u32>().ok()?;
                return Some((number, name.to_string()));
            })
            .collect::<Vec<(u32, String)>>();
        sheets.sort();

        let mut sections: Vec<String> = vec![];
        for (number, name) in sheets {
            let xml = read_entry(&mut archive, &name)?;
            let rows = ROW
                .captures_iter(&xml)
                .map(|row| {
                    return CELL
                        .captures_iter(&row[1])
                        .map(|cell| {
                            let attrs = cell.get(1).map(|e| return e.as_str()).unwrap_or("");
                            let body = cell.get(2).map(|e| return e.as_str()).unwrap_or("");
                            return cell_text(attrs, body, &shared);
                        })
                        .collect::<Vec<String>>()
                        .join("\t");
                })
                .collect::<Vec<String>>();

            sections.push(format!("# Sheet {number}\n{}", rows.join("\n")));
        }

        return Ok(sections.join("\n\n"));
    }
}
