use anyhow::Result;
use test_utils::zip_package;

use super::docx::Docx;
use super::pdf::PdfToText;
use super::text::PlainText;
use super::xlsx::Xlsx;
use super::Decoders;
use super::DocumentDecoder;
use crate::domain::models::FileKind;

#[test]
fn it_decodes_plain_text_lossily() -> Result<()> {
    let mut bytes = "\u{feff}hello".as_bytes().to_vec();
    bytes.push(0xff);
    let text = PlainText {}.decode(&bytes)?;
    assert_eq!(text, "hello\u{fffd}");
    return Ok(());
}

#[test]
fn it_decodes_docx_paragraphs() -> Result<()> {
    let xml = r#"<?xml version="1.0"?><w:document><w:body><w:p><w:r><w:t>Quarterly &amp; annual</w:t></w:r></w:p><w:p><w:r><w:t>Risks:</w:t><w:tab/><w:t>three</w:t></w:r></w:p></w:body></w:document>"#;
    let bytes = zip_package(&[("word/document.xml", xml)]);

    let text = Docx {}.decode(&bytes)?;
    assert_eq!(text, "Quarterly & annual\nRisks:\tthree");
    return Ok(());
}

#[test]
fn it_fails_docx_without_document_part() -> Result<()> {
    let bytes = zip_package(&[("word/other.xml", "<x/>")]);
    assert!(Docx {}.decode(&bytes).is_err());
    assert!(Docx {}.decode(b"not a zip").is_err());
    return Ok(());
}

#[test]
fn it_decodes_xlsx_sheets() -> Result<()> {
    let shared = r#"<sst><si><t>Name</t></si><si><t>Score</t></si><si><r><t>Ada</t></r><r><t xml:space="preserve"> L</t></r></si></sst>"#;
    let sheet1 = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>42</v></c></row></sheetData></worksheet>"#;
    let sheet2 = r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>inline</t></is></c><c r="B1"/></row></sheetData></worksheet>"#;
    let bytes = zip_package(&[
        ("xl/sharedStrings.xml", shared),
        ("xl/worksheets/sheet2.xml", sheet2),
        ("xl/worksheets/sheet1.xml", sheet1),
    ]);

    let text = Xlsx {}.decode(&bytes)?;
    assert_eq!(
        text,
        "# Sheet 1\nName\tScore\nAda L\t42\n\n# Sheet 2\ninline\t"
    );
    return Ok(());
}

#[test]
fn it_fails_pdf_when_converter_is_missing() {
    let decoder = PdfToText {
        program: "chatdesk-missing-pdftotext".to_string(),
    };
    assert!(decoder.decode(b"%PDF-1.4").is_err());
}

#[test]
fn it_resolves_decoders_by_kind() {
    let decoders = Decoders::default();
    assert!(decoders.get(FileKind::Pdf).is_some());
    assert!(decoders.get(FileKind::Word).is_some());
    assert!(decoders.get(FileKind::Spreadsheet).is_some());
    assert!(decoders.get(FileKind::Text).is_some());
    assert!(decoders.get(FileKind::Image).is_none());
    assert!(decoders.get(FileKind::Unknown).is_none());
}
