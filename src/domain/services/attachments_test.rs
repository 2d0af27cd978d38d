use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;

use super::apply_budget;
use super::classify;
use super::extraction_errors;
use super::AttachmentExtractor;
use super::AttachmentLimits;
use super::TRUNCATION_MARKER;
use crate::domain::models::AttachmentFile;
use crate::domain::models::ErrorKind;
use crate::domain::models::FileKind;
use crate::infrastructure::decoders::Decoders;
use crate::infrastructure::decoders::DocumentDecoder;

struct Failing {}

impl DocumentDecoder for Failing {
    fn decode(&self, _bytes: &[u8]) -> Result<String> {
        bail!("corrupt document");
    }
}

fn limits(max_total_chars: usize) -> AttachmentLimits {
    return AttachmentLimits {
        max_attachments: 3,
        max_image_bytes: 8,
        max_file_bytes: 200,
        max_total_chars,
    };
}

fn text_file(name: &str, len: usize) -> AttachmentFile {
    return AttachmentFile::new(name, "text/plain", "x".repeat(len).into_bytes());
}

fn strip_marker(text: &str) -> &str {
    return text.strip_suffix(TRUNCATION_MARKER).unwrap_or(text);
}

#[test]
fn it_classifies_with_fixed_precedence() {
    assert_eq!(classify("image/png", "png"), FileKind::Image);
    assert_eq!(classify("", "JPG"), FileKind::Image);
    assert_eq!(classify("application/pdf", "png"), FileKind::Image);
    assert_eq!(classify("application/pdf", ""), FileKind::Pdf);
    assert_eq!(classify("", "pdf"), FileKind::Pdf);
    assert_eq!(
        classify(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "bin"
        ),
        FileKind::Word
    );
    assert_eq!(classify("application/octet-stream", "docx"), FileKind::Word);
    assert_eq!(classify("", "xlsx"), FileKind::Spreadsheet);
    assert_eq!(classify("text/markdown", ""), FileKind::Text);
    assert_eq!(classify("", "rs"), FileKind::Text);
    assert_eq!(classify("application/json", ""), FileKind::Text);
    assert_eq!(classify("application/zip", "zip"), FileKind::Unknown);
    assert_eq!(classify("", ""), FileKind::Unknown);
}

#[tokio::test]
async fn it_encodes_images_as_data_urls() {
    let extractor = AttachmentExtractor::new(limits(100), Decoders::default());
    let files = vec![AttachmentFile::new("dot.png", "image/png", vec![1, 2, 3])];

    let res = extractor.prepare(files).await;

    assert_eq!(res.len(), 1);
    assert_eq!(res[0].data_url, Some("data:image/png;base64,AQID".to_string()));
    assert!(res[0].is_image());
    assert_eq!(res[0].text_content, None);
}

#[tokio::test]
async fn it_guesses_image_type_from_extension() {
    let extractor = AttachmentExtractor::new(limits(100), Decoders::default());
    let files = vec![AttachmentFile::new("photo.jpg", "", vec![1, 2, 3])];

    let res = extractor.prepare(files).await;

    assert_eq!(res[0].data_url, Some("data:image/jpeg;base64,AQID".to_string()));
}

#[tokio::test]
async fn it_excludes_oversized_files() {
    let extractor = AttachmentExtractor::new(limits(1000), Decoders::default());
    let files = vec![
        AttachmentFile::new("big.png", "image/png", vec![0; 9]),
        text_file("big.txt", 201),
        text_file("ok.txt", 200),
    ];

    let res = extractor.prepare(files).await;

    assert_eq!(res.len(), 1);
    assert_eq!(res[0].name, "ok.txt");
    assert_eq!(res[0].extraction_error, None);
}

#[tokio::test]
async fn it_enforces_max_attachments() {
    let extractor = AttachmentExtractor::new(limits(1000), Decoders::default());
    let files = (0..5)
        .map(|idx| return text_file(&format!("{idx}.txt"), 1))
        .collect::<Vec<AttachmentFile>>();

    let res = extractor.prepare(files).await;

    let names = res
        .iter()
        .map(|e| return e.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["0.txt", "1.txt", "2.txt"]);
}

#[tokio::test]
async fn it_shares_character_budget_across_batch() {
    let extractor = AttachmentExtractor::new(limits(100), Decoders::default());
    let files = vec![
        text_file("a.txt", 60),
        text_file("b.txt", 60),
        text_file("c.txt", 60),
    ];

    let res = extractor.prepare(files).await;
    let texts = res
        .iter()
        .map(|e| return e.text_content.clone().unwrap())
        .collect::<Vec<String>>();

    assert_eq!(texts[0], "x".repeat(60));
    assert_eq!(texts[1], format!("{}{TRUNCATION_MARKER}", "x".repeat(40)));
    assert_eq!(texts[2], TRUNCATION_MARKER);

    let total = texts
        .iter()
        .map(|text| return strip_marker(text).chars().count())
        .sum::<usize>();
    assert!(total <= 100);
}

#[tokio::test]
async fn it_keeps_file_when_extraction_fails() {
    let mut decoders = Decoders::default();
    decoders.text = Arc::new(Failing {});
    let extractor = AttachmentExtractor::new(limits(100), decoders);

    let res = extractor.prepare(vec![text_file("notes.txt", 10)]).await;

    assert_eq!(res.len(), 1);
    assert_eq!(res[0].text_content, None);
    assert_eq!(res[0].extraction_error, Some("corrupt document".to_string()));

    let errors = extraction_errors(&res);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Extraction);
    assert_eq!(errors[0].message, "notes.txt: corrupt document");
}

#[tokio::test]
async fn it_marks_unknown_formats_unextracted() {
    let extractor = AttachmentExtractor::new(limits(100), Decoders::default());
    let files = vec![AttachmentFile::new(
        "bundle.zip",
        "application/zip",
        vec![0; 4],
    )];

    let res = extractor.prepare(files).await;

    assert_eq!(res.len(), 1);
    assert_eq!(res[0].data_url, None);
    assert_eq!(res[0].text_content, None);
    assert_eq!(res[0].extraction_error, None);
}

#[test]
fn it_counts_budget_in_characters() {
    let (kept, used) = apply_budget("héllo", 3);
    assert_eq!(kept, format!("hél{TRUNCATION_MARKER}"));
    assert_eq!(used, 3);

    let (kept, used) = apply_budget("héllo", 5);
    assert_eq!(kept, "héllo");
    assert_eq!(used, 5);
}
