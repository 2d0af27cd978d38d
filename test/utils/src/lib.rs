use std::io::Cursor;
use std::io::Write;

use zip::write::FileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Builds an in-memory zip archive, the container used by office documents.
pub fn zip_package(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }

    return writer.finish().unwrap().into_inner();
}

/// A chat completion event stream that delivers `fragments` in order and
/// then terminates.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = fragments
        .iter()
        .map(|fragment| {
            let event = serde_json::json!({
                "choices": [{ "index": 0, "delta": { "content": fragment } }]
            });
            return format!("data: {event}\n\n");
        })
        .collect::<Vec<String>>()
        .join("");
    body.push_str("data: [DONE]\n\n");

    return body;
}
