#[cfg(test)]
#[path = "attachments_test.rs"]
mod tests;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::task;

use crate::domain::models::Attachment;
use crate::domain::models::AttachmentFile;
use crate::domain::models::EngineError;
use crate::domain::models::ErrorKind;
use crate::domain::models::FileKind;
use crate::infrastructure::decoders::Decoders;

pub const MAX_ATTACHMENTS: usize = 10;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_TOTAL_CHARS: usize = 100_000;
pub const TRUNCATION_MARKER: &str =
    "\n\n[... truncated: the attachment text budget for this message is used up]";

const WORD_TYPES: [&str; 2] = [
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
const SPREADSHEET_TYPES: [&str; 2] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];
const TEXT_TYPES: [&str; 4] = [
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-yaml",
];
const TEXT_EXTENSIONS: [&str; 31] = [
    "bat", "c", "cpp", "cs", "css", "csv", "go", "h", "htm", "html", "ini", "java", "js", "json",
    "jsx", "kt", "log", "md", "php", "ps1", "py", "rb", "rs", "sh", "sql", "toml", "ts", "tsx",
    "txt", "xml", "yaml",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttachmentLimits {
    pub max_attachments: usize,
    pub max_image_bytes: usize,
    pub max_file_bytes: usize,
    pub max_total_chars: usize,
}

impl Default for AttachmentLimits {
    fn default() -> AttachmentLimits {
        return AttachmentLimits {
            max_attachments: MAX_ATTACHMENTS,
            max_image_bytes: MAX_IMAGE_BYTES,
            max_file_bytes: MAX_FILE_BYTES,
            max_total_chars: MAX_TOTAL_CHARS,
        };
    }
}

/// Classifies by declared content type, then by extension, checking the
/// kinds in a fixed order so an image always wins over anything else.
pub fn classify(content_type: &str, extension: &str) -> FileKind {
    let content_type = content_type.to_lowercase();
    let extension = extension.to_lowercase();
    let guessed = mime_guess::from_ext(&extension)
        .first_raw()
        .unwrap_or("");

    if content_type.starts_with("image/") || guessed.starts_with("image/") {
        return FileKind::Image;
    }
    if content_type == "application/pdf" || extension == "pdf" {
        return FileKind::Pdf;
    }
    if WORD_TYPES.contains(&content_type.as_str()) || ["doc", "docx"].contains(&extension.as_str())
    {
        return FileKind::Word;
    }
    if SPREADSHEET_TYPES.contains(&content_type.as_str())
        || ["xls", "xlsx"].contains(&extension.as_str())
    {
        return FileKind::Spreadsheet;
    }
    if content_type.starts_with("text/")
        || TEXT_TYPES.contains(&content_type.as_str())
        || TEXT_EXTENSIONS.contains(&extension.as_str())
    {
        return FileKind::Text;
    }

    return FileKind::Unknown;
}

fn data_url(file: &AttachmentFile) -> String {
    let mut mime = file.content_type.to_string();
    if !mime.starts_with("image/") {
        mime = mime_guess::from_ext(&file.extension())
            .first_raw()
            .unwrap_or("image/png")
            .to_string();
    }

    return format!("data:{mime};base64,{}", STANDARD.encode(&file.bytes));
}

/// Reduces raw files to inline images or budgeted text before a send.
#[derive(Clone, Default)]
pub struct AttachmentExtractor {
    pub limits: AttachmentLimits,
    pub decoders: Decoders,
}

impl AttachmentExtractor {
    pub fn new(limits: AttachmentLimits, decoders: Decoders) -> AttachmentExtractor {
        return AttachmentExtractor { limits, decoders };
    }

    /// Prepares one batch of files for a single message. Files over the
    /// count or size limits are left out of the batch. Extraction failures
    /// keep the file with an `extraction_error`. Extracted text shares one
    /// character budget across the batch.
    pub async fn prepare(&self, files: Vec<AttachmentFile>) -> Vec<Attachment> {
        let mut attachments: Vec<Attachment> = vec![];
        let mut remaining = self.limits.max_total_chars;

        for file in files {
            if attachments.len() >= self.limits.max_attachments {
                tracing::info!(name = %file.name, "Attachment over the per-message limit, skipping");
                continue;
            }

            let kind = classify(&file.content_type, &file.extension());
            let ceiling = if kind == FileKind::Image {
                self.limits.max_image_bytes
            } else {
                self.limits.max_file_bytes
            };
            if file.size() > ceiling {
                tracing::info!(
                    name = %file.name,
                    size = file.size(),
                    ceiling = ceiling,
                    "Attachment too large, skipping"
                );
                continue;
            }

            let mut attachment = Attachment::unextracted(&file);
            if kind == FileKind::Image {
                attachment.data_url = Some(data_url(&file));
                attachments.push(attachment);
                continue;
            }

            let decoder = match self.decoders.get(kind) {
                Some(decoder) => decoder,
                None => {
                    attachments.push(attachment);
                    continue;
                }
            };

            let bytes = file.bytes;
            let decoded = task::spawn_blocking(move || return decoder.decode(&bytes)).await;
            match decoded {
                Ok(Ok(text)) => {
                    let (budgeted, used) = apply_budget(&text, remaining);
                    remaining -= used;
                    attachment.text_content = Some(budgeted);
                }
                Ok(Err(err)) => {
                    tracing::warn!(name = %attachment.name, kind = %kind, error = ?err, "Extraction failed");
                    attachment.extraction_error = Some(err.to_string());
                }
                Err(err) => {
                    tracing::error!(name = %attachment.name, error = ?err, "Extraction task panicked");
                    attachment.extraction_error = Some(err.to_string());
                }
            }

            attachments.push(attachment);
        }

        return attachments;
    }
}

/// Cuts `text` to at most `remaining` characters. Returns the text to keep,
/// with the truncation marker appended when anything was cut, and how many
/// characters of budget it consumed. The marker does not count against the
/// budget.
pub fn apply_budget(text: &str, remaining: usize) -> (String, usize) {
    let total = text.chars().count();
    if total <= remaining {
        return (text.to_string(), total);
    }

    let kept = text.chars().take(remaining).collect::<String>();
    return (format!("{kept}{TRUNCATION_MARKER}"), remaining);
}

/// Banner errors for files that were kept but could not be read.
pub fn extraction_errors(attachments: &[Attachment]) -> Vec<EngineError> {
    return attachments
        .iter()
        .filter_map(|attachment| {
            let err = attachment.extraction_error.as_ref()?;
            return Some(EngineError::new(
                ErrorKind::Extraction,
                &format!("{}: {err}", attachment.name),
            ));
        })
        .collect();
}
