/// A raw file offered for a turn, before extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AttachmentFile {
    pub fn new(name: &str, content_type: &str, bytes: Vec<u8>) -> AttachmentFile {
        return AttachmentFile {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        };
    }

    pub fn size(&self) -> usize {
        return self.bytes.len();
    }

    pub fn extension(&self) -> String {
        return self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| return ext.to_lowercase())
            .unwrap_or_default();
    }
}

/// Transient pre-send form of a file. Never persisted as is, it is folded into
/// the user message when the turn is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub size: usize,
    pub data_url: Option<String>,
    pub text_content: Option<String>,
    pub extraction_error: Option<String>,
}

impl Attachment {
    pub fn unextracted(file: &AttachmentFile) -> Attachment {
        return Attachment {
            name: file.name.to_string(),
            content_type: file.content_type.to_string(),
            size: file.size(),
            data_url: None,
            text_content: None,
            extraction_error: None,
        };
    }

    #[cfg(test)]
    pub fn is_image(&self) -> bool {
        return self.data_url.is_some();
    }
}

/// Format family of an attachment, in classification precedence order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
    Word,
    Spreadsheet,
    Text,
    Unknown,
}
