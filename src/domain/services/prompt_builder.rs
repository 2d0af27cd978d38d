#[cfg(test)]
#[path = "prompt_builder_test.rs"]
mod tests;

use crate::domain::models::CompletionRequest;
use crate::domain::models::ContentPart;
use crate::domain::models::ImageUrl;
use crate::domain::models::Message;
use crate::domain::models::MessageContent;
use crate::domain::models::ProviderMessage;
use crate::domain::models::ProviderRole;
use crate::domain::models::Role;

pub const FILE_TEXT_INSTRUCTION: &str = "The user's messages include the full text of attached files, each framed by '--- File: <name> ---' and '--- End of file: <name> ---' lines. That text is the file content. Read it and answer from it. Never say you cannot open, read, or access the attached files.";

pub const UNEXTRACTED_INSTRUCTION: &str = "Some attached files could not be converted to text, and their names are listed in the user's message. Acknowledge them by name and explain that their content was not included. Never claim that no files were attached.";

pub const IMAGE_INSTRUCTION: &str = "The user's messages include images as inline image parts. Look at them and answer about them directly. Never say you cannot see or access images.";

/// Text sent for a stored user message: the typed text, then each extracted
/// file framed by a name header, then the names of files with no text.
pub fn render_user_text(message: &Message) -> String {
    let mut sections: Vec<String> = vec![];
    if !message.content.is_empty() {
        sections.push(message.content.to_string());
    }

    for file in &message.file_texts {
        sections.push(format!(
            "--- File: {name} ---\n{text}\n--- End of file: {name} ---",
            name = file.name,
            text = file.text
        ));
    }

    if !message.other_file_names.is_empty() {
        sections.push(format!(
            "[Attached files without extractable content: {}]",
            message.other_file_names.join(", ")
        ));
    }

    return sections.join("\n\n");
}

pub fn to_provider_message(message: &Message) -> ProviderMessage {
    if message.role == Role::Assistant {
        return ProviderMessage::text(ProviderRole::Assistant, &message.content);
    }

    let text = render_user_text(message);
    if message.image_data_urls.is_empty() {
        return ProviderMessage::text(ProviderRole::User, &text);
    }

    let mut parts: Vec<ContentPart> = vec![];
    if !text.is_empty() {
        parts.push(ContentPart::Text { text });
    }
    for url in &message.image_data_urls {
        parts.push(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.to_string(),
            },
        });
    }

    return ProviderMessage {
        role: ProviderRole::User,
        content: MessageContent::Parts(parts),
    };
}

/// Provider messages for a conversation. Instructions about in-band
/// attachments lead the list, each at most once, followed by the history.
/// Assistant messages with no content (a turn cancelled before any reply)
/// are left out.
pub fn build_messages(history: &[Message]) -> Vec<ProviderMessage> {
    let users = history
        .iter()
        .filter(|e| return e.role == Role::User)
        .collect::<Vec<&Message>>();

    let mut messages: Vec<ProviderMessage> = vec![];
    if users.iter().any(|e| return !e.file_texts.is_empty()) {
        messages.push(ProviderMessage::text(
            ProviderRole::System,
            FILE_TEXT_INSTRUCTION,
        ));
    }
    if users.iter().any(|e| return !e.other_file_names.is_empty()) {
        messages.push(ProviderMessage::text(
            ProviderRole::System,
            UNEXTRACTED_INSTRUCTION,
        ));
    }
    if users.iter().any(|e| return !e.image_data_urls.is_empty()) {
        messages.push(ProviderMessage::text(ProviderRole::System, IMAGE_INSTRUCTION));
    }

    for message in history {
        if message.role == Role::Assistant && message.content.is_empty() {
            continue;
        }
        messages.push(to_provider_message(message));
    }

    return messages;
}

pub fn build_request(model: &str, max_tokens: u32, history: &[Message]) -> CompletionRequest {
    return CompletionRequest {
        model: model.to_string(),
        messages: build_messages(history),
        max_tokens,
        stream: true,
    };
}

/// Splits a chat for regeneration. When the chat ends with a user message
/// followed by its assistant reply, returns the history before that pair and
/// the user message to resubmit.
pub fn split_for_regenerate(messages: &[Message]) -> Option<(&[Message], &Message)> {
    if messages.len() < 2 {
        return None;
    }

    let user = &messages[messages.len() - 2];
    let reply = &messages[messages.len() - 1];
    if user.role != Role::User || reply.role != Role::Assistant {
        return None;
    }

    return Some((&messages[..messages.len() - 2], user));
}
