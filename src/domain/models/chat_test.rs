use super::derive_title;
use super::Chat;
use super::TITLE_MAX_CHARS;
use super::TITLE_PLACEHOLDER;
use crate::domain::models::Message;
use crate::domain::models::Role;

#[test]
fn it_creates_with_placeholder_title() {
    let chat = Chat::new("project-1");
    assert_eq!(chat.title, TITLE_PLACEHOLDER);
    assert_eq!(chat.project_id, "project-1");
    assert!(chat.messages.is_empty());
    assert_eq!(chat.created_at, chat.updated_at);
}

#[test]
fn it_derives_title_within_limit() {
    let title = derive_title("Summarize the Q3 report and list top 3 risks");
    assert_eq!(title, "Summarize the Q3 report and list top 3 risks");
}

#[test]
fn it_derives_title_truncated() {
    let text = "a ".repeat(100);
    let title = derive_title(&text);
    assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
}

#[test]
fn it_derives_title_collapsing_whitespace() {
    let title = derive_title("  Hello\n\n  world\t! ");
    assert_eq!(title, "Hello world !");
}

#[test]
fn it_derives_placeholder_for_empty() {
    assert_eq!(derive_title("   \n"), TITLE_PLACEHOLDER);
}

#[test]
fn it_assigns_title_once() {
    let mut chat = Chat::new("p");
    chat.messages.push(Message::new(Role::User, "First question"));
    chat.messages.push(Message::new(Role::Assistant, "First answer"));
    chat.assign_title();
    assert_eq!(chat.title, "First question");

    chat.messages.push(Message::new(Role::User, "Second question"));
    chat.assign_title();
    assert_eq!(chat.title, "First question");
}

#[test]
fn it_checks_alternation() {
    let mut chat = Chat::new("p");
    assert!(chat.alternates());

    chat.messages.push(Message::new(Role::User, "a"));
    chat.messages.push(Message::new(Role::Assistant, "b"));
    assert!(chat.alternates());

    chat.messages.push(Message::new(Role::Assistant, "c"));
    assert!(!chat.alternates());
}
