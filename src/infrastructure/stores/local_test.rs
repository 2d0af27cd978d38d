use std::sync::Arc;

use anyhow::Result;

use super::LocalStore;
use super::CHATS_KEY;
use super::PROJECTS_KEY;
use crate::domain::models::Chat;
use crate::domain::models::ChatStore;
use crate::domain::models::FileText;
use crate::domain::models::Message;
use crate::domain::models::Project;
use crate::domain::models::Role;
use crate::infrastructure::stores::KeyValueBox;
use crate::infrastructure::stores::KeyValueStore;
use crate::infrastructure::stores::MemoryKeyValueStore;

fn store() -> (LocalStore, KeyValueBox) {
    let kv: KeyValueBox = Arc::new(MemoryKeyValueStore::default());
    return (LocalStore::new(kv.clone()), kv);
}

fn chat(project_id: &str, updated_at: i64) -> Chat {
    let mut chat = Chat::new(project_id);
    chat.updated_at = updated_at;
    return chat;
}

#[tokio::test]
async fn it_round_trips_chats() -> Result<()> {
    let (store, _kv) = store();

    let mut user = Message::new(Role::User, "Read this");
    user.image_data_urls.push("data:image/png;base64,AAAA".to_string());
    user.file_texts.push(FileText {
        name: "a.txt".to_string(),
        text: "alpha".to_string(),
    });
    user.other_file_names.push("b.bin".to_string());

    let mut saved = chat("p1", 10);
    saved.messages = vec![user, Message::new(Role::Assistant, "Done reading")];
    store.save_chat(&saved).await?;

    let chats = store.list_chats_for_project("p1").await;
    assert_eq!(chats, vec![saved]);

    return Ok(());
}

#[tokio::test]
async fn it_upserts_and_orders_by_updated_at() -> Result<()> {
    let (store, _kv) = store();
    let older = chat("p1", 10);
    let mut newer = chat("p1", 20);
    let other = chat("p2", 30);

    store.save_chat(&older).await?;
    store.save_chat(&newer).await?;
    store.save_chat(&other).await?;

    newer.title = "Renamed".to_string();
    store.save_chat(&newer).await?;

    let chats = store.list_chats_for_project("p1").await;
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].id, newer.id);
    assert_eq!(chats[0].title, "Renamed");
    assert_eq!(chats[1].id, older.id);

    return Ok(());
}

#[tokio::test]
async fn it_deletes_chats() -> Result<()> {
    let (store, _kv) = store();
    let first = chat("p1", 10);
    let second = chat("p1", 20);
    store.save_chat(&first).await?;
    store.save_chat(&second).await?;

    store.delete_chat(&first.id).await?;

    let chats = store.list_chats_for_project("p1").await;
    assert_eq!(chats, vec![second]);

    return Ok(());
}

#[tokio::test]
async fn it_replaces_projects() -> Result<()> {
    let (store, _kv) = store();
    let first = Project::new("First");
    let second = Project::new("Second");

    store.save_projects(&[first.clone(), second.clone()]).await?;
    store.save_projects(&[second.clone()]).await?;

    assert_eq!(store.list_projects().await, vec![second]);

    return Ok(());
}

#[tokio::test]
async fn it_reads_corrupt_collections_as_empty() -> Result<()> {
    let (store, kv) = store();
    kv.set(PROJECTS_KEY, "{oops")?;
    kv.set(CHATS_KEY, "[1, 2")?;

    assert!(store.list_projects().await.is_empty());
    assert!(store.list_chats_for_project("p1").await.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_stores_current_selection() -> Result<()> {
    let (store, _kv) = store();
    assert_eq!(store.current_project_id().await, None);

    store.set_current_project_id(Some("p1")).await?;
    store.set_current_chat_id(Some("c1")).await?;
    assert_eq!(store.current_project_id().await, Some("p1".to_string()));
    assert_eq!(store.current_chat_id().await, Some("c1".to_string()));

    store.set_current_chat_id(None).await?;
    assert_eq!(store.current_chat_id().await, None);

    return Ok(());
}
