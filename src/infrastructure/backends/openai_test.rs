use anyhow::Result;
use futures::stream::StreamExt;
use futures::stream::TryStreamExt;
use mockito::Matcher;
use serde_json::json;
use test_utils::sse_body;

use super::fragments;
use super::parse_line;
use super::OpenAI;
use super::StreamLine;
use crate::domain::models::Backend;
use crate::domain::models::CompletionRequest;
use crate::domain::models::ProviderMessage;
use crate::domain::models::ProviderRole;

impl OpenAI {
    fn with_url(url: String) -> OpenAI {
        return OpenAI::new(&format!("{url}/v1/chat/completions"), "abc");
    }
}

fn request() -> CompletionRequest {
    return CompletionRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![ProviderMessage::text(ProviderRole::User, "Say hi to the world")],
        max_tokens: 512,
        stream: true,
    };
}

#[test]
fn it_checks_config() {
    assert!(OpenAI::new("http://localhost", "abc").check_config().is_ok());
    assert!(OpenAI::new("http://localhost", "").check_config().is_err());
    assert!(OpenAI::new("", "abc").check_config().is_err());
}

#[test]
fn it_parses_stream_lines() {
    assert_eq!(parse_line(""), StreamLine::Skip);
    assert_eq!(parse_line(": keep-alive"), StreamLine::Skip);
    assert_eq!(parse_line("data: [DONE]"), StreamLine::Done);
    assert_eq!(parse_line("data: {not json"), StreamLine::Skip);
    assert_eq!(parse_line("event: ping"), StreamLine::Skip);
    assert_eq!(
        parse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
        StreamLine::Skip
    );
    assert_eq!(parse_line(r#"data: {"choices":[]}"#), StreamLine::Skip);
    assert_eq!(
        parse_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#),
        StreamLine::Fragment("Hi".to_string())
    );
    assert_eq!(
        parse_line(r#"{"choices":[{"delta":{"content":"bare"}}]}"#),
        StreamLine::Fragment("bare".to_string())
    );
}

#[tokio::test]
async fn it_stops_reading_at_done() -> Result<()> {
    let body: &'static [u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n";
    let res = fragments(body).try_collect::<Vec<String>>().await?;
    assert_eq!(res, vec!["a".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let body = [
        r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
        "",
        r#"data: {"choices":[{"delta":{"content":"Hello "}}]}"#,
        "",
        "data: {broken",
        ": keep-alive",
        r#"data: {"choices":[{"delta":{"content":"World"}}]}"#,
        "",
        "data: [DONE]",
        "",
    ]
    .join("\n");

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .match_header("Content-Type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 512,
            "stream": true,
            "messages": [{ "role": "user", "content": "Say hi to the world" }]
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let backend = OpenAI::with_url(server.url());
    let stream = backend.get_completion(request()).await?;
    let res = stream.collect::<Vec<Result<String>>>().await;

    mock.assert_async().await;

    let fragments = res.into_iter().collect::<Result<Vec<String>>>()?;
    assert_eq!(fragments, vec!["Hello ".to_string(), "World".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_keeps_fragment_order_and_whitespace() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&["Line one\n", "  indented", "", " done"]))
        .create_async()
        .await;

    let backend = OpenAI::with_url(server.url());
    let res = backend
        .get_completion(request())
        .await?
        .try_collect::<Vec<String>>()
        .await?;

    mock.assert_async().await;
    assert_eq!(res.concat(), "Line one\n  indented done");
    return Ok(());
}

#[tokio::test]
async fn it_fails_on_error_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body("invalid api key")
        .create_async()
        .await;

    let backend = OpenAI::with_url(server.url());
    let res = backend.get_completion(request()).await;

    mock.assert_async().await;
    let err = res.err().unwrap().to_string();
    assert_eq!(err, "Completion request failed with HTTP 401: invalid api key");
}
