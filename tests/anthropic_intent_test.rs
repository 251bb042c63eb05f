use anyhow::Result;
use httpmock::prelude::*;
use sales_desk::adapters::http::build_client;
use sales_desk::adapters::ClaudeIntentParser;
use sales_desk::domain::intent::Intent;
use sales_desk::domain::ports::IntentParser;
use sales_desk::BotError;
use serde_json::json;

fn parser(server: &MockServer) -> Result<ClaudeIntentParser> {
    Ok(ClaudeIntentParser::new(
        build_client(5)?,
        server.base_url(),
        "sk-ant-test",
        "claude-haiku-4-5-20251001",
        200,
        "You parse messages.",
    ))
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    })
}

#[tokio::test]
async fn test_fenced_reply_is_parsed() -> Result<()> {
    let server = MockServer::start();
    let messages = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/messages")
            .header("x-api-key", "sk-ant-test")
            .header("anthropic-version", "2023-06-01")
            .json_body_partial(
                r#"{"model":"claude-haiku-4-5-20251001","max_tokens":200,"system":"You parse messages.","messages":[{"role":"user","content":"how much rice did we sell this week"}]}"#,
            );
        then.status(200).json_body(reply(
            "```json\n{\"intent\":\"sales_by_product\",\"period\":\"this_week\",\"channel\":\"online\",\"product\":\"rice\",\"search_query\":null}\n```",
        ));
    });

    let parsed = parser(&server)?
        .parse("how much rice did we sell this week")
        .await?;
    messages.assert();

    assert_eq!(parsed.intent.as_deref(), Some("sales_by_product"));
    assert_eq!(parsed.product.as_deref(), Some("rice"));
    assert!(matches!(parsed.resolve(), Intent::SalesByProduct(_)));
    Ok(())
}

#[tokio::test]
async fn test_prose_reply_is_intent_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/messages");
        then.status(200).json_body(reply("Sure! Here are your sales figures."));
    });

    let err = parser(&server)?.parse("sales").await.unwrap_err();
    assert!(matches!(err, BotError::IntentError { .. }));
    Ok(())
}

#[tokio::test]
async fn test_overloaded_api_is_retryable_upstream_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/messages");
        then.status(529)
            .json_body(json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}));
    });

    let err = parser(&server)?.parse("sales today").await.unwrap_err();
    match &err {
        BotError::UpstreamError { service, status, .. } => {
            assert_eq!(service, "Anthropic");
            assert_eq!(*status, 529);
        }
        other => panic!("unexpected error {}", other),
    }
    assert!(err.is_retryable());
    Ok(())
}
