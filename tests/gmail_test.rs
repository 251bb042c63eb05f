use anyhow::Result;
use httpmock::prelude::*;
use sales_desk::adapters::google::{GmailClient, StaticToken};
use sales_desk::adapters::http::build_client;
use sales_desk::app::MailSearch;
use sales_desk::domain::ports::Mailbox;
use serde_json::json;
use std::sync::Arc;

const LIST_PATH: &str = "/gmail/v1/users/me/messages";

fn gmail(server: &MockServer) -> Result<GmailClient> {
    Ok(GmailClient::new(
        build_client(5)?,
        server.base_url(),
        Arc::new(StaticToken("ya29.test".to_string())),
    ))
}

/// 列表後逐封抓 metadata，連結指向網頁版
#[tokio::test]
async fn test_search_fetches_metadata_for_each_hit() -> Result<()> {
    let server = MockServer::start();

    let list = server.mock(|when, then| {
        when.method(GET)
            .path(LIST_PATH)
            .header("Authorization", "Bearer ya29.test")
            .query_param("q", "invoice transfood")
            .query_param("maxResults", "3");
        then.status(200).json_body(json!({
            "messages": [{"id": "m1", "threadId": "t1"}, {"id": "m2", "threadId": "t2"}],
            "resultSizeEstimate": 2
        }));
    });
    let first = server.mock(|when, then| {
        when.method(GET)
            .path(format!("{}/m1", LIST_PATH))
            .query_param("format", "metadata");
        then.status(200).json_body(json!({
            "id": "m1",
            "payload": {"headers": [
                {"name": "Subject", "value": "Invoice TF-2251"},
                {"name": "From", "value": "Transfood <billing@transfood.example>"},
                {"name": "Date", "value": "Fri, 9 Oct 2026 08:05:00 +0200"}
            ]}
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path(format!("{}/m2", LIST_PATH));
        then.status(200).json_body(json!({"id": "m2", "payload": {"headers": []}}));
    });

    let hits = gmail(&server)?
        .search("invoices@example.eu", "invoice transfood", 3)
        .await?;

    list.assert();
    first.assert();
    second.assert();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].subject, "Invoice TF-2251");
    assert_eq!(hits[0].from, "Transfood <billing@transfood.example>");
    assert_eq!(hits[0].date, "09 Oct 2026 08:05");
    assert_eq!(hits[0].link, "https://mail.google.com/mail/u/0/#all/m1");
    assert_eq!(hits[1].subject, "(no subject)");
    Ok(())
}

#[tokio::test]
async fn test_empty_result_list() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(LIST_PATH);
        then.status(200).json_body(json!({"resultSizeEstimate": 0}));
    });

    let hits = gmail(&server)?.search("info@example.eu", "zzz", 3).await?;
    assert!(hits.is_empty());
    Ok(())
}

/// 信箱錯誤時 search_all 仍回傳每個信箱一組結果
#[tokio::test]
async fn test_mail_search_survives_failing_inbox() -> Result<()> {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path(LIST_PATH);
        then.status(403).body(r#"{"error":{"code":403,"message":"Delegation denied"}}"#);
    });

    let search = MailSearch::new(
        Arc::new(gmail(&server)?),
        vec!["invoices@example.eu".to_string(), "info@example.eu".to_string()],
        3,
    );
    let results = search.search_all("invoice").await;

    list.assert_hits(2);
    assert_eq!(results.inboxes.len(), 2);
    assert!(results.is_empty());
    Ok(())
}
