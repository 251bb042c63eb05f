use anyhow::Result;
use chrono::{DateTime, Utc};
use httpmock::prelude::*;
use sales_desk::adapters::google::{ServiceAccountKey, ServiceAccountTokens, SheetsClient};
use sales_desk::adapters::http::build_client;
use sales_desk::app::{RestaurantLedger, SupplierLedger};
use sales_desk::domain::model::SupplierLookup;
use sales_desk::domain::ports::SheetSource;
use sales_desk::BotError;
use serde_json::json;
use std::sync::Arc;

fn service_account(server: &MockServer) -> Result<ServiceAccountKey> {
    let pem = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/test_service_account_key.pem"
    ))?;
    Ok(ServiceAccountKey {
        client_email: "sales-desk@spice-village.iam.gserviceaccount.com".to_string(),
        private_key: pem,
        token_uri: Some(server.url("/token")),
    })
}

fn sheets(server: &MockServer) -> Result<Arc<SheetsClient>> {
    let client = build_client(5)?;
    let tokens = ServiceAccountTokens::new(client.clone(), service_account(server)?);
    Ok(Arc::new(SheetsClient::new(client, server.base_url(), Arc::new(tokens))))
}

fn token_mock(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .body_contains("jwt-bearer")
            .body_contains("assertion=");
        then.status(200)
            .json_body(json!({"access_token": "ya29.test", "expires_in": 3600, "token_type": "Bearer"}));
    })
}

/// 餐廳分頁：標題列找日期欄，資料區找 Restaurant Sales 列；token 只換一次
#[tokio::test]
async fn test_restaurant_sales_through_sheets_api() -> Result<()> {
    let server = MockServer::start();
    let token = token_mock(&server);

    let header = server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v4/spreadsheets/restaurant-sheet/values/")
            .path_contains("A3:AZ3")
            .header("Authorization", "Bearer ya29.test");
        then.status(200).json_body(json!({
            "range": "'October 2026'!A3:AZ3",
            "majorDimension": "ROWS",
            "values": [["", "", "", "", "", "16/10/2026", "17/10/2026", "18/10/2026"]]
        }));
    });
    let data = server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v4/spreadsheets/restaurant-sheet/values/")
            .path_contains("A200:AZ350");
        then.status(200).json_body(json!({
            "values": [
                ["", "", "", "Drinks", "€1,000.00"],
                ["", "", "", "Restaurant Sales", "€18,420.10", "€1,100.00", "€950.40", ""]
            ]
        }));
    });

    let ledger = RestaurantLedger::new(sheets(&server)?, "restaurant-sheet", chrono_tz::Europe::Berlin);
    let now = DateTime::parse_from_rfc3339("2026-10-18T02:00:00Z")?.with_timezone(&Utc);
    let sales = ledger.sales(now).await?;

    assert!((sales.yesterday - 950.4).abs() < 1e-9);
    assert!((sales.mtd - 18420.1).abs() < 1e-9);
    token.assert_hits(1);
    header.assert();
    data.assert();
    Ok(())
}

#[tokio::test]
async fn test_supplier_outstanding_through_sheets_api() -> Result<()> {
    let server = MockServer::start();
    token_mock(&server);

    let tabs = server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/supplier-sheet")
            .query_param("fields", "sheets.properties.title");
        then.status(200).json_body(json!({
            "sheets": [
                {"properties": {"title": "Summary"}},
                {"properties": {"title": "Smart Elite"}},
                {"properties": {"title": "Transfood"}}
            ]
        }));
    });

    let mut rows = vec![
        json!(["Transfood"]),
        json!(["", "", "", "", "", "", "€310.00", "", "", "€910.00"]),
    ];
    rows.extend((0..5).map(|_| json!([])));
    rows.push(json!(["#", "Invoice Date", "Invoice No", "", "Amount", "Due Date"]));
    rows.push(json!(["1", "02/10/2026", "TF-2210", "", "€600.00", "16/10/2026", "", "", "", "", "", "", "", "", "€600.00"]));
    rows.push(json!(["2", "09/10/2026", "TF-2251", "", "€310.00", "23/10/2026", "", "", "", "", "", "", "", "", "€310.00"]));

    let statement = server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v4/spreadsheets/supplier-sheet/values/")
            .path_contains("Transfood");
        then.status(200).json_body(json!({ "values": rows }));
    });

    let ledger = SupplierLedger::new(sheets(&server)?, "supplier-sheet");
    match ledger.outstanding("transfood").await? {
        SupplierLookup::Found(found) => {
            assert_eq!(found.supplier, "Transfood");
            assert!((found.total_balance - 910.0).abs() < 1e-9);
            assert!((found.total_due - 310.0).abs() < 1e-9);
            assert_eq!(found.unpaid().count(), 2);
        }
        other => panic!("unexpected lookup {:?}", other),
    }

    tabs.assert();
    statement.assert();
    Ok(())
}

#[tokio::test]
async fn test_rejected_token_exchange_is_auth_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(400)
            .json_body(json!({"error": "invalid_grant", "error_description": "Invalid JWT Signature."}));
    });

    let err = sheets(&server)?
        .values("any-sheet", "A1:B2")
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::AuthError { .. }));
    assert!(err.to_string().contains("invalid_grant"));
    Ok(())
}
