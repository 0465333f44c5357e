/// Integration tests for the BitSleuth API
///
/// End-to-end checks against the real router with a live database and a
/// mock blockchain gateway:
/// - Manual payment submission
/// - Duplicate transaction hash handling
/// - Authentication on protected routes

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::Service as _;

async fn submit_payment(
    ctx: &TestContext,
    tx_hash: &str,
    invoice_id: uuid::Uuid,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/manual")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "tx_hash": tx_hash,
                "invoice_id": invoice_id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    (status, body_json)
}

#[tokio::test]
async fn test_submit_payment() {
    let ctx = TestContext::new().await.unwrap();
    let invoice = ctx.create_test_invoice().await.unwrap();

    let tx_hash = format!("tx-{}", uuid::Uuid::new_v4());
    ctx.chain.insert_transaction(&tx_hash, Some(61_999_990));

    let (status, body) = submit_payment(&ctx, &tx_hash, invoice.id).await;

    assert_eq!(status, StatusCode::OK, "unexpected response: {body}");
    assert_eq!(body["message"], "Payment submitted for verification");
    assert_eq!(body["status"], "pending");
    assert_eq!(
        body["confirmations_required"],
        ctx.config.payments.required_confirmations
    );
    assert!(body["payment_id"].is_string());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_tx_hash_returns_original_payment() {
    let ctx = TestContext::new().await.unwrap();
    let invoice = ctx.create_test_invoice().await.unwrap();

    let tx_hash = format!("tx-{}", uuid::Uuid::new_v4());
    ctx.chain.insert_transaction(&tx_hash, Some(61_999_990));

    let (status, first) = submit_payment(&ctx, &tx_hash, invoice.id).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {first}");

    // Resubmitting the same hash is idempotent: same payment ID, no new
    // record, and no second "pending" announcement
    let (status, second) = submit_payment(&ctx, &tx_hash, invoice.id).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {second}");
    assert_eq!(second["message"], "Payment already recorded");
    assert_eq!(second["payment_id"], first["payment_id"]);
    assert!(second.get("status").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_submit_unknown_transaction_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let invoice = ctx.create_test_invoice().await.unwrap();

    // Never registered with the gateway
    let tx_hash = format!("tx-{}", uuid::Uuid::new_v4());
    let (status, body) = submit_payment(&ctx, &tx_hash, invoice.id).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Transaction not found on blockchain");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/manual")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "tx_hash": "anything",
                "invoice_id": uuid::Uuid::new_v4(),
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}
