use std::time::Duration;

use listwatch_core::Formatting;
use listwatch_engine::{Destination, Notifier, NotifyError, TelegramNotifier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notifier(server: &MockServer) -> TelegramNotifier {
    TelegramNotifier::new(&server.uri(), "123:abc", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn rich_text_is_sent_as_html() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_partial_json(json!({
            "chat_id": "-1001",
            "text": "<b>Threads 2017 June</b>",
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .deliver(
            &Destination::new("-1001"),
            "<b>Threads 2017 June</b>",
            Formatting::RichText,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn plain_text_has_no_parse_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    notifier(&server)
        .deliver(&Destination::new("42"), "Setting last check", Formatting::PlainText)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["chat_id"], "42");
    assert!(body.get("parse_mode").is_none());
}

#[tokio::test]
async fn api_refusal_is_reported_with_its_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let err = notifier(&server)
        .deliver(&Destination::new("0"), "hi", Formatting::PlainText)
        .await
        .unwrap_err();
    match err {
        NotifyError::Rejected(reason) => assert_eq!(reason, "Bad Request: chat not found"),
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn oversized_message_is_refused_before_sending() {
    let server = MockServer::start().await;
    let text = "x".repeat(4097);

    let err = notifier(&server)
        .deliver(&Destination::new("0"), &text, Formatting::PlainText)
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::TooLong { len: 4097, max: 4096 }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
