//! Live fetch tests against a local stand-in for the items endpoint.

mod common;

use std::net::TcpListener;
use std::time::Duration;

use common::{raw_items, serve_once};
use skinport_deals::fetcher::normalize_items;
use skinport_deals::{Credentials, SkinportClient, SkinportError, Source};

fn client(api_base: &str, credentials: Option<Credentials>) -> (SkinportClient, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let client = SkinportClient::builder()
        .data_dir(tmp.path())
        .api_base(api_base)
        .credentials(credentials)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    (client, tmp)
}

fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[test]
fn live_fetch_normalizes_and_persists_snapshot() {
    let (base, server) = serve_once("200 OK", &raw_items().to_string());
    let (client, tmp) = client(&base, None);

    let snap = client.fetch(&Source::live("EUR")).unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /v1/items?currency=EUR&app_id=730 "), "{request}");
    assert_eq!(header(&request, "accept"), Some("application/json"));
    assert_eq!(header(&request, "authorization"), None);

    // the element without market_hash_name is dropped
    assert_eq!(snap.len(), 6);
    assert_eq!(snap.items[1].name, "★ Karambit | Doppler (Factory New)");

    let saved = client.list_saved().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(snap.path.as_deref(), Some(saved[0].path.as_path()));
    assert!(saved[0].path.starts_with(tmp.path()));
    assert_eq!(saved[0].captured_at, snap.captured_at);

    // replaying the saved file gives the same items
    let replay = client.fetch(&Source::latest()).unwrap();
    assert_eq!(replay.items, snap.items);
}

#[test]
fn live_fetch_sends_basic_auth_when_configured() {
    let (base, server) = serve_once("200 OK", "[]");
    let (client, _tmp) = client(&base, Some(Credentials::new("id", "secret")));

    let snap = client.fetch(&Source::live("USD")).unwrap();
    let request = server.join().unwrap();

    assert!(snap.is_empty());
    assert!(request.contains("currency=USD"));
    assert_eq!(header(&request, "authorization"), Some("Basic aWQ6c2VjcmV0"));
}

#[test]
fn live_fetch_honours_app_id() {
    let (base, server) = serve_once("200 OK", "[]");
    let (client, _tmp) = client(&base, None);

    client
        .fetch(&Source::Live { currency: "GBP".into(), app_id: 570 })
        .unwrap();
    assert!(server.join().unwrap().contains("app_id=570"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn unauthorized_without_credentials_is_authentication_error() {
    let (base, server) = serve_once("401 Unauthorized", r#"{"errors":[{"id":"auth"}]}"#);
    let (client, _tmp) = client(&base, None);

    let err = client.fetch(&Source::live("EUR")).unwrap_err();
    server.join().unwrap();
    match err {
        SkinportError::Authentication(msg) => assert!(msg.contains("none are configured"), "{msg}"),
        other => panic!("expected Authentication, got {other:?}"),
    }
    assert!(client.list_saved().unwrap().is_empty());
}

#[test]
fn rejected_credentials_are_authentication_error() {
    let (base, server) = serve_once("403 Forbidden", "");
    let (client, _tmp) = client(&base, Some(Credentials::new("id", "wrong")));

    let err = client.fetch(&Source::live("EUR")).unwrap_err();
    server.join().unwrap();
    match err {
        SkinportError::Authentication(msg) => assert!(msg.contains("rejected"), "{msg}"),
        other => panic!("expected Authentication, got {other:?}"),
    }
}

#[test]
fn server_error_is_transport_error_with_body() {
    let (base, server) = serve_once("503 Service Unavailable", "maintenance");
    let (client, _tmp) = client(&base, None);

    let err = client.fetch(&Source::live("EUR")).unwrap_err();
    server.join().unwrap();
    match err {
        SkinportError::Transport { status, body, .. } => {
            assert_eq!(status, Some(503));
            assert_eq!(body.as_deref(), Some("maintenance"));
        }
        other => panic!("expected Transport, got {other:?}"),
    }
    assert!(client.list_saved().unwrap().is_empty());
}

#[test]
fn non_array_payload_is_transport_error() {
    let (base, server) = serve_once("200 OK", r#"{"message":"rate limited"}"#);
    let (client, _tmp) = client(&base, None);

    let err = client.fetch(&Source::live("EUR")).unwrap_err();
    server.join().unwrap();
    match err {
        SkinportError::Transport { status, message, body } => {
            assert_eq!(status, Some(200));
            assert!(message.contains("JSON array"));
            assert!(body.unwrap().contains("rate limited"));
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[test]
fn unreachable_endpoint_is_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (client, _tmp) = client(&format!("http://127.0.0.1:{port}/v1"), None);

    let err = client.fetch(&Source::live("EUR")).unwrap_err();
    assert!(
        matches!(err, SkinportError::Transport { status: None, body: None, .. }),
        "{err:?}"
    );
}

// ---------------------------------------------------------------------------
// normalize_items
// ---------------------------------------------------------------------------

#[test]
fn normalize_rejects_non_arrays() {
    assert!(normalize_items(&serde_json::json!({"items": []})).is_none());
    assert!(normalize_items(&serde_json::json!("nope")).is_none());
}

#[test]
fn normalize_keeps_absent_fields_absent() {
    let items = normalize_items(&serde_json::json!([
        {"market_hash_name": "A", "min_price": 0, "suggested_price": null},
        {"market_hash_name": "B", "quantity": -3, "min_price": "1.5"},
        {"market_hash_name": 42},
        "not an object",
    ]))
    .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].min_price, Some(0.0));
    assert_eq!(items[0].suggested_price, None);
    assert_eq!(items[1].quantity, None);
    assert_eq!(items[1].min_price, None);
    assert_eq!(items[1].currency, None);
}

#[test]
fn normalize_falls_back_to_market_page_link() {
    let items = normalize_items(&serde_json::json!([
        {"market_hash_name": "A", "market_page": "https://skinport.com/market?item=A"}
    ]))
    .unwrap();
    assert_eq!(items[0].link.as_deref(), Some("https://skinport.com/market?item=A"));
}
