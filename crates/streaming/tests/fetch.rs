mod common;

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use formats::{GridSnapshot, encode};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use streaming::{ClientConfig, FetchError, GridClient, TransportError};

use common::{REFERENCE_PAYLOAD, serve};

#[derive(Deserialize)]
struct CellQuery {
    levels: Vec<u8>,
    ids: Vec<u32>,
}

async fn echo_cells(Json(query): Json<CellQuery>) -> Vec<u8> {
    encode(&GridSnapshot::new(query.levels, query.ids)).expect("encode")
}

async fn slow() -> Vec<u8> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    REFERENCE_PAYLOAD.to_vec()
}

fn app() -> Router {
    Router::new()
        .route("/grids", get(|| async { REFERENCE_PAYLOAD.to_vec() }))
        .route("/empty", get(|| async { vec![0x01u8, 0x00] }))
        .route("/ragged", get(|| async { vec![9u8, 0, 0, 0, 1] }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "no such grid") }))
        .route("/cells", post(echo_cells))
        .route("/short", post(|| async { vec![0x05u8, 0x00, 0x00] }))
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/slow", get(slow))
}

fn client(base: &str) -> GridClient {
    GridClient::new(ClientConfig::new(base)).expect("client")
}

#[tokio::test]
async fn get_decodes_reference_payload() {
    let base = serve(app()).await;
    let snap = client(&base)
        .fetch_via_get(&format!("{base}/grids"))
        .await
        .expect("fetch");
    assert_eq!(snap.levels, vec![1, 2, 3, 4, 5]);
    assert_eq!(snap.global_ids, vec![10, 11]);
}

#[tokio::test]
async fn get_short_body_is_empty_snapshot() {
    let base = serve(app()).await;
    let snap = client(&base)
        .fetch_via_get(&format!("{base}/empty"))
        .await
        .expect("short body tolerated");
    assert_eq!(snap, GridSnapshot::default());
}

#[tokio::test]
async fn get_error_status_is_transport_error() {
    let base = serve(app()).await;
    let err = client(&base)
        .fetch_via_get(&format!("{base}/missing"))
        .await
        .unwrap_err();
    match err {
        FetchError::Transport(e) => assert_eq!(e.status(), Some(StatusCode::NOT_FOUND)),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_malformed_body_is_surfaced() {
    let base = serve(app()).await;
    let err = client(&base)
        .fetch_via_get(&format!("{base}/ragged"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "{err:?}");
}

#[tokio::test]
async fn post_sends_json_and_decodes() {
    let base = serve(app()).await;
    let payload = serde_json::json!({ "levels": [3, 3, 4], "ids": [100, 101, 4_000_000_000u32] });
    let snap = client(&base)
        .fetch_via_post(&format!("{base}/cells"), &payload)
        .await
        .expect("post");
    assert_eq!(snap, GridSnapshot::new(vec![3, 3, 4], vec![100, 101, 4_000_000_000]));
}

#[tokio::test]
async fn post_short_body_is_empty_snapshot() {
    let base = serve(app()).await;
    let snap = client(&base)
        .fetch_via_post(&format!("{base}/short"), &serde_json::json!({ "levels": [] }))
        .await
        .expect("short body tolerated");
    assert_eq!(snap, GridSnapshot::default());
    assert!(snap.is_empty());
}

#[tokio::test]
async fn post_error_status_is_returned_to_caller() {
    let base = serve(app()).await;
    let err = client(&base)
        .fetch_via_post(&format!("{base}/broken"), &serde_json::json!({}))
        .await
        .unwrap_err();
    match err {
        FetchError::Transport(TransportError::Status { status, url }) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(url.ends_with("/broken"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let base = format!("http://{addr}");
    let err = client(&base)
        .fetch_via_post(&format!("{base}/cells"), &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::Transport(TransportError::Request { .. })),
        "{err:?}"
    );
}

#[tokio::test]
async fn configured_timeout_aborts_slow_requests() {
    let base = serve(app()).await;
    let config = ClientConfig {
        timeout: Some(Duration::from_millis(50)),
        ..ClientConfig::new(base.clone())
    };
    let err = GridClient::new(config)
        .expect("client")
        .fetch_via_get(&format!("{base}/slow"))
        .await
        .unwrap_err();
    match err {
        FetchError::Transport(TransportError::Request { source, .. }) => {
            assert!(source.is_timeout(), "{source:?}")
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}
