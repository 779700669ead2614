use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

use casetrack::api::envelope::panic_response;
use casetrack::entity::{Case, CaseFields};
use casetrack::{CaseServer, CaseStore, ServerConfig};

const CASES: &str = "/api/v1/cases";

fn app() -> Router {
    CaseServer::new(ServerConfig::default()).router()
}

fn strict_app() -> Router {
    let config = ServerConfig {
        strict_not_found: true,
        ..Default::default()
    };
    CaseServer::new(config).router()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn ids(body: &Value) -> Vec<u64> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_list_seed_cases() {
    let app = app();
    let (status, body) = send(&app, Method::GET, CASES, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(ids(&body), vec![1, 2, 3]);
    assert_eq!(body["data"][1]["status"], "In Progress");
    assert_eq!(body["data"][0]["caseNumber"], "TI-2025-1001");
}

#[tokio::test]
async fn test_list_with_trailing_slash() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/cases/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_create_case() {
    let app = app();
    let (status, body) = send(&app, Method::POST, CASES, Some(json!({"title": "X"}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"success": true, "data": {"id": 4, "title": "X"}}));

    let (_, list) = send(&app, Method::GET, CASES, None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_create_echoes_all_fields_and_ignores_id() {
    let app = app();
    let submitted = json!({
        "status": "Open",
        "priority": "High",
        "owner": "Alice",
        "description": "Printer on fire",
        "title": "Printer",
        "date": "2025-11-01",
        "customer": "Acme",
        "caseNumber": "AC-2025-0001"
    });
    let mut with_id = submitted.clone();
    with_id["id"] = json!(100);

    let (status, body) = send(&app, Method::POST, CASES, Some(with_id)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 4);

    let (_, fetched) = send(&app, Method::GET, &format!("{CASES}/4"), None).await;
    let mut expected = submitted;
    expected["id"] = json!(4);
    assert_eq!(fetched["data"], expected);
}

#[tokio::test]
async fn test_get_case() {
    let app = app();
    let (status, body) = send(&app, Method::GET, &format!("{CASES}/2"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 2);
    assert_eq!(body["data"]["owner"], "Thor");
}

#[tokio::test]
async fn test_get_missing_or_malformed_returns_null_data() {
    let app = app();

    for uri in [format!("{CASES}/99"), format!("{CASES}/abc")] {
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": null}));
    }
}

#[tokio::test]
async fn test_update_merges_fields() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{CASES}/2"),
        Some(json!({"owner": "Alice", "id": 42})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 2);
    assert_eq!(body["data"]["owner"], "Alice");
    assert_eq!(body["data"]["status"], "In Progress");
    assert_eq!(body["data"]["title"], "Q4 Feedback Review");
}

#[tokio::test]
async fn test_update_missing_returns_null_data() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{CASES}/99"),
        Some(json!({"status": "Closed"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);

    let (_, list) = send(&app, Method::GET, CASES, None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_case() {
    let app = app();
    let (status, body) = send(&app, Method::DELETE, &format!("{CASES}/1"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Case deleted"}));

    let (_, fetched) = send(&app, Method::GET, &format!("{CASES}/1"), None).await;
    assert_eq!(fetched["data"], Value::Null);
}

#[tokio::test]
async fn test_delete_missing_still_reports_deleted() {
    let app = app();
    let (status, body) = send(&app, Method::DELETE, &format!("{CASES}/99"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Case deleted");

    let (_, list) = send(&app, Method::GET, CASES, None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let app = app();
    send(&app, Method::DELETE, &format!("{CASES}/3"), None).await;

    let (_, body) = send(&app, Method::POST, CASES, Some(json!({"title": "next"}))).await;
    assert_eq!(body["data"]["id"], 4);
}

#[tokio::test]
async fn test_create_keeps_non_string_values() {
    let app = app();

    let (status, body) = send(&app, Method::POST, CASES, Some(json!({"title": "X", "priority": 2}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], "X");
    assert_eq!(body["data"]["priority"], "2");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{CASES}/4"),
        Some(json!({"owner": false, "title": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner"], "false");
    assert_eq!(body["data"]["title"], "X");
}

#[tokio::test]
async fn test_create_without_content_type() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri(CASES)
        .body(Body::from(r#"{"title":"X"}"#))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"], json!({"id": 4, "title": "X"}));
}

#[tokio::test]
async fn test_create_with_empty_body_stores_blank_case() {
    let app = app();

    let (status, body) = send(&app, Method::POST, CASES, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"], json!({"id": 4}));
}

#[tokio::test]
async fn test_create_after_last_id_is_server_error() {
    let store = CaseStore::with_cases(vec![Case::new(u64::MAX, CaseFields::default())]);
    let app = CaseServer::with_store(ServerConfig::default(), store).router();

    let (status, body) = send(&app, Method::POST, CASES, Some(json!({"title": "X"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Something went wrong"}));

    let (_, list) = send(&app, Method::GET, CASES, None).await;
    assert_eq!(list["data"], json!([{"id": u64::MAX}]));
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri(CASES)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"success": false, "error": "Invalid request body"}));

    let (_, list) = send(&app, Method::GET, CASES, None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_strict_mode_not_found_and_invalid_id() {
    let app = strict_app();

    let (status, body) = send(&app, Method::GET, &format!("{CASES}/99"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Case not found"}));

    let (status, body) = send(&app, Method::GET, &format!("{CASES}/abc"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid case id");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("{CASES}/99"),
        Some(json!({"status": "Closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("{CASES}/99"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &format!("{CASES}/1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);
}

#[tokio::test]
async fn test_list_filters() {
    let app = app();

    let (_, body) = send(&app, Method::GET, &format!("{CASES}?status=open"), None).await;
    assert_eq!(ids(&body), vec![1]);

    let (_, body) = send(&app, Method::GET, &format!("{CASES}?caseNumber=GL"), None).await;
    assert_eq!(ids(&body), vec![2]);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("{CASES}?customer=Local%20Business"),
        None,
    )
    .await;
    assert_eq!(ids(&body), vec![3]);

    let (_, body) = send(&app, Method::GET, &format!("{CASES}?q=status:closed"), None).await;
    assert_eq!(ids(&body), vec![3]);

    let (_, body) = send(&app, Method::GET, &format!("{CASES}?owner=Nobody"), None).await;
    assert_eq!(ids(&body), Vec::<u64>::new());
}

#[tokio::test]
async fn test_list_sorting() {
    let app = app();

    let (_, body) = send(&app, Method::GET, &format!("{CASES}?sort=date"), None).await;
    assert_eq!(ids(&body), vec![3, 1, 2]);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("{CASES}?sort=priority&order=asc"),
        None,
    )
    .await;
    assert_eq!(ids(&body), vec![3, 2, 1]);

    let (status, body) = send(&app, Method::GET, &format!("{CASES}?sort=size"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_stats() {
    let app = app();
    send(&app, Method::POST, CASES, Some(json!({"status": "Open"}))).await;

    let (status, body) = send(&app, Method::GET, &format!("{CASES}/stats"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["active"], 3);
    assert_eq!(body["data"]["byStatus"]["Open"], 2);
    assert_eq!(body["data"]["byPriority"]["Unset"], 1);
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v2/things", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Route not found"}));
}

#[tokio::test]
async fn test_custom_base_path() {
    let config = ServerConfig {
        base_path: "/v2".to_string(),
        ..Default::default()
    };
    let app = CaseServer::new(config).router();

    let (status, _) = send(&app, Method::GET, "/v2/cases", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, CASES, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let app = app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(CASES)
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn test_panic_becomes_generic_error() {
    async fn boom() -> &'static str {
        panic!("boom")
    }

    let app = Router::new()
        .route("/boom", get(boom))
        .layer(CatchPanicLayer::custom(panic_response));

    let (status, body) = send(&app, Method::GET, "/boom", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Something went wrong"}));
}

#[tokio::test]
async fn test_serve_over_tcp_and_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();

    let server = CaseServer::new(ServerConfig::default());
    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/v1/cases/1 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("\"caseNumber\":\"TI-2025-1001\""));

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}
