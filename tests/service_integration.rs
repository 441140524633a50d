//! Integration tests for component retrieval over real HTTP
//!
//! Each test starts a throwaway TCP listener that answers a single request
//! with a canned response, then drives `ComponentService` with an
//! `HttpFetcher` pointed at it.

use std::time::Duration;

use dynamic_template::{
    assert_json_eq, ComponentService, DataFetcher, DynamicSetting, Error, FetchConfig, HttpFetcher,
    HttpMethod, InMemoryTemplateStore, TemplateRecord,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serve one request; the handle yields the raw request text
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}/data", addr), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn gallery_template() -> Value {
    json!({
        "card": {
            "log_id": "gallery",
            "variables": [
                {
                    "name": "products",
                    "type": "array",
                    "value": [{"label": "{{name}}", "price": "{{price}}"}]
                },
                {"name": "heading", "type": "string", "value": "{{response.title}}"}
            ]
        }
    })
}

fn service_for(setting: DynamicSetting) -> ComponentService<InMemoryTemplateStore, HttpFetcher> {
    let store = InMemoryTemplateStore::new();
    store
        .insert(
            TemplateRecord::new("gallery", "Gallery", gallery_template())
                .with_dynamic_setting(setting),
        )
        .unwrap();
    let config = FetchConfig::default().with_timeout(Duration::from_secs(5));
    let fetcher = HttpFetcher::with_config(config).unwrap();
    ComponentService::new(store, fetcher)
}

#[tokio::test]
async fn test_successful_fetch_is_merged() {
    init_tracing();
    let (url, server) = serve_once(
        "200 OK",
        r#"{"title": "Deals", "products": [
            {"name": "Lamp", "price": 10},
            {"name": "Desk", "price": 99.5}
        ]}"#,
    )
    .await;
    let setting = DynamicSetting::new(url, HttpMethod::Get).with_header("X-Api-Key", "secret");
    let service = service_for(setting);

    let response = service.get_component("gallery").await.unwrap();
    assert!(response.success);
    assert_json_eq!(
        response.data,
        json!({
            "card": {
                "log_id": "gallery",
                "variables": [
                    {"name": "products", "type": "array", "value": [
                        {"label": "Lamp", "price": 10},
                        {"label": "Desk", "price": 99.5}
                    ]},
                    {"name": "heading", "type": "string", "value": "Deals"}
                ]
            }
        })
    );

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /data "));
    assert!(request.contains("x-api-key: secret"));
    assert!(request.contains("content-type: application/json"));
}

#[tokio::test]
async fn test_service_unavailable_serves_static_template() {
    init_tracing();
    let (url, server) = serve_once("503 Service Unavailable", r#"{"error": "down"}"#).await;
    let service = service_for(DynamicSetting::new(url, HttpMethod::Get));

    let response = service.get_component("gallery").await.unwrap();
    assert!(response.success);
    assert_json_eq!(response.data, gallery_template());
    server.await.unwrap();
}

#[tokio::test]
async fn test_non_json_body_serves_static_template() {
    init_tracing();
    let (url, server) = serve_once("200 OK", "<html>not json</html>").await;
    let service = service_for(DynamicSetting::new(url, HttpMethod::Get));

    let response = service.get_component("gallery").await.unwrap();
    assert!(response.success);
    assert_json_eq!(response.data, gallery_template());
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_endpoint_serves_static_template() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/data", listener.local_addr().unwrap());
    drop(listener);
    let service = service_for(DynamicSetting::new(url, HttpMethod::Get));

    let response = service.get_component("gallery").await.unwrap();
    assert!(response.success);
    assert_json_eq!(response.data, gallery_template());
}

#[tokio::test]
async fn test_unknown_template_is_not_found() {
    let service = service_for(DynamicSetting::new("http://127.0.0.1:9/data", HttpMethod::Get));
    let err = service.get_component("unknown").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_post_sends_request_json() {
    let (url, server) = serve_once("200 OK", r#"{"ok": true}"#).await;
    let fetcher = HttpFetcher::new().unwrap();
    let setting = DynamicSetting::new(url, HttpMethod::Post).with_request_json(json!({"page": 2}));

    let data = fetcher.fetch(&setting).await.unwrap();
    assert_eq!(data, json!({"ok": true}));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /data "));
    let body = request.split("\r\n\r\n").nth(1).unwrap();
    assert_eq!(serde_json::from_str::<Value>(body).unwrap(), json!({"page": 2}));
}

#[tokio::test]
async fn test_post_without_request_json_sends_empty_object() {
    let (url, server) = serve_once("200 OK", "{}").await;
    let fetcher = HttpFetcher::new().unwrap();

    fetcher
        .fetch(&DynamicSetting::new(url, HttpMethod::Put))
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /data "));
    assert!(request.ends_with("\r\n\r\n{}"));
}

#[tokio::test]
async fn test_fetch_reports_status() {
    let (url, server) = serve_once("404 Not Found", "{}").await;
    let fetcher = HttpFetcher::new().unwrap();

    let err = fetcher
        .fetch(&DynamicSetting::new(url, HttpMethod::Get))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpError(_)));
    assert!(err.to_string().contains("404"));
    server.await.unwrap();
}
