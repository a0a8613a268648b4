use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use thor_client::{FetchError, Fetcher, HttpFetcher};

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/", get(|| async { "hello from the mock" }))
        .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route("/slow", get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "late"
        }));
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap(); });
    format!("http://{}:{}", addr.ip(), addr.port())
}

#[tokio::test]
async fn get_returns_status_and_body() {
    let base = spawn_server().await;
    let fetcher = HttpFetcher::new(None).unwrap();

    let r = fetcher.get(&format!("{}/", base)).await.unwrap();
    assert_eq!(r.status, 200);
    assert!(r.is_ok());
    assert_eq!(r.body, "hello from the mock");

    let r = fetcher.get(&format!("{}/broken", base)).await.unwrap();
    assert_eq!(r.status, 500);
    assert!(!r.is_ok());
    assert_eq!(r.body, "boom");
}

#[tokio::test]
async fn timeout_is_reported_as_timeout() {
    let base = spawn_server().await;
    let fetcher = HttpFetcher::new(Some(Duration::from_millis(100))).unwrap();
    let err = fetcher.get(&format!("{}/slow", base)).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn refused_connection_is_an_error() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new(Some(Duration::from_secs(5))).unwrap();
    let err = fetcher.get(&format!("http://{}/", addr)).await;
    assert!(err.is_err());
}
