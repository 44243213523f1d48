//! End-to-end dispatch over `ReqwestTransport` against a local mock server.

use http_useragent::client::{netloc, ContentSink, UserAgent};
use http_useragent::Request;
use mockito::Matcher;
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;

#[tokio::test]
async fn test_get_with_default_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/hello")
        .match_header("user-agent", Matcher::Regex("^http_useragent/".into()))
        .with_status(200)
        .with_header("content-type", "text/plain; charset=utf-8")
        .with_body("hello world")
        .create_async()
        .await;

    let agent = UserAgent::new();
    let resp = agent
        .get(&format!("{}/hello", server.url()))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_str(), Some("hello world"));
    assert_eq!(resp.headers.content_type().as_deref(), Some("text/plain"));
    assert_eq!(resp.headers.content_type_charset().as_deref(), Some("UTF-8"));
    assert!(resp.headers.client_date().is_some());
}

#[tokio::test]
async fn test_follows_redirect() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/start")
        .with_status(302)
        .with_header("location", "/final")
        .create_async()
        .await;
    let second = server
        .mock("GET", "/final")
        .with_status(200)
        .with_body("done")
        .create_async()
        .await;

    let agent = UserAgent::new();
    let resp = agent
        .get(&format!("{}/start", server.url()))
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.redirects(), 1);
    assert_eq!(resp.previous.as_ref().unwrap().status, 302);
    assert_eq!(resp.content_str(), Some("done"));
}

#[tokio::test]
async fn test_basic_authentication() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("GET", "/private")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("www-authenticate", r#"Basic realm="test""#)
        .create_async()
        .await;
    let granted = server
        .mock("GET", "/private")
        .match_header("authorization", "Basic YWxpY2U6c2VjcmV0")
        .with_status(200)
        .with_body("welcome")
        .create_async()
        .await;

    let base = Url::parse(&server.url()).unwrap();
    let mut agent = UserAgent::new();
    agent
        .set_credentials(&netloc(&base).unwrap(), "test", "alice", "secret")
        .unwrap();

    let resp = agent
        .get(&format!("{}/private", server.url()))
        .await
        .unwrap();

    challenge.assert_async().await;
    granted.assert_async().await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.previous.as_ref().unwrap().status, 401);
}

#[tokio::test]
async fn test_post_body_is_sent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/submit")
        .match_body("a=1&b=2")
        .with_status(201)
        .create_async()
        .await;

    let agent = UserAgent::new();
    let req = Request::post(format!("{}/submit", server.url()), "a=1&b=2")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .unwrap();
    let resp = agent.request(req).await.unwrap();

    mock.assert_async().await;
    assert_eq!(resp.status, 201);
}

#[tokio::test]
async fn test_callback_sink() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/stream")
        .with_status(200)
        .with_body("chunked payload")
        .create_async()
        .await;

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let received = received.clone();
        ContentSink::Callback(Arc::new(move |chunk: &[u8]| {
            received.lock().extend_from_slice(chunk);
        }))
    };

    let agent = UserAgent::new();
    let resp = agent
        .request_to(Request::get(format!("{}/stream", server.url())), &sink)
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    assert!(resp.content.is_empty());
    assert_eq!(&received.lock()[..], b"chunked payload");
}

#[tokio::test]
async fn test_file_sink() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/file")
        .with_status(200)
        .with_body("saved to disk")
        .create_async()
        .await;

    let path = std::env::temp_dir().join(format!("http_useragent_sink_{}.txt", std::process::id()));
    let agent = UserAgent::new();
    let resp = agent
        .request_to(
            Request::get(format!("{}/file", server.url())),
            &ContentSink::File(path.clone()),
        )
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    let written = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(written, "saved to disk");
    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_connection_failure_is_wrapped() {
    let agent = UserAgent::new();
    let resp = agent.get("http://127.0.0.1:1/").await.unwrap();

    assert_eq!(resp.status, 500);
    assert_eq!(resp.warnings(), vec!["Internal response"]);
    assert_eq!(resp.headers.content_type().as_deref(), Some("text/plain"));
}
