//! Integration tests for the requester backends.
//!
//! Every scenario runs against both backends through the `Requester` trait
//! object, using a mock HTTP server in place of the real host.

use std::time::Duration;

use idprobe_core::requester::{
    Backend, Endpoints, RequestError, Requester, RequesterConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BACKENDS: [Backend; 2] = [Backend::Pooled, Backend::Standard];

fn requester_for(backend: Backend, endpoints: Endpoints) -> Box<dyn Requester> {
    RequesterConfig::new(backend, 2, Duration::from_secs(5))
        .with_endpoints(endpoints)
        .build()
        .expect("requester should build")
}

fn requesters(server: &MockServer) -> Vec<Box<dyn Requester>> {
    let endpoints = Endpoints::new(server.uri(), server.uri());
    BACKENDS
        .into_iter()
        .map(|backend| requester_for(backend, endpoints.clone()))
        .collect()
}

/// Endpoints pointing at a port nothing listens on.
fn unreachable_endpoints() -> Endpoints {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let base = format!("http://{addr}");
    Endpoints::new(base.clone(), base)
}

async fn mount(server: &MockServer, verb: &str, route: &str, template: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

// ==================== exists ====================

#[tokio::test]
async fn test_exists_200_returns_true() {
    let server = MockServer::start().await;
    mount(&server, "HEAD", "/abcde", ResponseTemplate::new(200)).await;

    for requester in requesters(&server) {
        let exists = requester.exists("abcde").await;
        assert!(
            matches!(exists, Ok(true)),
            "{} backend: {exists:?}",
            requester.backend()
        );
    }
}

#[tokio::test]
async fn test_exists_404_returns_false() {
    let server = MockServer::start().await;
    mount(&server, "HEAD", "/zzzzz", ResponseTemplate::new(404)).await;

    for requester in requesters(&server) {
        let exists = requester.exists("zzzzz").await;
        assert!(
            matches!(exists, Ok(false)),
            "{} backend: {exists:?}",
            requester.backend()
        );
    }
}

#[tokio::test]
async fn test_exists_503_returns_status_error() {
    let server = MockServer::start().await;
    mount(&server, "HEAD", "/qqqqq", ResponseTemplate::new(503)).await;

    for requester in requesters(&server) {
        let err = requester
            .exists("qqqqq")
            .await
            .expect_err("503 must be an error");
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("503"), "message: {err}");
    }
}

#[tokio::test]
async fn test_exists_other_statuses_are_errors() {
    let server = MockServer::start().await;
    mount(&server, "HEAD", "/moved", ResponseTemplate::new(204)).await;
    mount(&server, "HEAD", "/limit", ResponseTemplate::new(429)).await;

    for requester in requesters(&server) {
        assert!(requester.exists("moved").await.is_err());
        assert!(requester.exists("limit").await.is_err());
    }
}

#[tokio::test]
async fn test_exists_uses_head_method() {
    let server = MockServer::start().await;
    mount(&server, "HEAD", "/abcde", ResponseTemplate::new(200)).await;

    for requester in requesters(&server) {
        requester.exists("abcde").await.expect("probe ok");
    }

    let received = server.received_requests().await.expect("recording on");
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|r| r.method.as_str() == "HEAD"));
}

#[tokio::test]
async fn test_exists_connection_refused_is_network_error() {
    let endpoints = unreachable_endpoints();
    for backend in BACKENDS {
        let requester = requester_for(backend, endpoints.clone());
        let err = requester
            .exists("abcde")
            .await
            .expect_err("nothing is listening");
        assert!(
            matches!(err, RequestError::Network { .. }),
            "{backend} backend: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_pooled_exists_times_out() {
    let server = MockServer::start().await;
    mount(
        &server,
        "HEAD",
        "/slow1",
        ResponseTemplate::new(200).set_delay(Duration::from_secs(3)),
    )
    .await;

    let requester = RequesterConfig::new(Backend::Pooled, 1, Duration::from_millis(200))
        .with_endpoints(Endpoints::new(server.uri(), server.uri()))
        .build()
        .expect("requester should build");

    let err = requester.exists("slow1").await.expect_err("should time out");
    assert!(matches!(err, RequestError::Timeout { .. }), "{err:?}");
}

// ==================== stream_to ====================

#[tokio::test]
async fn test_stream_to_200_writes_exact_body() {
    let server = MockServer::start().await;
    mount(
        &server,
        "GET",
        "/abcde.jpg",
        ResponseTemplate::new(200).set_body_bytes(vec![0x01, 0x02, 0x03]),
    )
    .await;

    for requester in requesters(&server) {
        let mut sink = Vec::new();
        let written = requester
            .stream_to("abcde", &mut sink)
            .await
            .expect("fetch should succeed");
        assert_eq!(written, 3);
        assert_eq!(sink, vec![0x01, 0x02, 0x03]);
    }
}

#[tokio::test]
async fn test_stream_to_large_body_streams_completely() {
    let server = MockServer::start().await;
    let body: Vec<u8> = (0..2 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    mount(
        &server,
        "GET",
        "/large77.jpg",
        ResponseTemplate::new(200).set_body_bytes(body.clone()),
    )
    .await;

    for requester in requesters(&server) {
        let mut sink = Vec::new();
        let written = requester
            .stream_to("large77", &mut sink)
            .await
            .expect("fetch should succeed");
        assert_eq!(written, body.len() as u64);
        assert_eq!(sink, body);
    }
}

#[tokio::test]
async fn test_stream_to_404_writes_nothing() {
    let server = MockServer::start().await;
    mount(
        &server,
        "GET",
        "/gone1.jpg",
        ResponseTemplate::new(404).set_body_bytes(b"not found page".to_vec()),
    )
    .await;

    for requester in requesters(&server) {
        let mut sink = Vec::new();
        let err = requester
            .stream_to("gone1", &mut sink)
            .await
            .expect_err("404 must be an error");
        assert_eq!(err.status(), Some(404));
        assert!(sink.is_empty(), "sink must stay empty, got {sink:?}");
    }
}

#[tokio::test]
async fn test_stream_to_500_writes_nothing() {
    let server = MockServer::start().await;
    mount(
        &server,
        "GET",
        "/boom1.jpg",
        ResponseTemplate::new(500).set_body_bytes(b"oops".to_vec()),
    )
    .await;

    for requester in requesters(&server) {
        let mut sink = Vec::new();
        let err = requester.stream_to("boom1", &mut sink).await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(sink.is_empty());
    }
}

#[tokio::test]
async fn test_stream_to_connection_refused_writes_nothing() {
    let endpoints = unreachable_endpoints();
    for backend in BACKENDS {
        let requester = requester_for(backend, endpoints.clone());
        let mut sink = Vec::new();
        let err = requester.stream_to("abcde", &mut sink).await.unwrap_err();
        assert!(matches!(err, RequestError::Network { .. }), "{err:?}");
        assert!(sink.is_empty());
    }
}

#[tokio::test]
async fn test_stream_to_into_file_sink() {
    let server = MockServer::start().await;
    mount(
        &server,
        "GET",
        "/filed.jpg",
        ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()),
    )
    .await;
    let temp_dir = tempfile::TempDir::new().expect("failed to create temp dir");

    for requester in requesters(&server) {
        let path = temp_dir.path().join(format!("{}.jpg", requester.backend()));
        let mut file = tokio::fs::File::create(&path).await.expect("create file");
        requester
            .stream_to("filed", &mut file)
            .await
            .expect("fetch should succeed");
        drop(file);
        assert_eq!(std::fs::read(&path).expect("read file"), b"jpeg bytes");
    }
}
