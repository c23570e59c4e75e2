use crate::helpers::{client_for, closed_port_url, fast_policy, sample_report, TEST_DELAY};
use crate::test_server::{ScriptedResponse, TestServer, HEALTH_BODY};
use hyper::Method;
use serde_json::json;
use site_audit::{AuditError, RetryPolicy};
use std::time::Instant;

#[tokio::test]
async fn test_first_attempt_success() {
    let server = TestServer::with_script(vec![ScriptedResponse::ok(&sample_report())])
        .await
        .unwrap();
    let client = client_for(&server.url(), fast_policy());

    let report = client.submit_audit("https://example.com").await.unwrap();

    assert_eq!(report.raw(), &sample_report());
    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/audit");
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(requests[0].json(), json!({"url": "https://example.com"}));
}

#[tokio::test]
async fn test_any_2xx_is_success() {
    let server = TestServer::with_script(vec![ScriptedResponse::new(201, r#"{"scores":{}}"#)])
        .await
        .unwrap();
    let client = client_for(&server.url(), fast_policy());

    let report = client.submit_audit("https://example.com").await.unwrap();
    assert_eq!(report.raw(), &json!({"scores": {}}));
    assert_eq!(server.audit_calls().await, 1);
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    for n in 1..=5usize {
        let mut script = vec![ScriptedResponse::new(503, "waking up"); n - 1];
        script.push(ScriptedResponse::ok(&sample_report()));
        let server = TestServer::with_script(script).await.unwrap();
        let client = client_for(&server.url(), fast_policy());

        let started = Instant::now();
        let report = client.submit_audit("https://example.com").await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.raw(), &sample_report());
        assert_eq!(server.audit_calls().await, n);
        assert!(elapsed >= TEST_DELAY * (n as u32 - 1));

        let requests = server.requests().await;
        for pair in requests.windows(2) {
            assert!(pair[1].received_at.duration_since(pair[0].received_at) >= TEST_DELAY);
        }
    }
}

#[tokio::test]
async fn test_each_transient_status_is_retried() {
    for status in [429, 502, 503, 504] {
        let server = TestServer::with_script(vec![
            ScriptedResponse::new(status, "busy"),
            ScriptedResponse::ok(&sample_report()),
        ])
        .await
        .unwrap();
        let client = client_for(&server.url(), fast_policy());

        assert!(client.submit_audit("https://example.com").await.is_ok());
        assert_eq!(server.audit_calls().await, 2);
    }
}

#[tokio::test]
async fn test_exhausted_transient_failures() {
    let server = TestServer::new().await.unwrap();
    server
        .set_fallback(ScriptedResponse::new(503, "Service Unavailable"))
        .await;
    let client = client_for(&server.url(), fast_policy());

    let err = client.submit_audit("https://example.com").await.unwrap_err();

    // Transient answers only use up attempts, so nothing specific is left to report
    assert_eq!(server.audit_calls().await, 6);
    assert!(matches!(err, AuditError::Network), "unexpected error: {err}");
    assert_eq!(err.to_string(), "Network error");
}

#[tokio::test]
async fn test_last_non_transient_error_survives_transient_retries() {
    let mut script = vec![ScriptedResponse::new(404, "not found here")];
    script.extend(vec![ScriptedResponse::new(503, "waking"); 5]);
    let server = TestServer::with_script(script).await.unwrap();
    let client = client_for(&server.url(), fast_policy());

    let err = client.submit_audit("https://example.com").await.unwrap_err();

    assert_eq!(server.audit_calls().await, 6);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert_eq!(err.to_string(), "HTTP 404: not found here");
}

#[tokio::test]
async fn test_network_error_on_every_attempt() {
    let client = client_for(&closed_port_url(), fast_policy());

    let started = Instant::now();
    let err = client.submit_audit("https://example.com").await.unwrap_err();

    // Five delays between six attempts
    assert!(started.elapsed() >= TEST_DELAY * 5);
    match err {
        AuditError::Transport(e) => assert!(e.is_connect()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_client_error_is_retried_with_truncated_body() {
    let server = TestServer::new().await.unwrap();
    server
        .set_fallback(ScriptedResponse::new(404, "x".repeat(500)))
        .await;
    let client = client_for(&server.url(), fast_policy());

    let err = client.submit_audit("https://example.com").await.unwrap_err();

    assert_eq!(server.audit_calls().await, 6);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert_eq!(err.to_string(), format!("HTTP 404: {}", "x".repeat(200)));
}

#[tokio::test]
async fn test_fail_fast_on_client_error() {
    let server = TestServer::with_script(vec![ScriptedResponse::new(
        422,
        r#"{"detail":"invalid url"}"#,
    )])
    .await
    .unwrap();
    let policy = RetryPolicy {
        fail_fast_on_client_error: true,
        ..fast_policy()
    };
    let client = client_for(&server.url(), policy);

    let err = client.submit_audit("not a url").await.unwrap_err();

    assert_eq!(server.audit_calls().await, 1);
    assert_eq!(err.to_string(), r#"HTTP 422: {"detail":"invalid url"}"#);
}

#[tokio::test]
async fn test_fail_fast_still_retries_transient() {
    let server = TestServer::with_script(vec![
        ScriptedResponse::new(502, "bad gateway"),
        ScriptedResponse::ok(&sample_report()),
    ])
    .await
    .unwrap();
    let policy = RetryPolicy {
        fail_fast_on_client_error: true,
        ..fast_policy()
    };
    let client = client_for(&server.url(), policy);

    assert!(client.submit_audit("https://example.com").await.is_ok());
    assert_eq!(server.audit_calls().await, 2);
}

#[tokio::test]
async fn test_invalid_json_is_retried() {
    let server = TestServer::with_script(vec![
        ScriptedResponse::new(200, "<html>warming up</html>"),
        ScriptedResponse::ok(&sample_report()),
    ])
    .await
    .unwrap();
    let client = client_for(&server.url(), fast_policy());

    let report = client.submit_audit("https://example.com").await.unwrap();
    assert_eq!(report.raw(), &sample_report());
    assert_eq!(server.audit_calls().await, 2);
}

#[tokio::test]
async fn test_attempt_budget_is_configurable() {
    let server = TestServer::new().await.unwrap();
    let policy = RetryPolicy {
        max_attempts: 2,
        ..fast_policy()
    };
    let client = client_for(&server.url(), policy);

    assert!(client.submit_audit("https://example.com").await.is_err());
    assert_eq!(server.audit_calls().await, 2);
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::new().await.unwrap();
    let client = client_for(&server.url(), fast_policy());

    let info = client.health().await.unwrap();
    let expected: serde_json::Value = serde_json::from_str(HEALTH_BODY).unwrap();
    assert!(info.ok);
    assert_eq!(info.service.as_deref(), expected["service"].as_str());
    assert_eq!(info.docs.as_deref(), Some("/docs"));
    assert_eq!(server.audit_calls().await, 0);
}
