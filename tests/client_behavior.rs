//! Client behavior tests against a recording transport.
//!
//! These tests exercise policy resolution, caching, error context and
//! concurrency limits end to end, without touching the network.

mod helpers;

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use helpers::{configuration, ok_response, options, RecordingTransport};
use netgate::cache::{CertificateCache, CertificateSource};
use netgate::dispatch::{
    FIELD_REQUEST_METHOD, FIELD_REQUEST_REDIRECTS, FIELD_REQUEST_URL, FIELD_RESPONSE_CODE,
    FIELD_RETRY_COUNT, STATUS_FAILURE_SUMMARY, TRANSPORT_ERROR_NAME,
};
use netgate::transport::{Agent, FailureKind, ProxyEndpoint, Scheme};
use netgate::{HttpClient, HttpError, Method, RequestOptions, TransportFailure};

fn client(transport: &Arc<RecordingTransport>) -> HttpClient {
    HttpClient::with_transport(transport.clone())
}

#[tokio::test]
async fn test_disabled_network_fails_before_transport() {
    let transport = Arc::new(RecordingTransport::ok("unused"));
    let client = client(&transport);
    let opts = options(
        r#"{
            "networkSettings": {
                "*.example.com": { "httpProxy": "http://proxy:8080" },
                "api.example.com": { "enableNetwork": false }
            }
        }"#,
    );

    let err = client
        .get("https://api.example.com/x", &opts)
        .await
        .expect_err("network is disabled for api.example.com");

    assert!(
        matches!(err, HttpError::NetworkDisabled { ref target } if target == "https://api.example.com/x"),
        "unexpected error: {:?}",
        err
    );
    assert!(err.is_policy_violation());
    assert_eq!(transport.calls(), 0);
    assert!(!client.is_cached("https://api.example.com/x"));
}

#[tokio::test]
async fn test_disabled_network_applies_to_every_verb() {
    let transport = Arc::new(RecordingTransport::ok("unused"));
    let client = client(&transport);
    let opts = options(r#"{ "enableNetwork": false }"#);
    let target = "https://registry.example.com/pkg";

    assert!(client.get(target, &opts).await.is_err());
    assert!(client.put(target, "x", &opts).await.is_err());
    assert!(client.post(target, "x", &opts).await.is_err());
    assert!(client.del(target, &opts).await.is_err());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_sibling_host_uses_wildcard_proxy() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let client = client(&transport);
    let opts = options(
        r#"{
            "networkSettings": {
                "*.example.com": { "httpsProxy": "http://proxy:8080" },
                "api.example.com": { "enableNetwork": false }
            }
        }"#,
    );

    client
        .get("https://cdn.example.com/asset", &opts)
        .await
        .expect("cdn.example.com is allowed");
    assert_eq!(
        transport.last_request().agent,
        Agent::Tunnel(ProxyEndpoint {
            host: "proxy".to_string(),
            port: Some(8080),
        })
    );

    client
        .get("https://other.org/asset", &opts)
        .await
        .expect("other.org is allowed");
    assert_eq!(transport.last_request().agent, Agent::KeepAlive(Scheme::Https));
}

#[tokio::test]
async fn test_http_proxy_is_not_used_for_https_targets() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let client = client(&transport);
    let opts = options(r#"{ "httpProxy": "http://proxy:3128", "unsafeHttpWhitelist": ["*.internal"] }"#);

    client
        .get("https://registry.example.com/", &opts)
        .await
        .expect("https request");
    assert_eq!(transport.last_request().agent, Agent::KeepAlive(Scheme::Https));

    client
        .get("http://mirror.internal/", &opts)
        .await
        .expect("whitelisted http request");
    assert!(matches!(
        transport.last_request().agent,
        Agent::Tunnel(ProxyEndpoint { ref host, port: Some(3128) }) if host == "proxy"
    ));
}

#[tokio::test]
async fn test_unsafe_http_requires_whitelist() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let client = client(&transport);
    let opts = options("{}");

    let err = client
        .get("http://registry.example.com/pkg", &opts)
        .await
        .expect_err("plaintext http must be whitelisted");
    match err {
        HttpError::UnsafeProtocol { ref host, .. } => assert_eq!(host, "registry.example.com"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(transport.calls(), 0);

    client
        .get("https://registry.example.com/pkg", &opts)
        .await
        .expect("https is always allowed");
    client
        .get("http://localhost/pkg", &opts)
        .await
        .expect("localhost is whitelisted by default");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_unsupported_scheme_and_invalid_url() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let client = client(&transport);
    let opts = options("{}");

    let err = client
        .get("ftp://files.example.com/pkg.tgz", &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::UnsupportedScheme { ref scheme, .. } if scheme == "ftp"));

    let err = client.get("not a url", &opts).await.unwrap_err();
    assert!(matches!(err, HttpError::InvalidUrl { .. }));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_gets_share_one_transport_call() {
    let transport = Arc::new(
        RecordingTransport::ok(r#"{"name":"pkg"}"#).with_delay(Duration::from_millis(50)),
    );
    let client = client(&transport);
    let opts = options("{}");
    let target = "https://registry.example.com/pkg";

    let calls = (0..10).map(|_| client.get(target, &opts));
    let bodies = futures::future::join_all(calls).await;

    assert_eq!(transport.calls(), 1);
    for body in bodies {
        assert_eq!(body.expect("shared success"), Bytes::from_static(br#"{"name":"pkg"}"#));
    }
    assert!(client.is_cached(target));

    // Later callers reuse the stored body
    client.get(target, &opts).await.expect("cached body");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_cache_key_is_the_literal_target() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let client = client(&transport);
    let opts = options("{}");

    client.get("https://registry.example.com/pkg", &opts).await.unwrap();
    client.get("https://registry.example.com/pkg/", &opts).await.unwrap();
    client.get("https://registry.example.com/pkg", &opts).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_failed_get_is_not_cached() {
    let transport = Arc::new(RecordingTransport::new(|request, call| {
        if call == 0 {
            Err(TransportFailure::new(FailureKind::Connect, "connection refused")
                .with_request(request.method, request.url.as_str()))
        } else {
            Ok(ok_response(request, "recovered"))
        }
    }));
    let client = client(&transport);
    let opts = options(r#"{ "httpRetry": 0 }"#);
    let target = "https://registry.example.com/pkg";

    let err = client.get(target, &opts).await.expect_err("first call fails");
    assert!(matches!(err, HttpError::Transport(_)));
    assert!(!client.is_cached(target));

    let body = client.get(target, &opts).await.expect("second call succeeds");
    assert_eq!(body, Bytes::from_static(b"recovered"));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_get_json_decodes_cached_bytes_every_time() {
    let transport = Arc::new(RecordingTransport::ok(r#"{"versions":["1.0.0","1.1.0"]}"#));
    let client = client(&transport);
    let opts = options("{}");
    let target = "https://registry.example.com/pkg";

    let mut first: Value = client.get_json(target, &opts).await.expect("json body");
    first["versions"] = json!([]);

    let second: Value = client.get_json(target, &opts).await.expect("json body");
    assert_eq!(second, json!({"versions": ["1.0.0", "1.1.0"]}));

    let raw = client.get(target, &opts).await.expect("raw body");
    assert_eq!(raw, Bytes::from_static(br#"{"versions":["1.0.0","1.1.0"]}"#));

    assert_eq!(transport.calls(), 1);
    let request = transport.last_request();
    assert!(request
        .headers
        .iter()
        .any(|(name, value)| name == "accept" && value == "application/json"));
}

#[tokio::test]
async fn test_get_json_reports_decode_errors() {
    let transport = Arc::new(RecordingTransport::ok("<html>"));
    let client = client(&transport);

    let err = client
        .get_json::<Value>("https://registry.example.com/pkg", &options("{}"))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_)));
}

#[tokio::test]
async fn test_exhausted_retries_error_fields() {
    let transport = Arc::new(RecordingTransport::new(|request, _| {
        Err(
            TransportFailure::new(FailureKind::Status, "Response code 503 (Service Unavailable)")
                .with_request(request.method, request.url.as_str())
                .with_retry_count(request.retry_limit)
                .with_response(503, ""),
        )
    }));
    let client = client(&transport);
    let target = "https://registry.example.com/pkg";

    let err = client.get(target, &options("{}")).await.unwrap_err();
    let structured = err.as_structured().expect("transport error");

    assert_eq!(structured.name(), TRANSPORT_ERROR_NAME);
    assert_eq!(structured.summary(), STATUS_FAILURE_SUMMARY);
    assert!(!structured.include_stack());
    assert!(structured.stack().is_none());

    let labels: Vec<&str> = structured
        .fields()
        .iter()
        .map(|field| field.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            FIELD_REQUEST_METHOD,
            FIELD_REQUEST_URL,
            FIELD_RETRY_COUNT,
            FIELD_RESPONSE_CODE
        ]
    );
    assert!(structured.field(FIELD_REQUEST_REDIRECTS).is_none());
    assert!(structured
        .message()
        .contains("Request Retry Count: 3 (can be increased via httpRetry)"));
    assert!(structured.message().contains("Response Code: 503 (Service Unavailable)"));
}

#[tokio::test]
async fn test_server_error_message_and_custom_summary() {
    let transport = Arc::new(RecordingTransport::new(|request, _| {
        Err(TransportFailure::new(FailureKind::Status, "Response code 403 (Forbidden)")
            .with_request(request.method, request.url.as_str())
            .with_response(403, r#"{"error":"You must be logged in to publish packages"}"#))
    }));
    let client = client(&transport);
    let target = "https://registry.example.com/pkg";

    let err = client
        .put(target, Value::Null, &options(r#"{ "httpRetry": 5 }"#))
        .await
        .unwrap_err();
    let structured = err.as_structured().unwrap();
    assert_eq!(structured.summary(), "You must be logged in to publish packages");
    assert!(structured.field(FIELD_RETRY_COUNT).is_none());

    let opts = options("{}").custom_error_message(|failure, _| {
        failure
            .response
            .as_ref()
            .filter(|response| response.status == 403)
            .map(|_| "Authentication required".to_string())
    });
    let err = client.put(target, Value::Null, &opts).await.unwrap_err();
    assert_eq!(err.as_structured().unwrap().summary(), "Authentication required");
}

#[tokio::test]
async fn test_redirects_are_reported() {
    let transport = Arc::new(RecordingTransport::new(|request, _| {
        Err(TransportFailure::new(FailureKind::Status, "Response code 404 (Not Found)")
            .with_request(request.method, request.url.as_str())
            .with_redirects(vec![
                "https://mirror.example.com/pkg".to_string(),
                "https://cdn.example.com/pkg".to_string(),
            ])
            .with_response(404, ""))
    }));
    let client = client(&transport);

    let err = client
        .get("https://registry.example.com/pkg", &options(r#"{ "httpRetry": 1 }"#))
        .await
        .unwrap_err();
    let structured = err.as_structured().unwrap();
    let labels: Vec<&str> = structured
        .fields()
        .iter()
        .map(|field| field.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            FIELD_REQUEST_METHOD,
            FIELD_REQUEST_URL,
            FIELD_REQUEST_REDIRECTS,
            FIELD_RESPONSE_CODE
        ]
    );
    assert!(structured.message().contains(
        "Request Redirects: https://mirror.example.com/pkg, https://cdn.example.com/pkg"
    ));
}

#[tokio::test]
async fn test_socket_timeout_mentions_setting() {
    let transport = Arc::new(RecordingTransport::new(|request, _| {
        Err(TransportFailure::new(
            FailureKind::Timeout(netgate::transport::TimeoutPhase::Socket),
            "operation timed out",
        )
        .with_request(request.method, request.url.as_str()))
    }));
    let client = client(&transport);

    let err = client
        .del("https://registry.example.com/pkg", &options(r#"{ "httpRetry": 2 }"#))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_structured().unwrap().summary(),
        "operation timed out (can be increased via httpTimeout)"
    );
}

#[tokio::test]
async fn test_mutating_verbs_bypass_the_cache() {
    let transport = Arc::new(RecordingTransport::ok("done"));
    let client = client(&transport);
    let opts = options("{}");
    let target = "https://registry.example.com/pkg";

    client.put(target, "a", &opts).await.unwrap();
    client.put(target, "a", &opts).await.unwrap();
    client.post(target, "b", &opts).await.unwrap();
    client.del(target, &opts).await.unwrap();
    assert_eq!(transport.calls(), 4);
    assert!(!client.is_cached(target));

    let methods: Vec<Method> = transport.requests().iter().map(|r| r.method).collect();
    assert_eq!(
        methods,
        vec![Method::Put, Method::Put, Method::Post, Method::Delete]
    );
}

#[tokio::test]
async fn test_request_uses_method_from_options() {
    let transport = Arc::new(RecordingTransport::ok("done"));
    let client = client(&transport);
    let opts = options("{}").method(Method::Delete);

    let response = client
        .request("https://registry.example.com/pkg", "x", &opts)
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(transport.last_request().method, Method::Delete);
}

#[tokio::test]
async fn test_body_encoding() {
    let transport = Arc::new(RecordingTransport::ok("done"));
    let client = client(&transport);
    let target = "https://registry.example.com/pkg";

    client
        .post(target, json!({"name": "pkg"}), &options("{}"))
        .await
        .unwrap();
    let request = transport.last_request();
    assert_eq!(request.body, Some(Bytes::from_static(br#"{"name":"pkg"}"#)));
    assert!(request
        .headers
        .iter()
        .any(|(name, value)| name == "content-type" && value == "application/json"));

    client.put(target, "raw text", &options("{}")).await.unwrap();
    let request = transport.last_request();
    assert_eq!(request.body, Some(Bytes::from_static(b"raw text")));
    assert!(!request.headers.iter().any(|(name, _)| name == "content-type"));

    client
        .put(target, "raw text", &options("{}").json_request(true))
        .await
        .unwrap();
    assert_eq!(
        transport.last_request().body,
        Some(Bytes::from_static(br#""raw text""#))
    );

    client
        .put(
            target,
            json!({"a": 1}),
            &options("{}").header("Content-Type", "application/vnd.pkg+json"),
        )
        .await
        .unwrap();
    let request = transport.last_request();
    let content_types: Vec<&str> = request
        .headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(content_types, vec!["application/vnd.pkg+json"]);
}

#[tokio::test]
async fn test_request_carries_timeout_and_retry_limit() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let client = client(&transport);

    client
        .get(
            "https://registry.example.com/pkg",
            &options(r#"{ "httpTimeout": 1500, "httpRetry": 7 }"#),
        )
        .await
        .unwrap();
    let request = transport.last_request();
    assert_eq!(request.timeout, Duration::from_millis(1500));
    assert_eq!(request.retry_limit, 7);
    assert!(request.tls.strict);
    assert!(request.tls.ca.is_none());
}

#[tokio::test]
async fn test_concurrency_gate_bounds_transport_calls() {
    let transport = Arc::new(RecordingTransport::ok("ok").with_delay(Duration::from_millis(20)));
    let client = client(&transport);
    let opts = options(r#"{ "networkConcurrency": 2 }"#);

    let calls = (0..8).map(|i| {
        let client = client.clone();
        let opts = opts.clone();
        async move {
            client
                .post(&format!("https://registry.example.com/pkg/{}", i), "x", &opts)
                .await
        }
    });
    for result in futures::future::join_all(calls).await {
        result.expect("request succeeds");
    }

    assert_eq!(transport.calls(), 8);
    assert!(transport.peak_in_flight() <= 2);
    assert_eq!(transport.peak_in_flight(), 2);
}

struct CountingSource {
    reads: AtomicUsize,
}

#[async_trait]
impl CertificateSource for CountingSource {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match path.to_str() {
            Some("/etc/netgate/ca.pem") => Ok(b"-----BEGIN CERTIFICATE-----\nCA\n".to_vec()),
            Some("/etc/netgate/client.crt") => Ok(b"CERT".to_vec()),
            Some("/etc/netgate/client.key") => Ok(b"KEY\n".to_vec()),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }
}

#[tokio::test]
async fn test_certificates_are_read_once() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let source = Arc::new(CountingSource {
        reads: AtomicUsize::new(0),
    });
    let client = HttpClient::with_parts(transport.clone(), CertificateCache::new(source.clone()));
    let opts = options(
        r#"{
            "caFilePath": "/etc/netgate/ca.pem",
            "httpsCertFilePath": "/etc/netgate/client.crt",
            "httpsKeyFilePath": "/etc/netgate/client.key",
            "enableStrictSsl": false
        }"#,
    );

    for i in 0..3 {
        client
            .post(&format!("https://registry.example.com/{}", i), "x", &opts)
            .await
            .unwrap();
    }

    assert_eq!(source.reads.load(Ordering::SeqCst), 3);
    let request = transport.last_request();
    assert_eq!(
        request.tls.ca,
        Some(Bytes::from_static(b"-----BEGIN CERTIFICATE-----\nCA\n"))
    );
    assert_eq!(request.tls.identity, Some(Bytes::from_static(b"CERT\nKEY\n")));
    assert!(!request.tls.strict);
}

#[tokio::test]
async fn test_certificate_errors() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let source = Arc::new(CountingSource {
        reads: AtomicUsize::new(0),
    });
    let client = HttpClient::with_parts(transport.clone(), CertificateCache::new(source));

    let err = client
        .get(
            "https://registry.example.com/",
            &options(r#"{ "caFilePath": "/missing/ca.pem" }"#),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Certificate { .. }));

    let err = client
        .get(
            "https://registry.example.com/",
            &options(r#"{ "httpsCertFilePath": "/etc/netgate/client.crt" }"#),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::IncompleteClientIdentity));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_invalid_proxy_is_rejected() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let client = client(&transport);

    let err = client
        .get(
            "https://registry.example.com/",
            &options(r#"{ "httpsProxy": "not a proxy" }"#),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::InvalidProxy { .. }));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_clients_do_not_share_caches() {
    let transport = Arc::new(RecordingTransport::ok("ok"));
    let opts = RequestOptions::new(configuration("{}"));
    let target = "https://registry.example.com/pkg";

    client(&transport).get(target, &opts).await.unwrap();
    client(&transport).get(target, &opts).await.unwrap();
    assert_eq!(transport.calls(), 2);
}
