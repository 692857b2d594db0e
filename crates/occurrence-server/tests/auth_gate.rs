//! Integration tests for AuthGate against a mocked realm certificate endpoint.

mod common;

use common::{bearer, claims_with_roles, realm_certs, sign_with_kid};
use occurrence_server::auth::{AuthConfig, AuthGate, KeyCachePolicy, RejectReason, RequiredRoles};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CERTS_PATH: &str = "/auth/realms/lines/protocol/openid-connect/certs";

fn config(server: &MockServer, key_cache: KeyCachePolicy) -> AuthConfig {
    AuthConfig {
        server_url: Some(Url::parse(&format!("{}/auth", server.uri())).unwrap()),
        realm: Some("lines".into()),
        client_id: Some("occurrence-backend".into()),
        key_cache,
        ..Default::default()
    }
}

fn user_role() -> RequiredRoles {
    RequiredRoles::new(["user_role"])
}

async fn mount_certs(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(CERTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(realm_certs()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_verified_with_published_signing_key() {
    let server = MockServer::start().await;
    mount_certs(&server, 1).await;

    let gate = AuthGate::from_config(&config(&server, KeyCachePolicy::Disabled)).unwrap();
    let ctx = gate
        .authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .expect("token should be accepted");
    assert_eq!(ctx.subject.as_deref(), Some("8f1c"));
}

#[tokio::test]
async fn test_unknown_kid_falls_back_to_first_signing_key() {
    let server = MockServer::start().await;
    mount_certs(&server, 2).await;
    let gate = AuthGate::from_config(&config(&server, KeyCachePolicy::Disabled)).unwrap();

    let claims = claims_with_roles(&["user_role"]);
    for kid in [None, Some("rotated-away")] {
        let header = format!("Bearer {}", sign_with_kid(&claims, kid));
        assert!(gate.authorize(Some(&header), &user_role()).await.is_ok(), "{kid:?}");
    }
}

#[tokio::test]
async fn test_keys_are_fetched_per_request_without_cache() {
    let server = MockServer::start().await;
    mount_certs(&server, 3).await;

    let gate = AuthGate::from_config(&config(&server, KeyCachePolicy::Disabled)).unwrap();
    for _ in 0..3 {
        gate.authorize(Some(&bearer(&["user_role"])), &user_role())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_ttl_cache_reuses_fetched_keys() {
    let server = MockServer::start().await;
    mount_certs(&server, 1).await;

    let policy = KeyCachePolicy::Ttl(Duration::from_secs(300));
    let gate = AuthGate::from_config(&config(&server, policy)).unwrap();
    for _ in 0..3 {
        gate.authorize(Some(&bearer(&["user_role"])), &user_role())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_ttl_cache_refetches_after_expiry() {
    let server = MockServer::start().await;
    mount_certs(&server, 2).await;

    let policy = KeyCachePolicy::Ttl(Duration::from_millis(200));
    let gate = AuthGate::from_config(&config(&server, policy)).unwrap();

    gate.authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .unwrap();
    gate.authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    gate.authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CERTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_certs(&server, 1).await;

    let policy = KeyCachePolicy::Ttl(Duration::from_secs(300));
    let gate = AuthGate::from_config(&config(&server, policy)).unwrap();

    let err = gate
        .authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .unwrap_err();
    assert!(matches!(err.reason(), RejectReason::KeyFetch(_)));

    assert!(gate
        .authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_realm_without_signing_keys_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CERTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [{ "kid": "enc-1", "kty": "RSA", "use": "enc", "n": "AQAB", "e": "AQAB" }]
        })))
        .mount(&server)
        .await;

    let gate = AuthGate::from_config(&config(&server, KeyCachePolicy::Disabled)).unwrap();
    let err = gate
        .authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .unwrap_err();
    assert!(matches!(err.reason(), RejectReason::KeyFetch(_)));
}

fn oversized_certs() -> serde_json::Value {
    let mut certs = realm_certs();
    certs["padding"] = json!("x".repeat(600 * 1024));
    certs
}

#[tokio::test]
async fn test_oversized_certificate_set_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CERTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(oversized_certs()))
        .mount(&server)
        .await;

    let gate = AuthGate::from_config(&config(&server, KeyCachePolicy::Disabled)).unwrap();
    let err = gate
        .authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .unwrap_err();
    match err.reason() {
        RejectReason::KeyFetch(msg) => assert!(msg.contains("too large"), "{msg}"),
        other => panic!("unexpected reason: {other:?}"),
    }
}

/// Answers one request with a chunked body, so no Content-Length is sent.
async fn serve_chunked_once(body: Vec<u8>) -> Url {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n";
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        for chunk in body.chunks(64 * 1024) {
            let framed = [
                format!("{:x}\r\n", chunk.len()).into_bytes(),
                chunk.to_vec(),
                b"\r\n".to_vec(),
            ]
            .concat();
            if socket.write_all(&framed).await.is_err() {
                return;
            }
        }
        let _ = socket.write_all(b"0\r\n\r\n").await;
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

#[tokio::test]
async fn test_oversized_chunked_certificate_set_is_rejected() {
    let body = serde_json::to_vec(&oversized_certs()).unwrap();
    let auth = AuthConfig {
        server_url: Some(serve_chunked_once(body).await),
        realm: Some("lines".into()),
        ..Default::default()
    };

    let gate = AuthGate::from_config(&auth).unwrap();
    let err = gate
        .authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .unwrap_err();
    match err.reason() {
        RejectReason::KeyFetch(msg) => assert!(msg.contains("too large"), "{msg}"),
        other => panic!("unexpected reason: {other:?}"),
    }
}

#[tokio::test]
async fn test_chunked_certificate_set_within_limit_is_accepted() {
    let body = serde_json::to_vec(&realm_certs()).unwrap();
    let auth = AuthConfig {
        server_url: Some(serve_chunked_once(body).await),
        realm: Some("lines".into()),
        ..Default::default()
    };

    let gate = AuthGate::from_config(&auth).unwrap();
    assert!(gate
        .authorize(Some(&bearer(&["user_role"])), &user_role())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_role_check_runs_after_signature_check() {
    let server = MockServer::start().await;
    mount_certs(&server, 1).await;

    let gate = AuthGate::from_config(&config(&server, KeyCachePolicy::Disabled)).unwrap();
    let err = gate
        .authorize(Some(&bearer(&["offline_access"])), &user_role())
        .await
        .unwrap_err();
    assert_eq!(
        err.reason(),
        &RejectReason::MissingRoles(vec!["user_role".into()])
    );
}

#[tokio::test]
async fn test_malformed_header_never_reaches_the_realm() {
    let server = MockServer::start().await;
    mount_certs(&server, 0).await;

    let gate = AuthGate::from_config(&config(&server, KeyCachePolicy::Disabled)).unwrap();
    let err = gate.authorize(Some("Basic dXNlcjpwdw=="), &user_role()).await.unwrap_err();
    assert_eq!(err.reason(), &RejectReason::MalformedHeader);
}

#[test]
fn test_gate_requires_server_and_realm() {
    assert!(AuthGate::from_config(&AuthConfig::default()).is_err());
}
