#![allow(clippy::unwrap_used)]
// Integration tests for `NervesHubClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nerves_hub_api::{CertificateChain, ClientConfig, Credentials, Error, NervesHubClient};

const CERT_PEM: &str = include_str!("fixtures/cert.pem");

const DEVICES: &str = "/orgs/organization/products/product/devices";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NervesHubClient) {
    let server = MockServer::start().await;
    let client = NervesHubClient::from_reqwest(
        &server.uri(),
        "organization",
        "product",
        reqwest::Client::new(),
    )
    .unwrap();
    (server, client)
}

fn assert_api_status<T: std::fmt::Debug>(result: Result<T, Error>, expected: u16) {
    match result {
        Err(Error::Api { status, .. }) => assert_eq!(status, expected),
        other => panic!("expected Api error with status {expected}, got: {other:?}"),
    }
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_create() {
    let (server, client) = setup().await;

    let resp = json!({"data": {"identifier": "123"}});

    Mock::given(method("POST"))
        .and(path(DEVICES))
        .and(body_string("identifier=test&tags="))
        .respond_with(ResponseTemplate::new(200).set_body_json(&resp))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.device_create("test", None, None).await.unwrap();

    assert_eq!(created.data.identifier, "123");
    assert_eq!(serde_json::to_value(&created).unwrap(), resp);
}

#[tokio::test]
async fn test_device_create_with_description_and_tags() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(DEVICES))
        .and(body_string(
            "identifier=nerves-1&description=lab+unit&tags=beta%2Cqa",
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "identifier": "nerves-1",
                "description": "lab unit",
                "tags": ["beta", "qa"]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tags = vec!["beta".to_string(), "qa".to_string()];
    let created = client
        .device_create("nerves-1", Some("lab unit"), Some(&tags))
        .await
        .unwrap();

    assert_eq!(created.data.description(), Some("lab unit"));
    assert_eq!(created.data.tags(), tags.as_slice());
}

#[tokio::test]
async fn test_device_create_fails_already_exists() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": {"identifier": ["has already been taken"]}
        })))
        .mount(&server)
        .await;

    let result = client.device_create("test", None, None).await;

    match result {
        Err(Error::Api {
            status,
            ref reason,
            ref errors,
        }) => {
            assert_eq!(status, 422);
            assert!(
                reason.starts_with("422 Unprocessable Entity for url:"),
                "unexpected reason: {reason}"
            );
            assert!(
                reason.contains("identifier: has already been taken"),
                "unexpected reason: {reason}"
            );
            assert_eq!(
                errors.as_ref().unwrap()["identifier"][0],
                "has already been taken"
            );
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_device_list() {
    let (server, client) = setup().await;

    let resp = json!({
        "data": [
            {"identifier": "a", "tags": ["prod"], "version": "1.0.0"},
            {"identifier": "b", "description": "spare", "tags": []}
        ]
    });

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(&resp))
        .mount(&server)
        .await;

    let devices = client.device_list().await.unwrap();

    assert_eq!(devices.data.len(), 2);
    assert_eq!(devices.data[0].identifier, "a");
    assert_eq!(devices.data[0].extra["version"], "1.0.0");
    assert_eq!(devices.data[1].description(), Some("spare"));
    assert_eq!(serde_json::to_value(&devices).unwrap(), resp);
}

#[tokio::test]
async fn test_device_delete_no_content() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DEVICES}/123")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.device_delete("123").await.unwrap());
}

#[tokio::test]
async fn test_device_delete_other_success_is_false() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DEVICES}/123")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(!client.device_delete("123").await.unwrap());
}

#[tokio::test]
async fn test_device_delete_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DEVICES}/missing")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"errors": {"detail": "Not Found"}})),
        )
        .mount(&server)
        .await;

    let result = client.device_delete("missing").await;

    assert!(result.as_ref().is_err_and(Error::is_not_found));
    assert_api_status(result, 404);
}

#[tokio::test]
async fn test_device_create_keeps_explicit_nulls() {
    let (server, client) = setup().await;

    let resp = json!({"data": {"description": null, "identifier": "123", "tags": null}});

    Mock::given(method("POST"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(&resp))
        .mount(&server)
        .await;

    let created = client.device_create("123", None, None).await.unwrap();

    assert_eq!(created.data.description(), None);
    assert_eq!(serde_json::to_value(&created).unwrap(), resp);
}

#[tokio::test]
async fn test_device_delete_encodes_identifier() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DEVICES}/a%23b")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DEVICES}/a")))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    assert!(client.device_delete("a#b").await.unwrap());
}

// ── Certificate tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_device_cert_create() {
    let (server, client) = setup().await;

    let resp = json!({
        "data": {
            "not_after": "2053-02-01T20:00:00Z",
            "not_before": "2022-02-01T19:00:00Z",
            "serial": "239802987793401573645013872129096179462716958206"
        }
    });

    // base64("my certificate") == "bXkgY2VydGlmaWNhdGU="
    Mock::given(method("POST"))
        .and(path(format!("{DEVICES}/123/certificates")))
        .and(body_string_contains("identifier=123"))
        .and(body_string_contains("cert=bXkgY2VydGlmaWNhdGU%3D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&resp))
        .expect(1)
        .mount(&server)
        .await;

    let cert = client
        .device_cert_create("123", b"my certificate")
        .await
        .unwrap();

    assert_eq!(
        cert.data.serial,
        "239802987793401573645013872129096179462716958206"
    );
    assert_eq!(serde_json::to_value(&cert).unwrap(), resp);
}

#[tokio::test]
async fn test_device_cert_list() {
    let (server, client) = setup().await;

    let resp = json!({
        "data": [{
            "not_after": "2053-02-01T20:00:00Z",
            "not_before": "2022-02-01T19:00:00Z",
            "serial": "42"
        }]
    });

    Mock::given(method("GET"))
        .and(path(format!("{DEVICES}/123/certificates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&resp))
        .mount(&server)
        .await;

    let certs = client.device_cert_list("123").await.unwrap();

    assert_eq!(certs.data.len(), 1);
    assert_eq!(certs.data[0].serial, "42");
}

#[tokio::test]
async fn test_device_cert_list_offsetless_timestamps() {
    let (server, client) = setup().await;

    let resp = json!({
        "data": [{
            "not_after": "2053-02-01T20:00:00",
            "not_before": "2022-02-01T19:00:00",
            "serial": "42"
        }]
    });

    Mock::given(method("GET"))
        .and(path(format!("{DEVICES}/123/certificates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&resp))
        .mount(&server)
        .await;

    let certs = client.device_cert_list("123").await.unwrap();

    assert!(certs.data[0].not_before_utc().is_some());
    assert_eq!(serde_json::to_value(&certs).unwrap(), resp);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_code_is_preserved_for_every_operation() {
    let (server, client) = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    assert_api_status(client.device_list().await, 503);
    assert_api_status(client.device_create("x", None, None).await, 503);
    assert_api_status(client.device_delete("x").await, 503);
    assert_api_status(client.device_cert_create("x", b"pem").await, 503);
    assert_api_status(client.device_cert_list("x").await, 503);
}

#[tokio::test]
async fn test_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.device_list().await;

    assert!(result.as_ref().is_err_and(Error::is_auth_failure));
    assert_api_status(result, 401);
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    match client.device_list().await {
        Err(Error::Deserialization { ref body, .. }) => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Grab a free port, then release it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");

    let client =
        NervesHubClient::from_reqwest(&uri, "organization", "product", reqwest::Client::new())
            .unwrap();

    let result = client.device_list().await;

    assert!(
        matches!(result, Err(Error::Transport(_))),
        "expected Transport error, got: {result:?}"
    );
}

// ── Auth header ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_sent_as_bearer_header() {
    let server = MockServer::start().await;

    // A self-hosted endpoint needs an explicit CA even though this mock
    // speaks plain HTTP.
    let config = ClientConfig::new("organization", "product", Credentials::token("nhu_abc"))
        .with_base_url(server.uri())
        .with_ca_cert(CertificateChain::from_pem(CERT_PEM).unwrap());
    let client = NervesHubClient::new(config).unwrap();

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .and(header("authorization", "Bearer nhu_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.device_list().await.unwrap();

    assert!(devices.data.is_empty());
}
