#![allow(clippy::unwrap_used)]
// Integration tests for `HarviaClient` using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use harvia_api::{
    AuthContext, ClientConfig, CredentialState, Error, GraphqlOperation, HarviaClient,
    IdentityProvider, Service,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Default)]
struct StaticProvider {
    sign_ins: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn sign_in(
        &self,
        ctx: AuthContext<'_>,
        _username: &str,
        _password: &SecretString,
    ) -> Result<CredentialState, Error> {
        assert_eq!(ctx.pool.user_pool_id, "eu-west-1_TestPool");
        assert_eq!(ctx.pool.client_id, "test-client");
        self.sign_ins.fetch_add(1, Ordering::SeqCst);
        Ok(CredentialState::new(
            SecretString::from("access-1".to_string()),
            SecretString::from("refresh-1".to_string()),
            SecretString::from("id-token-1".to_string()),
            Utc::now() + TimeDelta::hours(1),
        ))
    }

    async fn renew(
        &self,
        _ctx: AuthContext<'_>,
        current: &CredentialState,
    ) -> Result<CredentialState, Error> {
        Ok(current.clone())
    }
}

async fn mount_discovery(server: &MockServer) {
    let uri = server.uri();
    for service in ["users", "device", "events", "data"] {
        let mut body = json!({ "endpoint": format!("{uri}/graphql/{service}") });
        if service == "users" {
            body["userPoolId"] = json!("eu-west-1_TestPool");
            body["clientId"] = json!("test-client");
            body["identityPoolId"] = json!("eu-west-1:identity");
        }
        Mock::given(method("GET"))
            .and(path(format!("/{service}/endpoint")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}

fn client_for(server: &MockServer, provider: Arc<StaticProvider>) -> HarviaClient {
    let mut config =
        ClientConfig::new("sauna@example.com", SecretString::from("pw".to_string())).unwrap();
    config.discovery_url = Url::parse(&server.uri()).unwrap();
    HarviaClient::new(config, provider)
}

async fn setup() -> (MockServer, HarviaClient, Arc<StaticProvider>) {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    let provider = Arc::new(StaticProvider::default());
    let client = client_for(&server, provider.clone());
    client.connect().await.unwrap();
    (server, client, provider)
}

fn tree_query() -> GraphqlOperation {
    GraphqlOperation::new("Query", "query Query {\n  getDeviceTree\n}\n")
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_discovery_populates_every_service() {
    let (server, client, _) = setup().await;

    let directory = client.endpoints().await.unwrap();
    assert_eq!(
        directory.endpoint(Service::Data).unwrap().as_str(),
        format!("{}/graphql/data", server.uri())
    );
    let pool = directory.user_pool().unwrap();
    assert_eq!(pool.identity_pool_id.as_deref(), Some("eu-west-1:identity"));
}

#[tokio::test]
async fn test_discovery_failure_is_total_and_closes_session() {
    let server = MockServer::start().await;
    let uri = server.uri();
    for service in ["users", "device", "data"] {
        Mock::given(method("GET"))
            .and(path(format!("/{service}/endpoint")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "endpoint": format!("{uri}/graphql/{service}") })),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/events/endpoint"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticProvider::default()));
    let err = client.connect().await.unwrap_err();

    assert!(err.is_connectivity());
    assert!(
        matches!(err, Error::Discovery { service: Service::Events, .. }),
        "expected Discovery error for events, got: {err:?}"
    );
    assert!(!client.is_open().await);
    assert!(matches!(client.endpoints().await, Err(Error::NotDiscovered)));
}

#[tokio::test]
async fn test_discovery_rejects_non_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticProvider::default()));
    let result = client.connect().await;

    assert!(
        matches!(result, Err(Error::Discovery { service: Service::Users, .. })),
        "expected Discovery error, got: {result:?}"
    );
}

// ── Gateway ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_sends_raw_identity_token() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/graphql/device"))
        .and(header("authorization", "id-token-1"))
        .and(body_partial_json(json!({
            "operationName": "Query",
            "variables": {}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "getDeviceTree": "[]" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let envelope = client.execute(Service::Device, &tree_query()).await.unwrap();
    assert_eq!(envelope, json!({ "data": { "getDeviceTree": "[]" } }));
}

#[tokio::test]
async fn test_graphql_errors_are_returned_unmodified() {
    let (server, client, _) = setup().await;

    let body = json!({
        "data": null,
        "errors": [{ "errorType": "Unauthorized", "message": "Not Authorized to access getDeviceTree" }]
    });
    Mock::given(method("POST"))
        .and(path("/graphql/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let envelope = client.execute(Service::Device, &tree_query()).await.unwrap();
    assert_eq!(envelope, body);
    assert_eq!(harvia_api::graphql::errors(&envelope).map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_non_success_status_is_http_error() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/graphql/data"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = client.execute(Service::Data, &tree_query()).await;
    match result {
        Err(Error::Http { status, ref body, .. }) => {
            assert_eq!(status, 502);
            assert!(body.contains("Bad Gateway"));
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/graphql/device"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.execute(Service::Device, &tree_query()).await;
    assert!(
        result.as_ref().is_err_and(Error::is_malformed_response),
        "expected malformed-response error, got: {result:?}"
    );
}

// ── Authentication lifecycle ────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_is_lazy_and_happens_once() {
    let (server, client, provider) = setup().await;
    assert_eq!(provider.sign_ins.load(Ordering::SeqCst), 0);

    Mock::given(method("POST"))
        .and(path("/graphql/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&server)
        .await;

    client.execute(Service::Device, &tree_query()).await.unwrap();
    client.execute(Service::Device, &tree_query()).await.unwrap();
    let token = client.ensure_fresh_token().await.unwrap();

    assert_eq!(token.expose_secret(), "id-token-1");
    assert_eq!(provider.sign_ins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_calls_fail_outside_session_lifetime() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    let client = client_for(&server, Arc::new(StaticProvider::default()));

    let before = client.execute(Service::Device, &tree_query()).await;
    assert!(matches!(before, Err(Error::SessionClosed)));

    client.open().await.unwrap();
    let undiscovered = client.execute(Service::Device, &tree_query()).await;
    assert!(matches!(undiscovered, Err(Error::NotDiscovered)));

    client.discover().await.unwrap();
    client.close().await;
    client.close().await;

    let after = client.execute(Service::Device, &tree_query()).await;
    assert!(after.as_ref().is_err_and(Error::is_usage), "got: {after:?}");
    assert!(!client.credentials().is_authenticated().await);
}
