#![allow(clippy::unwrap_used)]
// Integration tests for `ManagedClient` using wiremock.

use std::io::Write;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatedeck_api::{
    ClientConfig, CookieJarSource, Credentials, DocumentParent, Error, GatewayClient,
    ManagedClient,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ManagedClient) {
    let server = MockServer::start().await;
    let client = ManagedClient::new(&ClientConfig::new(server.uri())).unwrap();
    (server, client)
}

fn credentials() -> Credentials {
    Credentials::new("ops@example.test", "hunter2".to_string().into())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc; Path=/")
                .set_body_json(json!({"id": "user-1", "org_id": "org-9"})),
        )
        .mount(server)
        .await;
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_returns_session() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(
            json!({"username": "ops@example.test", "password": "hunter2"}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc; Path=/")
                .set_body_json(json!({"id": "user-1", "org_id": "org-9"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = client.login(credentials()).await.unwrap();

    assert_eq!(session.user_id(), Some("user-1"));
    assert_eq!(session.org_id(), Some("org-9"));
    assert_eq!(client.api().cookie_header().as_deref(), Some("session=abc"));
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.login(credentials()).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("401"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_server_error_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&server)
        .await;

    let result = client.login(credentials()).await;

    assert!(
        matches!(result, Err(Error::Api { status: 503, ref message, .. }) if message == "maintenance"),
        "got: {result:?}"
    );
}

// ── Control planes ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_control_planes_sends_session_cookie() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/control_planes"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "cp-1", "name": "prod", "type": {"name": "kong-ee"}},
                {"id": "cp-2", "name": "portal", "type": {"name": "dev-portal"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client.login(credentials()).await.unwrap();
    let planes = client.list_control_planes(&session).await.unwrap();

    assert_eq!(planes.len(), 2);
    assert_eq!(planes[0].id, "cp-1");
    assert_eq!(planes[0].type_name(), Some("kong-ee"));
    assert_eq!(planes[1].name.as_deref(), Some("portal"));
}

#[tokio::test]
async fn test_gateway_client_shares_session_jar() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/control_planes/cp-1/services"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let session = client.login(credentials()).await.unwrap();
    let config = ClientConfig::new(client.control_plane_address("cp-1"))
        .with_cookie_jar(session.cookie_jar());
    let gateway = GatewayClient::new(&config).unwrap();

    let services = gateway
        .list(gatedeck_api::Collection::Services)
        .await
        .unwrap();
    assert!(services.is_empty());
}

// ── Packages & documents ────────────────────────────────────────────

#[tokio::test]
async fn test_list_packages_and_documents() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/service_packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "pkg-1", "name": "billing", "versions": [{"id": "ver-1"}]}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/service_packages/pkg-1/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "doc-1", "path": "/readme"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/service_versions/ver-1/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let session = client.login(credentials()).await.unwrap();
    let packages = client.list_service_packages(&session).await.unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].id(), Some("pkg-1"));

    let docs = client
        .list_documents(&session, DocumentParent::Package("pkg-1"))
        .await
        .unwrap();
    assert_eq!(docs[0].id(), Some("doc-1"));

    let version_docs = client
        .list_documents(&session, DocumentParent::Version("ver-1"))
        .await
        .unwrap();
    assert!(version_docs.is_empty());
}

// ── Factory behaviour over the wire ─────────────────────────────────

#[tokio::test]
async fn test_custom_headers_sent_on_every_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services"))
        .and(header("x-team", "platform"))
        .and(header("x-trace", "a:b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(2)
        .mount(&server)
        .await;

    let config = ClientConfig {
        headers: vec!["X-Team:platform".into(), "X-Trace:a:b".into()],
        ..ClientConfig::new(server.uri())
    };
    let gateway = GatewayClient::new(&config).unwrap();

    for _ in 0..2 {
        gateway
            .list(gatedeck_api::Collection::Services)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_cookie_jar_file_is_used() {
    let server = MockServer::start().await;
    let host = url::Url::parse(&server.uri())
        .unwrap()
        .host_str()
        .unwrap()
        .to_owned();

    let mut jar = tempfile::NamedTempFile::new().unwrap();
    writeln!(jar, "{host}\tFALSE\t/\tFALSE\t0\tadmin_session\tfromfile").unwrap();

    Mock::given(method("GET"))
        .and(path("/routes"))
        .and(header("cookie", "admin_session=fromfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig {
        cookie_jar: Some(CookieJarSource::File(jar.path().to_path_buf())),
        ..ClientConfig::new(server.uri())
    };
    let gateway = GatewayClient::new(&config).unwrap();

    gateway
        .list(gatedeck_api::Collection::Routes)
        .await
        .unwrap();
}
