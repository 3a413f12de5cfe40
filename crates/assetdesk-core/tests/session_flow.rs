//! End-to-end session behavior against a mock HTTP backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assetdesk_core::api::RequestDescriptor;
use assetdesk_core::config::SessionStorage;
use assetdesk_core::{ApiClient, ApiError, Config, Credential, MemoryTokenStore, Navigator, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct CountingNavigator(AtomicUsize);

impl Navigator for CountingNavigator {
    fn redirect_to_login(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    server: MockServer,
    store: Arc<MemoryTokenStore>,
    navigator: Arc<CountingNavigator>,
    api: ApiClient,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let config = Config {
        api_url: server.uri(),
        session_storage: SessionStorage::Memory,
        request_timeout_secs: 5,
        ..Config::default()
    };
    let store = Arc::new(MemoryTokenStore::new());
    store.save(Credential::new("A1", "R1"));
    let navigator = Arc::new(CountingNavigator::default());
    let api = ApiClient::new(&config, store.clone(), navigator.clone()).unwrap();
    Harness {
        server,
        store,
        navigator,
        api,
    }
}

fn asset_list() -> serde_json::Value {
    json!([
        {"id": 1, "name": "HP ProBook", "cost": 1000, "category": "LAPT", "asset_status": "A"},
        {"id": 2, "name": "APC Smart", "cost": 300, "category": "UPS", "asset_status": "C"}
    ])
}

#[tokio::test]
async fn test_valid_token_returns_backend_payload() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/assets/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_list()))
        .expect(2)
        .mount(&h.server)
        .await;

    let payload = h
        .api
        .executor()
        .execute(&RequestDescriptor::get("/assets/"))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&payload.body).unwrap();
    assert_eq!(body, asset_list());

    let assets = h.api.assets().await.unwrap();
    assert_eq!(assets.len(), 2);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_retried() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/assets/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_list()))
        .expect(1)
        .mount(&h.server)
        .await;

    let assets = h.api.assets().await.unwrap();
    assert_eq!(assets[1].name, "APC Smart");
    assert_eq!(h.store.read().as_deref(), Some("A2"));
    assert_eq!(h.store.refresh_token().as_deref(), Some("R1"));
    assert_eq!(h.navigator.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_parallel_requests_share_one_refresh() {
    let h = harness().await;
    Mock::given(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(6)
        .mount(&h.server)
        .await;

    let paths = [
        "/assets/",
        "/assets/inactive/",
        "/assets/need-troubleshooting/",
        "/divisions/",
        "/maintenances/",
        "/office/",
    ];
    let executor = h.api.executor();
    let descriptors: Vec<_> = paths.iter().map(|p| RequestDescriptor::get(*p)).collect();
    let results = futures::future::join_all(descriptors.iter().map(|d| executor.execute(d))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(executor.refresher().refresh_calls(), 1);
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": "token_not_valid"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.api.current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert!(err.is_auth_failure());
    assert_eq!(h.store.credential(), None);
    assert_eq!(h.navigator.0.load(Ordering::SeqCst), 1);

    let err = h.api.current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
}

#[tokio::test]
async fn test_server_error_is_not_treated_as_auth_failure() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/assets/asset-stats/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&h.server)
        .await;

    match h.api.asset_stats().await {
        Err(ApiError::RequestFailed { status, body }) => {
            assert_eq!(status.map(|s| s.as_u16()), Some(500));
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(h.store.read().as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_login_flow() {
    let h = harness().await;
    h.store.clear();
    Mock::given(method("POST"))
        .and(path("/token/"))
        .and(body_json(json!({"username": "asha", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "L1", "refresh": "LR1"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .and(header("authorization", "Bearer L1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 1, "username": "asha", "first_name": "Asha", "is_staff": false})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h.api.login("asha", "secret").await.unwrap();
    assert_eq!(user.full_name(), "Asha");
    assert_eq!(h.store.credential(), Some(Credential::new("L1", "LR1")));
}

#[tokio::test]
async fn test_logout_with_rejected_token_stays_quiet() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/logout/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&h.server)
        .await;

    h.api.logout().await;
    assert_eq!(h.store.credential(), None);
    assert_eq!(h.navigator.0.load(Ordering::SeqCst), 0);
}
