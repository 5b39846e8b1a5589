use std::net::SocketAddr;
use std::sync::Arc;

use meshguard_auth::{LookupError, LookupPolicy, Permission, PermissionLookup, Role};
use meshguard_service::app::{build_app, demo_permissions};
use meshguard_service::state::ServiceState;
use reqwest::StatusCode;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(state: ServiceState) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self { base_url, handle }
    }

    async fn demo() -> Self {
        Self::spawn(ServiceState::new(Arc::new(demo_permissions()), LookupPolicy::BestEffort)).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Unavailable;

#[axum::async_trait]
impl PermissionLookup for Unavailable {
    async fn permissions_for_role(&self, _role: &Role) -> Result<Vec<Permission>, LookupError> {
        Err(LookupError::unavailable("permission store offline"))
    }
}

/// Request carrying the headers the edge would have written.
fn as_user(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: String,
    id: &str,
    username: &str,
    role: &str,
) -> reqwest::RequestBuilder {
    client
        .request(method, url)
        .header("x-user-id", id)
        .header("x-username", username)
        .header("x-role-code", role)
}

async fn session(client: &reqwest::Client, base_url: &str) -> serde_json::Value {
    client
        .get(format!("{}/api/session", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn anonymous_request_is_rejected_by_identity_extractor() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/api/me", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn identity_is_rebuilt_from_trusted_headers() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/me", srv.base_url), "1001", "alice", "USER")
        .header("x-real-name", "Alice Liddell")
        .header("user-agent", "black-box-test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"], 1001);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["real_name"], "Alice Liddell");
    assert_eq!(body["user_agent"], "black-box-test");
    assert_eq!(body["super_admin"], false);
    assert_eq!(body["login_ip"], "127.0.0.1");
    assert!(body["permission_codes"].as_array().unwrap().iter().any(|p| p == "report:read"));
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn role_guard_rejects_with_requirement_description() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/admin/stats", srv.base_url), "1001", "alice", "USER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "FORBIDDEN");
    assert_eq!(body["message"], "insufficient role: administrators only");

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/admin/stats", srv.base_url), "1", "root", "ADMIN")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn role_guard_runs_before_permission_guard() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/reports/export", srv.base_url);

    let res = as_user(&client, reqwest::Method::POST, url.clone(), "1001", "alice", "USER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "insufficient role: editors only");

    let res = as_user(&client, reqwest::Method::POST, url, "7", "erin", "EDITOR")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn handler_level_authorization() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/reports/42", srv.base_url);

    let res = as_user(&client, reqwest::Method::DELETE, url.clone(), "7", "erin", "EDITOR")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "insufficient permission: delete reports");

    let res = as_user(&client, reqwest::Method::DELETE, url, "1", "root", "ADMIN")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn superadmin_passes_every_guard() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();

    for (method, path) in [
        (reqwest::Method::GET, "/api/admin/stats"),
        (reqwest::Method::GET, "/api/reports"),
        (reqwest::Method::POST, "/api/reports/export"),
        (reqwest::Method::DELETE, "/api/reports/1"),
    ] {
        let res = as_user(&client, method, format!("{}{}", srv.base_url, path), "0", "root", "SUPER_ADMIN")
            .send()
            .await
            .unwrap();
        assert!(res.status().is_success(), "{path} returned {}", res.status());
    }
}

#[tokio::test]
async fn malformed_user_id_degrades_to_anonymous() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/session", srv.base_url), "not-a-number", "alice", "USER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn identity_does_not_leak_into_later_requests() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();

    // Success, then a guard failure, each followed by an anonymous request.
    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/session", srv.base_url), "1001", "alice", "USER")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["login_ip"], "127.0.0.1");
    assert_eq!(session(&client, &srv.base_url).await["authenticated"], false);

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/admin/stats", srv.base_url), "1001", "alice", "USER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(session(&client, &srv.base_url).await["authenticated"], false);
}

#[tokio::test]
async fn concurrent_requests_see_only_their_own_identity() {
    let srv = TestServer::demo().await;
    let client = reqwest::Client::new();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..32u32 {
        let client = client.clone();
        let url = format!("{}/api/session", srv.base_url);
        tasks.spawn(async move {
            let req = if i % 2 == 0 {
                client
                    .get(url)
                    .header("x-user-id", i.to_string())
                    .header("x-username", format!("user-{i}"))
            } else {
                client.get(url)
            };
            let body: serde_json::Value = req.send().await.unwrap().json().await.unwrap();
            (i, body)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (i, body) = joined.unwrap();
        if i % 2 == 0 {
            assert_eq!(body["user_id"], i);
            assert_eq!(body["username"], format!("user-{i}"));
        } else {
            assert_eq!(body["authenticated"], false);
            assert!(body["username"].is_null());
        }
    }
}

#[tokio::test]
async fn mandatory_lookup_failure_is_service_unavailable() {
    let srv = TestServer::spawn(ServiceState::new(Arc::new(Unavailable), LookupPolicy::Mandatory)).await;
    let client = reqwest::Client::new();

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/me", srv.base_url), "1001", "alice", "USER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn best_effort_lookup_failure_continues_without_permissions() {
    let srv = TestServer::spawn(ServiceState::new(Arc::new(Unavailable), LookupPolicy::BestEffort)).await;
    let client = reqwest::Client::new();

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/reports", srv.base_url), "1001", "alice", "USER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = as_user(&client, reqwest::Method::GET, format!("{}/api/me", srv.base_url), "1001", "alice", "USER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::demo().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
