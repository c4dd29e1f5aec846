//! Common test utilities and helpers

#![allow(dead_code)]

use krucible::{ConnectionConfig, KrucibleClient, PollConfig};
use serde_json::{json, Value};
use std::ops::Deref;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCOUNT_ID: &str = "4ad69a63-bb6c-49a8-9c6f-6a166fb5acff";
pub const API_KEY_ID: &str = "146d98c4-327d-4a2d-b85a-49590246e136";
pub const API_KEY_SECRET: &str = "0da8afd2911904aa9bad8862a3e7478a";
pub const CLUSTER_ID: &str = "8d6b1a2e-1f0c-4b7e-9a43-5b1c7f2e0d11";

/// Install a test subscriber once; RUST_LOG controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Path under the mocked account for `suffix`
pub fn account_path(suffix: &str) -> String {
    format!("/api/accounts/{}{}", ACCOUNT_ID, suffix)
}

/// Cluster body as the service returns it
pub fn cluster_json(id: &str, display_name: &str, state: &str) -> Value {
    json!({
        "id": id,
        "displayName": display_name,
        "state": state,
        "connectionDetails": { "server": format!("https://{}.usekrucible.com", id) },
        "createdAt": "2020-06-01T10:00:00Z",
        "expiresAt": null
    })
}

pub fn snapshot_json(id: &str, cluster_id: &str, state: &str) -> Value {
    json!({
        "id": id,
        "clusterId": cluster_id,
        "state": state,
        "createdAt": "2020-06-01T11:00:00Z"
    })
}

/// Kubeconfig whose API server is `server`
pub fn kubeconfig_yaml(server: &str) -> String {
    format!(
        r#"apiVersion: v1
kind: Config
clusters:
- name: krucible
  cluster:
    server: {server}
contexts:
- name: krucible
  context:
    cluster: krucible
    user: krucible
current-context: krucible
users:
- name: krucible
  user:
    token: cluster-token
"#
    )
}

/// Mock Krucible API server
pub struct KrucibleMock {
    server: MockServer,
}

impl KrucibleMock {
    pub async fn start() -> Self {
        init_tracing();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}/api", self.server.uri())
    }

    /// Client pointed at the mock with a short poll interval
    pub fn client(&self) -> KrucibleClient {
        KrucibleClient::new(
            ConnectionConfig::new(ACCOUNT_ID, API_KEY_ID, API_KEY_SECRET)
                .with_base_url(self.base_url()),
        )
        .with_poll_config(PollConfig::default().with_interval(Duration::from_millis(10)))
    }

    /// Serve a kubeconfig for `cluster_id` pointing back at this mock
    pub async fn mock_kubeconfig(&self, cluster_id: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(account_path(&format!("/clusters/{}/kube-config", cluster_id))))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(kubeconfig_yaml(&self.server.uri())),
            )
            .named("kube-config")
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for `method` on `path`
    pub async fn count_requests(&self, http_method: &str, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
            .count()
    }
}

impl Deref for KrucibleMock {
    type Target = MockServer;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}
