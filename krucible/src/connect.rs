//! Kubernetes client construction from downloaded kubeconfigs
//!
//! Wraps the kube-rs Client with the Krucible cluster it points at.

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::version::Info;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::error::{ClientError, Result};

/// Turns a cluster's kubeconfig into something that can talk to the cluster
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    type Handle: Send;

    async fn connect(&self, cluster_id: &str, kubeconfig: &[u8]) -> Result<Self::Handle>;
}

/// Default connector producing kube-rs clients
#[derive(Debug, Clone, Default)]
pub struct KubeConnector {
    context: Option<String>,
}

impl KubeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a named kubeconfig context instead of `current-context`
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }
}

#[async_trait]
impl ClusterConnector for KubeConnector {
    type Handle = ClusterHandle;

    async fn connect(&self, cluster_id: &str, kubeconfig: &[u8]) -> Result<ClusterHandle> {
        let yaml = std::str::from_utf8(kubeconfig)
            .map_err(|e| ClientError::Connect(format!("Kubeconfig is not UTF-8: {}", e)))?;

        ClusterHandle::from_kubeconfig(yaml, self.context.as_deref(), cluster_id.to_string())
            .await
    }
}

/// kube-rs Client connected to a Krucible cluster
#[derive(Clone)]
pub struct ClusterHandle {
    inner: Client,
    cluster_id: String,
    api_server: String,
}

impl ClusterHandle {
    /// Create client from kubeconfig YAML with optional context
    pub async fn from_kubeconfig(
        kubeconfig_yaml: &str,
        context: Option<&str>,
        cluster_id: String,
    ) -> Result<Self> {
        let kubeconfig = Kubeconfig::from_yaml(kubeconfig_yaml)?;
        let api_server = Self::extract_api_server(&kubeconfig, context)?;

        let config = Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: context.map(String::from),
                ..Default::default()
            },
        )
        .await?;

        let client = Client::try_from(config)?;

        Ok(Self {
            inner: client,
            cluster_id,
            api_server,
        })
    }

    /// Extract API server URL from kubeconfig
    fn extract_api_server(kubeconfig: &Kubeconfig, context_name: Option<&str>) -> Result<String> {
        let context_name = context_name
            .map(String::from)
            .or_else(|| kubeconfig.current_context.clone())
            .ok_or_else(|| {
                ClientError::Connect("No context specified and no current-context".into())
            })?;

        let context = kubeconfig
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| ClientError::Connect(format!("Context '{}' not found", context_name)))?;

        let cluster_name = context
            .context
            .as_ref()
            .map(|c| c.cluster.as_str())
            .ok_or_else(|| ClientError::Connect("Context has no cluster reference".into()))?;

        let cluster = kubeconfig
            .clusters
            .iter()
            .find(|c| c.name == cluster_name)
            .ok_or_else(|| ClientError::Connect(format!("Cluster '{}' not found", cluster_name)))?;

        cluster
            .cluster
            .as_ref()
            .and_then(|c| c.server.clone())
            .ok_or_else(|| ClientError::Connect("Cluster has no server URL".into()))
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn into_inner(self) -> Client {
        self.inner
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    /// Ask the API server for its version
    pub async fn server_version(&self) -> Result<Info> {
        Ok(self.inner.apiserver_version().await?)
    }
}

impl std::fmt::Debug for ClusterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterHandle")
            .field("cluster_id", &self.cluster_id)
            .field("api_server", &self.api_server)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: krucible
  cluster:
    server: http://127.0.0.1:6443
- name: other
  cluster:
    server: http://127.0.0.1:7443
contexts:
- name: krucible
  context:
    cluster: krucible
    user: krucible
- name: dangling
  context:
    cluster: missing
    user: krucible
current-context: krucible
users:
- name: krucible
  user:
    token: test-token
"#;

    #[test]
    fn test_extract_api_server_from_current_context() {
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        let server = ClusterHandle::extract_api_server(&kubeconfig, None).unwrap();
        assert_eq!(server, "http://127.0.0.1:6443");
    }

    #[test]
    fn test_extract_api_server_errors() {
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();

        let err = ClusterHandle::extract_api_server(&kubeconfig, Some("nope")).unwrap_err();
        assert!(err.to_string().contains("Context 'nope' not found"));

        let err = ClusterHandle::extract_api_server(&kubeconfig, Some("dangling")).unwrap_err();
        assert!(err.to_string().contains("Cluster 'missing' not found"));
    }

    #[tokio::test]
    async fn test_connect_builds_client() {
        let handle = KubeConnector::new()
            .connect("c-1", KUBECONFIG.as_bytes())
            .await
            .unwrap();

        assert_eq!(handle.cluster_id(), "c-1");
        assert_eq!(handle.api_server(), "http://127.0.0.1:6443");
    }

    #[tokio::test]
    async fn test_connect_with_named_context() {
        let handle = KubeConnector::with_context("krucible")
            .connect("c-1", KUBECONFIG.as_bytes())
            .await
            .unwrap();
        assert_eq!(handle.api_server(), "http://127.0.0.1:6443");

        let result = KubeConnector::with_context("dangling")
            .connect("c-1", KUBECONFIG.as_bytes())
            .await;
        assert!(matches!(result, Err(ClientError::Connect(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_garbage() {
        let result = KubeConnector::new().connect("c-1", b"\xff\xfe").await;
        assert!(matches!(result, Err(ClientError::Connect(_))));

        let result = KubeConnector::new().connect("c-1", b"clusters: 12").await;
        assert!(matches!(result, Err(ClientError::Connect(_))));
    }
}
