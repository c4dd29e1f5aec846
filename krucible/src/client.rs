//! Krucible API client

use krucible_common::{Cluster, Snapshot};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::{ConnectionConfig, KrucibleConfig, PollConfig};
use crate::connect::{ClusterConnector, KubeConnector};
use crate::error::{ClientError, Result};

const API_KEY_ID: HeaderName = HeaderName::from_static("api-key-id");
const API_KEY_SECRET: HeaderName = HeaderName::from_static("api-key-secret");

/// Krucible API client bound to a single account
pub struct KrucibleClient<C = KubeConnector> {
    http: reqwest::Client,
    config: ConnectionConfig,
    base_url: String,
    account_url: String,
    pub(crate) polling: PollConfig,
    connector: Arc<C>,
}

impl KrucibleClient<KubeConnector> {
    /// Create a new client. Never performs I/O.
    pub fn new(config: ConnectionConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("krucible-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.resolved_base_url(),
            account_url: config.account_url(),
            config,
            polling: PollConfig::default(),
            connector: Arc::new(KubeConnector::new()),
        }
    }

    /// Create a client from a loaded configuration file
    pub fn from_config(config: KrucibleConfig) -> Self {
        Self::new(config.connection).with_poll_config(config.polling)
    }
}

impl<C> KrucibleClient<C> {
    /// Set how creations are awaited
    pub fn with_poll_config(mut self, polling: PollConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Replace the factory used to connect to created clusters
    pub fn with_connector<D>(self, connector: D) -> KrucibleClient<D> {
        KrucibleClient {
            http: self.http,
            config: self.config,
            base_url: self.base_url,
            account_url: self.account_url,
            polling: self.polling,
            connector: Arc::new(connector),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn account_url(&self) -> &str {
        &self.account_url
    }

    pub fn account_id(&self) -> &str {
        &self.config.account_id
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.polling
    }

    /// Build headers for requests
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let key_id = HeaderValue::from_str(&self.config.api_key_id).map_err(|_| {
            ClientError::InvalidArgument("API key id is not a valid header value".into())
        })?;
        let mut key_secret = HeaderValue::from_str(&self.config.api_key_secret).map_err(|_| {
            ClientError::InvalidArgument("API key secret is not a valid header value".into())
        })?;
        key_secret.set_sensitive(true);

        headers.insert(API_KEY_ID, key_id);
        headers.insert(API_KEY_SECRET, key_secret);

        Ok(headers)
    }

    /// Issue an authenticated request against the account URL.
    ///
    /// Every call to the service goes through here.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.account_url, path);
        debug!(%method, %url, "Sending Krucible API request");

        let mut request = self.http.request(method, &url).headers(self.headers()?);
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response> {
        self.execute(method, path, None).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let body = serde_json::to_vec(body).map_err(ClientError::Encode)?;
        self.execute(method, path, Some(body)).await
    }

    /// GET `path` and decode the body, requiring `expected`
    async fn get_json<T: DeserializeOwned>(&self, path: &str, expected: StatusCode) -> Result<T> {
        let response = self.send(Method::GET, path).await?;
        decode(expect_status(response, expected).await?).await
    }

    /// POST `body` to `path` and decode the reply, requiring `expected`
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B, expected: StatusCode) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_json(Method::POST, path, body).await?;
        decode(expect_status(response, expected).await?).await
    }

    /// Fetch metadata about a cluster
    pub async fn get_cluster(&self, id: &str) -> Result<Cluster> {
        let id = required("Cluster ID", id)?;
        self.get_json(&format!("/clusters/{}", id), StatusCode::OK).await
    }

    /// List every cluster in the account
    pub async fn get_clusters(&self) -> Result<Vec<Cluster>> {
        self.get_json("/clusters/", StatusCode::OK).await
    }

    /// Download a cluster's kubeconfig
    pub async fn get_cluster_kubeconfig(&self, id: &str) -> Result<Vec<u8>> {
        let id = required("Cluster ID", id)?;
        let response = self
            .send(Method::GET, &format!("/clusters/{}/kube-config", id))
            .await?;
        let response = expect_status(response, StatusCode::OK).await?;

        Ok(response.bytes().await?.to_vec())
    }

    /// Delete a cluster
    pub async fn delete_cluster(&self, id: &str) -> Result<()> {
        let id = required("Cluster ID", id)?;
        let response = self
            .send(Method::DELETE, &format!("/clusters/{}", id))
            .await?;
        expect_status(response, StatusCode::ACCEPTED).await?;

        Ok(())
    }

    /// Fetch metadata about a snapshot
    pub async fn get_snapshot(&self, id: &str) -> Result<Snapshot> {
        let id = required("Snapshot ID", id)?;
        self.get_json(&format!("/snapshots/{}", id), StatusCode::OK).await
    }

    /// List every snapshot in the account
    pub async fn get_snapshots(&self) -> Result<Vec<Snapshot>> {
        self.get_json("/snapshots/", StatusCode::OK).await
    }
}

impl<C: ClusterConnector> KrucibleClient<C> {
    /// Connect to an existing cluster using its kubeconfig
    pub async fn connect_cluster(&self, id: &str) -> Result<C::Handle> {
        let kubeconfig = self.get_cluster_kubeconfig(id).await?;
        self.connector.connect(id, &kubeconfig).await
    }
}

impl<C> Clone for KrucibleClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            account_url: self.account_url.clone(),
            polling: self.polling.clone(),
            connector: Arc::clone(&self.connector),
        }
    }
}

impl<C> std::fmt::Debug for KrucibleClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrucibleClient")
            .field("account_url", &self.account_url)
            .field("config", &self.config)
            .field("polling", &self.polling)
            .finish()
    }
}

/// Reject empty identifiers before any request is made
fn required<'a>(what: &str, id: &'a str) -> Result<std::borrow::Cow<'a, str>> {
    if id.is_empty() {
        return Err(ClientError::InvalidArgument(format!(
            "{} must be non-empty",
            what
        )));
    }
    Ok(urlencoding::encode(id))
}

/// Fail unless the response carries exactly `expected`
async fn expect_status(
    response: reqwest::Response,
    expected: StatusCode,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ClientError::UnexpectedStatus {
        status: status.as_u16(),
        expected: expected.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(ClientError::Decode)
}
