//! Wire types shared by Krucible API consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state reported for clusters and snapshots.
///
/// The service reports states as bare strings. Only `provisioning` and
/// `ready` carry meaning on the client; anything else is kept verbatim in
/// [`LifecycleState::Other`] so callers decide what it means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Provisioning,
    Ready,
    Other(String),
}

impl LifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Ready => "ready",
            Self::Other(state) => state,
        }
    }

    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::Provisioning)
    }
}

impl From<String> for LifecycleState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "provisioning" => Self::Provisioning,
            "ready" => Self::Ready,
            _ => Self::Other(state),
        }
    }
}

impl From<&str> for LifecycleState {
    fn from(state: &str) -> Self {
        Self::from(state.to_string())
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a cluster should stay up.
///
/// Serialized as `durationInHours`: `null` for a permanent cluster, otherwise
/// a whole number of hours. The service accepts 1 to 6 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u8>", into = "Option<u8>")]
pub enum ClusterLifetime {
    #[default]
    Permanent,
    Hours(u8),
}

impl ClusterLifetime {
    pub const PERMANENT: Self = Self::Permanent;
    pub const ONE_HOUR: Self = Self::Hours(1);
    pub const TWO_HOURS: Self = Self::Hours(2);
    pub const THREE_HOURS: Self = Self::Hours(3);
    pub const FOUR_HOURS: Self = Self::Hours(4);
    pub const FIVE_HOURS: Self = Self::Hours(5);
    pub const SIX_HOURS: Self = Self::Hours(6);

    pub fn hours(&self) -> Option<u8> {
        match self {
            Self::Permanent => None,
            Self::Hours(hours) => Some(*hours),
        }
    }
}

impl From<Option<u8>> for ClusterLifetime {
    fn from(hours: Option<u8>) -> Self {
        hours.map_or(Self::Permanent, Self::Hours)
    }
}

impl From<ClusterLifetime> for Option<u8> {
    fn from(lifetime: ClusterLifetime) -> Self {
        lifetime.hours()
    }
}

/// Request body for creating a cluster
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterConfig {
    pub display_name: String,
    #[serde(rename = "durationInHours", default)]
    pub lifetime: ClusterLifetime,
    /// Restore the new cluster from an existing snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

impl CreateClusterConfig {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn with_lifetime(mut self, lifetime: ClusterLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn from_snapshot(mut self, snapshot_id: impl Into<String>) -> Self {
        self.snapshot_id = Some(snapshot_id.into());
        self
    }
}

/// Connection details the service reports for a cluster.
///
/// Older API revisions inline the CA and a bearer token here. Current ones
/// only report the server and expect the kubeconfig to be downloaded.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    #[serde(default)]
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_auth_token: Option<String>,
}

impl std::fmt::Debug for ConnectionDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDetails")
            .field("server", &self.server)
            .field("certificate_authority", &self.certificate_authority)
            .field(
                "cluster_auth_token",
                &self.cluster_auth_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Cluster metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub display_name: String,
    pub state: LifecycleState,
    #[serde(default)]
    pub connection_details: ConnectionDetails,
    pub created_at: DateTime<Utc>,
    /// `None` for permanent clusters
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Cluster {
    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }
}

/// Request body for snapshotting a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotConfig {
    pub cluster_id: String,
}

impl CreateSnapshotConfig {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }
}

/// Snapshot metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub cluster_id: String,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
}
