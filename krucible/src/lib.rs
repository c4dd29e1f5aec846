//! Client for the Krucible cluster provisioning API
//!
//! Create short-lived or permanent Kubernetes clusters, wait for them to
//! become ready and get back a connected [`kube::Client`].
//!
//! ```no_run
//! use krucible::{ClusterLifetime, ConnectionConfig, CreateClusterConfig, KrucibleClient};
//!
//! # async fn run() -> krucible::Result<()> {
//! let client = KrucibleClient::new(ConnectionConfig::new(
//!     "4ad69a63-bb6c-49a8-9c6f-6a166fb5acff",
//!     "146d98c4-327d-4a2d-b85a-49590246e136",
//!     "0da8afd2911904aa9bad8862a3e7478a",
//! ));
//!
//! let created = client
//!     .create_cluster(
//!         &CreateClusterConfig::new("my-krucible-cluster").with_lifetime(ClusterLifetime::ONE_HOUR),
//!     )
//!     .await?;
//!
//! println!("{:?}", created.cluster.expires_at);
//! let version = created.client.server_version().await?;
//! println!("{}", version.git_version);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connect;
pub mod error;
pub mod provision;

pub use client::KrucibleClient;
pub use config::{ConfigError, ConnectionConfig, KrucibleConfig, PollConfig, DEFAULT_BASE_URL};
pub use connect::{ClusterConnector, ClusterHandle, KubeConnector};
pub use error::{ClientError, Result};
pub use krucible_common::{
    Cluster, ClusterLifetime, ConnectionDetails, CreateClusterConfig, CreateSnapshotConfig,
    LifecycleState, Snapshot,
};
pub use provision::{CreateClusterResult, Provisioned};
