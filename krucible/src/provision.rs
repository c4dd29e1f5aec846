//! Create-and-wait sequences
//!
//! Creations return immediately with a `provisioning` resource. The client
//! refreshes it at a fixed interval until the service reports another state,
//! then decides whether that state counts as success.

use krucible_common::{Cluster, CreateClusterConfig, CreateSnapshotConfig, LifecycleState, Snapshot};
use reqwest::StatusCode;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::client::KrucibleClient;
use crate::config::PollConfig;
use crate::connect::{ClusterConnector, ClusterHandle};
use crate::error::{ClientError, Result};

/// Resources that report a lifecycle state while being created
pub trait Provisioned {
    fn id(&self) -> &str;
    fn state(&self) -> &LifecycleState;
}

impl Provisioned for Cluster {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> &LifecycleState {
        &self.state
    }
}

impl Provisioned for Snapshot {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> &LifecycleState {
        &self.state
    }
}

/// A freshly created cluster and a client connected to it
#[derive(Debug, Clone)]
pub struct CreateClusterResult<H = ClusterHandle> {
    pub cluster: Cluster,
    pub client: H,
}

impl<C> KrucibleClient<C> {
    /// Wait until `cluster` leaves the provisioning state
    pub async fn wait_for_cluster(&self, cluster: Cluster) -> Result<Cluster> {
        self.wait_until_settled(cluster, |id| async move { self.get_cluster(&id).await })
            .await
    }

    /// Snapshot a cluster and wait for the snapshot to settle
    pub async fn create_snapshot(&self, config: &CreateSnapshotConfig) -> Result<Snapshot> {
        let snapshot: Snapshot = self
            .post_json("/snapshots", config, StatusCode::ACCEPTED)
            .await?;
        info!(
            snapshot_id = %snapshot.id,
            cluster_id = %snapshot.cluster_id,
            state = %snapshot.state,
            "Snapshot requested"
        );

        self.wait_until_settled(snapshot, |id| async move { self.get_snapshot(&id).await })
            .await
    }

    async fn wait_until_settled<T, F, Fut>(&self, resource: T, refresh: F) -> Result<T>
    where
        T: Provisioned,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !resource.state().is_provisioning() {
            return settle(&self.polling, resource);
        }

        let id = resource.id().to_string();
        info!(id = %id, "Waiting for provisioning to finish");

        let resource = match self.polling.timeout() {
            Some(timeout) => tokio::time::timeout(timeout, self.poll(resource, refresh))
                .await
                .map_err(|_| ClientError::Timeout {
                    id: id.clone(),
                    waited: timeout,
                })??,
            None => self.poll(resource, refresh).await?,
        };

        info!(id = %id, state = %resource.state(), "Provisioning finished");
        settle(&self.polling, resource)
    }

    async fn poll<T, F, Fut>(&self, mut resource: T, mut refresh: F) -> Result<T>
    where
        T: Provisioned,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let interval = self.polling.interval();
        let mut attempt: u32 = 0;

        while resource.state().is_provisioning() {
            tokio::time::sleep(interval).await;
            attempt += 1;

            let id = resource.id().to_string();
            debug!(id = %id, attempt, "Refreshing provisioning state");
            resource = refresh(id.clone()).await.map_err(|e| ClientError::Poll {
                id,
                source: Box::new(e),
            })?;
        }

        Ok(resource)
    }
}

impl<C: ClusterConnector> KrucibleClient<C> {
    /// Create a cluster, wait for it to become ready and connect to it.
    ///
    /// Waits at the configured poll interval with no upper bound unless a
    /// timeout is configured. Dropping the future abandons the wait; the
    /// cluster itself keeps provisioning on the service.
    pub async fn create_cluster(
        &self,
        config: &CreateClusterConfig,
    ) -> Result<CreateClusterResult<C::Handle>> {
        let cluster: Cluster = self
            .post_json("/clusters", config, StatusCode::CREATED)
            .await?;
        info!(
            cluster_id = %cluster.id,
            display_name = %cluster.display_name,
            state = %cluster.state,
            "Cluster created"
        );

        let cluster = self.wait_for_cluster(cluster).await?;
        let client = self.connect_cluster(&cluster.id).await?;

        Ok(CreateClusterResult { cluster, client })
    }
}

/// Decide whether a resource that left `provisioning` is usable
fn settle<T: Provisioned>(polling: &PollConfig, resource: T) -> Result<T> {
    let LifecycleState::Other(state) = resource.state().clone() else {
        return Ok(resource);
    };

    if polling.is_failure_state(&state) {
        return Err(ClientError::ProvisioningFailed {
            id: resource.id().to_string(),
            state,
        });
    }

    if !polling.accept_unrecognized_states {
        return Err(ClientError::UnrecognizedState {
            id: resource.id().to_string(),
            state,
        });
    }

    warn!(id = %resource.id(), state = %state, "Accepting unrecognized state");
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(state: &str) -> Snapshot {
        Snapshot {
            id: "s-1".to_string(),
            cluster_id: "c-1".to_string(),
            state: LifecycleState::from(state),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_settle_ready() {
        let result = settle(&PollConfig::default(), snapshot("ready"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_settle_unrecognized_state_is_rejected_by_default() {
        let result = settle(&PollConfig::default(), snapshot("errored"));
        assert!(matches!(
            result,
            Err(ClientError::UnrecognizedState { ref state, .. }) if state == "errored"
        ));
    }

    #[test]
    fn test_settle_failure_state() {
        let polling = PollConfig::default().with_failure_state("errored");
        let result = settle(&polling, snapshot("errored"));
        assert!(matches!(
            result,
            Err(ClientError::ProvisioningFailed { ref id, .. }) if id == "s-1"
        ));
    }

    #[test]
    fn test_settle_accepting_unrecognized_states() {
        let polling = PollConfig::default()
            .with_failure_state("errored")
            .accepting_unrecognized_states();

        assert!(settle(&polling, snapshot("degraded")).is_ok());
        assert!(settle(&polling, snapshot("errored")).is_err());
    }
}
