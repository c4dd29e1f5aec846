//! Client error types

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`crate::KrucibleClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required argument was empty or unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or connection failure
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with something other than the expected status
    #[error("Unexpected status code {status}")]
    UnexpectedStatus {
        status: u16,
        expected: u16,
        message: String,
    },

    /// Request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Response body did not match the expected shape
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Refreshing a resource failed while waiting for it to settle
    #[error("Polling {id} failed: {source}")]
    Poll {
        id: String,
        #[source]
        source: Box<ClientError>,
    },

    /// Resource settled in a configured failure state
    #[error("Provisioning of {id} failed with state '{state}'")]
    ProvisioningFailed { id: String, state: String },

    /// Resource settled in a state the client was not told how to handle
    #[error("{id} settled in unrecognized state '{state}'")]
    UnrecognizedState { id: String, state: String },

    /// Configured wait bound exceeded
    #[error("Timed out after {waited:?} waiting for {id} to finish provisioning")]
    Timeout { id: String, waited: Duration },

    /// Kubeconfig could not be turned into a cluster client
    #[error("Cluster connection error: {0}")]
    Connect(String),
}

impl ClientError {
    /// Status code carried by an `UnexpectedStatus` error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Poll { source, .. } => source.status(),
            _ => None,
        }
    }
}

impl From<kube::Error> for ClientError {
    fn from(err: kube::Error) -> Self {
        ClientError::Connect(format!("Failed to create client: {}", err))
    }
}

impl From<kube::config::KubeconfigError> for ClientError {
    fn from(err: kube::config::KubeconfigError) -> Self {
        ClientError::Connect(format!("Invalid kubeconfig: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_message() {
        let err = ClientError::UnexpectedStatus {
            status: 404,
            expected: 201,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status code 404");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_poll_error_keeps_cause() {
        let err = ClientError::Poll {
            id: "c-1".to_string(),
            source: Box::new(ClientError::UnexpectedStatus {
                status: 500,
                expected: 200,
                message: String::new(),
            }),
        };
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("c-1"));
    }
}
