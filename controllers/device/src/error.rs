//! Controller-specific error types.
//!
//! Every lifecycle operation wraps its failure in an operation-specific variant
//! so the cause can be told apart in logs and in the `Synced` condition.

use crate::store::StoreError;
use packet_client::PacketError;
use thiserror::Error;

/// Errors that can occur in the Device Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Provider referenced by the device could not be read
    #[error("cannot get Provider: {0}")]
    ProviderNotFound(#[source] StoreError),

    /// Credentials secret referenced by the provider could not be read
    #[error("cannot get Provider credentials secret: {0}")]
    SecretNotFound(#[source] StoreError),

    /// Packet client could not be built from the credential blob
    #[error("cannot create Packet client: {0}")]
    ClientConstructionFailed(#[source] PacketError),

    /// Reading the remote device failed for a reason other than not-found
    #[error("cannot get Packet device: {0}")]
    ObserveFailed(#[source] PacketError),

    /// Creating the remote device failed
    #[error("cannot create Packet device: {0}")]
    CreateFailed(#[source] PacketError),

    /// Updating the remote device failed
    #[error("cannot update Packet device: {0}")]
    UpdateFailed(#[source] PacketError),

    /// Deleting the remote device failed for a reason other than not-found
    #[error("cannot delete Packet device: {0}")]
    DeleteFailed(#[source] PacketError),

    /// The remote device changed but the Device resource could not be persisted
    #[error("cannot update Device resource: {0}")]
    ManagedUpdateFailed(#[source] StoreError),

    /// A reference points at a resource of the wrong kind
    #[error("unexpected resource kind: {0}")]
    TypeMismatch(String),

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
