//! Packet Device CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the Packet device controller:
//! - `Device`: a bare-metal server provisioned through the Packet API
//! - `Provider`: credentials used to talk to the Packet API

pub mod conditions;
pub mod device;
pub mod provider;
pub mod references;

pub use conditions::*;
pub use device::*;
pub use provider::*;
pub use references::*;
