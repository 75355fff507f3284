//! GPU instance acquisition for the Lambda Cloud capacity pool.
//!
//! This crate snapshots available capacity, launches and releases instances,
//! and waits for scarce instance types to free up so they can be grabbed the
//! moment they appear.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          gpu CLI                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │   ┌──────────────────┐        ┌──────────────────────────┐   │
//! │   │  Acquisition     │        │  Lifecycle               │   │
//! │   │  • poll + sleep  │───────►│  • launch / terminate    │   │
//! │   │  • cancellable   │        │  • list / connect        │   │
//! │   └────────┬─────────┘        └────────────┬─────────────┘   │
//! │            ▼                               │                 │
//! │   ┌──────────────────┐                     │                 │
//! │   │  Catalog         │◄────────────────────┘                 │
//! │   │  • numbered      │                                       │
//! │   │    snapshot      │                                       │
//! │   └────────┬─────────┘                                       │
//! │            ▼                                                 │
//! │   ┌──────────────────────────────────────────────────────┐   │
//! │   │  GpuProvider (Lambda Cloud REST API)                 │   │
//! │   └──────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use lambda_gpu::acquire::acquire;
//! use lambda_gpu::config::{AcquireConfig, LaunchConfig, ProviderConfig};
//! use lambda_gpu::providers::lambda::Lambda;
//! use tokio_util::sync::CancellationToken;
//!
//! let provider = Lambda::new(ProviderConfig::new(api_key))?;
//! let launch_config = LaunchConfig { ssh_key_names: vec!["laptop".into()], instance_name: None };
//!
//! // Blocks until gpu_1x_h100_pcie has capacity somewhere, then launches it
//! let acquisition = acquire(
//!     &provider,
//!     &launch_config,
//!     &AcquireConfig::default(),
//!     "gpu_1x_h100_pcie",
//!     CancellationToken::new(),
//! )
//! .await?;
//! ```

pub mod acquire;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod providers;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{CapacitySnapshot, InstanceTypeOffer, UnavailableOffer};
pub use error::{Error, Result};
pub use providers::lambda;
pub use providers::traits::{
    GpuProvider, GpuProviderError, InstanceSpecs, InstanceStatus, InstanceTypeListing,
    LaunchRequest, RunningInstance,
};
