//! GPU provider trait and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during GPU provider operations.
#[derive(Error, Debug)]
pub enum GpuProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a structured error.
    #[error("API error ({status}): {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Instance status as reported by the provider.
///
/// Values the client does not know about are kept verbatim in [`InstanceStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    /// Instance is provisioning.
    Booting,
    /// Instance is up and reachable.
    Active,
    /// Instance is up but failing health checks.
    Unhealthy,
    /// Instance is shutting down.
    Terminating,
    /// Instance is gone.
    Terminated,
    /// Unrecognised status.
    Other(String),
}

impl From<String> for InstanceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "booting" => Self::Booting,
            "active" => Self::Active,
            "unhealthy" => Self::Unhealthy,
            "terminating" => Self::Terminating,
            "terminated" => Self::Terminated,
            _ => Self::Other(value),
        }
    }
}

impl From<InstanceStatus> for String {
    fn from(value: InstanceStatus) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Booting => write!(f, "booting"),
            Self::Active => write!(f, "active"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Terminating => write!(f, "terminating"),
            Self::Terminated => write!(f, "terminated"),
            Self::Other(other) => write!(f, "{other}"),
        }
    }
}

/// Hardware specifications of an instance type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpecs {
    /// Number of virtual CPUs.
    pub vcpus: Option<u32>,
    /// RAM in GiB.
    pub memory_gib: Option<u32>,
    /// Local storage in GiB.
    pub storage_gib: Option<u32>,
    /// Number of GPUs.
    pub gpus: Option<u32>,
}

/// One instance type as listed by the provider, in listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceTypeListing {
    /// Provider type identifier (e.g. `gpu_1x_a10`).
    pub type_id: String,
    /// Human description supplied by the provider.
    pub description: Option<String>,
    /// Hourly price in USD, if the provider reports one.
    pub hourly_price: Option<f64>,
    /// Hardware specifications.
    pub specs: Option<InstanceSpecs>,
    /// Regions currently holding capacity, in provider order.
    pub regions: Vec<String>,
}

/// A provider-side instance owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningInstance {
    /// Instance ID.
    pub id: String,
    /// Instance name, if one was given at launch.
    pub name: Option<String>,
    /// Instance type identifier.
    pub type_id: String,
    /// Public IP, present once the instance is active.
    pub ip_address: Option<String>,
    /// Region the instance runs in.
    pub region: Option<String>,
    /// Current status.
    pub status: InstanceStatus,
}

/// Request to launch one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Region to launch in.
    pub region_name: String,
    /// Instance type identifier.
    pub instance_type_name: String,
    /// SSH key names to inject.
    pub ssh_key_names: Vec<String>,
    /// Optional instance name.
    pub name: Option<String>,
}

/// Trait for GPU cloud providers.
///
/// Every method is a single request/response call. Implementations never retry.
#[async_trait]
pub trait GpuProvider: Send + Sync {
    /// List every instance type with the regions currently holding capacity.
    async fn list_instance_types(&self) -> Result<Vec<InstanceTypeListing>, GpuProviderError>;

    /// List the caller's instances, in any status.
    async fn list_instances(&self) -> Result<Vec<RunningInstance>, GpuProviderError>;

    /// Launch an instance. Returns the IDs the provider created.
    async fn launch(&self, req: LaunchRequest) -> Result<Vec<String>, GpuProviderError>;

    /// Terminate instances. Returns the IDs the provider reports as terminated.
    async fn terminate(&self, instance_ids: Vec<String>) -> Result<Vec<String>, GpuProviderError>;

    /// Prefix stripped from type identifiers when deriving display names.
    fn type_prefix(&self) -> Option<&str> {
        None
    }
}
