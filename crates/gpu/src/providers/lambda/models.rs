//! Lambda Cloud API models.
//!
//! Every successful response wraps its payload in `data`; failures carry an
//! `error` object.

use serde::{Deserialize, Serialize};

// ============================================================================
// Common wrapper types
// ============================================================================

/// Successful response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Response data.
    pub data: T,
}

/// Error response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// Structured API error.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable code (e.g. `global/quota-exceeded`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional hint from the provider.
    pub suggestion: Option<String>,
}

// ============================================================================
// Instance type types
// ============================================================================

/// Value of one entry in the `instance-types` map.
#[derive(Debug, Deserialize)]
pub struct InstanceTypeEntry {
    /// Instance type details.
    pub instance_type: InstanceTypeDetails,
    /// Regions that can currently launch this type.
    #[serde(default)]
    pub regions_with_capacity_available: Vec<Region>,
}

/// Instance type details.
#[derive(Debug, Deserialize)]
pub struct InstanceTypeDetails {
    /// Type name (e.g. `gpu_1x_a10`).
    pub name: String,
    /// Description (e.g. `1x A10 (24 GB PCIe)`).
    pub description: Option<String>,
    /// Price in US cents per hour.
    pub price_cents_per_hour: Option<u64>,
    /// Hardware specs.
    pub specs: Option<InstanceTypeSpecs>,
}

/// Instance type hardware specs.
#[derive(Debug, Deserialize)]
pub struct InstanceTypeSpecs {
    /// Number of virtual CPUs.
    pub vcpus: Option<u32>,
    /// Memory in GiB.
    pub memory_gib: Option<u32>,
    /// Storage in GiB.
    pub storage_gib: Option<u32>,
    /// Number of GPUs.
    pub gpus: Option<u32>,
}

/// Region reference.
#[derive(Debug, Deserialize)]
pub struct Region {
    /// Region name (e.g. `us-west-1`).
    pub name: String,
    /// Region description (e.g. `California, USA`).
    pub description: Option<String>,
}

// ============================================================================
// Instance types
// ============================================================================

/// Instance resource from `GET instances`.
#[derive(Debug, Deserialize)]
pub struct InstanceResource {
    /// Instance ID.
    pub id: String,
    /// Instance name.
    pub name: Option<String>,
    /// Public IPv4 address.
    pub ip: Option<String>,
    /// Status string.
    pub status: String,
    /// Region.
    pub region: Option<Region>,
    /// Instance type.
    pub instance_type: InstanceTypeRef,
}

/// Instance type reference embedded in an instance.
#[derive(Debug, Deserialize)]
pub struct InstanceTypeRef {
    /// Type name.
    pub name: String,
}

// ============================================================================
// Instance operation types
// ============================================================================

/// Request body for `POST instance-operations/launch`.
#[derive(Debug, Serialize)]
pub struct LaunchBody {
    /// Region to launch in.
    pub region_name: String,
    /// Instance type name.
    pub instance_type_name: String,
    /// SSH key names to inject.
    pub ssh_key_names: Vec<String>,
    /// Number of instances.
    pub quantity: u32,
    /// Optional instance name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Launch response data.
#[derive(Debug, Deserialize)]
pub struct LaunchData {
    /// Created instance IDs.
    #[serde(default)]
    pub instance_ids: Vec<String>,
}

/// Request body for `POST instance-operations/terminate`.
#[derive(Debug, Serialize)]
pub struct TerminateBody {
    /// Instances to terminate.
    pub instance_ids: Vec<String>,
}

/// Terminate response data.
#[derive(Debug, Deserialize)]
pub struct TerminateData {
    /// Instances the provider is terminating.
    #[serde(default)]
    pub terminated_instances: Vec<TerminatedInstance>,
}

/// Terminated instance entry.
#[derive(Debug, Deserialize)]
pub struct TerminatedInstance {
    /// Instance ID.
    pub id: String,
}
