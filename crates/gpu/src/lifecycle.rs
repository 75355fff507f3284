//! Instance lifecycle: launch, terminate, list and connect.
//!
//! Each operation is a single provider call. Structured provider rejections
//! come back as `Rejected` outcomes with code and message untouched; transport
//! and decoding failures are errors.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{build_snapshot, InstanceTypeOffer};
use crate::config::LaunchConfig;
use crate::error::{Error, Result};
use crate::providers::{
    GpuProvider, GpuProviderError, InstanceStatus, LaunchRequest, RunningInstance,
};
use crate::session::RemoteShell;

/// A well-formed call the provider refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderRejection {
    /// HTTP status of the refusal.
    pub status: u16,
    /// Provider error code, verbatim.
    pub code: String,
    /// Provider error message, verbatim.
    pub message: String,
}

impl std::fmt::Display for ProviderRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Split a provider error into a rejection or a hard failure.
fn into_rejection(err: GpuProviderError) -> Result<ProviderRejection> {
    match err {
        GpuProviderError::Api {
            status,
            code,
            message,
        } => Ok(ProviderRejection {
            status,
            code,
            message,
        }),
        other => Err(other.into()),
    }
}

/// Result of a launch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LaunchOutcome {
    /// The provider accepted the launch.
    Launched {
        /// IDs of the created instances.
        instance_ids: Vec<String>,
        /// Instance type launched.
        type_id: String,
        /// Region launched in.
        region: String,
    },
    /// The provider refused the launch.
    Rejected(ProviderRejection),
}

impl LaunchOutcome {
    /// True when the provider accepted the launch.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Launched { .. })
    }
}

/// Result of a terminate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TerminateOutcome {
    /// The provider is terminating these instances.
    Terminated { instance_ids: Vec<String> },
    /// The provider refused the termination.
    Rejected(ProviderRejection),
}

impl TerminateOutcome {
    /// True when the provider accepted the termination.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }
}

/// Result of a connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectOutcome {
    /// The session ran and exited with this code.
    Connected {
        instance_id: String,
        host: String,
        exit_code: Option<i32>,
    },
    /// No active instance with that id and an address.
    NotFound { instance_id: String },
}

/// Build the request for one offer.
pub fn launch_request(offer: &InstanceTypeOffer, config: &LaunchConfig) -> Result<LaunchRequest> {
    let region = offer
        .region()
        .ok_or_else(|| Error::NoRegion(offer.type_id.clone()))?;

    Ok(LaunchRequest {
        region_name: region.to_string(),
        instance_type_name: offer.type_id.clone(),
        ssh_key_names: config.ssh_key_names.clone(),
        name: config.instance_name.clone(),
    })
}

/// Launch one instance of `offer` in its first available region. No retry.
///
/// # Errors
/// [`Error::NoRegion`] without any call if the offer is unavailable; transport
/// failures propagate.
pub async fn launch<P>(
    provider: &P,
    config: &LaunchConfig,
    offer: &InstanceTypeOffer,
) -> Result<LaunchOutcome>
where
    P: GpuProvider + ?Sized,
{
    let req = launch_request(offer, config)?;
    let type_id = req.instance_type_name.clone();
    let region = req.region_name.clone();

    match provider.launch(req).await {
        Ok(instance_ids) => {
            info!(type_id = %type_id, region = %region, instance_ids = ?instance_ids, "Launched instance");
            Ok(LaunchOutcome::Launched {
                instance_ids,
                type_id,
                region,
            })
        }
        Err(err) => {
            let rejection = into_rejection(err)?;
            warn!(type_id = %type_id, code = %rejection.code, "Launch rejected");
            Ok(LaunchOutcome::Rejected(rejection))
        }
    }
}

/// Launch the offer behind a selection index in a freshly fetched snapshot.
///
/// When `expected_type` is given and the index now resolves to another type,
/// nothing is launched. A race remains between this check and the launch call:
/// the capacity can be claimed by another tenant in between, which surfaces
/// as a rejection.
///
/// # Errors
/// [`Error::UnknownSelection`] or [`Error::SelectionMismatch`] without any
/// launch call; transport failures propagate.
pub async fn launch_by_index<P>(
    provider: &P,
    config: &LaunchConfig,
    index: usize,
    expected_type: Option<&str>,
) -> Result<LaunchOutcome>
where
    P: GpuProvider + ?Sized,
{
    let snapshot = build_snapshot(provider).await?;

    let offer = snapshot.get(index).ok_or(Error::UnknownSelection {
        index,
        available: snapshot.len(),
    })?;

    if let Some(expected) = expected_type {
        if offer.type_id != expected {
            return Err(Error::SelectionMismatch {
                index,
                expected: expected.to_string(),
                found: offer.type_id.clone(),
            });
        }
    }

    launch(provider, config, offer).await
}

/// Terminate exactly one instance.
///
/// # Errors
/// Transport failures propagate; provider refusals are [`TerminateOutcome::Rejected`].
pub async fn terminate<P>(provider: &P, instance_id: &str) -> Result<TerminateOutcome>
where
    P: GpuProvider + ?Sized,
{
    match provider.terminate(vec![instance_id.to_string()]).await {
        Ok(instance_ids) => {
            info!(instance_id = %instance_id, "Terminated instance");
            Ok(TerminateOutcome::Terminated { instance_ids })
        }
        Err(err) => {
            let rejection = into_rejection(err)?;
            warn!(instance_id = %instance_id, code = %rejection.code, "Terminate rejected");
            Ok(TerminateOutcome::Rejected(rejection))
        }
    }
}

/// All of the caller's instances, whatever their status.
///
/// # Errors
/// Transport failures propagate.
pub async fn list_instances<P>(provider: &P) -> Result<Vec<RunningInstance>>
where
    P: GpuProvider + ?Sized,
{
    Ok(provider.list_instances().await?)
}

/// Active instances only. Empty means none running.
///
/// # Errors
/// Transport failures propagate.
pub async fn list_running<P>(provider: &P) -> Result<Vec<RunningInstance>>
where
    P: GpuProvider + ?Sized,
{
    let mut instances = list_instances(provider).await?;
    instances.retain(|i| i.status == InstanceStatus::Active);
    Ok(instances)
}

/// Open a remote shell on an active instance.
///
/// # Errors
/// Transport failures and a shell that cannot be spawned.
pub async fn connect<P, S>(provider: &P, shell: &S, instance_id: &str) -> Result<ConnectOutcome>
where
    P: GpuProvider + ?Sized,
    S: RemoteShell + ?Sized,
{
    let running = list_running(provider).await?;

    let Some(host) = running
        .iter()
        .find(|i| i.id == instance_id)
        .and_then(|i| i.ip_address.clone())
    else {
        return Ok(ConnectOutcome::NotFound {
            instance_id: instance_id.to_string(),
        });
    };

    let exit_code = shell.open(&host).await?;
    Ok(ConnectOutcome::Connected {
        instance_id: instance_id.to_string(),
        host,
        exit_code,
    })
}
