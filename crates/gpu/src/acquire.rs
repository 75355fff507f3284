//! Acquisition loop: wait for an instance type to have capacity, then launch it.
//!
//! ```text
//!   Polling ──(target available)──► Found ──► Launching ──► Done
//!      ▲  │
//!      └──┘ (not available: sleep poll_interval)
//! ```
//!
//! The loop has no iteration limit. Callers bound it through the
//! [`CancellationToken`]. A launch is attempted exactly once: whatever the
//! provider answers ends the loop. Capacity seen during a poll can be claimed
//! by another tenant before the launch lands; that shows up as a rejected
//! launch and is not retried.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::build_snapshot;
use crate::config::{AcquireConfig, LaunchConfig};
use crate::error::{Error, Result};
use crate::lifecycle::{launch, LaunchOutcome};
use crate::providers::GpuProvider;

/// Acquisition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquireState {
    /// Checking the catalog for the target type.
    Polling,
    /// Target type has capacity.
    Found,
    /// Launch call in flight.
    Launching,
    /// Launch attempted; the loop is over.
    Done,
}

impl std::fmt::Display for AcquireState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Found => write!(f, "found"),
            Self::Launching => write!(f, "launching"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// What an acquisition ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acquisition {
    /// Catalog polls performed, including the one that found the target.
    pub polls: u32,
    /// The single launch attempt.
    pub launch: LaunchOutcome,
}

fn transition(type_id: &str, from: AcquireState, to: AcquireState) -> AcquireState {
    debug!(type_id = %type_id, from = %from, to = %to, "Acquisition state change");
    to
}

/// Poll until `type_id` has capacity, then launch it once.
///
/// # Errors
/// - [`Error::InvalidConfig`] for a zero poll interval, before any call.
/// - [`Error::Cancelled`] when `cancel` fires before the target appears.
/// - Transport and decoding failures from any poll end the loop immediately.
pub async fn acquire<P>(
    provider: &P,
    launch_config: &LaunchConfig,
    config: &AcquireConfig,
    type_id: &str,
    cancel: CancellationToken,
) -> Result<Acquisition>
where
    P: GpuProvider + ?Sized,
{
    config.validate()?;

    info!(
        type_id = %type_id,
        interval_secs = config.poll_interval.as_secs(),
        "Waiting for capacity"
    );

    let mut state = AcquireState::Polling;
    let mut polls: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled { polls });
        }

        let snapshot = tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled { polls }),
            snapshot = build_snapshot(provider) => snapshot?,
        };
        polls += 1;

        if polls == 1 && !snapshot.contains_type(type_id) {
            warn!(type_id = %type_id, "Instance type is not in the catalog at all; check the name");
        }

        if let Some((_, offer)) = snapshot.find_available(type_id) {
            state = transition(type_id, state, AcquireState::Found);
            info!(
                type_id = %type_id,
                region = offer.region().unwrap_or_default(),
                polls,
                "Capacity available"
            );

            state = transition(type_id, state, AcquireState::Launching);
            let outcome = launch(provider, launch_config, offer).await?;
            transition(type_id, state, AcquireState::Done);

            return Ok(Acquisition {
                polls,
                launch: outcome,
            });
        }

        debug!(type_id = %type_id, polls, "No capacity yet");
        tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled { polls }),
            () = tokio::time::sleep(config.poll_interval) => {}
        }
    }
}
