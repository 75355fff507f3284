//! Workflow-level errors.

use thiserror::Error;

use crate::providers::GpuProviderError;

/// Errors returned by catalog, lifecycle and acquisition workflows.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport, decoding or configuration failure in the provider client.
    #[error(transparent)]
    Provider(#[from] GpuProviderError),

    /// The selection index does not resolve against the current snapshot.
    #[error("No available instance type has number {index} ({available} currently available). List instance types first.")]
    UnknownSelection { index: usize, available: usize },

    /// The selection index now points at a different type than the caller expected.
    #[error("Instance type number {index} is now {found}, not {expected}. List instance types again.")]
    SelectionMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// The offer has no region holding capacity.
    #[error("Instance type {0} has no region with available capacity")]
    NoRegion(String),

    /// Workflow settings that cannot be honoured.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Acquisition was cancelled before the target appeared.
    #[error("Acquisition cancelled after {polls} poll(s)")]
    Cancelled { polls: u32 },

    /// The remote shell could not be started.
    #[error("Failed to start remote shell: {0}")]
    Session(#[from] std::io::Error),
}

/// Result alias for workflow operations.
pub type Result<T> = std::result::Result<T, Error>;
