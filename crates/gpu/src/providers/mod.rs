//! GPU provider implementations.
//!
//! This module contains the [`GpuProvider`] trait and the Lambda Cloud
//! implementation.

pub mod lambda;
pub mod traits;

pub use traits::{
    GpuProvider, GpuProviderError, InstanceSpecs, InstanceStatus, InstanceTypeListing,
    LaunchRequest, RunningInstance,
};
