//! Lambda Cloud GPU provider.
//!
//! Implements the [`GpuProvider`](crate::providers::GpuProvider) trait over the
//! Lambda Cloud v1 REST API.
//!
//! ## Example
//!
//! ```ignore
//! use lambda_gpu::config::ProviderConfig;
//! use lambda_gpu::providers::lambda::Lambda;
//! use lambda_gpu::providers::GpuProvider;
//!
//! let provider = Lambda::new(ProviderConfig::new(api_key))?;
//!
//! // Instance types, in API order, with regions holding capacity
//! let types = provider.list_instance_types().await?;
//! ```

mod client;
mod models;

pub use client::Lambda;
pub use models::*;
