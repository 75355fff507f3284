//! Scripted in-memory provider for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::providers::{
    GpuProvider, GpuProviderError, InstanceStatus, InstanceTypeListing, LaunchRequest,
    RunningInstance,
};

/// A call the fake provider received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListInstanceTypes,
    ListInstances,
    Launch(LaunchRequest),
    Terminate(Vec<String>),
}

/// Provider that replays scripted responses and records every call.
#[derive(Default)]
pub struct FakeProvider {
    catalogs: Mutex<VecDeque<Result<Vec<InstanceTypeListing>, GpuProviderError>>>,
    instances: Mutex<Vec<RunningInstance>>,
    rejection: Mutex<Option<(String, String)>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one `list_instance_types` response. Once the queue runs dry the
    /// catalog is empty.
    pub fn push_catalog(&self, listings: Vec<InstanceTypeListing>) -> &Self {
        self.catalogs.lock().unwrap().push_back(Ok(listings));
        self
    }

    pub fn push_catalog_error(&self, error: GpuProviderError) -> &Self {
        self.catalogs.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn set_instances(&self, instances: Vec<RunningInstance>) -> &Self {
        *self.instances.lock().unwrap() = instances;
        self
    }

    /// Make launch and terminate answer with a structured error.
    pub fn reject_with(&self, code: &str, message: &str) -> &Self {
        *self.rejection.lock().unwrap() = Some((code.to_string(), message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn launches(&self) -> Vec<LaunchRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Launch(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn rejection(&self) -> Option<GpuProviderError> {
        self.rejection
            .lock()
            .unwrap()
            .clone()
            .map(|(code, message)| GpuProviderError::Api {
                status: 400,
                code,
                message,
            })
    }
}

#[async_trait]
impl GpuProvider for FakeProvider {
    async fn list_instance_types(&self) -> Result<Vec<InstanceTypeListing>, GpuProviderError> {
        self.record(Call::ListInstanceTypes);
        self.catalogs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_instances(&self) -> Result<Vec<RunningInstance>, GpuProviderError> {
        self.record(Call::ListInstances);
        Ok(self.instances.lock().unwrap().clone())
    }

    async fn launch(&self, req: LaunchRequest) -> Result<Vec<String>, GpuProviderError> {
        self.record(Call::Launch(req));
        match self.rejection() {
            Some(err) => Err(err),
            None => Ok(vec!["instance-1".to_string()]),
        }
    }

    async fn terminate(&self, instance_ids: Vec<String>) -> Result<Vec<String>, GpuProviderError> {
        self.record(Call::Terminate(instance_ids.clone()));
        match self.rejection() {
            Some(err) => Err(err),
            None => Ok(instance_ids),
        }
    }
}

pub fn listing(type_id: &str, regions: &[&str]) -> InstanceTypeListing {
    InstanceTypeListing {
        type_id: type_id.to_string(),
        description: None,
        hourly_price: Some(1.10),
        specs: None,
        regions: regions.iter().map(ToString::to_string).collect(),
    }
}

pub fn instance(id: &str, ip: Option<&str>, status: InstanceStatus) -> RunningInstance {
    RunningInstance {
        id: id.to_string(),
        name: None,
        type_id: "gpu_1x_a10".to_string(),
        ip_address: ip.map(ToString::to_string),
        region: Some("us-west-1".to_string()),
        status,
    }
}
