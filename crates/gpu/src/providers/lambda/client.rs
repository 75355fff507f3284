//! Lambda Cloud API client implementation.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use super::models::{
    ApiErrorResponse, ApiResponse, InstanceResource, InstanceTypeEntry, LaunchBody, LaunchData,
    TerminateBody, TerminateData,
};
use crate::config::ProviderConfig;
use crate::providers::traits::{
    GpuProvider, GpuProviderError, InstanceSpecs, InstanceTypeListing, LaunchRequest,
    RunningInstance,
};

/// Lambda Cloud GPU provider.
#[derive(Clone)]
pub struct Lambda {
    /// HTTP client.
    client: Client,
    /// API root, always ending in `/`.
    base_url: Url,
    /// API key for authentication.
    api_key: String,
}

impl Lambda {
    /// Create a new Lambda provider from explicit configuration.
    ///
    /// # Errors
    /// Returns error if the config is invalid or the HTTP client cannot be created.
    pub fn new(config: ProviderConfig) -> Result<Self, GpuProviderError> {
        let base_url = config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    fn url(&self, path: &str) -> Result<Url, GpuProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| GpuProviderError::Config(format!("invalid API path {path}: {e}")))
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, GpuProviderError> {
        let url = self.url(path)?;
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, GpuProviderError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let url = self.url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response, parsing JSON or the structured error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GpuProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                GpuProviderError::Serialization(e)
            })
        } else {
            Err(Self::decode_error(status.as_u16(), &text))
        }
    }

    /// Turn an error body into [`GpuProviderError::Api`], keeping code and message verbatim.
    pub(crate) fn decode_error(status: u16, body: &str) -> GpuProviderError {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(parsed) => {
                if let Some(suggestion) = &parsed.error.suggestion {
                    debug!(code = %parsed.error.code, suggestion = %suggestion, "Provider suggestion");
                }
                GpuProviderError::Api {
                    status,
                    code: parsed.error.code,
                    message: parsed.error.message,
                }
            }
            Err(_) => GpuProviderError::Api {
                status,
                code: format!("http_{status}"),
                message: body.to_string(),
            },
        }
    }

    /// Convert one `instance-types` entry to our listing type.
    fn to_listing(entry: InstanceTypeEntry) -> InstanceTypeListing {
        let details = entry.instance_type;
        InstanceTypeListing {
            type_id: details.name,
            description: details.description,
            hourly_price: details
                .price_cents_per_hour
                .map(|cents| cents as f64 / 100.0),
            specs: details.specs.map(|s| InstanceSpecs {
                vcpus: s.vcpus,
                memory_gib: s.memory_gib,
                storage_gib: s.storage_gib,
                gpus: s.gpus,
            }),
            regions: entry
                .regions_with_capacity_available
                .into_iter()
                .map(|r| r.name)
                .collect(),
        }
    }

    /// Convert API instance resource to our `RunningInstance` type.
    fn to_instance(resource: InstanceResource) -> RunningInstance {
        RunningInstance {
            id: resource.id,
            name: resource.name,
            type_id: resource.instance_type.name,
            ip_address: resource.ip,
            region: resource.region.map(|r| r.name),
            status: resource.status.into(),
        }
    }
}

#[async_trait]
impl GpuProvider for Lambda {
    async fn list_instance_types(&self) -> Result<Vec<InstanceTypeListing>, GpuProviderError> {
        // Kept as a raw map so the listing order matches the response body.
        let response: ApiResponse<serde_json::Map<String, serde_json::Value>> =
            self.get("instance-types").await?;

        response
            .data
            .into_iter()
            .map(|(_, value)| {
                serde_json::from_value::<InstanceTypeEntry>(value)
                    .map(Self::to_listing)
                    .map_err(GpuProviderError::Serialization)
            })
            .collect()
    }

    async fn list_instances(&self) -> Result<Vec<RunningInstance>, GpuProviderError> {
        let response: ApiResponse<Vec<InstanceResource>> = self.get("instances").await?;
        Ok(response.data.into_iter().map(Self::to_instance).collect())
    }

    async fn launch(&self, req: LaunchRequest) -> Result<Vec<String>, GpuProviderError> {
        info!(
            instance_type = %req.instance_type_name,
            region = %req.region_name,
            "Launching instance"
        );

        let body = LaunchBody {
            region_name: req.region_name,
            instance_type_name: req.instance_type_name,
            ssh_key_names: req.ssh_key_names,
            quantity: 1,
            name: req.name,
        };

        let response: ApiResponse<LaunchData> =
            self.post("instance-operations/launch", &body).await?;

        info!(instance_ids = ?response.data.instance_ids, "Instance launch accepted");
        Ok(response.data.instance_ids)
    }

    async fn terminate(&self, instance_ids: Vec<String>) -> Result<Vec<String>, GpuProviderError> {
        info!(instance_ids = ?instance_ids, "Terminating instances");

        let body = TerminateBody { instance_ids };
        let response: ApiResponse<TerminateData> =
            self.post("instance-operations/terminate", &body).await?;

        Ok(response
            .data
            .terminated_instances
            .into_iter()
            .map(|i| i.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::traits::InstanceStatus;

    #[test]
    fn test_decode_structured_error() {
        let body = r#"{"error":{"code":"global/quota-exceeded","message":"Quota exceeded","suggestion":"Contact support"}}"#;
        match Lambda::decode_error(400, body) {
            GpuProviderError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "global/quota-exceeded");
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unstructured_error() {
        match Lambda::decode_error(502, "Bad Gateway") {
            GpuProviderError::Api { code, message, .. } => {
                assert_eq!(code, "http_502");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_to_listing_converts_price_and_regions() {
        let entry: InstanceTypeEntry = serde_json::from_value(serde_json::json!({
            "instance_type": {
                "name": "gpu_1x_a10",
                "description": "1x A10 (24 GB PCIe)",
                "price_cents_per_hour": 75,
                "specs": {"vcpus": 30, "memory_gib": 200, "storage_gib": 1400, "gpus": 1}
            },
            "regions_with_capacity_available": [
                {"name": "us-west-1", "description": "California, USA"},
                {"name": "us-east-1", "description": "Virginia, USA"}
            ]
        }))
        .unwrap();

        let listing = Lambda::to_listing(entry);
        assert_eq!(listing.type_id, "gpu_1x_a10");
        assert_eq!(listing.hourly_price, Some(0.75));
        assert_eq!(listing.regions, vec!["us-west-1", "us-east-1"]);
        assert_eq!(listing.specs.unwrap().gpus, Some(1));
    }

    #[test]
    fn test_to_listing_without_price() {
        let entry: InstanceTypeEntry = serde_json::from_value(serde_json::json!({
            "instance_type": {"name": "gpu_8x_a100"}
        }))
        .unwrap();

        let listing = Lambda::to_listing(entry);
        assert_eq!(listing.hourly_price, None);
        assert!(listing.regions.is_empty());
    }

    #[test]
    fn test_to_instance_passes_unknown_status_through() {
        let resource: InstanceResource = serde_json::from_value(serde_json::json!({
            "id": "0920582c7ff041399e34823a0be62549",
            "status": "rebooting",
            "instance_type": {"name": "gpu_1x_a10"}
        }))
        .unwrap();

        let instance = Lambda::to_instance(resource);
        assert_eq!(instance.status, InstanceStatus::Other("rebooting".to_string()));
        assert_eq!(instance.status.to_string(), "rebooting");
        assert!(instance.ip_address.is_none());
    }
}
