use crate::engine::errors::NetworkError;
use crate::engine::query::request::AggregationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One window of aggregated rows plus the total across all windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationPage {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub total_count: usize,
}

/// Executes aggregation requests. Implemented by the GraphQL client and by
/// test doubles.
#[async_trait]
pub trait AggregationBackend: Send + Sync {
    async fn fetch(&self, request: &AggregationRequest) -> Result<AggregationPage, NetworkError>;
}
