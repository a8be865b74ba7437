use crate::engine::errors::NetworkError;
use crate::engine::query::request::AggregationRequest;
use crate::engine::query::response::{AggregationBackend, AggregationPage};
use crate::engine::schema::catalog::{DEFAULT_MAX_DEPTH, IntrospectionEnvelope, TypeCatalog};
use crate::engine::schema::metadata::{MetadataSource, ResourceMeta};
use crate::frontend::graphql::queries::{GET_AGGREGATION_DATA, GET_RESOURCE, INTROSPECTION};
use crate::frontend::graphql::response::{
    AggregationData, ResourceData, aggregation_variables, decode_response,
};
use crate::shared::config::Settings;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Uri, header};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// GraphQL-over-HTTP client for the metadata and aggregation APIs.
///
/// The type catalog is introspected once and shared for the client's lifetime.
pub struct GraphqlClient {
    endpoint: Uri,
    auth_token: Option<String>,
    timeout: Duration,
    max_depth: usize,
    http: Client<HttpConnector, Full<Bytes>>,
    catalog: OnceCell<Arc<TypeCatalog>>,
}

impl GraphqlClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let endpoint = endpoint
            .parse::<Uri>()
            .map_err(|e| NetworkError::Transport(format!("Invalid endpoint {}: {}", endpoint, e)))?;
        let http: Client<HttpConnector, Full<Bytes>> =
            Client::builder(TokioExecutor::new())
                .pool_idle_timeout(Duration::from_secs(30))
                .build_http();
        Ok(Self {
            endpoint,
            auth_token: None,
            timeout,
            max_depth: DEFAULT_MAX_DEPTH,
            http,
            catalog: OnceCell::new(),
        })
    }

    pub fn from_config(settings: &Settings) -> Result<Self, NetworkError> {
        let client = Self::new(
            &settings.backend.endpoint,
            Duration::from_millis(settings.backend.timeout_ms),
        )?
        .with_max_depth(settings.schema.max_depth);
        Ok(match settings.backend.auth_token.as_deref() {
            Some(token) => client.with_auth_token(token),
            None => client,
        })
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, NetworkError> {
        let payload = json!({ "query": query, "variables": variables }).to_string();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.auth_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = builder
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let started = Instant::now();
        let res = tokio::time::timeout(self.timeout, self.http.request(req))
            .await
            .map_err(|_| NetworkError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res
            .into_body()
            .collect()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?
            .to_bytes();

        debug!(
            target: "aggview::graphql",
            operation,
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "GraphQL response received"
        );

        decode_response(status, &body).inspect_err(|e| {
            warn!(target: "aggview::graphql", operation, error = %e, "GraphQL request failed");
        })
    }
}

#[async_trait]
impl AggregationBackend for GraphqlClient {
    async fn fetch(&self, request: &AggregationRequest) -> Result<AggregationPage, NetworkError> {
        let data: AggregationData = self
            .execute(
                "getAggregationData",
                GET_AGGREGATION_DATA,
                aggregation_variables(request),
            )
            .await?;
        Ok(data.records_aggregation)
    }
}

#[async_trait]
impl MetadataSource for GraphqlClient {
    async fn resource(&self, id: &str) -> Result<ResourceMeta, NetworkError> {
        let data: ResourceData = self
            .execute("getResource", GET_RESOURCE, json!({ "id": id }))
            .await?;
        Ok(data.resource)
    }

    async fn catalog(&self) -> Result<Arc<TypeCatalog>, NetworkError> {
        self.catalog
            .get_or_try_init(|| async {
                let envelope: IntrospectionEnvelope = self
                    .execute("introspection", INTROSPECTION, json!({}))
                    .await?;
                let catalog =
                    TypeCatalog::from(envelope.schema).with_max_depth(self.max_depth);
                info!(
                    target: "aggview::graphql",
                    max_depth = self.max_depth,
                    "Type catalog loaded"
                );
                Ok::<_, NetworkError>(Arc::new(catalog))
            })
            .await
            .cloned()
    }
}
