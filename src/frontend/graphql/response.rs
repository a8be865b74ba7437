use crate::engine::errors::NetworkError;
use crate::engine::query::request::AggregationRequest;
use crate::engine::query::response::AggregationPage;
use crate::engine::schema::metadata::ResourceMeta;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceData {
    pub resource: ResourceMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationData {
    pub records_aggregation: AggregationPage,
}

/// Variables for the `recordsAggregation` query.
pub fn aggregation_variables(request: &AggregationRequest) -> Value {
    json!({
        "resource": request.data_source_id,
        "aggregation": request.aggregation_id,
        "first": request.first,
        "skip": request.skip,
        "sortField": request.sort_field,
        "sortOrder": request.sort_order.map(|o| o.as_str()),
        "contextFilters": request.context_filters,
        "at": request.at,
    })
}

/// Turns an HTTP status and body into the query's data.
///
/// GraphQL `errors` win over everything else, also on non-2xx responses.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, NetworkError> {
    let parsed = serde_json::from_slice::<GraphqlResponse<T>>(body);

    if let Ok(GraphqlResponse {
        errors: Some(errors),
        ..
    }) = &parsed
    {
        if !errors.is_empty() {
            return Err(NetworkError::GraphQl(
                errors.iter().map(|e| e.message.clone()).collect(),
            ));
        }
    }

    if !(200..300).contains(&status) {
        return Err(NetworkError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    parsed
        .map_err(|e| NetworkError::Decode(e.to_string()))?
        .data
        .ok_or_else(|| NetworkError::Decode("response has no data".to_string()))
}
