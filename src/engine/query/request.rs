use crate::engine::errors::ValidationError;
use crate::engine::pipeline::spec::AggregationSpec;
use crate::engine::pipeline::stage::{SortOrder, StageDefinition};
use crate::engine::query::context::{inject_context, resolve_as_of};
use crate::engine::schema::types::{FieldSchema, find_field};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Grid column sort as reported by the grid; `dir: None` means unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<SortOrder>,
}

impl SortDescriptor {
    pub fn new(field: &str, dir: SortOrder) -> Self {
        Self {
            field: field.to_string(),
            dir: Some(dir),
        }
    }
}

/// Everything the grid knows when it asks for a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridQuery {
    pub data_source_id: String,
    pub aggregation_id: String,
    pub page_size: usize,
    pub skip: usize,
    pub sort: Vec<SortDescriptor>,
    pub context_filters: Option<Value>,
    pub as_of: Option<String>,
}

impl GridQuery {
    /// First descriptor carrying a direction.
    pub fn active_sort(&self) -> Option<(&str, SortOrder)> {
        self.sort
            .iter()
            .find_map(|s| s.dir.map(|dir| (s.field.as_str(), dir)))
    }
}

/// Wire request for one page of aggregated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRequest {
    pub data_source_id: String,
    pub aggregation_id: String,
    pub pipeline: Vec<StageDefinition>,
    pub source_fields: Vec<String>,
    pub first: usize,
    pub skip: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_filters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
}

/// Builds wire requests for one spec. The spec is only read; context filters
/// are attached to the request as an overlay.
pub struct AggregationRequestBuilder<'a> {
    spec: &'a AggregationSpec,
    output_fields: &'a [FieldSchema],
    dashboard: Value,
}

impl<'a> AggregationRequestBuilder<'a> {
    /// `output_fields` are the fields after the aggregation's last stage.
    pub fn new(spec: &'a AggregationSpec, output_fields: &'a [FieldSchema]) -> Self {
        Self {
            spec,
            output_fields,
            dashboard: Value::Null,
        }
    }

    pub fn with_dashboard_values(mut self, dashboard: Value) -> Self {
        self.dashboard = dashboard;
        self
    }

    pub fn build(&self, query: &GridQuery) -> Result<AggregationRequest, ValidationError> {
        if query.page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }

        let (sort_field, sort_order) = match query.active_sort() {
            Some((field, order)) => {
                self.check_sort_field(field)?;
                (Some(field.to_string()), Some(order))
            }
            None => (None, None),
        };

        let context_filters = query
            .context_filters
            .as_ref()
            .map(|filters| inject_context(filters, &self.dashboard));
        let at = query
            .as_of
            .as_deref()
            .and_then(|raw| resolve_as_of(raw, &self.dashboard));

        debug!(
            target: "aggview::query",
            aggregation = %query.aggregation_id,
            first = query.page_size,
            skip = query.skip,
            sort_field = ?sort_field,
            has_context = context_filters.is_some(),
            at = ?at,
            "Built aggregation request"
        );

        Ok(AggregationRequest {
            data_source_id: query.data_source_id.clone(),
            aggregation_id: query.aggregation_id.clone(),
            pipeline: self.spec.pipeline.clone(),
            source_fields: self.spec.source_fields.clone(),
            first: query.page_size,
            skip: query.skip,
            sort_field,
            sort_order,
            context_filters,
            at,
        })
    }

    /// Same rule as a Sort stage: a top-level scalar of the output.
    fn check_sort_field(&self, field: &str) -> Result<(), ValidationError> {
        match find_field(self.output_fields, field) {
            None => Err(ValidationError::SortFieldMissing(field.to_string())),
            Some(f) if !f.is_scalar() => Err(ValidationError::SortFieldNotScalar(field.to_string())),
            Some(_) => Ok(()),
        }
    }
}

/// Parses `field:dir` (dir defaults to asc).
pub fn parse_sort(raw: &str) -> Result<SortDescriptor, ValidationError> {
    let (field, dir) = match raw.split_once(':') {
        Some((field, dir)) => (field.trim(), dir.trim()),
        None => (raw.trim(), "asc"),
    };
    if field.is_empty() {
        return Err(ValidationError::MissingValue("sort.field".to_string()));
    }
    let dir = match dir.to_ascii_lowercase().as_str() {
        "asc" => SortOrder::Asc,
        "desc" => SortOrder::Desc,
        _ => return Err(ValidationError::InvalidSortOrder(dir.to_string())),
    };
    Ok(SortDescriptor::new(field, dir))
}
