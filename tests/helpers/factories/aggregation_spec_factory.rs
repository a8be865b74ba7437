use crate::engine::pipeline::spec::{AggregationSpec, Mapping};
use crate::engine::pipeline::stage::StageDefinition;

/// Factory for creating `AggregationSpec` values in tests
pub struct AggregationSpecFactory {
    id: Option<String>,
    data_source_id: String,
    source_fields: Vec<String>,
    pipeline: Vec<StageDefinition>,
    mapping: Mapping,
}

impl AggregationSpecFactory {
    pub fn new() -> Self {
        Self {
            id: Some("agg-1".to_string()),
            data_source_id: "incidents".to_string(),
            source_fields: vec!["region".to_string(), "severity".to_string()],
            pipeline: Vec::new(),
            mapping: Mapping {
                category: "region".to_string(),
                field: "count".to_string(),
                series: None,
            },
        }
    }

    pub fn with_id(mut self, id: Option<&str>) -> Self {
        self.id = id.map(str::to_string);
        self
    }

    pub fn with_data_source(mut self, id: &str) -> Self {
        self.data_source_id = id.to_string();
        self
    }

    pub fn with_source_fields(mut self, fields: &[&str]) -> Self {
        self.source_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_stage(mut self, stage: StageDefinition) -> Self {
        self.pipeline.push(stage);
        self
    }

    pub fn with_pipeline(mut self, pipeline: Vec<StageDefinition>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_mapping(mut self, category: &str, field: &str, series: Option<&str>) -> Self {
        self.mapping = Mapping {
            category: category.to_string(),
            field: field.to_string(),
            series: series.map(str::to_string),
        };
        self
    }

    pub fn create(self) -> AggregationSpec {
        AggregationSpec {
            id: self.id,
            data_source_id: self.data_source_id,
            source_fields: self.source_fields,
            pipeline: self.pipeline,
            mapping: self.mapping,
        }
    }
}
