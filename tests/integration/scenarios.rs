use crate::integration::matcher::Matcher;
use aggview::engine::pipeline::StageDefinition;
use aggview::engine::schema::FieldSchema;
use serde::Deserialize;
use serde_json::Value;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct TestScenario {
    pub name: String,
    /// Fields of the resource before the first stage
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub filter_fields: Vec<FieldSchema>,
    pub pipeline: Vec<StageDefinition>,
    /// Optional grid request built against the pipeline output
    #[serde(default)]
    pub request: Option<RequestInput>,
    pub matchers: Vec<Matcher>,
}

#[derive(Debug, Deserialize)]
pub struct RequestInput {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub context_filters: Option<Value>,
    #[serde(default)]
    pub dashboard: Option<Value>,
    #[serde(default)]
    pub as_of: Option<String>,
}

fn default_page_size() -> usize {
    10
}

pub fn load_scenarios_from_json(path: &str) -> Vec<TestScenario> {
    let content = fs::read_to_string(path).expect("Failed to read scenario file");
    serde_json::from_str(&content).expect("Invalid JSON format")
}
