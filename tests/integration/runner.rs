use crate::integration::scenarios::{RequestInput, TestScenario};
use aggview::engine::pipeline::{AggregationSpec, PipelineEditor};
use aggview::engine::query::{AggregationRequestBuilder, GridQuery, parse_sort};
use aggview::engine::schema::FieldSchema;
use serde_json::Value;
use std::fmt::Write;
use tracing::info;

fn describe(fields: &[FieldSchema]) -> String {
    fields
        .iter()
        .map(|f| format!("{}:{}:{}", f.name, f.kind, f.type_name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_request(editor: &PipelineEditor, input: &RequestInput) -> String {
    let spec = AggregationSpec {
        id: Some("scenario".to_string()),
        data_source_id: "scenario-source".to_string(),
        pipeline: editor.pipeline().to_vec(),
        ..AggregationSpec::default()
    };
    let sort = match input.sort.as_deref().map(parse_sort).transpose() {
        Ok(sort) => sort.into_iter().collect(),
        Err(e) => return format!("request error: {}", e),
    };
    let query = GridQuery {
        data_source_id: spec.data_source_id.clone(),
        aggregation_id: "scenario".to_string(),
        page_size: input.page_size,
        skip: input.skip,
        sort,
        context_filters: input.context_filters.clone(),
        as_of: input.as_of.clone(),
    };
    let built = AggregationRequestBuilder::new(&spec, editor.output_fields())
        .with_dashboard_values(input.dashboard.clone().unwrap_or(Value::Null))
        .build(&query);
    match built {
        Ok(request) => format!(
            "request: {}",
            serde_json::to_string(&request).unwrap_or_default()
        ),
        Err(e) => format!("request error: {}", e),
    }
}

/// Renders the scenario as text: one line per stage, diagnostics, output
/// and the optional request.
pub fn render(scenario: &TestScenario) -> String {
    let editor = PipelineEditor::new(scenario.fields.clone(), scenario.pipeline.clone())
        .with_filter_fields(scenario.filter_fields.clone());

    let mut out = String::new();
    for issue in editor.field_issues() {
        let _ = writeln!(out, "fields error: {}", issue);
    }
    for (index, stage) in editor.pipeline().iter().enumerate() {
        let available = editor.fields_for(index).unwrap_or(&[]);
        let _ = writeln!(out, "stage {} {}: [{}]", index, stage.kind(), describe(available));
        for issue in editor.diagnostics_for(index) {
            let severity = if issue.is_blocking() { "error" } else { "warning" };
            let _ = writeln!(out, "stage {} {}: {}", index, severity, issue);
        }
    }
    let _ = writeln!(out, "output: [{}]", describe(editor.output_fields()));
    let _ = writeln!(out, "valid: {}", editor.is_valid());
    if let Some(input) = &scenario.request {
        let _ = writeln!(out, "{}", render_request(&editor, input));
    }
    out
}

pub fn run_scenario(scenario: &TestScenario) -> Result<(), String> {
    info!(target: "test_runner", "Running scenario: {}", scenario.name);
    let actual = render(scenario);

    let failed: Vec<String> = scenario
        .matchers
        .iter()
        .filter(|m| !m.matches(&actual))
        .map(|m| format!("{:?}", m))
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Scenario '{}' failed\nOutput:\n{}Failed matchers:\n{}",
            scenario.name,
            actual,
            failed.join("\n")
        ))
    }
}
