use crate::engine::errors::ValidationError;
use crate::engine::pipeline::propagation::{StageDiagnostic, StageIssue};
use crate::engine::pipeline::stage::StageDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chart axes bound to output fields of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
}

impl Mapping {
    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "category" => Some(&self.category),
            "field" => Some(&self.field),
            "series" => self.series.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingField {
    pub name: &'static str,
    pub required: bool,
}

/// Mapping entries a widget of `widget_type` exposes.
pub fn mapping_fields(widget_type: &str) -> Vec<MappingField> {
    let mut fields = vec![
        MappingField {
            name: "category",
            required: true,
        },
        MappingField {
            name: "field",
            required: true,
        },
    ];
    if matches!(widget_type, "bar" | "column" | "line") {
        fields.push(MappingField {
            name: "series",
            required: false,
        });
    }
    fields
}

/// The persisted aggregation. Derived per-stage fields are never part of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub data_source_id: String,
    #[serde(default)]
    pub source_fields: Vec<String>,
    #[serde(default)]
    pub pipeline: Vec<StageDefinition>,
    #[serde(default)]
    pub mapping: Mapping,
}

/// Everything blocking a save, split between spec-level and per-stage problems.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecIssues {
    pub spec: Vec<ValidationError>,
    pub stages: Vec<StageDiagnostic>,
}

impl SpecIssues {
    pub fn is_empty(&self) -> bool {
        self.spec.is_empty() && self.stages.is_empty()
    }
}

impl fmt::Display for SpecIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.spec {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}", e)?;
            first = false;
        }
        for d in &self.stages {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "stage {}: {}", d.stage, d.issue)?;
            first = false;
        }
        Ok(())
    }
}

impl AggregationSpec {
    /// Save-time checks that need no schema: required values, stage
    /// configuration and the mapping entries `widget_type` requires.
    pub fn validate(&self, widget_type: &str) -> Result<(), SpecIssues> {
        let mut issues = SpecIssues::default();

        if self.data_source_id.trim().is_empty() {
            issues
                .spec
                .push(ValidationError::MissingValue("dataSourceId".to_string()));
        }
        if self.source_fields.is_empty() {
            issues
                .spec
                .push(ValidationError::MissingValue("sourceFields".to_string()));
        }
        for entry in mapping_fields(widget_type) {
            let filled = self
                .mapping
                .value(entry.name)
                .is_some_and(|v| !v.trim().is_empty());
            if entry.required && !filled {
                issues.spec.push(ValidationError::MissingValue(format!(
                    "mapping.{}",
                    entry.name
                )));
            }
        }
        for (index, stage) in self.pipeline.iter().enumerate() {
            issues
                .stages
                .extend(stage.validate().into_iter().map(|e| StageDiagnostic {
                    stage: index,
                    issue: StageIssue::Validation(e),
                }));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
