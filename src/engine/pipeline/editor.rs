use crate::engine::errors::{EngineError, SchemaError, ValidationError};
use crate::engine::pipeline::propagation::{
    Propagation, StageDiagnostic, StageIssue, fields_per_stage,
};
use crate::engine::pipeline::spec::AggregationSpec;
use crate::engine::pipeline::stage::{StageDefinition, StageKind};
use crate::engine::schema::metadata::{MetadataSource, load_source_fields};
use crate::engine::schema::types::FieldSchema;
use tracing::{debug, info, warn};

/// Owns the pipeline being edited and the fields valid at each of its positions.
///
/// `fields_per_stage` is derived state: it is rebuilt whenever the initial
/// fields, the filter fields or the pipeline change by value, and is never
/// written back into the aggregation spec.
#[derive(Debug, Clone)]
pub struct PipelineEditor {
    initial_fields: Vec<FieldSchema>,
    filter_fields: Vec<FieldSchema>,
    pipeline: Vec<StageDefinition>,
    fields_per_stage: Vec<Vec<FieldSchema>>,
    output: Propagation,
    diagnostics: Vec<StageDiagnostic>,
    field_issues: Vec<SchemaError>,
}

impl PipelineEditor {
    pub fn new(initial_fields: Vec<FieldSchema>, pipeline: Vec<StageDefinition>) -> Self {
        let mut editor = Self {
            initial_fields,
            filter_fields: Vec::new(),
            pipeline,
            fields_per_stage: Vec::new(),
            output: Propagation::default(),
            diagnostics: Vec::new(),
            field_issues: Vec::new(),
        };
        editor.recompute();
        editor
    }

    /// Opens an editor for `spec`, loading its source fields first.
    /// A metadata failure means there is nothing to edit against.
    pub async fn open(
        source: &dyn MetadataSource,
        spec: &AggregationSpec,
    ) -> Result<Self, EngineError> {
        let fields = load_source_fields(source, &spec.data_source_id, &spec.source_fields)
            .await
            .inspect_err(|e| e.log_error())?;
        info!(
            target: "aggview::editor",
            data_source = %spec.data_source_id,
            fields = fields.len(),
            stages = spec.pipeline.len(),
            "Pipeline editor opened"
        );
        Ok(Self::new(fields, spec.pipeline.clone()))
    }

    pub fn with_filter_fields(mut self, filter_fields: Vec<FieldSchema>) -> Self {
        self.set_filter_fields(filter_fields);
        self
    }

    pub fn pipeline(&self) -> &[StageDefinition] {
        &self.pipeline
    }

    pub fn initial_fields(&self) -> &[FieldSchema] {
        &self.initial_fields
    }

    /// Returns true when the value changed and fields were recomputed.
    pub fn set_initial_fields(&mut self, fields: Vec<FieldSchema>) -> bool {
        if self.initial_fields == fields {
            return false;
        }
        self.initial_fields = fields;
        self.recompute();
        true
    }

    pub fn set_filter_fields(&mut self, fields: Vec<FieldSchema>) -> bool {
        if self.filter_fields == fields {
            return false;
        }
        self.filter_fields = fields;
        self.recompute();
        true
    }

    pub fn set_pipeline(&mut self, pipeline: Vec<StageDefinition>) -> bool {
        if self.pipeline == pipeline {
            return false;
        }
        self.pipeline = pipeline;
        self.recompute();
        true
    }

    /// Appends a default-configured stage and returns its index.
    pub fn add_stage(&mut self, kind: StageKind) -> usize {
        self.pipeline.push(StageDefinition::default_for(kind));
        self.recompute();
        self.pipeline.len() - 1
    }

    pub fn delete_stage(&mut self, index: usize) -> Result<StageDefinition, ValidationError> {
        self.check_index(index)?;
        let removed = self.pipeline.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// Moves the stage at `from` so that it ends up at `to`.
    pub fn move_stage(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let stage = self.pipeline.remove(from);
        self.pipeline.insert(to, stage);
        self.recompute();
        Ok(())
    }

    /// Replaces one stage's configuration; returns true when it changed.
    pub fn update_stage(
        &mut self,
        index: usize,
        stage: StageDefinition,
    ) -> Result<bool, ValidationError> {
        self.check_index(index)?;
        if self.pipeline[index] == stage {
            return Ok(false);
        }
        self.pipeline[index] = stage;
        self.recompute();
        Ok(true)
    }

    /// Fields the form of stage `index` may reference.
    pub fn fields_for(&self, index: usize) -> Option<&[FieldSchema]> {
        self.fields_per_stage.get(index).map(Vec::as_slice)
    }

    pub fn fields_per_stage(&self) -> &[Vec<FieldSchema>] {
        &self.fields_per_stage
    }

    /// Fields produced by the whole pipeline.
    pub fn output_fields(&self) -> &[FieldSchema] {
        &self.output.fields
    }

    pub fn output(&self) -> &Propagation {
        &self.output
    }

    pub fn diagnostics(&self) -> &[StageDiagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_for(&self, index: usize) -> impl Iterator<Item = &StageIssue> {
        self.diagnostics
            .iter()
            .filter(move |d| d.stage == index)
            .map(|d| &d.issue)
    }

    /// Shape problems in the initial or filter fields themselves.
    pub fn field_issues(&self) -> &[SchemaError] {
        &self.field_issues
    }

    /// True when the fields are well formed and no stage carries a blocking issue.
    pub fn is_valid(&self) -> bool {
        self.field_issues.is_empty() && !self.diagnostics.iter().any(|d| d.issue.is_blocking())
    }

    /// A copy of `spec` carrying the edited pipeline.
    pub fn apply_to(&self, spec: &AggregationSpec) -> AggregationSpec {
        AggregationSpec {
            pipeline: self.pipeline.clone(),
            ..spec.clone()
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index >= self.pipeline.len() {
            return Err(ValidationError::StageOutOfBounds {
                index,
                len: self.pipeline.len(),
            });
        }
        Ok(())
    }

    fn recompute(&mut self) {
        self.field_issues = self
            .initial_fields
            .iter()
            .chain(&self.filter_fields)
            .filter_map(|f| f.validate().err())
            .collect();
        for issue in &self.field_issues {
            warn!(target: "aggview::editor", error = %issue, "Malformed field schema");
        }

        let stage_fields =
            fields_per_stage(&self.initial_fields, &self.filter_fields, &self.pipeline);

        let mut diagnostics = Vec::new();
        for (index, stage) in self.pipeline.iter().enumerate() {
            diagnostics.extend(stage.validate().into_iter().map(|e| StageDiagnostic {
                stage: index,
                issue: StageIssue::Validation(e),
            }));
        }
        diagnostics.extend(stage_fields.output.diagnostics.iter().cloned());
        diagnostics.sort_by_key(|d| d.stage);

        self.fields_per_stage = stage_fields.per_stage;
        self.output = stage_fields.output;
        self.diagnostics = diagnostics;

        debug!(
            target: "aggview::editor",
            stages = self.pipeline.len(),
            output_fields = self.output.fields.len(),
            issues = self.diagnostics.len(),
            "Recomputed fields per stage"
        );
    }
}
