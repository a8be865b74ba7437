use crate::engine::errors::{EngineWarning, SchemaError, ValidationError};
use crate::engine::pipeline::stage::{
    ComputedField, FilterGroup, GroupStage, SortStage, StageDefinition, UnwindStage,
};
use crate::engine::schema::types::{FieldKind, FieldSchema, resolve_path};
use indexmap::IndexMap;
use std::fmt;
use tracing::debug;

/// Something worth showing on a stage's form.
#[derive(Debug, Clone, PartialEq)]
pub enum StageIssue {
    Schema(SchemaError),
    Validation(ValidationError),
    Warning(EngineWarning),
}

impl StageIssue {
    /// Warnings are informational; everything else blocks save and execution.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, StageIssue::Warning(_))
    }
}

impl fmt::Display for StageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageIssue::Schema(e) => write!(f, "{}", e),
            StageIssue::Validation(e) => write!(f, "{}", e),
            StageIssue::Warning(w) => write!(f, "{}", w),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageDiagnostic {
    pub stage: usize,
    pub issue: StageIssue,
}

/// Result of running a stage sequence over a field set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Propagation {
    pub fields: Vec<FieldSchema>,
    pub diagnostics: Vec<StageDiagnostic>,
    /// Set once a stage with unpredictable output has been passed.
    pub unchecked: bool,
}

impl Propagation {
    pub fn warnings(&self) -> impl Iterator<Item = &EngineWarning> {
        self.diagnostics.iter().filter_map(|d| match &d.issue {
            StageIssue::Warning(w) => Some(w),
            _ => None,
        })
    }
}

/// Fields that exist after `stages` have run over `fields`.
pub fn fields_after(fields: &[FieldSchema], stages: &[StageDefinition]) -> Vec<FieldSchema> {
    propagate(fields, stages).fields
}

/// Same as [`fields_after`] but keeps the per-stage diagnostics.
pub fn propagate(fields: &[FieldSchema], stages: &[StageDefinition]) -> Propagation {
    let mut propagator = Propagator::new(fields);
    for (index, stage) in stages.iter().enumerate() {
        propagator.apply(index, stage);
    }
    propagator.finish()
}

/// Incremental propagation state, one stage at a time.
#[derive(Debug, Clone)]
pub struct Propagator {
    fields: IndexMap<String, FieldSchema>,
    diagnostics: Vec<StageDiagnostic>,
    unchecked: bool,
    quiet: bool,
}

impl Propagator {
    pub fn new(fields: &[FieldSchema]) -> Self {
        Self {
            fields: index_fields(fields.iter().cloned()),
            diagnostics: Vec::new(),
            unchecked: false,
            quiet: false,
        }
    }

    /// Suppresses warning logs, for shadow passes over the same pipeline.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn snapshot(&self) -> Vec<FieldSchema> {
        self.fields.values().cloned().collect()
    }

    pub fn is_unchecked(&self) -> bool {
        self.unchecked
    }

    pub fn apply(&mut self, index: usize, stage: &StageDefinition) {
        match stage {
            StageDefinition::Filter(group) => self.filter(index, group),
            StageDefinition::Sort(sort) => self.sort(index, sort),
            StageDefinition::AddFields(entries) => self.add_fields(index, entries),
            StageDefinition::Group(group) => self.group(index, group),
            StageDefinition::Unwind(unwind) => self.unwind(index, unwind),
            StageDefinition::Custom(_) => {
                self.warn(index, EngineWarning::UncheckedCustomStage);
                self.unchecked = true;
            }
        }
    }

    pub fn finish(self) -> Propagation {
        Propagation {
            fields: self.fields.into_values().collect(),
            diagnostics: self.diagnostics,
            unchecked: self.unchecked,
        }
    }

    fn filter(&mut self, index: usize, group: &FilterGroup) {
        let current = self.snapshot();
        for path in group.referenced_fields() {
            if resolve_path(&current, path).is_none() {
                self.unknown_field(index, path);
            }
        }
    }

    fn sort(&mut self, index: usize, sort: &SortStage) {
        if sort.field.is_empty() {
            return;
        }
        match self.fields.get(&sort.field) {
            None => self.unknown_field(index, &sort.field),
            Some(field) if !field.is_scalar() => {
                let issue = StageIssue::Validation(ValidationError::SortFieldNotScalar(
                    sort.field.clone(),
                ));
                self.diagnostics.push(StageDiagnostic {
                    stage: index,
                    issue,
                });
            }
            Some(_) => {}
        }
    }

    fn add_fields(&mut self, index: usize, entries: &[ComputedField]) {
        let upstream = self.snapshot();
        for computed in entries {
            self.check_expression_field(index, &upstream, &computed.expression.field);
            if computed.name.is_empty() {
                continue;
            }
            let type_name = computed.expression.result_type(&upstream);
            // insert keeps the position of an overridden name
            self.fields.insert(
                computed.name.clone(),
                FieldSchema::scalar(&computed.name, type_name),
            );
        }
    }

    fn group(&mut self, index: usize, group: &GroupStage) {
        let upstream = self.snapshot();
        let mut grouped = IndexMap::new();

        for rule in &group.group_by {
            if rule.field.is_empty() {
                continue;
            }
            match (&rule.expression, resolve_path(&upstream, &rule.field)) {
                (Some(expression), found) if !expression.operator.is_empty() => {
                    if found.is_none() {
                        self.unknown_field(index, &rule.field);
                    }
                    let type_name = expression.result_type(&upstream);
                    grouped.insert(
                        rule.field.clone(),
                        FieldSchema::scalar(&rule.field, type_name),
                    );
                }
                (_, Some(field)) => {
                    let mut field = field.clone();
                    field.name = rule.field.clone();
                    grouped.insert(rule.field.clone(), field);
                }
                (_, None) if self.unchecked => {
                    grouped.insert(
                        rule.field.clone(),
                        FieldSchema::scalar(&rule.field, "Unknown"),
                    );
                }
                (_, None) => self.unknown_field(index, &rule.field),
            }
        }

        for computed in &group.add_fields {
            self.check_expression_field(index, &upstream, &computed.expression.field);
            if computed.name.is_empty() {
                continue;
            }
            let type_name = computed.expression.result_type(&upstream);
            grouped.insert(
                computed.name.clone(),
                FieldSchema::scalar(&computed.name, type_name),
            );
        }

        debug!(
            target: "aggview::propagation",
            stage = index,
            before = upstream.len(),
            after = grouped.len(),
            "Group replaced field set"
        );
        self.fields = grouped;
    }

    fn unwind(&mut self, index: usize, unwind: &UnwindStage) {
        if unwind.field.is_empty() {
            return;
        }
        let Some(target) = self.fields.get(&unwind.field) else {
            self.unknown_field(index, &unwind.field);
            return;
        };
        if target.kind != FieldKind::List {
            let warning = EngineWarning::UnwindNotList {
                field: unwind.field.clone(),
                kind: target.kind.to_string(),
            };
            self.warn(index, warning);
            return;
        }
        if let Err(e) = target.validate() {
            self.diagnostics.push(StageDiagnostic {
                stage: index,
                issue: StageIssue::Schema(e),
            });
            return;
        }

        let previous = std::mem::take(&mut self.fields);
        let mut flattened = IndexMap::with_capacity(previous.len());
        let mut collisions = Vec::new();
        for (name, field) in &previous {
            if *name != unwind.field {
                flattened.insert(name.clone(), field.clone());
                continue;
            }
            match field.sub_fields() {
                [] => {
                    // list of scalars becomes the element itself
                    flattened.insert(
                        name.clone(),
                        FieldSchema::scalar(&field.name, &field.type_name),
                    );
                }
                children => {
                    for child in children {
                        // siblings keep their own schema
                        if child.name != unwind.field && previous.contains_key(&child.name) {
                            collisions.push(child.name.clone());
                            continue;
                        }
                        flattened.insert(child.name.clone(), child.clone());
                    }
                }
            }
        }
        self.fields = flattened;

        for child in collisions {
            let warning = EngineWarning::UnwindNameCollision {
                field: unwind.field.clone(),
                child,
            };
            self.warn(index, warning);
        }
    }

    fn check_expression_field(&mut self, index: usize, upstream: &[FieldSchema], field: &str) {
        if !field.is_empty() && resolve_path(upstream, field).is_none() {
            self.unknown_field(index, field);
        }
    }

    fn unknown_field(&mut self, index: usize, field: &str) {
        // past a custom stage any name may exist
        if self.unchecked {
            return;
        }
        self.diagnostics.push(StageDiagnostic {
            stage: index,
            issue: StageIssue::Schema(SchemaError::UnknownField(field.to_string())),
        });
    }

    fn warn(&mut self, index: usize, warning: EngineWarning) {
        if !self.quiet {
            warning.log(index);
        }
        self.diagnostics.push(StageDiagnostic {
            stage: index,
            issue: StageIssue::Warning(warning),
        });
    }
}

fn index_fields(fields: impl IntoIterator<Item = FieldSchema>) -> IndexMap<String, FieldSchema> {
    fields.into_iter().map(|f| (f.name.clone(), f)).collect()
}

/// Fields offered to each stage's form, plus the final propagation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageFields {
    pub per_stage: Vec<Vec<FieldSchema>>,
    pub output: Propagation,
}

/// Computes the fields valid at every position in one pass.
///
/// Filter stages see `filter_fields` laid over the initial fields by name.
/// Sort stages only see scalars.
pub fn fields_per_stage(
    initial: &[FieldSchema],
    filter_fields: &[FieldSchema],
    pipeline: &[StageDefinition],
) -> StageFields {
    let mut base = Propagator::new(initial);
    let mut overlay = (!filter_fields.is_empty())
        .then(|| Propagator::new(&overlay_fields(initial, filter_fields)).quiet());

    let mut per_stage = Vec::with_capacity(pipeline.len());
    for (index, stage) in pipeline.iter().enumerate() {
        let available = match stage {
            StageDefinition::Filter(_) => overlay.as_ref().unwrap_or(&base).snapshot(),
            StageDefinition::Sort(_) => base
                .snapshot()
                .into_iter()
                .filter(FieldSchema::is_scalar)
                .collect(),
            _ => base.snapshot(),
        };
        per_stage.push(available);

        base.apply(index, stage);
        if let Some(overlay) = overlay.as_mut() {
            overlay.apply(index, stage);
        }
    }

    StageFields {
        per_stage,
        output: base.finish(),
    }
}

fn overlay_fields(initial: &[FieldSchema], filter_fields: &[FieldSchema]) -> Vec<FieldSchema> {
    initial
        .iter()
        .map(|field| {
            filter_fields
                .iter()
                .find(|f| f.name == field.name)
                .cloned()
                .unwrap_or_else(|| field.clone())
        })
        .collect()
}
