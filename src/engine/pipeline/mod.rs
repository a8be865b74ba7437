pub mod editor;
pub mod propagation;
pub mod spec;
pub mod stage;

pub use editor::PipelineEditor;
pub use propagation::{
    Propagation, Propagator, StageDiagnostic, StageFields, StageIssue, fields_after,
    fields_per_stage, propagate,
};
pub use spec::{AggregationSpec, Mapping, MappingField, SpecIssues, mapping_fields};
pub use stage::{
    ComputedField, CustomStage, Expression, FilterGroup, FilterNode, FilterRule, GroupByRule,
    GroupStage, Logic, SortOrder, SortStage, StageDefinition, StageKind, UnwindStage,
};
