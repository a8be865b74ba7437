use crate::engine::pipeline::stage::{
    ComputedField, CustomStage, Expression, FilterGroup, FilterNode, FilterRule, GroupByRule,
    GroupStage, Logic, SortOrder, SortStage, StageDefinition, StageKind, UnwindStage,
};
use serde_json::Value;

/// Factory for creating `StageDefinition` values in tests.
/// Collects settings with `with_*` and finishes with the stage kind.
pub struct StageFactory {
    field: String,
    order: SortOrder,
    logic: Logic,
    rules: Vec<FilterNode>,
    group_by: Vec<GroupByRule>,
    computed: Vec<ComputedField>,
    raw: String,
}

impl StageFactory {
    pub fn new() -> Self {
        Self {
            field: String::new(),
            order: SortOrder::Asc,
            logic: Logic::And,
            rules: Vec::new(),
            group_by: Vec::new(),
            computed: Vec::new(),
            raw: "{}".to_string(),
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = field.to_string();
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    pub fn with_rule(mut self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.rules.push(FilterNode::Rule(FilterRule {
            field: field.to_string(),
            operator: operator.to_string(),
            value: Some(value.into()),
        }));
        self
    }

    pub fn with_nested(mut self, group: FilterGroup) -> Self {
        self.rules.push(FilterNode::Group(group));
        self
    }

    pub fn with_group_by(mut self, field: &str) -> Self {
        self.group_by.push(GroupByRule {
            field: field.to_string(),
            expression: None,
        });
        self
    }

    pub fn with_group_by_expression(mut self, field: &str, operator: &str) -> Self {
        self.group_by.push(GroupByRule {
            field: field.to_string(),
            expression: Some(Expression::new(operator, field)),
        });
        self
    }

    pub fn with_computed(mut self, name: &str, operator: &str, field: &str) -> Self {
        self.computed.push(ComputedField::new(name, operator, field));
        self
    }

    pub fn with_raw(mut self, raw: &str) -> Self {
        self.raw = raw.to_string();
        self
    }

    pub fn filter(self) -> StageDefinition {
        StageDefinition::Filter(FilterGroup {
            logic: self.logic,
            filters: self.rules,
        })
    }

    pub fn sort(self) -> StageDefinition {
        StageDefinition::Sort(SortStage {
            field: self.field,
            order: self.order,
        })
    }

    pub fn group(self) -> StageDefinition {
        StageDefinition::Group(GroupStage {
            group_by: self.group_by,
            add_fields: self.computed,
        })
    }

    pub fn add_fields(self) -> StageDefinition {
        StageDefinition::AddFields(self.computed)
    }

    pub fn unwind(self) -> StageDefinition {
        StageDefinition::Unwind(UnwindStage { field: self.field })
    }

    pub fn custom(self) -> StageDefinition {
        StageDefinition::Custom(CustomStage { raw: self.raw })
    }

    pub fn create(self, kind: StageKind) -> StageDefinition {
        match kind {
            StageKind::Filter => self.filter(),
            StageKind::Sort => self.sort(),
            StageKind::Group => self.group(),
            StageKind::AddFields => self.add_fields(),
            StageKind::Unwind => self.unwind(),
            StageKind::Custom => self.custom(),
        }
    }
}
