use crate::engine::errors::ValidationError;
use crate::engine::schema::types::{FieldSchema, resolve_path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Closed set of stage kinds a pipeline may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageKind {
    Filter,
    Sort,
    Group,
    AddFields,
    Unwind,
    Custom,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::Filter,
        StageKind::Sort,
        StageKind::Group,
        StageKind::AddFields,
        StageKind::Unwind,
        StageKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Filter => "filter",
            StageKind::Sort => "sort",
            StageKind::Group => "group",
            StageKind::AddFields => "addFields",
            StageKind::Unwind => "unwind",
            StageKind::Custom => "custom",
        }
    }
}

/// Unrecognised names become `Custom`.
impl From<&str> for StageKind {
    fn from(s: &str) -> Self {
        StageKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .unwrap_or(StageKind::Custom)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// `{operator, field}` pair computing one value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub field: String,
}

impl Expression {
    pub fn new(operator: &str, field: &str) -> Self {
        Self {
            operator: operator.to_string(),
            field: field.to_string(),
        }
    }

    /// Type name of the value this expression produces.
    pub fn result_type(&self, upstream: &[FieldSchema]) -> String {
        match self.operator.as_str() {
            "count" | "year" | "month" | "week" | "day" | "dayOfWeek" | "hour" => {
                "Int".to_string()
            }
            "sum" | "avg" | "add" | "subtract" | "multiply" | "divide" => "Float".to_string(),
            "concat" | "toString" => "String".to_string(),
            "date" => "Date".to_string(),
            "min" | "max" | "first" | "last" => resolve_path(upstream, &self.field)
                .filter(|f| f.is_scalar())
                .map(|f| f.type_name.clone())
                .unwrap_or_else(|| "String".to_string()),
            _ => "String".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupByRule {
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
}

/// Named computed field, used by both AddFields and Group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedField {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expression: Expression,
}

impl ComputedField {
    pub fn new(name: &str, operator: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            expression: Expression::new(operator, field),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    And,
    Or,
}

/// Filter expression tree as produced by the query builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub logic: Logic,
    pub filters: Vec<FilterNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Group(FilterGroup),
    Rule(FilterRule),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FilterGroup {
    /// Every non-empty field referenced anywhere in the tree, depth first.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        for node in &self.filters {
            match node {
                FilterNode::Group(group) => group.collect_fields(out),
                FilterNode::Rule(rule) if !rule.field.is_empty() => out.push(&rule.field),
                FilterNode::Rule(_) => {}
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortStage {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStage {
    #[serde(default)]
    pub group_by: Vec<GroupByRule>,
    #[serde(default)]
    pub add_fields: Vec<ComputedField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnwindStage {
    #[serde(default)]
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomStage {
    #[serde(default)]
    pub raw: String,
}

/// Configuration of one pipeline stage, persisted as `{"type": .., "form": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "form", rename_all = "camelCase")]
pub enum StageDefinition {
    Filter(FilterGroup),
    Sort(SortStage),
    Group(GroupStage),
    AddFields(Vec<ComputedField>),
    Unwind(UnwindStage),
    Custom(CustomStage),
}

impl StageDefinition {
    /// Stage as first added to a pipeline, before the user configures it.
    pub fn default_for(kind: StageKind) -> Self {
        match kind {
            StageKind::Filter => StageDefinition::Filter(FilterGroup::default()),
            StageKind::Sort => StageDefinition::Sort(SortStage::default()),
            StageKind::Group => StageDefinition::Group(GroupStage {
                group_by: vec![GroupByRule::default()],
                add_fields: Vec::new(),
            }),
            StageKind::AddFields => StageDefinition::AddFields(vec![ComputedField::default()]),
            StageKind::Unwind => StageDefinition::Unwind(UnwindStage::default()),
            StageKind::Custom => StageDefinition::Custom(CustomStage::default()),
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            StageDefinition::Filter(_) => StageKind::Filter,
            StageDefinition::Sort(_) => StageKind::Sort,
            StageDefinition::Group(_) => StageKind::Group,
            StageDefinition::AddFields(_) => StageKind::AddFields,
            StageDefinition::Unwind(_) => StageKind::Unwind,
            StageDefinition::Custom(_) => StageKind::Custom,
        }
    }

    /// Required-value and syntax checks that need no schema.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self {
            StageDefinition::Filter(_) => {}
            StageDefinition::Sort(sort) => {
                require(&mut errors, &sort.field, "field");
            }
            StageDefinition::Group(group) => {
                for (i, rule) in group.group_by.iter().enumerate() {
                    require(&mut errors, &rule.field, &format!("groupBy[{}].field", i));
                }
                for (i, computed) in group.add_fields.iter().enumerate() {
                    require(
                        &mut errors,
                        &computed.expression.operator,
                        &format!("addFields[{}].expression.operator", i),
                    );
                }
            }
            StageDefinition::AddFields(entries) => {
                if entries.is_empty() {
                    errors.push(ValidationError::MissingValue("fields".to_string()));
                }
                for (i, computed) in entries.iter().enumerate() {
                    require(&mut errors, &computed.name, &format!("[{}].name", i));
                    require(
                        &mut errors,
                        &computed.expression.operator,
                        &format!("[{}].expression.operator", i),
                    );
                }
            }
            StageDefinition::Unwind(unwind) => {
                require(&mut errors, &unwind.field, "field");
            }
            StageDefinition::Custom(custom) => {
                if custom.raw.trim().is_empty() {
                    errors.push(ValidationError::MissingValue("raw".to_string()));
                } else if let Err(e) = serde_json::from_str::<Value>(&custom.raw) {
                    errors.push(ValidationError::InvalidJson(e.to_string()));
                }
            }
        }
        errors
    }
}

fn require(errors: &mut Vec<ValidationError>, value: &str, path: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::MissingValue(path.to_string()));
    }
}
