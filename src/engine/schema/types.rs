use crate::engine::errors::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape class of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    Scalar,
    Object,
    List,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Scalar => "SCALAR",
            FieldKind::Object => "OBJECT",
            FieldKind::List => "LIST",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape descriptor for one field of a resource.
/// - `Object`/`List` fields carry `sub_fields`
/// - `Scalar` fields never do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_fields: Option<Vec<FieldSchema>>,
}

impl FieldSchema {
    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar,
            type_name: type_name.into(),
            sub_fields: None,
        }
    }

    pub fn object(
        name: impl Into<String>,
        type_name: impl Into<String>,
        sub_fields: Vec<FieldSchema>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Object,
            type_name: type_name.into(),
            sub_fields: Some(sub_fields),
        }
    }

    pub fn list(
        name: impl Into<String>,
        type_name: impl Into<String>,
        sub_fields: Vec<FieldSchema>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::List,
            type_name: type_name.into(),
            sub_fields: Some(sub_fields),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == FieldKind::Scalar
    }

    pub fn sub_fields(&self) -> &[FieldSchema] {
        self.sub_fields.as_deref().unwrap_or(&[])
    }

    /// Checks the kind/sub-field invariant on this field and everything below it.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::MalformedField {
                name: self.name.clone(),
                reason: "field name is empty".to_string(),
            });
        }
        match (self.kind, &self.sub_fields) {
            (FieldKind::Scalar, Some(_)) => Err(SchemaError::MalformedField {
                name: self.name.clone(),
                reason: "scalar field cannot carry sub-fields".to_string(),
            }),
            (FieldKind::Object | FieldKind::List, None) => Err(SchemaError::MalformedField {
                name: self.name.clone(),
                reason: format!("{} field must carry sub-fields", self.kind),
            }),
            (_, Some(children)) => children.iter().try_for_each(FieldSchema::validate),
            (FieldKind::Scalar, None) => Ok(()),
        }
    }
}

pub fn find_field<'a>(fields: &'a [FieldSchema], name: &str) -> Option<&'a FieldSchema> {
    fields.iter().find(|f| f.name == name)
}

/// Resolves a dotted path (`tags.label`) through nested sub-fields.
pub fn resolve_path<'a>(fields: &'a [FieldSchema], path: &str) -> Option<&'a FieldSchema> {
    let mut segments = path.split('.');
    let mut current = find_field(fields, segments.next()?)?;
    for segment in segments {
        current = find_field(current.sub_fields(), segment)?;
    }
    Some(current)
}

pub fn field_names(fields: &[FieldSchema]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}
