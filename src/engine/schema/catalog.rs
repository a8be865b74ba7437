use crate::engine::errors::SchemaError;
use crate::engine::schema::types::{FieldKind, FieldSchema};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Introspection type kinds as reported by the metadata API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// Reference to a (possibly wrapped) type, e.g. `[Tag!]!`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    pub fn named(kind: TypeKind, name: &str) -> Self {
        Self {
            kind,
            name: Some(name.to_string()),
            of_type: None,
        }
    }

    pub fn list_of(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    fn strip_non_null(&self) -> &TypeRef {
        let mut current = self;
        while current.kind == TypeKind::NonNull {
            match current.of_type.as_deref() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    /// Innermost named type behind list/non-null wrappers.
    pub fn named_type(&self) -> Option<&str> {
        let mut current = self;
        loop {
            if let Some(name) = current.name.as_deref() {
                return Some(name);
            }
            current = current.of_type.as_deref()?;
        }
    }

    fn innermost(&self) -> &TypeRef {
        let mut current = self;
        while let Some(inner) = current.of_type.as_deref() {
            current = inner;
        }
        current
    }

    pub fn field_kind(&self) -> FieldKind {
        let outer = self.strip_non_null();
        if outer.kind == TypeKind::List {
            return FieldKind::List;
        }
        match outer.kind {
            TypeKind::Object | TypeKind::Interface | TypeKind::Union => FieldKind::Object,
            _ => FieldKind::Scalar,
        }
    }

    /// True when the innermost type has fields of its own.
    fn is_composite(&self) -> bool {
        matches!(
            self.innermost().kind,
            TypeKind::Object | TypeKind::Interface | TypeKind::Union
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaType {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: Option<Vec<MetaField>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// `__schema` payload of an introspection query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    pub query_type: NamedRef,
    pub types: Vec<MetaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrospectionEnvelope {
    #[serde(rename = "__schema")]
    pub schema: IntrospectionSchema,
}

/// Immutable view over the metadata types of one API, loaded once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCatalog {
    query_type: String,
    types: IndexMap<String, MetaType>,
    max_depth: usize,
}

impl From<IntrospectionSchema> for TypeCatalog {
    fn from(schema: IntrospectionSchema) -> Self {
        let types = schema
            .types
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        Self {
            query_type: schema.query_type.name,
            types,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TypeCatalog {
    pub fn new(query_type: &str, types: Vec<MetaType>) -> Self {
        Self::from(IntrospectionSchema {
            query_type: NamedRef {
                name: query_type.to_string(),
            },
            types,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn get_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn type_fields(&self, name: &str) -> Result<&[MetaField], SchemaError> {
        let meta = self
            .types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        Ok(meta.fields.as_deref().unwrap_or(&[]))
    }

    /// Record type served by a root query. Relay connections
    /// (`edges { node }`) resolve to the node type.
    pub fn query_record_type(&self, query_name: &str) -> Result<String, SchemaError> {
        let root = self.type_fields(&self.query_type)?;
        let query = root
            .iter()
            .find(|f| f.name == query_name)
            .ok_or_else(|| SchemaError::UnknownQuery(query_name.to_string()))?;
        let type_name = named_or_malformed(&query.name, &query.type_ref)?;

        let Ok(fields) = self.type_fields(type_name) else {
            return Ok(type_name.to_string());
        };
        let node_type = fields
            .iter()
            .find(|f| f.name == "edges")
            .and_then(|edges| edges.type_ref.named_type())
            .and_then(|edge_type| self.type_fields(edge_type).ok())
            .and_then(|edge_fields| edge_fields.iter().find(|f| f.name == "node"))
            .and_then(|node| node.type_ref.named_type());

        Ok(node_type.unwrap_or(type_name).to_string())
    }

    /// Raw metadata fields of the records returned by `query_name`.
    pub fn meta_fields(&self, query_name: &str) -> Result<(String, &[MetaField]), SchemaError> {
        let record_type = self.query_record_type(query_name)?;
        let fields = self.type_fields(&record_type)?;
        Ok((record_type, fields))
    }

    /// Fully expanded fields of the records returned by `query_name`.
    pub fn get_fields(&self, query_name: &str) -> Result<Vec<FieldSchema>, SchemaError> {
        let record_type = self.query_record_type(query_name)?;
        let mut visited = HashSet::new();
        visited.insert(record_type.clone());
        self.expand_type(&record_type, &visited, 0)
    }

    /// Expands one nesting level of an object/list type. Composite fields whose
    /// type is already in `visited` are left out, so self-referencing types
    /// terminate; `max_depth` bounds everything else.
    pub fn deconfine_fields(
        &self,
        type_ref: &TypeRef,
        visited: &HashSet<String>,
    ) -> Result<Vec<FieldSchema>, SchemaError> {
        let type_name = named_or_malformed("<type>", type_ref)?;
        self.expand_type(type_name, visited, 0)
    }

    fn expand_type(
        &self,
        type_name: &str,
        visited: &HashSet<String>,
        depth: usize,
    ) -> Result<Vec<FieldSchema>, SchemaError> {
        let mut out = Vec::new();
        for field in self.type_fields(type_name)? {
            if let Some(schema) = self.field_schema(field, visited, depth)? {
                out.push(schema);
            }
        }
        Ok(out)
    }

    fn field_schema(
        &self,
        field: &MetaField,
        visited: &HashSet<String>,
        depth: usize,
    ) -> Result<Option<FieldSchema>, SchemaError> {
        let type_name = named_or_malformed(&field.name, &field.type_ref)?;
        if !field.type_ref.is_composite() {
            return Ok(Some(leaf_field(field, type_name)));
        }

        if visited.contains(type_name) {
            debug!(
                target: "aggview::schema",
                field = %field.name,
                type_name,
                "Skipping already visited type"
            );
            return Ok(None);
        }
        if depth >= self.max_depth {
            warn!(
                target: "aggview::schema",
                field = %field.name,
                type_name,
                max_depth = self.max_depth,
                "Nesting depth exceeded, field left out"
            );
            return Ok(None);
        }

        let mut nested = visited.clone();
        nested.insert(type_name.to_string());
        let sub_fields = self.expand_type(type_name, &nested, depth + 1)?;

        Ok(Some(composite_field(field, type_name, sub_fields)))
    }

    /// Schema for a top-level field whose expansion starts from a visited set
    /// seeded by the caller.
    pub fn seeded_field(
        &self,
        field: &MetaField,
        visited: &HashSet<String>,
    ) -> Result<FieldSchema, SchemaError> {
        let type_name = named_or_malformed(&field.name, &field.type_ref)?;
        if !field.type_ref.is_composite() {
            return Ok(leaf_field(field, type_name));
        }
        let sub_fields = self.expand_type(type_name, visited, 1)?;
        Ok(composite_field(field, type_name, sub_fields))
    }
}

fn leaf_field(field: &MetaField, type_name: &str) -> FieldSchema {
    match field.type_ref.field_kind() {
        // list of scalars: unwinds into a scalar of the same name
        FieldKind::List => FieldSchema::list(&field.name, type_name, Vec::new()),
        _ => FieldSchema::scalar(&field.name, type_name),
    }
}

fn composite_field(field: &MetaField, type_name: &str, sub_fields: Vec<FieldSchema>) -> FieldSchema {
    match field.type_ref.field_kind() {
        FieldKind::List => FieldSchema::list(&field.name, type_name, sub_fields),
        _ => FieldSchema::object(&field.name, type_name, sub_fields),
    }
}

fn named_or_malformed<'a>(field: &str, type_ref: &'a TypeRef) -> Result<&'a str, SchemaError> {
    type_ref
        .named_type()
        .ok_or_else(|| SchemaError::MalformedField {
            name: field.to_string(),
            reason: "type reference has no named type".to_string(),
        })
}
