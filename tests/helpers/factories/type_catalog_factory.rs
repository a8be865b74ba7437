use crate::engine::schema::catalog::{MetaField, MetaType, TypeCatalog, TypeKind, TypeRef};

/// Factory for creating `TypeCatalog` values in tests.
///
/// The default catalog serves `allIncidents: [Incident]` where
/// `Incident.owner: User` and `User.incidents: [Incident]` form a cycle.
pub struct TypeCatalogFactory {
    query_fields: Vec<MetaField>,
    types: Vec<MetaType>,
    max_depth: Option<usize>,
}

impl TypeCatalogFactory {
    pub fn new() -> Self {
        Self {
            query_fields: vec![Self::list("allIncidents", "Incident")],
            types: vec![
                Self::object_type(
                    "Incident",
                    vec![
                        Self::scalar("id", "ID"),
                        Self::scalar("region", "String"),
                        Self::scalar("severity", "String"),
                        Self::scalar("createdAt", "Date"),
                        Self::list("tags", "Tag"),
                        Self::object("owner", "User"),
                        Self::scalar_list("labels", "String"),
                    ],
                ),
                Self::object_type(
                    "Tag",
                    vec![Self::scalar("label", "String"), Self::scalar("weight", "Int")],
                ),
                Self::object_type(
                    "User",
                    vec![
                        Self::scalar("name", "String"),
                        Self::scalar("email", "String"),
                        Self::list("incidents", "Incident"),
                    ],
                ),
                Self::scalar_type("ID"),
                Self::scalar_type("String"),
                Self::scalar_type("Int"),
                Self::scalar_type("Date"),
            ],
            max_depth: None,
        }
    }

    /// Starts from a catalog with no types besides the root query type.
    pub fn empty() -> Self {
        Self {
            query_fields: Vec::new(),
            types: Vec::new(),
            max_depth: None,
        }
    }

    pub fn with_query(mut self, field: MetaField) -> Self {
        self.query_fields.push(field);
        self
    }

    pub fn with_type(mut self, meta: MetaType) -> Self {
        self.types.retain(|t| t.name != meta.name);
        self.types.push(meta);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn create(self) -> TypeCatalog {
        let mut types = vec![Self::object_type("Query", self.query_fields)];
        types.extend(self.types);
        let catalog = TypeCatalog::new("Query", types);
        match self.max_depth {
            Some(depth) => catalog.with_max_depth(depth),
            None => catalog,
        }
    }

    pub fn scalar(name: &str, type_name: &str) -> MetaField {
        MetaField {
            name: name.to_string(),
            type_ref: TypeRef::named(TypeKind::Scalar, type_name),
        }
    }

    pub fn object(name: &str, type_name: &str) -> MetaField {
        MetaField {
            name: name.to_string(),
            type_ref: TypeRef::named(TypeKind::Object, type_name),
        }
    }

    pub fn list(name: &str, type_name: &str) -> MetaField {
        MetaField {
            name: name.to_string(),
            type_ref: TypeRef::non_null(TypeRef::list_of(TypeRef::named(
                TypeKind::Object,
                type_name,
            ))),
        }
    }

    pub fn scalar_list(name: &str, type_name: &str) -> MetaField {
        MetaField {
            name: name.to_string(),
            type_ref: TypeRef::list_of(TypeRef::named(TypeKind::Scalar, type_name)),
        }
    }

    pub fn object_type(name: &str, fields: Vec<MetaField>) -> MetaType {
        MetaType {
            name: name.to_string(),
            kind: TypeKind::Object,
            fields: Some(fields),
        }
    }

    pub fn scalar_type(name: &str) -> MetaType {
        MetaType {
            name: name.to_string(),
            kind: TypeKind::Scalar,
            fields: None,
        }
    }
}
