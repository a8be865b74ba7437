use crate::engine::schema::types::{FieldKind, FieldSchema};

/// Factory for creating `FieldSchema` values in tests
pub struct FieldSchemaFactory {
    name: String,
    kind: FieldKind,
    type_name: String,
    sub_fields: Vec<FieldSchema>,
}

impl FieldSchemaFactory {
    pub fn new() -> Self {
        Self {
            name: "field".to_string(),
            kind: FieldKind::Scalar,
            type_name: "String".to_string(),
            sub_fields: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_type(mut self, type_name: &str) -> Self {
        self.type_name = type_name.to_string();
        self
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_sub_field(mut self, field: FieldSchema) -> Self {
        self.sub_fields.push(field);
        self
    }

    pub fn with_sub_fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.sub_fields = fields;
        self
    }

    pub fn create(self) -> FieldSchema {
        match self.kind {
            FieldKind::Scalar => FieldSchema::scalar(self.name, self.type_name),
            FieldKind::Object => FieldSchema::object(self.name, self.type_name, self.sub_fields),
            FieldKind::List => FieldSchema::list(self.name, self.type_name, self.sub_fields),
        }
    }

    /// Fields of the incident resource used across tests:
    /// `region, severity, createdAt, tags[label, weight], owner{name, email}`.
    pub fn incident_fields() -> Vec<FieldSchema> {
        vec![
            FieldSchemaFactory::new().with_name("region").create(),
            FieldSchemaFactory::new().with_name("severity").create(),
            FieldSchemaFactory::new()
                .with_name("createdAt")
                .with_type("Date")
                .create(),
            FieldSchemaFactory::new()
                .with_name("tags")
                .with_type("Tag")
                .with_kind(FieldKind::List)
                .with_sub_field(FieldSchema::scalar("label", "String"))
                .with_sub_field(FieldSchema::scalar("weight", "Int"))
                .create(),
            FieldSchemaFactory::new()
                .with_name("owner")
                .with_type("User")
                .with_kind(FieldKind::Object)
                .with_sub_field(FieldSchema::scalar("name", "String"))
                .with_sub_field(FieldSchema::scalar("email", "String"))
                .create(),
        ]
    }
}
