use crate::engine::errors::{EngineError, NetworkError, SchemaError};
use crate::engine::schema::catalog::TypeCatalog;
use crate::engine::schema::types::FieldSchema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Resource descriptor returned by the metadata API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub query_name: Option<String>,
}

/// Metadata collaborator: resource lookup plus the type catalog of the API.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn resource(&self, id: &str) -> Result<ResourceMeta, NetworkError>;

    async fn catalog(&self) -> Result<Arc<TypeCatalog>, NetworkError>;
}

/// Builds the initial pipeline fields from the user's source-field selection.
///
/// Unknown names are dropped. Object and list fields are expanded with the
/// resource type and the field's own type pre-marked as visited.
pub fn resolve_source_fields(
    catalog: &TypeCatalog,
    resource: &ResourceMeta,
    source_fields: &[String],
) -> Result<Vec<FieldSchema>, SchemaError> {
    let query_name = resource.query_name.as_deref().unwrap_or_default();
    let (_, meta_fields) = catalog.meta_fields(query_name)?;

    let mut selected = Vec::with_capacity(source_fields.len());
    for name in source_fields {
        let Some(meta) = meta_fields.iter().find(|f| &f.name == name) else {
            debug!(
                target: "aggview::schema",
                field = %name,
                resource = %resource.name,
                "Selected field not found in metadata"
            );
            continue;
        };

        let mut visited = HashSet::new();
        visited.insert(resource.name.clone());
        if let Some(own_type) = meta.type_ref.named_type() {
            visited.insert(own_type.to_string());
        }
        selected.push(catalog.seeded_field(meta, &visited)?);
    }
    Ok(selected)
}

/// Loads the resource and catalog, then resolves the selected source fields.
/// Any failure here blocks the editing session.
pub async fn load_source_fields(
    source: &dyn MetadataSource,
    resource_id: &str,
    source_fields: &[String],
) -> Result<Vec<FieldSchema>, EngineError> {
    let resource = source.resource(resource_id).await?;
    let catalog = source.catalog().await?;
    let fields = resolve_source_fields(&catalog, &resource, source_fields)?;
    debug!(
        target: "aggview::schema",
        resource = %resource.name,
        selected = source_fields.len(),
        resolved = fields.len(),
        "Resolved source fields"
    );
    Ok(fields)
}
