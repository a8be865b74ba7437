pub mod catalog;
pub mod metadata;
pub mod types;

pub use catalog::{MetaField, MetaType, TypeCatalog, TypeKind, TypeRef};
pub use metadata::{MetadataSource, ResourceMeta, load_source_fields, resolve_source_fields};
pub use types::{FieldKind, FieldSchema, find_field, resolve_path};
