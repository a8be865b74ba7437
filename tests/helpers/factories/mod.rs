pub mod aggregation_spec_factory;
pub mod field_schema_factory;
pub mod stage_factory;
pub mod type_catalog_factory;

pub use aggregation_spec_factory::AggregationSpecFactory;
pub use field_schema_factory::FieldSchemaFactory;
pub use stage_factory::StageFactory;
pub use type_catalog_factory::TypeCatalogFactory;

#[cfg(test)]
mod aggregation_spec_factory_test;
#[cfg(test)]
mod field_schema_factory_test;
#[cfg(test)]
mod stage_factory_test;
#[cfg(test)]
mod type_catalog_factory_test;
