pub use super::factories::{
    AggregationSpecFactory, FieldSchemaFactory, StageFactory, TypeCatalogFactory,
};

pub struct Factory;

impl Factory {
    pub fn field() -> FieldSchemaFactory {
        FieldSchemaFactory::new()
    }

    pub fn stage() -> StageFactory {
        StageFactory::new()
    }

    pub fn spec() -> AggregationSpecFactory {
        AggregationSpecFactory::new()
    }

    pub fn catalog() -> TypeCatalogFactory {
        TypeCatalogFactory::new()
    }
}
