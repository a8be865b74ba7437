use crate::engine::schema::catalog::DEFAULT_MAX_DEPTH;
use crate::test_helpers::factories::TypeCatalogFactory;

#[test]
fn default_catalog_serves_incidents() {
    let catalog = TypeCatalogFactory::new().create();

    assert_eq!(catalog.max_depth(), DEFAULT_MAX_DEPTH);
    assert_eq!(catalog.query_record_type("allIncidents").unwrap(), "Incident");
    assert!(catalog.get_type("User").is_some());
}

#[test]
fn with_type_replaces_existing_definition() {
    let catalog = TypeCatalogFactory::new()
        .with_type(TypeCatalogFactory::object_type(
            "Tag",
            vec![TypeCatalogFactory::scalar("label", "String")],
        ))
        .with_max_depth(3)
        .create();

    assert_eq!(catalog.type_fields("Tag").unwrap().len(), 1);
    assert_eq!(catalog.max_depth(), 3);
}
