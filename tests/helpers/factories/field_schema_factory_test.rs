use crate::engine::schema::types::{FieldKind, FieldSchema};
use crate::test_helpers::factories::FieldSchemaFactory;

#[test]
fn creates_scalar_by_default() {
    let field = FieldSchemaFactory::new().with_name("severity").create();

    assert_eq!(field, FieldSchema::scalar("severity", "String"));
    assert!(field.validate().is_ok());
}

#[test]
fn creates_list_with_sub_fields() {
    let field = FieldSchemaFactory::new()
        .with_name("tags")
        .with_type("Tag")
        .with_kind(FieldKind::List)
        .with_sub_field(FieldSchema::scalar("label", "String"))
        .create();

    assert_eq!(field.kind, FieldKind::List);
    assert_eq!(field.sub_fields().len(), 1);
    assert!(field.validate().is_ok());
}

#[test]
fn incident_fields_are_well_formed() {
    let fields = FieldSchemaFactory::incident_fields();

    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["region", "severity", "createdAt", "tags", "owner"]);
    assert!(fields.iter().all(|f| f.validate().is_ok()));
}
