use crate::test_helpers::factories::{AggregationSpecFactory, StageFactory};

#[test]
fn creates_valid_spec_by_default() {
    let spec = AggregationSpecFactory::new().create();

    assert_eq!(spec.id.as_deref(), Some("agg-1"));
    assert_eq!(spec.data_source_id, "incidents");
    assert!(spec.pipeline.is_empty());
    assert!(spec.validate("pie").is_ok());
}

#[test]
fn appends_stages_in_order() {
    let spec = AggregationSpecFactory::new()
        .with_stage(StageFactory::new().with_field("tags").unwind())
        .with_stage(StageFactory::new().with_group_by("region").group())
        .create();

    assert_eq!(spec.pipeline.len(), 2);
    assert_eq!(spec.pipeline[0].kind().as_str(), "unwind");
    assert_eq!(spec.pipeline[1].kind().as_str(), "group");
}
