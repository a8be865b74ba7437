use crate::engine::pipeline::stage::{SortOrder, StageDefinition, StageKind};
use crate::test_helpers::factories::StageFactory;
use serde_json::json;

#[test]
fn creates_each_kind() {
    for kind in StageKind::ALL {
        let stage = StageFactory::new().with_field("region").create(kind);
        assert_eq!(stage.kind(), kind);
    }
}

#[test]
fn creates_sort_with_order() {
    let stage = StageFactory::new()
        .with_field("severity")
        .with_order(SortOrder::Desc)
        .sort();

    match stage {
        StageDefinition::Sort(sort) => {
            assert_eq!(sort.field, "severity");
            assert_eq!(sort.order, SortOrder::Desc);
        }
        other => panic!("Expected Sort, got {:?}", other),
    }
}

#[test]
fn creates_group_with_rules_and_computed_fields() {
    let stage = StageFactory::new()
        .with_group_by("region")
        .with_computed("count", "count", "")
        .group();

    match stage {
        StageDefinition::Group(group) => {
            assert_eq!(group.group_by.len(), 1);
            assert_eq!(group.group_by[0].field, "region");
            assert_eq!(group.add_fields[0].name, "count");
        }
        other => panic!("Expected Group, got {:?}", other),
    }
}

#[test]
fn creates_filter_with_rules() {
    let stage = StageFactory::new()
        .with_rule("severity", "eq", json!("high"))
        .filter();

    match stage {
        StageDefinition::Filter(group) => {
            assert_eq!(group.referenced_fields(), vec!["severity"]);
        }
        other => panic!("Expected Filter, got {:?}", other),
    }
}
