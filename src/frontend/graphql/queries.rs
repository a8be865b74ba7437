pub const GET_RESOURCE: &str = r#"
query getResource($id: ID!) {
  resource(id: $id) {
    id
    name
    queryName
  }
}
"#;

pub const GET_AGGREGATION_DATA: &str = r#"
query getAggregationData(
  $resource: ID!
  $aggregation: ID!
  $contextFilters: JSON
  $first: Int
  $skip: Int
  $sortField: String
  $sortOrder: String
  $at: Date
) {
  recordsAggregation(
    resource: $resource
    aggregation: $aggregation
    contextFilters: $contextFilters
    first: $first
    skip: $skip
    sortField: $sortField
    sortOrder: $sortOrder
    at: $at
  )
}
"#;

pub const INTROSPECTION: &str = r#"
query introspection {
  __schema {
    queryType { name }
    types {
      name
      kind
      fields {
        name
        type { ...TypeRef }
      }
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType { kind name }
      }
    }
  }
}
"#;
