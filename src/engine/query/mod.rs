pub mod context;
pub mod request;
pub mod response;

pub use context::{inject_context, resolve_as_of};
pub use request::{
    AggregationRequest, AggregationRequestBuilder, GridQuery, SortDescriptor, parse_sort,
};
pub use response::{AggregationBackend, AggregationPage};
