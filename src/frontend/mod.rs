pub mod graphql;

pub use graphql::GraphqlClient;
