pub mod client;
pub mod queries;
pub mod response;

pub use client::GraphqlClient;
