//! Elasticsearch REST client for the autocomplete index.

pub mod client;
pub mod types;

pub use client::ElasticClient;
