//! Web search: provider client, wire types, and parallel fan-out with URL deduplication.

pub(crate) mod aggregate;
pub(crate) mod client;
pub(crate) mod types;

pub use aggregate::Recency;
pub use client::{SearchClient, SearchOptions, TavilyClient};
pub use types::SearchResult;
