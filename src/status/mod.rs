//! War status retrieval.

pub mod fetcher;

pub use fetcher::{fetch_all, HttpStatusFetcher, StatusFetcher};
