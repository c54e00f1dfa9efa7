//! Search providers: the contract and the SerpApi client

mod error;
mod provider;
mod serpapi;

pub use error::SearchError;
pub use provider::{Engine, SearchParams, SearchProvider};
pub use serpapi::SerpApiClient;
