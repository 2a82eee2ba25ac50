//! Yelp Fusion API client: business search and business details.

mod client;
mod error;
mod params;

pub use client::{DEFAULT_BASE_URL, FusionClient, FusionConfig};
pub use error::FusionError;
pub use params::{SearchParams, SortBy};
