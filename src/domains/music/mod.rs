//! Apple Music API client domain.

mod client;
mod error;

pub use client::{DEFAULT_BASE_URL, DEFAULT_STOREFRONT, MusicApiClient};
pub use error::MusicError;
