//! Catalog tools (developer token only).

mod search;

pub use search::{CatalogSearchParams, CatalogSearchTool};
