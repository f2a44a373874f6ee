//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod catalog;
pub mod common;
pub mod history;
pub mod library;
pub mod playlists;

pub use catalog::{CatalogSearchParams, CatalogSearchTool};
pub use history::{
    HeavyRotationParams, HeavyRotationTool, RecentlyPlayedParams, RecentlyPlayedTool,
};
pub use library::{LibraryAddParams, LibraryAddTool, LibraryListParams, LibraryListTool};
pub use playlists::{
    PlaylistAddTracksParams, PlaylistAddTracksTool, PlaylistCreateParams, PlaylistCreateTool,
    PlaylistTracksParams, PlaylistTracksTool,
};
