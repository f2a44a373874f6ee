//! Listening history tools (user-scoped).

mod heavy_rotation;
mod recently_played;

pub use heavy_rotation::{HeavyRotationParams, HeavyRotationTool};
pub use recently_played::{RecentlyPlayedParams, RecentlyPlayedTool};
