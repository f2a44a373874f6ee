//! Playlist tools (user-scoped).

mod add_tracks;
mod create;
mod tracks;

pub use add_tracks::{PlaylistAddTracksParams, PlaylistAddTracksTool};
pub use create::{PlaylistCreateParams, PlaylistCreateTool};
pub use tracks::{PlaylistTracksParams, PlaylistTracksTool};
