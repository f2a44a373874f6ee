//! Library tools (user-scoped).

mod add;
mod list;

pub use add::{LibraryAddParams, LibraryAddTool};
pub use list::{LibraryListParams, LibraryListTool};
