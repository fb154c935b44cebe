//! The view engine (component E): the `View`/`ViewOps` contract, the
//! process-wide [`ViewRegistry`] that owns every live view and dispatches
//! requests to it, split geometry, scroll/cursor position, and search.
//!
//! Per-view-kind behavior (what a commit log row looks like, what `Enter`
//! does on a tree row, how a diff hunk is parsed) lives in `core-git`, which
//! implements [`ViewOps`] once per [`ViewKind`] and registers the handlers
//! with a [`ViewRegistry`] at startup.

mod layout;
mod position;
mod registry;
mod search;
mod view;

pub use layout::{Layout, LayoutRegion, MIN_VIEW_HEIGHT, MIN_VIEW_WIDTH};
pub use position::Position;
pub use registry::{Outcome, ViewRegistry};
pub use search::{Direction, SearchState};
pub use view::{Line, View, ViewKind, ViewOps, ViewState};
