//! Option store, command language, and line-color table.
//!
//! This crate owns everything needed to go from `.tigrc`-style text to a
//! fully populated [`options::Options`]: tokenizing, typed value parsing,
//! the `set`/`color`/`bind`/`source` statements, the line-type/color table
//! consulted by the draw layer, and the two-phase config load (rc files,
//! then VCS config) including the `core.worktree` chdir dance.

pub mod config;
pub mod error;
pub mod line_info;
pub mod options;
pub mod step;
pub mod tokenizer;

pub use config::{LineWarning, VcsConfigEntry, VcsConfigOutcome, apply_line, load_defaults, load_file, resolve_worktree};
pub use error::{ColorKind, OptionError};
pub use line_info::{Attr, Color, LineInfo, LineInfoTable, LineType};
pub use options::{CommitOrder, IgnoreSpace, LineGraphics, Options, ShowAuthor, ShowDate, ShowFileSize, ShowFilename};
pub use step::{Step, apply_step, parse_step};
pub use tokenizer::tokenize;
