//! Error taxonomy for the option store and command language.

use thiserror::Error;

/// What a `color` statement's first token failed to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    Name,
    Attribute,
}

/// A single failure while interpreting one line of the command language.
///
/// Every variant maps to a message fragment used when a line is reported
/// as `<path> line N: <msg> near '<prefix>'`; see [`OptionError::message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("Too many arguments")]
    TooManyArgs,
    #[error("No value assigned")]
    NoValueAssigned,
    #[error("Unknown variable name")]
    UnknownVariable,
    #[error("Unknown color name")]
    UnknownColorName,
    #[error("Unknown color attribute")]
    UnknownColorAttribute,
    #[error("Unknown key map")]
    UnknownKeyMap,
    #[error("Unknown request name")]
    UnknownRequest,
    #[error("Obsolete request name")]
    Obsolete,
    #[error("Integer value out of bound")]
    OutOfRange,
    #[error("Invalid step value")]
    InvalidStep,
    #[error("Unmatched quotation")]
    UnmatchedQuote,
    #[error("File does not exist")]
    FileMissing,
    #[error("Failed to resolve HOME directory")]
    HomeUnresolvable,
    #[error("Out of memory")]
    Oom,
}

impl OptionError {
    pub fn color(kind: ColorKind) -> Self {
        match kind {
            ColorKind::Name => OptionError::UnknownColorName,
            ColorKind::Attribute => OptionError::UnknownColorAttribute,
        }
    }
}
