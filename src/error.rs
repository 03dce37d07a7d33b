use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors produced while using the letterspacer crate
///
/// Glyphs which are simply not spaceable (no outlines, linked metrics,
/// outlines outside the reference zone) are not errors; see
/// [`crate::SkipReason`].
#[derive(Debug, Error)]
pub enum SpacingError {
    #[error("Unknown file type for file {path:?}")]
    /// The file type is unknown
    UnknownFileType {
        /// The path of the file
        path: PathBuf,
    },

    /// General error with a message
    #[error("{0}")]
    General(String),

    #[error("IO Error: {0}")]
    /// IO error
    IO(#[from] io::Error),

    #[error("Error parsing JSON: {0}")]
    /// Error (de)serializing a font or rule table
    Json(#[from] serde_json::Error),

    #[error("Ill-constructed path")]
    /// A path could not be converted to a curve
    BadPath,

    #[error("Glyph {glyph} not found")]
    /// A glyph was not found in the font
    GlyphNotFound {
        /// The glyph name
        glyph: String,
    },

    #[error("Master {master} not found")]
    /// A master was not found in the font
    MasterNotFound {
        /// The master ID
        master: String,
    },

    #[error("Called a method which requires a decomposed layer on a layer which had components")]
    /// Components must be decomposed before this operation
    NeedsDecomposition,

    #[error("Invalid spacing parameter {name}: {reason}")]
    /// A spacing parameter is out of range
    InvalidParameter {
        /// The parameter name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    #[error("Bad rule on line {line}: {reason}")]
    /// A line of a rule file could not be understood
    RuleParse {
        /// One-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    #[error("Error in filter: {0}")]
    /// A filter could not be constructed or applied
    FilterError(String),
}
