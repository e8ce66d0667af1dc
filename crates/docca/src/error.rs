//! Error types for docca

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for docca operations
#[derive(Error, Debug)]
pub enum DoccaError {
    /// A required element or attribute is missing, or the input violates a
    /// structural assumption about the Doxygen output.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A cross-reference points to an entity that was never loaded
    #[error("Unresolved reference: {refid}")]
    UnresolvedReference {
        /// Identifier that could not be found
        refid: String,
    },

    /// Two members of one scope share a name
    #[error("Duplicate member '{name}' in scope '{scope}'")]
    DuplicateMember {
        /// Name of the scope
        scope: String,
        /// Name of the clashing member
        name: String,
    },

    /// A `memberdef` of a kind docca has no factory for
    #[error("Unsupported member kind '{kind}' for '{id}'")]
    UnsupportedMemberKind {
        /// The `kind` attribute
        kind: String,
        /// The member's identifier
        id: String,
    },

    /// The XML parser rejected a document
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Reading an input file failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A configuration file is not valid
    #[error("Config error: {0}")]
    Config(String),

    /// Template loading or rendering failed
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl DoccaError {
    /// Shorthand for [`DoccaError::MalformedInput`].
    pub fn malformed(message: impl Into<String>) -> Self {
        DoccaError::MalformedInput(message.into())
    }
}

/// Result type alias for docca operations
pub type Result<T> = std::result::Result<T, DoccaError>;
