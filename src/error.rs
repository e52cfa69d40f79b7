//! Error types for registry codec operations.
//!
//! This module provides error handling for every stage of the codec: reading
//! and writing the backing files, the line-oriented import grammar, the value
//! wire encodings, and tree manipulation.

use crate::value::ValueType;
use std::io;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while importing, exporting or manipulating a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// I/O error occurred while reading or writing a registry file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The first line of the stream is not a known registry header.
    #[error("Expected registry header, got {found:?}")]
    InvalidHeader {
        /// The line that was found instead.
        found: String,
    },

    /// An error raised while parsing a specific line of a registry file.
    #[error("line {line}: {source}")]
    Parse {
        /// 1-based line number where the error occurred.
        line: usize,
        /// The underlying error.
        #[source]
        source: Box<RegistryError>,
    },

    /// Malformed syntax or data.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A value line carries a wire tag outside the known set.
    #[error("Unknown value tag: {0}")]
    UnknownValueTag(String),

    /// UTF-16LE data could not be decoded.
    #[error("Invalid UTF-16 string data")]
    InvalidUtf16,

    /// A fixed-width field has the wrong number of bytes.
    #[error("Truncated data: expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        /// Number of bytes required.
        expected: usize,
        /// Number of bytes present.
        actual: usize,
    },

    /// A value line appeared before any key header.
    #[error("Value without key")]
    ValueWithoutKey,

    /// A `#time` or `#link` directive appeared before any key header.
    #[error("Directive without key")]
    DirectiveWithoutKey,

    /// The root-scope comment appeared more than once.
    #[error("Duplicate root declaration")]
    DuplicateRootDeclaration,

    /// A key header appeared before the root-scope comment.
    #[error("Key header before root declaration")]
    MissingRootDeclaration,

    /// The root-scope comment names an unrecognized path.
    #[error("Unknown registry path: {0}")]
    UnknownRootPath(String),

    /// A path or hive root is not one of the recognized root keys.
    #[error("Unknown root key: {0}")]
    UnknownRootKey(String),

    /// Attempted to delete the root key of a hive.
    #[error("Cannot delete the root key")]
    RootDeletion,

    /// A registry type outside the closed set of supported value types.
    #[error("Unsupported value type: {}", .0.name())]
    UnsupportedValueType(ValueType),

    /// Key or value not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RegistryError {
    /// Creates a format error with detailed context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use wine_registry::error::RegistryError;
    /// let tag = "hex(4)";
    /// let err = RegistryError::format_error(format!("{} expects 4 bytes, got {}", tag, 3));
    /// ```
    pub fn format_error(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }

    /// Creates a not found error with context about what was being searched.
    ///
    /// # Arguments
    ///
    /// * `item_type` - Type of item (e.g., "key", "value")
    /// * `name` - Name of the item that wasn't found
    pub fn not_found(item_type: &str, name: &str) -> Self {
        Self::NotFound(format!("{} '{}'", item_type, name))
    }

    /// Attaches a line number to an error raised by the import parser.
    ///
    /// I/O errors are passed through unchanged.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            err @ (Self::Io(_) | Self::Parse { .. }) => err,
            err => Self::Parse {
                line,
                source: Box::new(err),
            },
        }
    }

    /// Returns the innermost error, skipping line-number context.
    pub fn kind(&self) -> &RegistryError {
        match self {
            Self::Parse { source, .. } => source.kind(),
            err => err,
        }
    }
}
