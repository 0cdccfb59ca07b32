//! Error types for the enrichment pipeline.
//!
//! Every variant aborts the whole build: a host must surface it as a
//! build-time failure rather than emit a partial document.

use thiserror::Error;

/// Result type alias for connmeta operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while enriching a document.
#[derive(Error, Debug)]
pub enum Error {
    /// A lookup parameter spec is neither a JSON object nor query-encoded.
    #[error("Malformed parameter spec '{spec}': {reason}")]
    MalformedParameterSpec {
        /// The raw spec text as declared.
        spec: String,
        /// Why the text was rejected.
        reason: String,
    },

    /// Strict resolution found no operation with the requested signature.
    #[error("No operation '{action}' with parameters [{}]", .parameters.join(", "))]
    UnresolvedLookupOperation {
        /// Declared action name.
        action: String,
        /// Sorted parameter names that were searched for.
        parameters: Vec<String>,
    },

    /// Strict resolution found more than one operation with the requested signature.
    #[error(
        "Operation '{action}' with parameters [{}] is ambiguous: {}",
        .parameters.join(", "),
        .candidates.join(", ")
    )]
    AmbiguousLookupOperation {
        /// Declared action name.
        action: String,
        /// Sorted parameter names that were searched for.
        parameters: Vec<String>,
        /// Paths of every matching operation.
        candidates: Vec<String>,
    },

    /// The draft document could not be read or written.
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

impl Error {
    /// Short machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MalformedParameterSpec { .. } => "MALFORMED_PARAMETER_SPEC",
            Error::UnresolvedLookupOperation { .. } => "UNRESOLVED_LOOKUP_OPERATION",
            Error::AmbiguousLookupOperation { .. } => "AMBIGUOUS_LOOKUP_OPERATION",
            Error::InvalidDocument(_) => "INVALID_DOCUMENT",
        }
    }
}
