//! Error and diagnostic types for the ormfilter crate.

use thiserror::Error;

/// Fatal errors raised while executing a query.
///
/// Only structurally invalid input aborts a query. Everything else a `where`
/// clause can get wrong degrades to "no match" and is reported as a
/// [`Diagnostic`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Pagination parameters are 1-based and must both be at least 1.
    #[error("invalid pagination: page {page} and size {size} must both be >= 1")]
    InvalidPagination { page: i64, size: i64 },
}

/// Result type for ormfilter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

/// A non-fatal problem found while compiling a `where` clause.
///
/// The offending operator is compiled into a unit that never matches (or, for
/// negated operators, always matches) and the query carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// The key is neither a known operator nor a field in a relation fragment.
    #[error("unknown operator '{key}'")]
    UnknownOperator { key: String },

    /// A known operator received an operand it cannot use.
    #[error("invalid operand for '{op}': {reason}")]
    InvalidOperand { op: &'static str, reason: String },

    /// The regular expression (or one of its flags) failed to compile.
    #[error("invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// `mode` was set to something other than `insensitive` or `default`.
    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    /// An `AND`/`OR`/`NOT` entry was not an object.
    #[error("'{group}' expects a fragment or a list of fragments")]
    InvalidGroup { group: &'static str },

    /// A field filtered with a relation fragment held a scalar or array.
    #[error("'{field}' is filtered as a relation but holds a non-object value")]
    NotARelation { field: String },
}

impl Diagnostic {
    pub(crate) fn invalid_operand(op: &'static str, reason: impl Into<String>) -> Self {
        Diagnostic::InvalidOperand {
            op,
            reason: reason.into(),
        }
    }
}
