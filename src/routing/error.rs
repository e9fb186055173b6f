//! Routing error types.

use thiserror::Error;

/// A rule that cannot be installed.
///
/// Raised by the parser for grammar violations and by the factory for
/// missing or undecodable payloads. A router is never built from a rule
/// that produced this error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedRuleError {
    /// The rule has no `=>` between its when and then sides.
    #[error("route rule {rule:?} has no `=>` separator")]
    MissingSeparator { rule: String },

    /// A clause has neither `=` nor `!=`.
    #[error("clause {clause:?} has no `=` or `!=` operator")]
    MissingOperator { clause: String },

    /// A clause operator has nothing on its left.
    #[error("clause {clause:?} has an empty key")]
    EmptyKey { clause: String },

    /// A match value carries more than one `*`.
    #[error("value {value:?} has more than one `*` wildcard")]
    MultipleWildcards { value: String },

    /// The configuration url carries no `rule` parameter.
    #[error("configuration url has no `rule` parameter")]
    MissingRule,

    /// The `rule` parameter is not valid URL-safe base64 text.
    #[error("rule payload cannot be decoded: {0}")]
    Decode(String),
}
