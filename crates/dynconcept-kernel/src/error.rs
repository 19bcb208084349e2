//! Error types for concept declaration and resolution.
//!
//! Every failure here is detected ahead of any runtime use of a concept. None
//! are retryable: each one means an interface definition must be fixed at its
//! declaration site.

use crate::concept::ConceptId;

/// Errors arising from invalid concept declarations or lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConceptError {
    /// The flattened clause sequence of a concept names an operation twice.
    #[error(
        "duplicate operation `{operation}` while resolving `{concept}`: \
         declared by `{first_origin}` and again by `{second_origin}`"
    )]
    DuplicateOperationName {
        concept: String,
        operation: String,
        first_origin: String,
        second_origin: String,
    },

    /// A lookup named an operation outside the concept's requirement set.
    #[error("`{concept}` does not require an operation named `{operation}`")]
    UnknownOperation { concept: String, operation: String },

    /// A concept refines itself, directly or through other concepts.
    #[error("cyclic refinement: {}", path.join(" -> "))]
    CyclicRefinement { path: Vec<String> },

    /// Refinement chain exceeds the configured depth limit.
    #[error("refinement of `{concept}` exceeds the depth limit of {limit}")]
    RefinementTooDeep { concept: String, limit: usize },

    /// A concept was reserved but never given clauses.
    #[error("concept `{concept}` was reserved but never defined")]
    UndefinedConcept { concept: String },

    /// A reserved concept was defined a second time.
    #[error("concept `{concept}` is already defined")]
    AlreadyDefined { concept: String },

    /// The id was not issued by this catalog.
    #[error("unknown concept {0}")]
    UnknownConcept(ConceptId),

    /// An operation clause carries an empty name.
    #[error("`{concept}` declares an operation with an empty name")]
    EmptyOperationName { concept: String },

    /// A textual signature or type descriptor could not be parsed.
    #[error("invalid signature `{input}`: {reason}")]
    InvalidSignature { input: String, reason: String },
}

impl ConceptError {
    /// Stable failure class for this error, suitable for machine consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateOperationName { .. } => "duplicate_operation_name",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::CyclicRefinement { .. } => "cyclic_refinement",
            Self::RefinementTooDeep { .. } => "refinement_too_deep",
            Self::UndefinedConcept { .. } => "undefined_concept",
            Self::AlreadyDefined { .. } => "already_defined",
            Self::UnknownConcept(_) => "unknown_concept",
            Self::EmptyOperationName { .. } => "empty_operation_name",
            Self::InvalidSignature { .. } => "invalid_signature",
        }
    }
}

/// Errors from loading [`ResolveOptions`](crate::config::ResolveOptions).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid toml: {source}")]
    ParseToml {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid resolve options: {0}")]
    Invalid(String),
}
