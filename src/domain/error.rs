//! Error types for tree construction, node resolution and value generation

use thiserror::Error;

/// Errors raised while building, querying or generating an arbitrary tree.
///
/// All of them are structural or configuration problems; none is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A resolver or manipulator was applied to a node of the wrong shape
    #[error("Invalid structure: expected {expected}, found {property}")]
    InvalidStructure { expected: String, property: String },

    /// No introspector in the chain claimed the node
    #[error("Unsupported type '{type_name}' for property {property}")]
    UnsupportedType { type_name: String, property: String },

    /// An abstract slot has no concrete implementation to choose from
    #[error("No candidate implementation for abstract type '{type_name}' (property {property})")]
    NoCandidateImplementation { type_name: String, property: String },

    /// Abstract types whose candidates lead back to themselves
    #[error("Cyclic candidate resolution at abstract type '{type_name}' (property {property})")]
    CyclicCandidate { type_name: String, property: String },

    /// Candidate index outside the node's candidate list
    #[error("Candidate index {index} out of range for property {property} ({available} candidates)")]
    CandidateOutOfRange {
        index: usize,
        available: usize,
        property: String,
    },

    /// Type name not present in the registry
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Malformed path expression
    #[error("Invalid expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// A unique container could not be filled with distinct elements
    #[error("Could not generate distinct elements for {property} after {attempts} attempts")]
    UniqueElementsExhausted { property: String, attempts: usize },
}

impl GenerationError {
    pub fn invalid_structure(expected: impl Into<String>, property: impl ToString) -> Self {
        GenerationError::InvalidStructure {
            expected: expected.into(),
            property: property.to_string(),
        }
    }

    pub fn invalid_expression(expression: &str, reason: impl Into<String>) -> Self {
        GenerationError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;
