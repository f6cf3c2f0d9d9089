use crate::types::KeyPath;
use thiserror::Error;

/// Stage of the projection a navigation failure was detected in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Enumerate,
    Filter,
    Materialize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Enumerate => "enumerate",
            Stage::Filter => "filter",
            Stage::Materialize => "materialize",
        })
    }
}

/// Errors raised while validating or projecting a header document
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The raw header does not conform to the header schema
    #[error("header failed schema validation: {0}")]
    SchemaValidation(String),

    #[error("header document root is not a mapping")]
    RootNotMapping,

    /// Enumeration still had containers to expand after the round limit
    #[error("path enumeration did not converge after {rounds} rounds (still expanding `{path}`)")]
    StructuralDepthExceeded { rounds: usize, path: KeyPath },

    /// A path produced by enumeration no longer resolves. Internal contract breach.
    #[error("key-path `{path}` does not resolve against the document during {stage}")]
    Unresolvable { path: KeyPath, stage: Stage },

    #[error("flat key `{key}` produced by both `{first}` and `{second}`")]
    KeyCollision {
        key: String,
        first: KeyPath,
        second: KeyPath,
    },
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
