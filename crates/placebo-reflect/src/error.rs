use thiserror::Error;

/// The reflection log cannot be used. Fatal: the pass stops before any
/// method is synthesized.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read reflection facts file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed reflection fact at {path}:{line}: {content:?}")]
    Malformed {
        path: String,
        line: usize,
        content: String,
    },
}

/// A reflection target that is not a well-formed method signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid method signature: {0}")]
pub struct SignatureError(pub String);
