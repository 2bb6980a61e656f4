use placebo_ir::{ClassName, LocalId, MethodRef};
use thiserror::Error;

/// Failure to read or write a model file. Fatal for the whole pass.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to access model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The model references something it does not define. Recoverable: only the
/// method being processed is affected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelConsistencyError {
    #[error("class {0} is not part of the program model")]
    MissingClass(ClassName),
    #[error("method {0} is not part of the program model")]
    MissingMethod(MethodRef),
    #[error("class {0} declares no constructor")]
    NoConstructor(ClassName),
    #[error("body of {method} refers to undeclared local {}", local.0)]
    UnknownLocal { method: MethodRef, local: LocalId },
}
