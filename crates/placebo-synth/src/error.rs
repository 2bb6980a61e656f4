use placebo_ir::{MethodRef, Type};
use placebo_model::ModelConsistencyError;
use thiserror::Error;

pub type Result<T, E = SynthesisError> = std::result::Result<T, E>;

/// Why one method's placeholder body could not be built. Always recoverable:
/// the method is reported and the batch moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("call to {callee} uses {kind}, which has no fixed dispatch kind")]
    UnsupportedCallKind {
        callee: MethodRef,
        kind: &'static str,
    },
    #[error("cannot materialize a value of type {ty}: {reason}")]
    UnresolvableType { ty: Type, reason: &'static str },
    #[error("{0} has no original body to replace")]
    MissingBody(MethodRef),
    #[error(transparent)]
    Model(#[from] ModelConsistencyError),
}
