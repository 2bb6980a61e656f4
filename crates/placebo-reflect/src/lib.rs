//! Reflection facts: call targets that reflective operations reached in a
//! recorded run, used to approximate effects static scanning cannot see.

#![forbid(unsafe_code)]

mod error;
mod facts;
mod signature;

pub use crate::error::{ConfigurationError, SignatureError};
pub use crate::facts::{ReflectionFacts, ReflectiveCallKind};
pub use crate::signature::parse_method_signature;
