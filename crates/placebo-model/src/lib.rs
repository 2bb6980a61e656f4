//! Whole-program class/method model.
//!
//! The model is the read-only input of body synthesis (classes, their
//! superclass links, methods and original bodies) and the sink for synthesized
//! bodies. It is loaded from and written to JSON.

#![forbid(unsafe_code)]

mod error;
mod program;

pub use crate::error::{ModelConsistencyError, ModelError};
pub use crate::program::{ClassDef, FieldDef, MethodDef, Program};
