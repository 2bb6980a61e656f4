//! Placeholder-body synthesis for library methods.
//!
//! A library method's original body is scanned once for the effects a
//! call-graph analysis cares about (creations, calls, thrown types). The
//! [`Synthesizer`] then emits a much smaller body producing exactly those
//! effects, drawing every reference value it needs from an [`Abstraction`].

#![forbid(unsafe_code)]

mod abstraction;
mod batch;
mod builder;
mod cleanup;
mod error;
mod reflective;
mod scan;
mod synthesizer;

pub use crate::abstraction::{Abstraction, AbstractionKind, PerUnitSet, SharedSet};
pub use crate::batch::{synthesize_program, SkippedMethod, SynthesisReport};
pub use crate::builder::{primitive_value, BodyBuilder};
pub use crate::cleanup::{cleanup, eliminate_nops, standardize_locals};
pub use crate::error::{Result, SynthesisError};
pub use crate::reflective::{reflective_api, ReflectiveEffects};
pub use crate::scan::{classify, ArrayAccess, Call, Observation, OriginalBodyFacts, ScanContext};
pub use crate::synthesizer::{SynthesisOptions, Synthesized, Synthesizer};
