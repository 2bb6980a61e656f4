//! Three-address intermediate representation for method bodies.
//!
//! The IR is deliberately small: it carries exactly the instructions needed to
//! express object/array creation, field access, invocation and exception flow,
//! which is what call-graph construction consumes.

#![forbid(unsafe_code)]

mod body;
mod printer;
mod ty;

pub use crate::body::{
    BinaryOp, Body, Constant, Expr, IdentitySource, Instruction, InvokeExpr, InvokeKind, Local,
    LocalId, Operand, Place, Trap,
};
pub use crate::ty::{
    ClassName, FieldRef, MethodRef, PrimitiveKind, ReturnType, Type, TypeParseError,
    CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME,
};
