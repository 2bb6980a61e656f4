//! Single-pass extraction of call-graph-relevant facts from an original body.
//!
//! [`classify`] maps one instruction to at most one [`Observation`]; the
//! scanner folds observations into [`OriginalBodyFacts`]. Every set is keyed
//! by type or declaration identity, so repeated occurrences collapse.

use indexmap::IndexSet;
use placebo_ir::{
    Body, ClassName, Expr, Instruction, InvokeExpr, InvokeKind, LocalId, MethodRef, Operand,
    Place, Type,
};
use placebo_model::{ClassDef, MethodDef, ModelConsistencyError};

/// A call shape: dispatch kind, callee and static receiver type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub kind: InvokeKind,
    pub callee: MethodRef,
    /// Static type of the receiver in the original body; `None` for static
    /// calls.
    pub receiver: Option<Type>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalBodyFacts {
    pub array_creations: IndexSet<Type>,
    pub object_creations: IndexSet<MethodRef>,
    pub invoke_stmts: IndexSet<Call>,
    pub invoke_exprs: IndexSet<Call>,
    pub throwables: IndexSet<Type>,
    pub checked_exceptions: IndexSet<ClassName>,
    pub reads_array: bool,
    pub writes_array: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    ArrayCreation(Type),
    ArrayRead,
    ArrayWrite,
    InvokeExpr(Call),
    ObjectCreation(MethodRef),
    InvokeStmt(Call),
    Throw(Type),
}

/// Array accesses already seen; a second read or write is not re-reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrayAccess {
    pub reads: bool,
    pub writes: bool,
}

/// The method whose original body is being scanned.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub class: &'a ClassDef,
    pub method: &'a MethodDef,
    pub body: &'a Body,
}

impl ScanContext<'_> {
    fn local_type(&self, local: LocalId) -> Result<Type, ModelConsistencyError> {
        self.body
            .local_type(local)
            .cloned()
            .ok_or_else(|| ModelConsistencyError::UnknownLocal {
                method: self.method.method_ref(&self.class.name),
                local,
            })
    }

    fn call(&self, invoke: &InvokeExpr) -> Result<Call, ModelConsistencyError> {
        Ok(Call {
            kind: invoke.kind,
            callee: invoke.callee.clone(),
            receiver: invoke.base.map(|base| self.local_type(base)).transpose()?,
        })
    }

    /// Calls to the direct superclass's constructor from a constructor. The
    /// header re-emits this call unconditionally, so it is not collected.
    pub fn is_call_to_super_constructor(&self, invoke: &InvokeExpr) -> bool {
        let Some(superclass) = &self.class.superclass else {
            return false;
        };
        invoke.kind == InvokeKind::Special
            && self.method.is_constructor()
            && invoke.callee.is_constructor()
            && invoke.callee.class == *superclass
    }

    fn is_relevant_object_creation(&self, invoke: &InvokeExpr) -> bool {
        invoke.kind == InvokeKind::Special
            && invoke.callee.is_constructor()
            && !self.is_call_to_super_constructor(invoke)
    }
}

/// Classify one instruction. For assignments the first matching case wins:
/// array creation, array read, array write, then invoke.
///
/// A thrown local or a call receiver the body does not declare is an
/// [`ModelConsistencyError::UnknownLocal`]; only a constant `null` throw
/// yields nothing.
pub fn classify(
    ctx: &ScanContext<'_>,
    instruction: &Instruction,
    seen: ArrayAccess,
) -> Result<Option<Observation>, ModelConsistencyError> {
    let observation = match instruction {
        Instruction::Assign { dest, value } => {
            if let Expr::NewArray { ty, .. } = value {
                Some(Observation::ArrayCreation(ty.clone()))
            } else if !seen.reads && matches!(value, Expr::ArrayElement { .. }) {
                Some(Observation::ArrayRead)
            } else if !seen.writes && matches!(dest, Place::ArrayElement { .. }) {
                Some(Observation::ArrayWrite)
            } else if let Expr::Invoke(invoke) = value {
                Some(Observation::InvokeExpr(ctx.call(invoke)?))
            } else {
                None
            }
        }
        Instruction::Invoke(invoke) => {
            let call = ctx.call(invoke)?;
            if ctx.is_relevant_object_creation(invoke) {
                Some(Observation::ObjectCreation(call.callee))
            } else if !ctx.is_call_to_super_constructor(invoke) {
                Some(Observation::InvokeStmt(call))
            } else {
                None
            }
        }
        Instruction::Throw(Operand::Local(local)) => {
            Some(Observation::Throw(ctx.local_type(*local)?))
        }
        Instruction::Throw(Operand::Const(constant)) => constant.ty().map(Observation::Throw),
        _ => None,
    };
    Ok(observation)
}

impl OriginalBodyFacts {
    /// Scan every instruction once, then every trap.
    pub fn scan(ctx: &ScanContext<'_>) -> Result<Self, ModelConsistencyError> {
        let mut facts = OriginalBodyFacts::default();
        for instruction in &ctx.body.instructions {
            if let Some(observation) = classify(ctx, instruction, facts.array_access())? {
                facts.record(observation);
            }
        }
        facts.checked_exceptions.extend(
            ctx.body
                .traps
                .iter()
                .map(|trap| trap.exception.clone()),
        );
        Ok(facts)
    }

    pub fn record(&mut self, observation: Observation) {
        match observation {
            Observation::ArrayCreation(ty) => {
                self.array_creations.insert(ty);
            }
            Observation::ArrayRead => self.reads_array = true,
            Observation::ArrayWrite => self.writes_array = true,
            Observation::InvokeExpr(call) => {
                self.invoke_exprs.insert(call);
            }
            Observation::ObjectCreation(init) => {
                self.object_creations.insert(init);
            }
            Observation::InvokeStmt(call) => {
                self.invoke_stmts.insert(call);
            }
            Observation::Throw(ty) => {
                self.throwables.insert(ty);
            }
        }
    }

    pub fn array_access(&self) -> ArrayAccess {
        ArrayAccess {
            reads: self.reads_array,
            writes: self.writes_array,
        }
    }

    /// Every call collected, discarded results first.
    pub fn calls(&self) -> impl Iterator<Item = &Call> + '_ {
        self.invoke_stmts.iter().chain(self.invoke_exprs.iter())
    }
}
