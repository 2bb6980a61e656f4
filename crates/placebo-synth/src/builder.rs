use std::collections::{HashMap, HashSet};

use placebo_ir::{
    Body, ClassName, Constant, Expr, FieldRef, Instruction, LocalId, Operand, Place,
    PrimitiveKind, Type,
};

use crate::error::{Result, SynthesisError};

/// Append-only construction of one placeholder body.
///
/// Tracks the per-body memos synthesis relies on: one cast local per target
/// type, one static-initializer call per class, one guard load, and the slot
/// an abstraction strategy keeps its representative in.
#[derive(Debug, Default)]
pub struct BodyBuilder {
    body: Body,
    casts: HashMap<Type, LocalId>,
    initialized: HashSet<ClassName>,
    guard: Option<LocalId>,
    representative: Option<LocalId>,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh temporary; names are placeholders until cleanup standardizes them.
    pub fn new_local(&mut self, ty: Type) -> LocalId {
        let name = format!("$t{}", self.body.locals.len());
        self.body.add_local(name, ty)
    }

    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.body.push(instruction)
    }

    pub fn local_type(&self, local: LocalId) -> Option<&Type> {
        self.body.local_type(local)
    }

    pub fn representative_slot(&self) -> Option<LocalId> {
        self.representative
    }

    pub fn set_representative_slot(&mut self, local: LocalId) {
        self.representative = Some(local);
    }

    /// `local` viewed at type `ty`. Emits at most one cast per target type;
    /// a local already of type `ty` is used as-is.
    pub fn cast(&mut self, local: LocalId, ty: &Type) -> LocalId {
        if self.local_type(local) == Some(ty) {
            return local;
        }
        if let Some(&cached) = self.casts.get(ty) {
            return cached;
        }
        let cast = self.new_local(ty.clone());
        self.push(Instruction::assign(
            cast,
            Expr::Cast {
                operand: Operand::Local(local),
                target: ty.clone(),
            },
        ));
        self.casts.insert(ty.clone(), cast);
        cast
    }

    /// Allocate an object or array of `ty`. Arrays get length 1 in every
    /// dimension.
    pub fn insert_new(&mut self, ty: &Type) -> Result<LocalId> {
        let value = match ty {
            Type::Reference(class) => Expr::New(class.clone()),
            Type::Array { dimensions: 0, .. } => {
                return Err(SynthesisError::UnresolvableType {
                    ty: ty.clone(),
                    reason: "array type without dimensions",
                })
            }
            Type::Array { dimensions, .. } => Expr::NewArray {
                ty: ty.clone(),
                lengths: (0..*dimensions)
                    .map(|_| Operand::Const(Constant::Int(1)))
                    .collect(),
            },
            Type::Primitive(_) => {
                return Err(SynthesisError::UnresolvableType {
                    ty: ty.clone(),
                    reason: "primitive types cannot be allocated",
                })
            }
        };
        let local = self.new_local(ty.clone());
        self.push(Instruction::assign(local, value));
        Ok(local)
    }

    pub fn load_static_field(&mut self, field: &FieldRef) -> LocalId {
        let local = self.new_local(field.ty.clone());
        self.push(Instruction::assign(local, Expr::StaticField(field.clone())));
        local
    }

    pub fn store_static_field(&mut self, field: &FieldRef, value: Operand) {
        self.push(Instruction::Assign {
            dest: Place::StaticField(field.clone()),
            value: Expr::Use(value),
        });
    }

    /// Returns `true` the first time `class` is seen.
    pub fn mark_initialized(&mut self, class: &ClassName) -> bool {
        self.initialized.insert(class.clone())
    }

    /// Emit `if guard goto skip; instruction; skip: nop`. The guard is loaded
    /// from `guard_field` once per body.
    pub fn push_guarded(&mut self, guard_field: &FieldRef, instruction: Instruction) {
        let guard = match self.guard {
            Some(guard) => guard,
            None => {
                let guard = self.load_static_field(guard_field);
                self.guard = Some(guard);
                guard
            }
        };
        let skip = self.body.instructions.len() + 2;
        self.push(Instruction::If {
            condition: Operand::Local(guard),
            target: skip,
        });
        self.push(instruction);
        self.push(Instruction::Nop);
    }

    pub fn finish(self) -> Body {
        self.body
    }
}

/// Canonical non-zero constant for a primitive type.
pub fn primitive_value(kind: PrimitiveKind) -> Constant {
    match kind {
        PrimitiveKind::Long => Constant::Long(1),
        PrimitiveKind::Float => Constant::Float(1.0),
        PrimitiveKind::Double => Constant::Double(1.0),
        _ => Constant::Int(1),
    }
}
