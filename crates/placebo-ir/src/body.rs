use serde::{Deserialize, Serialize};

use crate::ty::{ClassName, FieldRef, MethodRef, PrimitiveKind, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub u32);

impl LocalId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A typed, named storage slot scoped to one body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Local {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Class(Type),
    Null,
}

impl Constant {
    /// Static type of the constant; `null` has none.
    pub fn ty(&self) -> Option<Type> {
        match self {
            Constant::Int(_) => Some(Type::Primitive(PrimitiveKind::Int)),
            Constant::Long(_) => Some(Type::Primitive(PrimitiveKind::Long)),
            Constant::Float(_) => Some(Type::Primitive(PrimitiveKind::Float)),
            Constant::Double(_) => Some(Type::Primitive(PrimitiveKind::Double)),
            Constant::String(_) => Some(Type::class("java.lang.String")),
            Constant::Class(_) => Some(Type::class("java.lang.Class")),
            Constant::Null => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Local(LocalId),
    Const(Constant),
}

impl Operand {
    pub fn as_local(&self) -> Option<LocalId> {
        match self {
            Operand::Local(id) => Some(*id),
            Operand::Const(_) => None,
        }
    }

    fn for_each_local_mut(&mut self, f: &mut dyn FnMut(&mut LocalId)) {
        if let Operand::Local(id) = self {
            f(id);
        }
    }
}

impl From<LocalId> for Operand {
    fn from(value: LocalId) -> Self {
        Operand::Local(value)
    }
}

impl From<Constant> for Operand {
    fn from(value: Constant) -> Self {
        Operand::Const(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    Static,
    Special,
    Interface,
    Virtual,
    /// Bootstrap-method call sites; no fixed dispatch target.
    Dynamic,
}

impl InvokeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            InvokeKind::Static => "staticinvoke",
            InvokeKind::Special => "specialinvoke",
            InvokeKind::Interface => "interfaceinvoke",
            InvokeKind::Virtual => "virtualinvoke",
            InvokeKind::Dynamic => "dynamicinvoke",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    pub callee: MethodRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<LocalId>,
    #[serde(default)]
    pub args: Vec<Operand>,
}

impl InvokeExpr {
    pub fn new_static(callee: MethodRef, args: Vec<Operand>) -> Self {
        Self {
            kind: InvokeKind::Static,
            callee,
            base: None,
            args,
        }
    }

    pub fn new_instance(
        kind: InvokeKind,
        base: LocalId,
        callee: MethodRef,
        args: Vec<Operand>,
    ) -> Self {
        Self {
            kind,
            callee,
            base: Some(base),
            args,
        }
    }

    fn for_each_local_mut(&mut self, f: &mut dyn FnMut(&mut LocalId)) {
        if let Some(base) = &mut self.base {
            f(base);
        }
        for arg in &mut self.args {
            arg.for_each_local_mut(f);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    Cmp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Ushr => ">>>",
            BinaryOp::Cmp => "cmp",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Use(Operand),
    New(ClassName),
    /// Allocation of `ty` (an array type); `lengths` may cover fewer
    /// dimensions than the type declares.
    NewArray {
        ty: Type,
        lengths: Vec<Operand>,
    },
    Cast {
        operand: Operand,
        target: Type,
    },
    StaticField(FieldRef),
    InstanceField {
        base: LocalId,
        field: FieldRef,
    },
    ArrayElement {
        base: LocalId,
        index: Operand,
    },
    Invoke(InvokeExpr),
    Binary {
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
}

impl Expr {
    fn for_each_local_mut(&mut self, f: &mut dyn FnMut(&mut LocalId)) {
        match self {
            Expr::Use(op) => op.for_each_local_mut(f),
            Expr::New(_) | Expr::StaticField(_) => {}
            Expr::NewArray { lengths, .. } => {
                for len in lengths {
                    len.for_each_local_mut(f);
                }
            }
            Expr::Cast { operand, .. } => operand.for_each_local_mut(f),
            Expr::InstanceField { base, .. } => f(base),
            Expr::ArrayElement { base, index } => {
                f(base);
                index.for_each_local_mut(f);
            }
            Expr::Invoke(invoke) => invoke.for_each_local_mut(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_local_mut(f);
                rhs.for_each_local_mut(f);
            }
        }
    }
}

/// Destination of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    Local(LocalId),
    ArrayElement { base: LocalId, index: Operand },
    StaticField(FieldRef),
    InstanceField { base: LocalId, field: FieldRef },
}

impl Place {
    fn for_each_local_mut(&mut self, f: &mut dyn FnMut(&mut LocalId)) {
        match self {
            Place::Local(id) => f(id),
            Place::ArrayElement { base, index } => {
                f(base);
                index.for_each_local_mut(f);
            }
            Place::StaticField(_) => {}
            Place::InstanceField { base, .. } => f(base),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    This,
    Parameter(u16),
    CaughtException,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Binds an implicit value (receiver, parameter, caught exception) to a local.
    Identity {
        dest: LocalId,
        source: IdentitySource,
    },
    Assign {
        dest: Place,
        value: Expr,
    },
    /// Call whose result, if any, is discarded.
    Invoke(InvokeExpr),
    Throw(Operand),
    /// Jump to `target` (an instruction index) when `condition` is non-zero.
    If {
        condition: Operand,
        target: usize,
    },
    Goto(usize),
    Return(Option<Operand>),
    Nop,
}

impl Instruction {
    pub fn assign(dest: LocalId, value: Expr) -> Self {
        Instruction::Assign {
            dest: Place::Local(dest),
            value,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Instruction::Identity { .. })
    }

    pub fn branch_target(&self) -> Option<usize> {
        match self {
            Instruction::If { target, .. } | Instruction::Goto(target) => Some(*target),
            _ => None,
        }
    }

    pub fn branch_target_mut(&mut self) -> Option<&mut usize> {
        match self {
            Instruction::If { target, .. } | Instruction::Goto(target) => Some(target),
            _ => None,
        }
    }

    /// Visit every local this instruction reads or writes.
    pub fn for_each_local_mut(&mut self, mut f: impl FnMut(&mut LocalId)) {
        let f: &mut dyn FnMut(&mut LocalId) = &mut f;
        match self {
            Instruction::Identity { dest, .. } => f(dest),
            Instruction::Assign { dest, value } => {
                dest.for_each_local_mut(f);
                value.for_each_local_mut(f);
            }
            Instruction::Invoke(invoke) => invoke.for_each_local_mut(f),
            Instruction::Throw(op) => op.for_each_local_mut(f),
            Instruction::If { condition, .. } => condition.for_each_local_mut(f),
            Instruction::Return(Some(op)) => op.for_each_local_mut(f),
            Instruction::Goto(_) | Instruction::Return(None) | Instruction::Nop => {}
        }
    }

    pub fn locals(&self) -> Vec<LocalId> {
        let mut out = Vec::new();
        self.clone().for_each_local_mut(|id| out.push(*id));
        out
    }
}

/// A guarded region `[begin, end)` whose `exception` is handled at `handler`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap {
    pub exception: ClassName,
    pub begin: usize,
    pub end: usize,
    pub handler: usize,
}

/// An ordered instruction sequence plus its locals and catch regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub locals: Vec<Local>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub traps: Vec<Trap>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_local(&mut self, name: impl Into<String>, ty: Type) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(Local {
            name: name.into(),
            ty,
        });
        id
    }

    pub fn local(&self, id: LocalId) -> Option<&Local> {
        self.locals.get(id.index())
    }

    pub fn local_type(&self, id: LocalId) -> Option<&Type> {
        self.local(id).map(|local| &local.ty)
    }

    /// Append an instruction and return its index.
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    pub fn operand_type(&self, operand: &Operand) -> Option<Type> {
        match operand {
            Operand::Local(id) => self.local_type(*id).cloned(),
            Operand::Const(c) => c.ty(),
        }
    }

    pub fn this_local(&self) -> Option<LocalId> {
        self.instructions.iter().find_map(|insn| match insn {
            Instruction::Identity {
                dest,
                source: IdentitySource::This,
            } => Some(*dest),
            _ => None,
        })
    }

    pub fn parameter_locals(&self) -> Vec<(u16, LocalId)> {
        self.instructions
            .iter()
            .filter_map(|insn| match insn {
                Instruction::Identity {
                    dest,
                    source: IdentitySource::Parameter(idx),
                } => Some((*idx, *dest)),
                _ => None,
            })
            .collect()
    }

    /// Index of the first instruction that is not an identity binding.
    pub fn first_non_identity(&self) -> Option<usize> {
        self.instructions.iter().position(|insn| !insn.is_identity())
    }
}
