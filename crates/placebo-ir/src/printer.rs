//! Jimple-like textual rendering of a [`Body`].
//!
//! Two bodies that print identically are structurally identical up to the
//! names chosen for their locals, which makes the text form suitable for
//! golden comparisons once local names are standardized.

use std::collections::BTreeSet;
use std::fmt::{self, Write};

use crate::body::{
    Body, Constant, Expr, IdentitySource, Instruction, InvokeExpr, LocalId, Operand, Place,
};

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Long(v) => write!(f, "{v}L"),
            Constant::Float(v) => write!(f, "{v:?}F"),
            Constant::Double(v) => write!(f, "{v:?}"),
            Constant::String(v) => write!(f, "{v:?}"),
            Constant::Class(ty) => write!(f, "class \"{ty}\""),
            Constant::Null => f.write_str("null"),
        }
    }
}

struct Printer<'a> {
    body: &'a Body,
}

impl Printer<'_> {
    fn local(&self, id: LocalId) -> String {
        match self.body.local(id) {
            Some(local) => local.name.clone(),
            None => format!("<unknown local {}>", id.0),
        }
    }

    fn operand(&self, op: &Operand) -> String {
        match op {
            Operand::Local(id) => self.local(*id),
            Operand::Const(c) => c.to_string(),
        }
    }

    fn operands(&self, ops: &[Operand]) -> String {
        ops.iter()
            .map(|op| self.operand(op))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn invoke(&self, invoke: &InvokeExpr) -> String {
        let args = self.operands(&invoke.args);
        match invoke.base {
            Some(base) => format!(
                "{} {}.{}({args})",
                invoke.kind.keyword(),
                self.local(base),
                invoke.callee
            ),
            None => format!("{} {}({args})", invoke.kind.keyword(), invoke.callee),
        }
    }

    fn place(&self, place: &Place) -> String {
        match place {
            Place::Local(id) => self.local(*id),
            Place::ArrayElement { base, index } => {
                format!("{}[{}]", self.local(*base), self.operand(index))
            }
            Place::StaticField(field) => field.to_string(),
            Place::InstanceField { base, field } => format!("{}.{field}", self.local(*base)),
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Use(op) => self.operand(op),
            Expr::New(class) => format!("new {class}"),
            Expr::NewArray { ty, lengths } => {
                if lengths.len() == 1 && ty.dimensions() == 1 {
                    let elem = match ty {
                        crate::Type::Array { base, .. } => base.to_string(),
                        other => other.to_string(),
                    };
                    format!("newarray ({elem})[{}]", self.operand(&lengths[0]))
                } else {
                    let mut out = format!("newmultiarray ({ty})");
                    for len in lengths {
                        let _ = write!(out, "[{}]", self.operand(len));
                    }
                    out
                }
            }
            Expr::Cast { operand, target } => format!("({target}) {}", self.operand(operand)),
            Expr::StaticField(field) => field.to_string(),
            Expr::InstanceField { base, field } => format!("{}.{field}", self.local(*base)),
            Expr::ArrayElement { base, index } => {
                format!("{}[{}]", self.local(*base), self.operand(index))
            }
            Expr::Invoke(invoke) => self.invoke(invoke),
            Expr::Binary { op, lhs, rhs } => {
                format!("{} {} {}", self.operand(lhs), op.symbol(), self.operand(rhs))
            }
        }
    }

    fn instruction(&self, insn: &Instruction) -> String {
        match insn {
            Instruction::Identity { dest, source } => {
                let source = match source {
                    IdentitySource::This => "@this".to_string(),
                    IdentitySource::Parameter(idx) => format!("@parameter{idx}"),
                    IdentitySource::CaughtException => "@caughtexception".to_string(),
                };
                let ty = self
                    .body
                    .local_type(*dest)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                format!("{} := {source}: {ty}", self.local(*dest))
            }
            Instruction::Assign { dest, value } => {
                format!("{} = {}", self.place(dest), self.expr(value))
            }
            Instruction::Invoke(invoke) => self.invoke(invoke),
            Instruction::Throw(op) => format!("throw {}", self.operand(op)),
            Instruction::If { condition, target } => {
                format!("if {} != 0 goto label{target}", self.operand(condition))
            }
            Instruction::Goto(target) => format!("goto label{target}"),
            Instruction::Return(None) => "return".to_string(),
            Instruction::Return(Some(op)) => format!("return {}", self.operand(op)),
            Instruction::Nop => "nop".to_string(),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printer = Printer { body: self };

        for local in &self.locals {
            writeln!(f, "    {} {};", local.ty, local.name)?;
        }
        if !self.locals.is_empty() {
            writeln!(f)?;
        }

        let targets: BTreeSet<usize> = self
            .instructions
            .iter()
            .filter_map(Instruction::branch_target)
            .chain(self.traps.iter().map(|trap| trap.handler))
            .collect();

        for (idx, insn) in self.instructions.iter().enumerate() {
            if targets.contains(&idx) {
                writeln!(f, "  label{idx}:")?;
            }
            writeln!(f, "    {};", printer.instruction(insn))?;
        }

        for trap in &self.traps {
            writeln!(
                f,
                "    catch {} from label{} to label{} with label{};",
                trap.exception, trap.begin, trap.end, trap.handler
            )?;
        }
        Ok(())
    }
}
