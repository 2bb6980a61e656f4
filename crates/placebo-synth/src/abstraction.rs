//! How library objects are abstracted in placeholder bodies.
//!
//! Every object a placeholder body creates or receives is stored into an
//! abstract set, and every value it needs is drawn from that set. The
//! strategy decides what the set is: one program-wide static field, or one
//! local per synthesized method.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use parking_lot::Mutex;
use placebo_ir::{Constant, Expr, FieldRef, Instruction, LocalId, Operand, Type};
use serde::{Deserialize, Serialize};

use crate::builder::BodyBuilder;

pub trait Abstraction: Send + Sync {
    fn name(&self) -> &'static str;

    /// A local holding some abstract library object, typed
    /// `java.lang.Object`. Emits its initialization on first use per body.
    fn representative_value(&self, body: &mut BodyBuilder) -> LocalId;

    /// Record that `value` flows into the abstract set.
    fn store(&self, body: &mut BodyBuilder, value: LocalId);
}

/// One set for the whole library, materialized as a static field.
#[derive(Debug)]
pub struct SharedSet {
    field: FieldRef,
    flows: Mutex<IndexSet<Type>>,
}

impl SharedSet {
    pub fn new(field: FieldRef) -> Self {
        Self {
            field,
            flows: Mutex::new(IndexSet::new()),
        }
    }

    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    /// Every type stored into the shared set so far, sorted.
    pub fn flow_types(&self) -> Vec<Type> {
        let mut types: Vec<Type> = self.flows.lock().iter().cloned().collect();
        types.sort();
        types
    }
}

impl Default for SharedSet {
    fn default() -> Self {
        Self::new(FieldRef::new("placebo.Library", "set", Type::object()))
    }
}

impl Abstraction for SharedSet {
    fn name(&self) -> &'static str {
        "shared"
    }

    fn representative_value(&self, body: &mut BodyBuilder) -> LocalId {
        if let Some(local) = body.representative_slot() {
            return local;
        }
        let local = body.load_static_field(&self.field);
        body.set_representative_slot(local);
        local
    }

    fn store(&self, body: &mut BodyBuilder, value: LocalId) {
        body.store_static_field(&self.field, Operand::Local(value));
        if let Some(ty) = body.local_type(value) {
            self.flows.lock().insert(ty.clone());
        }
    }
}

/// One set per synthesized method, materialized as a local.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerUnitSet;

impl PerUnitSet {
    fn slot(body: &mut BodyBuilder) -> (LocalId, bool) {
        match body.representative_slot() {
            Some(local) => (local, false),
            None => {
                let local = body.new_local(Type::object());
                body.set_representative_slot(local);
                (local, true)
            }
        }
    }
}

impl Abstraction for PerUnitSet {
    fn name(&self) -> &'static str {
        "per-unit"
    }

    fn representative_value(&self, body: &mut BodyBuilder) -> LocalId {
        let (local, fresh) = Self::slot(body);
        if fresh {
            // Nothing stored yet.
            body.push(Instruction::assign(
                local,
                Expr::Use(Operand::Const(Constant::Null)),
            ));
        }
        local
    }

    fn store(&self, body: &mut BodyBuilder, value: LocalId) {
        let (local, _) = Self::slot(body);
        body.push(Instruction::assign(local, Expr::Use(Operand::Local(value))));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbstractionKind {
    #[default]
    Shared,
    PerUnit,
}

impl AbstractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AbstractionKind::Shared => "shared",
            AbstractionKind::PerUnit => "per-unit",
        }
    }
}

impl fmt::Display for AbstractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbstractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shared" => Ok(AbstractionKind::Shared),
            "per-unit" => Ok(AbstractionKind::PerUnit),
            other => Err(format!(
                "unknown abstraction `{other}` (expected `shared` or `per-unit`)"
            )),
        }
    }
}
