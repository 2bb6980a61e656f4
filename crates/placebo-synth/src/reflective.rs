//! Effects of reflective calls, recovered from recorded reflection facts.
//!
//! A method only receives the effects of a reflective API it actually calls.
//! Targets are resolved against the program model; unresolvable ones are
//! logged and dropped.

use indexmap::IndexSet;
use placebo_ir::{ClassName, InvokeKind, MethodRef, Type};
use placebo_model::Program;
use placebo_reflect::{parse_method_signature, ReflectionFacts, ReflectiveCallKind};

use crate::scan::{Call, OriginalBodyFacts};

/// The reflective API a callee belongs to, if any.
pub fn reflective_api(callee: &MethodRef) -> Option<ReflectiveCallKind> {
    match (callee.class.as_str(), callee.name.as_str()) {
        ("java.lang.reflect.Array", "newInstance") => Some(ReflectiveCallKind::ArrayNewInstance),
        ("java.lang.Class", "forName") => Some(ReflectiveCallKind::ClassForName),
        ("java.lang.Class", "newInstance") => Some(ReflectiveCallKind::ClassNewInstance),
        ("java.lang.reflect.Constructor", "newInstance") => {
            Some(ReflectiveCallKind::ConstructorNewInstance)
        }
        ("java.lang.reflect.Method", "invoke") => Some(ReflectiveCallKind::MethodInvoke),
        _ => None,
    }
}

/// Creations and calls to add on top of a method's scanned facts. Entries
/// already present in the scanned facts are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectiveEffects {
    pub object_creations: IndexSet<MethodRef>,
    pub array_creations: IndexSet<Type>,
    pub initialized_classes: IndexSet<ClassName>,
    pub calls: IndexSet<Call>,
}

impl ReflectiveEffects {
    pub fn collect(
        method: &MethodRef,
        scanned: &OriginalBodyFacts,
        reflection: &ReflectionFacts,
        program: &Program,
    ) -> Self {
        let mut effects = ReflectiveEffects::default();
        if reflection.is_empty() {
            return effects;
        }

        let apis: IndexSet<ReflectiveCallKind> = scanned
            .calls()
            .filter_map(|call| reflective_api(&call.callee))
            .collect();
        for kind in apis {
            for target in reflection.targets(kind) {
                if !effects.fold(kind, target, scanned, program) {
                    tracing::warn!(
                        target: "placebo.synth",
                        method = %method,
                        kind = %kind,
                        reflective_target = %target,
                        "reflection target does not resolve against the program model"
                    );
                }
            }
        }
        effects
    }

    pub fn is_empty(&self) -> bool {
        self.object_creations.is_empty()
            && self.array_creations.is_empty()
            && self.initialized_classes.is_empty()
            && self.calls.is_empty()
    }

    /// Returns `false` when `target` does not resolve.
    fn fold(
        &mut self,
        kind: ReflectiveCallKind,
        target: &str,
        scanned: &OriginalBodyFacts,
        program: &Program,
    ) -> bool {
        match kind {
            ReflectiveCallKind::ArrayNewInstance => match target.parse::<Type>() {
                Ok(ty @ Type::Array { .. }) => {
                    if !scanned.array_creations.contains(&ty) {
                        self.array_creations.insert(ty);
                    }
                    true
                }
                _ => false,
            },
            ReflectiveCallKind::ClassForName => {
                let class = ClassName::new(target.trim());
                if program.class(&class).is_none() {
                    return false;
                }
                if program.has_static_initializer(&class) {
                    self.initialized_classes.insert(class);
                }
                true
            }
            ReflectiveCallKind::ClassNewInstance => {
                let class = ClassName::new(target.trim());
                let Some(init) = program
                    .class(&class)
                    .filter(|def| !def.is_interface)
                    .and_then(|def| def.default_constructor().map(|m| m.method_ref(&def.name)))
                else {
                    return false;
                };
                self.add_creation(init, scanned);
                true
            }
            ReflectiveCallKind::ConstructorNewInstance => {
                let Ok(init) = parse_method_signature(target) else {
                    return false;
                };
                if !init.is_constructor() || program.method(&init).is_none() {
                    return false;
                }
                self.add_creation(init, scanned);
                true
            }
            ReflectiveCallKind::MethodInvoke => {
                let Ok(callee) = parse_method_signature(target) else {
                    return false;
                };
                let Ok((class, def)) = program.lookup(&callee) else {
                    return false;
                };
                let kind = if def.is_static {
                    InvokeKind::Static
                } else if class.is_interface {
                    InvokeKind::Interface
                } else {
                    InvokeKind::Virtual
                };
                let receiver = (!def.is_static).then(|| Type::Reference(class.name.clone()));
                let call = Call {
                    kind,
                    callee,
                    receiver,
                };
                if !scanned.invoke_stmts.contains(&call) && !scanned.invoke_exprs.contains(&call) {
                    self.calls.insert(call);
                }
                true
            }
        }
    }

    fn add_creation(&mut self, init: MethodRef, scanned: &OriginalBodyFacts) {
        if !scanned.object_creations.contains(&init) {
            self.object_creations.insert(init);
        }
    }
}
