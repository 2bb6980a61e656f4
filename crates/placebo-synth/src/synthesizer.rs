//! The placeholder-body pipeline: header, creations, calls, exits, cleanup.

use placebo_ir::{
    Body, ClassName, Expr, FieldRef, IdentitySource, Instruction, InvokeExpr, InvokeKind, LocalId,
    MethodRef, Operand, PrimitiveKind, ReturnType, Type,
};
use placebo_model::{ClassDef, MethodDef, ModelConsistencyError, Program};
use placebo_reflect::ReflectionFacts;

use crate::abstraction::Abstraction;
use crate::builder::{primitive_value, BodyBuilder};
use crate::cleanup::cleanup;
use crate::error::{Result, SynthesisError};
use crate::reflective::ReflectiveEffects;
use crate::scan::{Call, OriginalBodyFacts, ScanContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Static `int` field whose value guards every synthesized `throw`.
    pub guard_field: FieldRef,
    /// Worker threads for batch synthesis; `None` uses one per core.
    pub threads: Option<usize>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            guard_field: FieldRef::new(
                "placebo.Library",
                "guard",
                Type::Primitive(PrimitiveKind::Int),
            ),
            threads: None,
        }
    }
}

/// A placeholder body together with the facts it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub body: Body,
    pub facts: OriginalBodyFacts,
}

/// Builds placeholder bodies with one abstraction strategy.
///
/// Reads the program and reflection facts only, so one synthesizer can be
/// shared by every worker of a batch.
pub struct Synthesizer<'a> {
    abstraction: &'a dyn Abstraction,
    reflection: ReflectionFacts,
    options: SynthesisOptions,
}

impl<'a> Synthesizer<'a> {
    pub fn new(abstraction: &'a dyn Abstraction) -> Self {
        Self {
            abstraction,
            reflection: ReflectionFacts::empty(),
            options: SynthesisOptions::default(),
        }
    }

    pub fn with_reflection(mut self, reflection: ReflectionFacts) -> Self {
        self.reflection = reflection;
        self
    }

    pub fn with_options(mut self, options: SynthesisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    pub fn abstraction(&self) -> &dyn Abstraction {
        self.abstraction
    }

    /// Build the placeholder body for `method`. The program is not modified.
    pub fn synthesize(&self, program: &Program, method: &MethodRef) -> Result<Synthesized> {
        let (class, def) = program.lookup(method)?;
        let original = def
            .body
            .as_ref()
            .ok_or_else(|| SynthesisError::MissingBody(method.clone()))?;

        let facts = OriginalBodyFacts::scan(&ScanContext {
            class,
            method: def,
            body: original,
        })?;
        let reflective = ReflectiveEffects::collect(method, &facts, &self.reflection, program);

        let mut run = Run {
            abstraction: self.abstraction,
            options: &self.options,
            program,
            class,
            method: def,
            builder: BodyBuilder::new(),
        };
        run.header()?;
        run.creations(&facts, &reflective)?;
        run.calls(&facts, &reflective)?;
        run.exits(&facts);

        let mut body = run.builder.finish();
        cleanup(&mut body);

        tracing::debug!(
            target: "placebo.synth",
            method = %method,
            abstraction = self.abstraction.name(),
            object_creations = facts.object_creations.len(),
            array_creations = facts.array_creations.len(),
            calls = facts.invoke_stmts.len() + facts.invoke_exprs.len(),
            throwables = facts.throwables.len(),
            reflective = !reflective.is_empty(),
            reads_array = facts.reads_array,
            writes_array = facts.writes_array,
            instructions = body.instructions.len(),
            "synthesized placeholder body"
        );
        Ok(Synthesized { body, facts })
    }
}

/// State of one synthesis run.
struct Run<'s, 'p> {
    abstraction: &'s dyn Abstraction,
    options: &'s SynthesisOptions,
    program: &'p Program,
    class: &'p ClassDef,
    method: &'p MethodDef,
    builder: BodyBuilder,
}

impl Run<'_, '_> {
    fn header(&mut self) -> Result<()> {
        let method = self.method;
        let this = if method.is_static {
            None
        } else {
            let local = self.builder.new_local(Type::Reference(self.class.name.clone()));
            self.builder.push(Instruction::Identity {
                dest: local,
                source: IdentitySource::This,
            });
            Some(local)
        };

        let mut params = Vec::with_capacity(method.params.len());
        for (idx, ty) in method.params.iter().enumerate() {
            let local = self.builder.new_local(ty.clone());
            self.builder.push(Instruction::Identity {
                dest: local,
                source: IdentitySource::Parameter(idx as u16),
            });
            params.push((local, ty));
        }

        if let (Some(this), Some(superclass)) = (this, &self.class.superclass) {
            if method.is_constructor() {
                let init = self.super_constructor_of(superclass)?;
                self.special_invoke(this, &init);
            }
        }

        if let Some(this) = this {
            self.abstraction.store(&mut self.builder, this);
        }
        for (local, ty) in params {
            if ty.is_reference_like() {
                self.abstraction.store(&mut self.builder, local);
            }
        }
        Ok(())
    }

    fn creations(&mut self, facts: &OriginalBodyFacts, reflective: &ReflectiveEffects) -> Result<()> {
        for init in &facts.object_creations {
            self.create_object(init)?;
        }
        for ty in &facts.array_creations {
            self.create_array(ty)?;
        }
        for exception in &facts.checked_exceptions {
            let init = self.constructor_of(exception)?;
            self.create_object(&init)?;
        }

        for init in &reflective.object_creations {
            self.create_object(init)?;
        }
        for ty in &reflective.array_creations {
            self.create_array(ty)?;
        }
        for class in &reflective.initialized_classes {
            let def = self
                .program
                .class(class)
                .ok_or_else(|| ModelConsistencyError::MissingClass(class.clone()))?;
            self.initialize(def);
        }
        Ok(())
    }

    fn calls(&mut self, facts: &OriginalBodyFacts, reflective: &ReflectiveEffects) -> Result<()> {
        for call in &facts.invoke_stmts {
            let invoke = self.invoke(call)?;
            self.builder.push(Instruction::Invoke(invoke));
        }
        for call in facts.invoke_exprs.iter().chain(&reflective.calls) {
            self.call_and_store(call)?;
        }
        Ok(())
    }

    fn exits(&mut self, facts: &OriginalBodyFacts) {
        for ty in &facts.throwables {
            if !ty.is_reference_like() {
                continue;
            }
            let value = self.representative_as(ty);
            self.builder.push_guarded(
                &self.options.guard_field,
                Instruction::Throw(Operand::Local(value)),
            );
        }

        let value = match &self.method.return_type {
            ReturnType::Void => None,
            ReturnType::Type(ty) => Some(self.value_of(ty)),
        };
        self.builder.push(Instruction::Return(value));
    }

    /// The no-argument constructor of `class`. It takes no arguments, so
    /// nothing is emitted between the header bindings and the call.
    fn super_constructor_of(&self, class: &ClassName) -> Result<MethodRef> {
        let def = self
            .program
            .class(class)
            .ok_or_else(|| ModelConsistencyError::MissingClass(class.clone()))?;
        let init = def
            .default_constructor()
            .ok_or_else(|| ModelConsistencyError::NoConstructor(class.clone()))?;
        Ok(init.method_ref(&def.name))
    }

    /// The no-argument constructor of `class`, else its first declared one.
    fn constructor_of(&self, class: &ClassName) -> Result<MethodRef> {
        let def = self
            .program
            .class(class)
            .ok_or_else(|| ModelConsistencyError::MissingClass(class.clone()))?;
        let init = def
            .default_constructor()
            .or_else(|| def.constructors().next())
            .ok_or_else(|| ModelConsistencyError::NoConstructor(class.clone()))?;
        Ok(init.method_ref(&def.name))
    }

    fn create_object(&mut self, init: &MethodRef) -> Result<LocalId> {
        let (class, _) = self.program.lookup(init)?;
        let ty = Type::Reference(class.name.clone());
        if class.is_interface {
            return Err(SynthesisError::UnresolvableType {
                ty,
                reason: "interfaces cannot be instantiated",
            });
        }
        let object = self.builder.insert_new(&ty)?;
        self.special_invoke(object, init);
        self.initialize(class);
        self.abstraction.store(&mut self.builder, object);
        Ok(object)
    }

    fn create_array(&mut self, ty: &Type) -> Result<LocalId> {
        if !matches!(ty, Type::Array { .. }) {
            return Err(SynthesisError::UnresolvableType {
                ty: ty.clone(),
                reason: "array creation of a non-array type",
            });
        }
        let array = self.builder.insert_new(ty)?;
        self.abstraction.store(&mut self.builder, array);
        Ok(array)
    }

    /// Call the static initializer of `class` once per body, if it has one.
    fn initialize(&mut self, class: &ClassDef) {
        let Some(clinit) = class.static_initializer() else {
            return;
        };
        if self.builder.mark_initialized(&class.name) {
            self.builder.push(Instruction::Invoke(InvokeExpr::new_static(
                clinit.method_ref(&class.name),
                Vec::new(),
            )));
        }
    }

    fn special_invoke(&mut self, base: LocalId, init: &MethodRef) {
        let args = self.arguments(init);
        self.builder.push(Instruction::Invoke(InvokeExpr::new_instance(
            InvokeKind::Special,
            base,
            init.clone(),
            args,
        )));
    }

    fn invoke(&mut self, call: &Call) -> Result<InvokeExpr> {
        if call.kind == InvokeKind::Dynamic {
            return Err(SynthesisError::UnsupportedCallKind {
                callee: call.callee.clone(),
                kind: call.kind.keyword(),
            });
        }
        let args = self.arguments(&call.callee);
        if call.kind == InvokeKind::Static {
            return Ok(InvokeExpr::new_static(call.callee.clone(), args));
        }
        let receiver = call
            .receiver
            .clone()
            .unwrap_or_else(|| Type::Reference(call.callee.class.clone()));
        let base = self.representative_as(&receiver);
        Ok(InvokeExpr::new_instance(
            call.kind,
            base,
            call.callee.clone(),
            args,
        ))
    }

    /// Emit `call`; a reference-typed result flows into the abstraction.
    fn call_and_store(&mut self, call: &Call) -> Result<()> {
        let invoke = self.invoke(call)?;
        match call.callee.return_type.as_type() {
            Some(ty) if ty.is_reference_like() => {
                let result = self.builder.new_local(ty.clone());
                self.builder
                    .push(Instruction::assign(result, Expr::Invoke(invoke)));
                self.abstraction.store(&mut self.builder, result);
            }
            _ => {
                self.builder.push(Instruction::Invoke(invoke));
            }
        }
        Ok(())
    }

    fn arguments(&mut self, callee: &MethodRef) -> Vec<Operand> {
        callee.params.iter().map(|ty| self.value_of(ty)).collect()
    }

    fn value_of(&mut self, ty: &Type) -> Operand {
        match ty {
            Type::Primitive(kind) => Operand::Const(primitive_value(*kind)),
            _ => Operand::Local(self.representative_as(ty)),
        }
    }

    fn representative_as(&mut self, ty: &Type) -> LocalId {
        let representative = self.abstraction.representative_value(&mut self.builder);
        self.builder.cast(representative, ty)
    }
}
