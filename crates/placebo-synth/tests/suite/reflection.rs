use placebo_ir::{
    Body, ClassName, Expr, Instruction, InvokeExpr, InvokeKind, MethodRef, ReturnType, Type,
};
use placebo_reflect::ReflectionFacts;
use placebo_synth::{PerUnitSet, Synthesizer};

use super::fixture::{class, init, library, static_method};

const FACTS: &str = "\
Class.newInstance;lib.Foo
Class.newInstance;lib.Nowhere
Class.forName;lib.Foo
Method.invoke;<lib.Foo: java.lang.String describe()>
";

/// Calls `Class.newInstance()` on a `Class` it was handed.
fn loader_program() -> (placebo_model::Program, MethodRef) {
    let mut body = Body::new();
    let cls = body.add_local("cls", Type::class("java.lang.Class"));
    let obj = body.add_local("obj", Type::object());
    body.push(Instruction::assign(
        obj,
        Expr::Invoke(InvokeExpr::new_instance(
            InvokeKind::Virtual,
            cls,
            MethodRef::new(
                "java.lang.Class",
                "newInstance",
                vec![],
                ReturnType::Type(Type::object()),
            ),
            vec![],
        )),
    ));
    body.push(Instruction::Return(None));

    let mut program = library();
    program.add_class(class(
        "lib.Loader",
        Some("java.lang.Object"),
        vec![static_method("load", vec![], ReturnType::Void, Some(body))],
    ));
    (program, MethodRef::new("lib.Loader", "load", vec![], ReturnType::Void))
}

#[test]
fn recorded_reflective_creations_are_folded_in() {
    let (program, load) = loader_program();
    let reflection = ReflectionFacts::parse(FACTS, "refl.log").unwrap();
    let body = Synthesizer::new(&PerUnitSet)
        .with_reflection(reflection)
        .synthesize(&program, &load)
        .unwrap()
        .body;

    let created: Vec<&ClassName> = body
        .instructions
        .iter()
        .filter_map(|insn| match insn {
            Instruction::Assign {
                value: Expr::New(class),
                ..
            } => Some(class),
            _ => None,
        })
        .collect();
    assert_eq!(created, vec![&ClassName::new("lib.Foo")]);
    assert!(body.instructions.iter().any(|insn| matches!(
        insn,
        Instruction::Invoke(invoke) if invoke.callee == init("lib.Foo")
    )));
    // Only the Class.newInstance facts apply to this body.
    let clinits = body
        .instructions
        .iter()
        .filter(|insn| matches!(insn, Instruction::Invoke(invoke) if invoke.callee.is_static_initializer()))
        .count();
    assert_eq!(clinits, 1);
}

#[test]
fn reflection_facts_do_not_leak_into_unrelated_methods() {
    let (mut program, _) = loader_program();
    let mut body = Body::new();
    body.push(Instruction::Return(None));
    program.add_class(class(
        "lib.Quiet",
        Some("java.lang.Object"),
        vec![static_method("idle", vec![], ReturnType::Void, Some(body))],
    ));

    let reflection = ReflectionFacts::parse(FACTS, "refl.log").unwrap();
    let idle = MethodRef::new("lib.Quiet", "idle", vec![], ReturnType::Void);
    let body = Synthesizer::new(&PerUnitSet)
        .with_reflection(reflection)
        .synthesize(&program, &idle)
        .unwrap()
        .body;
    assert_eq!(body.instructions, vec![Instruction::Return(None)]);
}
