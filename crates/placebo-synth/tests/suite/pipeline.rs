use placebo_ir::{
    Body, ClassName, Constant, Expr, IdentitySource, Instruction, InvokeExpr, InvokeKind,
    LocalId, MethodRef, Operand, Place, PrimitiveKind, ReturnType, Trap, Type, CONSTRUCTOR_NAME,
};
use placebo_model::{ModelConsistencyError, Program};
use placebo_synth::{synthesize_program, PerUnitSet, SharedSet, SynthesisError, Synthesizer};
use pretty_assertions::assert_eq;

use super::fixture::{class, init, library, method, static_method};

fn int() -> Type {
    Type::Primitive(PrimitiveKind::Int)
}

fn string() -> Type {
    Type::class("java.lang.String")
}

fn new_object(body: &mut Body, class: &str) -> LocalId {
    let local = body.add_local(format!("obj{}", body.locals.len()), Type::class(class));
    body.push(Instruction::assign(local, Expr::New(ClassName::new(class))));
    body.push(Instruction::Invoke(InvokeExpr::new_instance(
        InvokeKind::Special,
        local,
        init(class),
        vec![],
    )));
    local
}

/// Reads an int array, writes a String array and creates two lists.
fn fill_program() -> (Program, MethodRef) {
    let mut body = Body::new();
    let names = body.add_local("names", Type::array_of(string(), 1));
    let counts = body.add_local("counts", Type::array_of(int(), 1));
    let n = body.add_local("n", int());
    body.push(Instruction::Identity {
        dest: names,
        source: IdentitySource::Parameter(0),
    });
    body.push(Instruction::Identity {
        dest: counts,
        source: IdentitySource::Parameter(1),
    });
    body.push(Instruction::assign(
        n,
        Expr::ArrayElement {
            base: counts,
            index: Operand::Const(Constant::Int(0)),
        },
    ));
    body.push(Instruction::Assign {
        dest: Place::ArrayElement {
            base: names,
            index: Operand::Const(Constant::Int(0)),
        },
        value: Expr::Use(Operand::Const(Constant::String("x".to_string()))),
    });
    new_object(&mut body, "java.util.ArrayList");
    new_object(&mut body, "java.util.ArrayList");
    body.push(Instruction::Return(None));

    let params = vec![Type::array_of(string(), 1), Type::array_of(int(), 1)];
    let mut program = library();
    program.add_class(class(
        "lib.Util",
        Some("java.lang.Object"),
        vec![static_method("fill", params.clone(), ReturnType::Void, Some(body))],
    ));
    (program, MethodRef::new("lib.Util", "fill", params, ReturnType::Void))
}

/// A constructor that calls its superclass constructor, then creates three
/// `lib.Foo` objects.
fn child_program() -> (Program, MethodRef) {
    let mut body = Body::new();
    let this = body.add_local("this", Type::class("lib.Child"));
    body.push(Instruction::Identity {
        dest: this,
        source: IdentitySource::This,
    });
    body.push(Instruction::Invoke(InvokeExpr::new_instance(
        InvokeKind::Special,
        this,
        init("lib.Parent"),
        vec![],
    )));
    for _ in 0..3 {
        new_object(&mut body, "lib.Foo");
    }
    body.push(Instruction::Return(None));

    let mut program = library();
    program.add_class(class(
        "lib.Child",
        Some("lib.Parent"),
        vec![method(CONSTRUCTOR_NAME, vec![], ReturnType::Void, Some(body))],
    ));
    (program, init("lib.Child"))
}

fn count(body: &Body, pred: impl Fn(&Instruction) -> bool) -> usize {
    body.instructions.iter().filter(|insn| pred(insn)).count()
}

#[test]
fn array_list_example_synthesizes_one_creation_and_no_array_access() {
    let (program, fill) = fill_program();
    let shared = SharedSet::default();
    let synthesized = Synthesizer::new(&shared).synthesize(&program, &fill).unwrap();

    assert!(synthesized.facts.reads_array);
    assert!(synthesized.facts.writes_array);
    assert_eq!(
        synthesized.body.to_string(),
        "    java.lang.String[] r0;\n    int[] r1;\n    java.util.ArrayList r2;\n\n    r0 := @parameter0: java.lang.String[];\n    r1 := @parameter1: int[];\n    <placebo.Library: java.lang.Object set> = r0;\n    <placebo.Library: java.lang.Object set> = r1;\n    r2 = new java.util.ArrayList;\n    specialinvoke r2.<java.util.ArrayList: void <init>()>();\n    <placebo.Library: java.lang.Object set> = r2;\n    return;\n"
    );
    assert_eq!(
        shared.flow_types(),
        vec![
            Type::array_of(int(), 1),
            Type::array_of(string(), 1),
            Type::class("java.util.ArrayList"),
        ]
        .into_iter()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
    );
}

#[test]
fn constructor_starts_with_superclass_initialization() {
    let (program, child) = child_program();
    let shared = SharedSet::default();
    let body = Synthesizer::new(&shared)
        .synthesize(&program, &child)
        .unwrap()
        .body;

    let first = body.first_non_identity().unwrap();
    assert_eq!(
        body.instructions[first],
        Instruction::Invoke(InvokeExpr::new_instance(
            InvokeKind::Special,
            body.this_local().unwrap(),
            init("lib.Parent"),
            vec![],
        ))
    );
}

#[test]
fn repeated_creations_collapse_to_one() {
    let (program, child) = child_program();
    let shared = SharedSet::default();
    let synthesized = Synthesizer::new(&shared).synthesize(&program, &child).unwrap();
    let body = &synthesized.body;

    assert_eq!(synthesized.facts.object_creations.len(), 1);
    assert_eq!(
        count(body, |insn| matches!(
            insn,
            Instruction::Assign { value: Expr::New(class), .. } if class.as_str() == "lib.Foo"
        )),
        1
    );
    assert_eq!(
        count(body, |insn| matches!(
            insn,
            Instruction::Invoke(invoke) if invoke.callee == init("lib.Foo")
        )),
        1
    );
    assert_eq!(
        count(body, |insn| matches!(
            insn,
            Instruction::Invoke(invoke) if invoke.callee.is_static_initializer()
        )),
        1
    );
}

/// Calls `lib.Sink.accept(String, long, double, List)` for its result and
/// `lib.Sink.pair(String, String)` for effect.
fn sink_program() -> (Program, MethodRef) {
    let accept = MethodRef::new(
        "lib.Sink",
        "accept",
        vec![
            string(),
            Type::Primitive(PrimitiveKind::Long),
            Type::Primitive(PrimitiveKind::Double),
            Type::class("java.util.List"),
        ],
        ReturnType::Type(Type::object()),
    );
    let pair = MethodRef::new(
        "lib.Sink",
        "pair",
        vec![string(), string()],
        ReturnType::Type(Type::Primitive(PrimitiveKind::Boolean)),
    );

    let mut body = Body::new();
    let s = body.add_local("s", string());
    let l = body.add_local("l", Type::class("java.util.List"));
    let out = body.add_local("out", Type::object());
    let flag = body.add_local("flag", Type::Primitive(PrimitiveKind::Boolean));
    body.push(Instruction::assign(
        out,
        Expr::Invoke(InvokeExpr::new_static(
            accept,
            vec![
                Operand::Local(s),
                Operand::Const(Constant::Long(7)),
                Operand::Const(Constant::Double(2.5)),
                Operand::Local(l),
            ],
        )),
    ));
    body.push(Instruction::assign(
        flag,
        Expr::Invoke(InvokeExpr::new_static(
            pair,
            vec![Operand::Local(s), Operand::Local(s)],
        )),
    ));
    body.push(Instruction::Return(None));

    let mut program = library();
    program.add_class(class(
        "lib.Caller",
        Some("java.lang.Object"),
        vec![static_method("run", vec![], ReturnType::Void, Some(body))],
    ));
    (program, MethodRef::new("lib.Caller", "run", vec![], ReturnType::Void))
}

#[test]
fn arguments_match_declared_parameter_types() {
    let (program, run) = sink_program();
    let shared = SharedSet::default();
    let body = Synthesizer::new(&shared).synthesize(&program, &run).unwrap().body;

    for insn in &body.instructions {
        let invoke = match insn {
            Instruction::Invoke(invoke) => invoke,
            Instruction::Assign {
                value: Expr::Invoke(invoke),
                ..
            } => invoke,
            _ => continue,
        };
        let arg_types: Vec<Type> = invoke
            .args
            .iter()
            .map(|arg| body.operand_type(arg).unwrap())
            .collect();
        assert_eq!(arg_types, invoke.callee.params, "{}", invoke.callee);
    }

    // Only the reference-typed result flows into the set.
    let stored: Vec<Type> = body
        .instructions
        .iter()
        .filter_map(|insn| match insn {
            Instruction::Assign {
                dest: Place::StaticField(_),
                value: Expr::Use(op),
            } => body.operand_type(op),
            _ => None,
        })
        .collect();
    assert_eq!(stored, vec![Type::object()]);
}

#[test]
fn casts_to_one_type_are_emitted_once() {
    let (program, run) = sink_program();
    let shared = SharedSet::default();
    let body = Synthesizer::new(&shared).synthesize(&program, &run).unwrap().body;

    let string_casts = count(&body, |insn| {
        matches!(insn, Instruction::Assign { value: Expr::Cast { target, .. }, .. } if *target == string())
    });
    assert_eq!(string_casts, 1);
}

#[test]
fn synthesis_is_deterministic() {
    let (program, child) = child_program();
    let (fill_program, fill) = fill_program();

    let first = Synthesizer::new(&SharedSet::default()).synthesize(&program, &child).unwrap();
    let second = Synthesizer::new(&SharedSet::default()).synthesize(&program, &child).unwrap();
    assert_eq!(first, second);

    let first = Synthesizer::new(&PerUnitSet).synthesize(&fill_program, &fill).unwrap();
    let second = Synthesizer::new(&PerUnitSet).synthesize(&fill_program, &fill).unwrap();
    assert_eq!(first.body.to_string(), second.body.to_string());
}

#[test]
fn per_unit_set_keeps_objects_in_a_local() {
    let (program, fill) = fill_program();
    let body = Synthesizer::new(&PerUnitSet).synthesize(&program, &fill).unwrap().body;

    assert_eq!(
        count(&body, |insn| matches!(insn, Instruction::Assign { dest: Place::StaticField(_), .. })),
        0
    );
    assert_eq!(
        body.to_string(),
        "    java.lang.String[] r0;\n    int[] r1;\n    java.lang.Object r2;\n    java.util.ArrayList r3;\n\n    r0 := @parameter0: java.lang.String[];\n    r1 := @parameter1: int[];\n    r2 = r0;\n    r2 = r1;\n    r3 = new java.util.ArrayList;\n    specialinvoke r3.<java.util.ArrayList: void <init>()>();\n    r2 = r3;\n    return;\n"
    );
}

#[test]
fn thrown_types_are_guarded_and_return_value_matches_signature() {
    let mut body = Body::new();
    let ex = body.add_local("ex", Type::class("java.lang.IllegalStateException"));
    body.push(Instruction::Throw(Operand::Local(ex)));
    body.push(Instruction::Return(Some(Operand::Const(Constant::Long(0)))));
    body.traps.push(Trap {
        exception: ClassName::new("java.io.IOException"),
        begin: 0,
        end: 1,
        handler: 1,
    });

    let long = Type::Primitive(PrimitiveKind::Long);
    let mut program = library();
    program.add_class(class(
        "lib.Checker",
        Some("java.lang.Object"),
        vec![static_method("check", vec![], ReturnType::Type(long.clone()), Some(body))],
    ));
    let check = MethodRef::new("lib.Checker", "check", vec![], ReturnType::Type(long));
    let body = Synthesizer::new(&PerUnitSet).synthesize(&program, &check).unwrap().body;

    // The checked exception is created from its default constructor.
    assert_eq!(
        count(&body, |insn| matches!(
            insn,
            Instruction::Invoke(invoke) if invoke.callee == init("java.io.IOException")
        )),
        1
    );

    let branch = body
        .instructions
        .iter()
        .position(|insn| matches!(insn, Instruction::If { .. }))
        .unwrap();
    assert!(matches!(body.instructions[branch + 1], Instruction::Throw(_)));
    let target = body.instructions[branch].branch_target().unwrap();
    assert_eq!(
        body.instructions[target],
        Instruction::Return(Some(Operand::Const(Constant::Long(1))))
    );
    assert_eq!(target, body.instructions.len() - 1);
    assert_eq!(count(&body, |insn| matches!(insn, Instruction::Nop)), 0);
}

#[test]
fn dynamic_calls_are_unsupported() {
    let target = MethodRef::new("lib.Lambda", "apply", vec![], ReturnType::Void);
    let mut body = Body::new();
    let f = body.add_local("f", Type::class("lib.Lambda"));
    body.push(Instruction::Invoke(InvokeExpr::new_instance(
        InvokeKind::Dynamic,
        f,
        target.clone(),
        vec![],
    )));
    body.push(Instruction::Return(None));

    let mut program = library();
    program.add_class(class(
        "lib.Indy",
        Some("java.lang.Object"),
        vec![static_method("go", vec![], ReturnType::Void, Some(body))],
    ));
    let go = MethodRef::new("lib.Indy", "go", vec![], ReturnType::Void);

    let err = Synthesizer::new(&SharedSet::default())
        .synthesize(&program, &go)
        .unwrap_err();
    assert_eq!(
        err,
        SynthesisError::UnsupportedCallKind {
            callee: target,
            kind: "dynamicinvoke",
        }
    );
}

#[test]
fn missing_superclass_is_a_model_error() {
    let mut body = Body::new();
    let this = body.add_local("this", Type::class("lib.Orphan"));
    body.push(Instruction::Identity {
        dest: this,
        source: IdentitySource::This,
    });
    body.push(Instruction::Return(None));

    let mut program = library();
    program.add_class(class(
        "lib.Orphan",
        Some("lib.Gone"),
        vec![method(CONSTRUCTOR_NAME, vec![], ReturnType::Void, Some(body))],
    ));

    let err = Synthesizer::new(&SharedSet::default())
        .synthesize(&program, &init("lib.Orphan"))
        .unwrap_err();
    assert_eq!(
        err,
        SynthesisError::Model(ModelConsistencyError::MissingClass(ClassName::new("lib.Gone")))
    );
}

#[test]
fn superclass_without_no_argument_constructor_is_a_model_error() {
    let mut body = Body::new();
    let this = body.add_local("this", Type::class("lib.Kid"));
    body.push(Instruction::Identity {
        dest: this,
        source: IdentitySource::This,
    });
    body.push(Instruction::Return(None));

    let mut program = library();
    program.add_class(class(
        "lib.Base",
        Some("java.lang.Object"),
        vec![method(CONSTRUCTOR_NAME, vec![string()], ReturnType::Void, None)],
    ));
    program.add_class(class(
        "lib.Kid",
        Some("lib.Base"),
        vec![method(CONSTRUCTOR_NAME, vec![], ReturnType::Void, Some(body))],
    ));

    let err = Synthesizer::new(&SharedSet::default())
        .synthesize(&program, &init("lib.Kid"))
        .unwrap_err();
    assert_eq!(
        err,
        SynthesisError::Model(ModelConsistencyError::NoConstructor(ClassName::new("lib.Base")))
    );
}

#[test]
fn throwing_an_undeclared_local_skips_the_method() {
    let mut body = Body::new();
    body.push(Instruction::Throw(Operand::Local(LocalId(7))));

    let mut program = library();
    program.add_class(class(
        "lib.Broken",
        Some("java.lang.Object"),
        vec![static_method("fail", vec![], ReturnType::Void, Some(body.clone()))],
    ));
    let fail = MethodRef::new("lib.Broken", "fail", vec![], ReturnType::Void);

    let shared = SharedSet::default();
    let report = synthesize_program(&mut program, &Synthesizer::new(&shared));

    assert_eq!(report.synthesized, 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].method, fail.to_string());
    assert_eq!(
        report.skipped[0].error,
        SynthesisError::Model(ModelConsistencyError::UnknownLocal {
            method: fail.clone(),
            local: LocalId(7),
        })
        .to_string()
    );
    assert_eq!(program.method(&fail).and_then(|m| m.body.clone()), Some(body));
}
