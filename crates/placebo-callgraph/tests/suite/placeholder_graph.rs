use placebo_callgraph::{CallGraphBackend, DirectEdges, GxlWriter};
use placebo_ir::{
    Body, ClassName, Expr, IdentitySource, Instruction, InvokeExpr, InvokeKind, MethodRef,
    ReturnType, Type, CONSTRUCTOR_NAME,
};
use placebo_model::{ClassDef, MethodDef, Program};
use placebo_synth::{synthesize_program, SharedSet, Synthesizer};
use pretty_assertions::assert_eq;

fn method(name: &str, is_static: bool, body: Option<Body>) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        params: vec![],
        return_type: ReturnType::Void,
        is_static,
        is_abstract: false,
        is_native: false,
        body,
    }
}

fn init(class: &str) -> MethodRef {
    MethodRef::new(class, CONSTRUCTOR_NAME, vec![], ReturnType::Void)
}

/// `app.Main.main` calls `lib.Api.open`, which creates a `lib.Handle` and
/// calls its constructor.
fn program() -> Program {
    let mut open = Body::new();
    let handle = open.add_local("handle", Type::class("lib.Handle"));
    let this = open.add_local("this", Type::class("lib.Api"));
    open.push(Instruction::Identity {
        dest: this,
        source: IdentitySource::This,
    });
    open.push(Instruction::assign(handle, Expr::New(ClassName::new("lib.Handle"))));
    open.push(Instruction::Invoke(InvokeExpr::new_instance(
        InvokeKind::Special,
        handle,
        init("lib.Handle"),
        vec![],
    )));
    open.push(Instruction::Return(None));

    let mut main = Body::new();
    let api = main.add_local("api", Type::class("lib.Api"));
    main.push(Instruction::Invoke(InvokeExpr::new_instance(
        InvokeKind::Virtual,
        api,
        MethodRef::new("lib.Api", "open", vec![], ReturnType::Void),
        vec![],
    )));
    main.push(Instruction::Return(None));

    let mut app = ClassDef::new("app.Main");
    app.is_application = true;
    app.methods.push(method("main", true, Some(main)));

    let mut api = ClassDef::new("lib.Api");
    api.methods.push(method("open", false, Some(open)));

    let mut handle = ClassDef::new("lib.Handle");
    handle.methods.push(method(CONSTRUCTOR_NAME, false, None));

    [app, api, handle].into_iter().collect()
}

#[test]
fn placeholder_bodies_preserve_call_edges() {
    let original = DirectEdges.build(&program());

    let mut program = program();
    let shared = SharedSet::default();
    let report = synthesize_program(&mut program, &Synthesizer::new(&shared));
    assert_eq!(report.synthesized, 1);
    let placeholder = DirectEdges.build(&program);

    for edge in &original.edges {
        assert!(placeholder.edges.contains(edge), "lost edge {} -> {}", edge.0, edge.1);
    }
    assert_eq!(placeholder.size(), original.size());
}

#[test]
fn call_graph_is_written_as_gxl_file() {
    let graph = DirectEdges.build(&program());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.gxl");
    let file = std::fs::File::create(&path).unwrap();
    GxlWriter::default().write(&graph, std::io::BufWriter::new(file)).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("<edge ").count(), graph.size());
    assert_eq!(text.matches("<node ").count(), graph.nodes.len());
}
