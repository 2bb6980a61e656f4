use std::collections::HashSet;

use indexmap::IndexSet;
use placebo_ir::{Body, ClassName, Expr, Instruction, InvokeExpr, InvokeKind, MethodRef};
use placebo_model::{ClassDef, Program};

use crate::graph::CallGraph;

/// Something that turns a program model into a call graph.
pub trait CallGraphBackend {
    fn name(&self) -> &'static str;
    fn build(&self, program: &Program) -> CallGraph;
}

fn invokes(body: &Body) -> impl Iterator<Item = &InvokeExpr> + '_ {
    body.instructions.iter().filter_map(|insn| match insn {
        Instruction::Invoke(invoke)
        | Instruction::Assign {
            value: Expr::Invoke(invoke),
            ..
        } => Some(invoke),
        _ => None,
    })
}

/// Walk every concrete method, handing each call site to `targets`.
fn build_with(
    program: &Program,
    mut targets: impl FnMut(&InvokeExpr) -> Vec<MethodRef>,
) -> CallGraph {
    let mut graph = CallGraph::new();
    for class in program.classes() {
        for method in class.methods.iter().filter(|m| m.is_concrete()) {
            let caller = method.method_ref(&class.name);
            graph.add_node(caller.clone());
            let Some(body) = &method.body else {
                continue;
            };
            for invoke in invokes(body) {
                for callee in targets(invoke) {
                    graph.add_edge(caller.clone(), callee);
                }
            }
        }
    }
    graph
}

/// One edge per call site, to the statically named callee.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectEdges;

impl CallGraphBackend for DirectEdges {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn build(&self, program: &Program) -> CallGraph {
        let graph = build_with(program, |invoke| vec![invoke.callee.clone()]);
        tracing::debug!(
            target: "placebo.callgraph",
            backend = self.name(),
            nodes = graph.nodes.len(),
            edges = graph.size(),
            "built call graph"
        );
        graph
    }
}

/// Class-hierarchy analysis: a virtual or interface call reaches the
/// implementation selected by every concrete subtype of the receiver class.
#[derive(Debug, Default, Clone, Copy)]
pub struct HierarchyEdges;

impl HierarchyEdges {
    fn dispatch(program: &Program, callee: &MethodRef) -> Vec<MethodRef> {
        let mut targets: IndexSet<MethodRef> = program
            .classes()
            .filter(|class| !class.is_interface && is_subtype(program, class, &callee.class))
            .filter_map(|class| resolve(program, class, callee))
            .collect();
        if targets.is_empty() {
            // Receiver hierarchy outside the model: keep the named callee.
            targets.insert(callee.clone());
        }
        targets.into_iter().collect()
    }
}

impl CallGraphBackend for HierarchyEdges {
    fn name(&self) -> &'static str {
        "hierarchy"
    }

    fn build(&self, program: &Program) -> CallGraph {
        let graph = build_with(program, |invoke| match invoke.kind {
            InvokeKind::Virtual | InvokeKind::Interface => Self::dispatch(program, &invoke.callee),
            _ => vec![invoke.callee.clone()],
        });
        tracing::debug!(
            target: "placebo.callgraph",
            backend = self.name(),
            nodes = graph.nodes.len(),
            edges = graph.size(),
            "built call graph"
        );
        graph
    }
}

fn is_subtype(program: &Program, class: &ClassDef, ancestor: &ClassName) -> bool {
    let mut pending = vec![class];
    let mut seen: HashSet<&ClassName> = HashSet::new();
    while let Some(current) = pending.pop() {
        if current.name == *ancestor {
            return true;
        }
        if !seen.insert(&current.name) {
            continue;
        }
        for parent in current.superclass.iter().chain(&current.interfaces) {
            if parent == ancestor {
                return true;
            }
            if let Some(parent) = program.class(parent) {
                pending.push(parent);
            }
        }
    }
    false
}

/// The concrete method `class` runs for `callee`, searching up its
/// superclass chain.
fn resolve(program: &Program, class: &ClassDef, callee: &MethodRef) -> Option<MethodRef> {
    let mut seen: HashSet<&ClassName> = HashSet::new();
    let mut current = Some(class);
    while let Some(def) = current {
        if !seen.insert(&def.name) {
            return None;
        }
        if let Some(method) = def
            .find_method(&callee.name, &callee.params)
            .filter(|m| m.is_concrete() && !m.is_static)
        {
            return Some(method.method_ref(&def.name));
        }
        current = program.superclass_of(def);
    }
    None
}
