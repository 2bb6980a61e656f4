use indexmap::IndexSet;
use placebo_ir::MethodRef;

/// Methods and the caller-to-callee edges between them, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallGraph {
    pub nodes: IndexSet<MethodRef>,
    pub edges: IndexSet<(MethodRef, MethodRef)>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, method: MethodRef) {
        self.nodes.insert(method);
    }

    /// Adds both endpoints as nodes. Returns `false` if the edge existed.
    pub fn add_edge(&mut self, caller: MethodRef, callee: MethodRef) -> bool {
        self.nodes.insert(caller.clone());
        self.nodes.insert(callee.clone());
        self.edges.insert((caller, callee))
    }

    /// Number of edges.
    pub fn size(&self) -> usize {
        self.edges.len()
    }

    pub fn callees<'a>(&'a self, caller: &'a MethodRef) -> impl Iterator<Item = &'a MethodRef> + 'a {
        self.edges
            .iter()
            .filter(move |(from, _)| from == caller)
            .map(|(_, to)| to)
    }
}
