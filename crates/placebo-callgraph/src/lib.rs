//! Call graphs over a program model and their GXL serialization.

#![forbid(unsafe_code)]

mod backend;
mod graph;
mod gxl;

pub use crate::backend::{CallGraphBackend, DirectEdges, HierarchyEdges};
pub use crate::graph::CallGraph;
pub use crate::gxl::{GxlError, GxlWriter};
