use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::graph::CallGraph;

#[derive(Debug, Error)]
pub enum GxlError {
    #[error("failed to write GXL document: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Writes a [`CallGraph`] as a GXL document.
///
/// Nodes get ids `n0, n1, ...` in graph order and carry the method signature
/// in a `signature` attribute; edges get ids `e0, e1, ...`.
#[derive(Debug, Clone)]
pub struct GxlWriter {
    graph_id: String,
}

impl Default for GxlWriter {
    fn default() -> Self {
        Self::new("callgraph")
    }
}

impl GxlWriter {
    pub fn new(graph_id: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
        }
    }

    pub fn write(&self, graph: &CallGraph, out: impl Write) -> Result<(), GxlError> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("gxl")))?;

        let mut root = BytesStart::new("graph");
        root.push_attribute(("id", self.graph_id.as_str()));
        root.push_attribute(("edgeids", "true"));
        root.push_attribute(("edgemode", "directed"));
        writer.write_event(Event::Start(root))?;

        for (idx, method) in graph.nodes.iter().enumerate() {
            let id = format!("n{idx}");
            let mut node = BytesStart::new("node");
            node.push_attribute(("id", id.as_str()));
            writer.write_event(Event::Start(node))?;

            let mut attr = BytesStart::new("attr");
            attr.push_attribute(("name", "signature"));
            writer.write_event(Event::Start(attr))?;
            writer.write_event(Event::Start(BytesStart::new("string")))?;
            let signature = method.to_string();
            writer.write_event(Event::Text(BytesText::new(&signature)))?;
            writer.write_event(Event::End(BytesEnd::new("string")))?;
            writer.write_event(Event::End(BytesEnd::new("attr")))?;

            writer.write_event(Event::End(BytesEnd::new("node")))?;
        }

        for (idx, (caller, callee)) in graph.edges.iter().enumerate() {
            // Both endpoints are always nodes.
            let (Some(from), Some(to)) = (
                graph.nodes.get_index_of(caller),
                graph.nodes.get_index_of(callee),
            ) else {
                continue;
            };
            let id = format!("e{idx}");
            let from = format!("n{from}");
            let to = format!("n{to}");
            let mut edge = BytesStart::new("edge");
            edge.push_attribute(("id", id.as_str()));
            edge.push_attribute(("from", from.as_str()));
            edge.push_attribute(("to", to.as_str()));
            writer.write_event(Event::Empty(edge))?;
        }

        writer.write_event(Event::End(BytesEnd::new("graph")))?;
        writer.write_event(Event::End(BytesEnd::new("gxl")))?;
        Ok(())
    }
}
