use std::io::{self, Write};

use super::{Renderer, truncation_notice};
use crate::graph::Graph;

/// Graphviz `digraph`, one statement per node then one per relation
///
/// Node ids are the namespace-qualified object key so two objects with the
/// same `Kind/Name` in different namespaces stay distinct.
pub struct DotRenderer;

impl Renderer for DotRenderer {
    fn render(&self, graph: &Graph, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "digraph kubegraph {{")?;

        for node in graph.nodes() {
            let id = escape(&node.key.to_string());
            let label = escape(&node.reference.display_name());
            match node.error() {
                Some(err) => writeln!(
                    out,
                    "  \"{}\" [label=\"{}\", style=dashed, tooltip=\"{}\"];",
                    id,
                    label,
                    escape(&err.to_string())
                )?,
                None => writeln!(out, "  \"{}\" [label=\"{}\"];", id, label)?,
            }
        }

        for relation in graph.relations() {
            writeln!(
                out,
                "  \"{}\" -> \"{}\" [label=\"{}\"];",
                escape(&relation.from.to_string()),
                escape(&relation.to.to_string()),
                relation.kind
            )?;
        }

        writeln!(out, "}}")?;

        if graph.truncated() {
            writeln!(out, "// {}", truncation_notice(graph))?;
        }
        Ok(())
    }
}

/// Escape a string for a double-quoted DOT id
fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}
