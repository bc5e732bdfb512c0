use std::collections::HashSet;
use std::io::{self, Write};

use super::{Renderer, truncation_notice};
use crate::graph::{Graph, ObjectKey, RelationKind};

/// Indented tree, depth-first from the root
///
/// ```text
/// Service/web
///   Pod/web-1 [Selects]
///     ReplicaSet/web-7f9c [Owns]
///   Pod/web-2 [Selects]
///     ReplicaSet/web-7f9c [Owns] (see above)
/// ```
///
/// The first encounter of a node is expanded; later encounters print a single
/// reference line, which also breaks cycles.
pub struct TreeRenderer;

impl Renderer for TreeRenderer {
    fn render(&self, graph: &Graph, out: &mut dyn Write) -> io::Result<()> {
        let mut printed: HashSet<&ObjectKey> = HashSet::new();
        let mut stack: Vec<(&ObjectKey, usize, Option<RelationKind>)> =
            vec![(graph.root(), 0, None)];

        while let Some((key, depth, via)) = stack.pop() {
            let Some(node) = graph.node(key) else {
                continue;
            };

            let mut line = format!("{}{}", "  ".repeat(depth), node.reference.display_name());
            if let Some(kind) = via {
                line.push_str(&format!(" [{}]", kind));
            }

            if !printed.insert(key) {
                writeln!(out, "{} (see above)", line)?;
                continue;
            }

            if let Some(err) = node.error() {
                line.push_str(&format!(" (unresolved: {})", err));
            }
            writeln!(out, "{}", line)?;

            for relation in node.relations.iter().rev() {
                stack.push((&relation.to, depth + 1, Some(relation.kind)));
            }
        }

        if graph.truncated() {
            writeln!(out, "... {}", truncation_notice(graph))?;
        }
        Ok(())
    }
}
