//! Graph renderers
//!
//! Pure functions over a finished [`Graph`]: no API calls, output depends
//! only on node and relation order.

mod dot;
mod tree;

pub use dot::DotRenderer;
pub use tree::TreeRenderer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::graph::{Graph, GraphError};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Indented text tree
    #[default]
    Tree,
    /// Graphviz DOT
    Dot,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Tree => f.write_str("tree"),
            OutputMode::Dot => f.write_str("dot"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" => Ok(OutputMode::Tree),
            "dot" => Ok(OutputMode::Dot),
            other => Err(format!("unknown output mode '{}', expected tree or dot", other)),
        }
    }
}

/// Writes a graph in one text format
pub trait Renderer {
    fn render(&self, graph: &Graph, out: &mut dyn Write) -> io::Result<()>;
}

/// Render `graph` in `mode` to `out`
pub fn render(graph: &Graph, mode: OutputMode, out: &mut dyn Write) -> Result<(), GraphError> {
    match mode {
        OutputMode::Tree => TreeRenderer.render(graph, out)?,
        OutputMode::Dot => DotRenderer.render(graph, out)?,
    }
    out.flush()?;
    Ok(())
}

/// Render into a string
pub fn render_to_string(graph: &Graph, mode: OutputMode) -> Result<String, GraphError> {
    let mut buf = Vec::new();
    render(graph, mode, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| GraphError::Render(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Notice appended by both renderers when the node cap was hit
fn truncation_notice(graph: &Graph) -> String {
    format!(
        "graph truncated at {} nodes; some relations were not followed",
        graph.node_cap()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_parse() {
        assert_eq!("DOT".parse::<OutputMode>(), Ok(OutputMode::Dot));
        assert_eq!("tree".parse::<OutputMode>(), Ok(OutputMode::Tree));
        assert!("json".parse::<OutputMode>().is_err());
        assert_eq!(OutputMode::default().to_string(), "tree");
    }
}
