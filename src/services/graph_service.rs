//! Build-then-render service

use std::io::Write;

use crate::graph::{BuildOptions, CancelSignal, Graph, GraphBuilder, GraphError, ResourceAccessor};
use crate::render::{self, OutputMode};

/// Root object to graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl GraphRequest {
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Service for building and printing relationship graphs
pub struct GraphService<A> {
    accessor: A,
    options: BuildOptions,
    cancel: Option<CancelSignal>,
}

impl<A: ResourceAccessor> GraphService<A> {
    pub fn new(accessor: A) -> Self {
        Self {
            accessor,
            options: BuildOptions::default(),
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the graph for `request`
    pub async fn build(&self, request: &GraphRequest) -> Result<Graph, GraphError> {
        let mut builder = GraphBuilder::new(&self.accessor).with_options(self.options.clone());
        if let Some(cancel) = &self.cancel {
            builder = builder.with_cancel(cancel.clone());
        }
        builder
            .build(&request.kind, &request.namespace, &request.name)
            .await
    }

    /// Build and render to `out`; nothing is written when the build fails
    pub async fn run(
        &self,
        request: &GraphRequest,
        mode: OutputMode,
        out: &mut dyn Write,
    ) -> Result<Graph, GraphError> {
        let graph = self.build(request).await?;
        tracing::debug!(
            "Rendering {} nodes as {} for {}/{}",
            graph.len(),
            mode,
            request.kind,
            request.name
        );
        render::render(&graph, mode, out)?;
        Ok(graph)
    }

    /// Get a reference to the underlying accessor
    pub fn accessor(&self) -> &A {
        &self.accessor
    }
}
