//! kubegraph - show how Kubernetes objects relate to each other
//!
//! Starting from one object, follows owner references, label selectors,
//! volume and env references, routing and autoscaling targets, and prints
//! the result as a tree or as Graphviz DOT.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufWriter;
use std::path::PathBuf;

use kubegraph::cli::{ConfigSubcommand, display_version, handle_config_command, init_logging};
use kubegraph::config::ConfigLoader;
use kubegraph::graph::cancel_pair;
use kubegraph::kube::{self as cluster, KubeAccessor};
use kubegraph::{GraphRequest, GraphService, OutputMode};

/// Print the graph of objects related to a Kubernetes object
#[derive(Parser, Debug)]
#[command(name = "kubegraph")]
#[command(about = "Print a tree or DOT graph of the objects related to a Kubernetes object", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// Kind of the root object (kind, plural, singular or short name, e.g. svc)
    kind: Option<String>,

    /// Name of the root object
    name: Option<String>,

    /// Namespace of the root object (defaults to the kubeconfig context namespace)
    #[arg(long, short = 'n')]
    namespace: Option<String>,

    /// Print Graphviz DOT instead of a tree
    #[arg(long)]
    dot: bool,

    /// Stop after this many objects
    #[arg(long, value_name = "N")]
    max_nodes: Option<usize>,

    /// Objects fetched in parallel
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Deadline for each API call, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Kubeconfig context to use
    #[arg(long)]
    context: Option<String>,

    /// Path to a kubeconfig file
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Print version information
    Version,
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Command::Version) => {
            display_version();
            return Ok(());
        }
        Some(Command::Config { subcommand }) => return handle_config_command(subcommand),
        None => {}
    }

    let (kind, name) = match (args.kind.as_deref(), args.name.as_deref()) {
        (Some(kind), Some(name)) if !kind.is_empty() && !name.is_empty() => (kind, name),
        _ => anyhow::bail!("requires valid 'kind' and 'name' arguments"),
    };

    let log_file = init_logging(args.debug)?;
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }

    let mut config = ConfigLoader::load().context("Failed to load configuration")?;
    if let Some(max_nodes) = args.max_nodes {
        config.graph.max_nodes = max_nodes;
    }
    if let Some(concurrency) = args.concurrency {
        config.graph.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.graph.request_timeout_secs = timeout;
    }
    ConfigLoader::check(&config)?;

    let mode = if args.dot {
        OutputMode::Dot
    } else {
        config.output
    };

    tracing::debug!("Initializing Kubernetes client");
    let connection = cluster::connect(args.context.as_deref(), args.kubeconfig.as_deref())
        .await
        .context("Failed to connect to Kubernetes")?;

    let namespace = args
        .namespace
        .filter(|ns| !ns.is_empty())
        .or_else(|| Some(config.default_namespace.clone()).filter(|ns| !ns.is_empty()))
        .unwrap_or(connection.default_namespace);

    let (cancel, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Interrupted, cancelling graph build");
            cancel.cancel();
        }
    });

    let service = GraphService::new(KubeAccessor::new(connection.client))
        .with_options(config.graph.build_options())
        .with_cancel(signal);
    let request = GraphRequest::new(kind, namespace, name);

    let mut out = BufWriter::new(std::io::stdout().lock());
    let graph = service.run(&request, mode, &mut out).await?;

    tracing::debug!(
        "Printed {} nodes and {} relations",
        graph.len(),
        graph.relation_count()
    );
    Ok(())
}
