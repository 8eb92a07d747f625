// crates/maticli/src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use maticore::{ExecutionEvent, NodeEvent, NodeSpec, RunState, RunStatus, Workflow};
use matiruntime::{resolve_execution_order, FlowRuntime, InMemoryRunStore, RuntimeConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mati")]
#[command(about = "Mati workflow runner", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Runtime configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_workflow(file: &Path) -> Result<Workflow> {
    let workflow_json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    serde_json::from_str(&workflow_json).with_context(|| format!("failed to parse {}", file.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { file, config } => run_workflow(&file, config.as_deref()).await,
        Commands::Validate { file } => validate_workflow(&file),
        Commands::Nodes => {
            list_nodes();
            Ok(())
        }
        Commands::Init { output } => create_example_workflow(&output),
    }
}

async fn run_workflow(file: &Path, config: Option<&Path>) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let workflow = load_workflow(file)?;

    println!("📋 Workflow: {}", workflow.name);
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Connections: {}", workflow.connections.len());
    println!();

    let config = match config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => RuntimeConfig::default(),
    };
    tracing::debug!("Runtime config: {:?}", config);

    let registry = matinodes::builtin_registry()?;
    let store = Arc::new(InMemoryRunStore::new());
    let runtime = FlowRuntime::new(Arc::new(registry), store.clone(), config);
    let run_id = store.create_run().run_id;

    // Subscribe before spawning so no event is missed
    let mut events = runtime.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if event.run_id() != run_id {
                continue;
            }
            let finished = matches!(event, ExecutionEvent::RunFinished { .. });
            print_event(event);
            if finished {
                break;
            }
        }
    });

    let mut handle = runtime.spawn(workflow, run_id)?;

    let state = tokio::select! {
        result = &mut handle => result??,
        _ = tokio::signal::ctrl_c() => {
            println!("🛑 Cancelling run {}", run_id);
            runtime.cancel(run_id).await;
            handle.await??
        }
    };

    // The terminal event is emitted before the run task returns
    let _ = event_task.await;

    print_summary(&state);

    if state.status == RunStatus::Failed {
        bail!(
            "run {} failed: {}",
            run_id,
            state.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_event(event: ExecutionEvent) {
    match event {
        ExecutionEvent::RunStarted { total_nodes, .. } => {
            println!("▶️  Run started ({} nodes)", total_nodes);
        }
        ExecutionEvent::NodeStarted { node_id, node_type, .. } => {
            println!("  ⚡ Starting node: {} ({})", node_id, node_type);
        }
        ExecutionEvent::NodeCompleted { node_id, duration_ms, .. } => {
            println!("  ✅ Node {} completed in {}ms", node_id, duration_ms);
        }
        ExecutionEvent::NodeFailed { node_id, error, .. } => {
            println!("  ❌ Node {} failed: {}", node_id, error);
        }
        ExecutionEvent::Progress { progress, .. } => {
            println!("  📈 {:.0}%", progress);
        }
        ExecutionEvent::NodeEvent { node_id, event, .. } => match event {
            NodeEvent::Info { message } => {
                println!("     ℹ️  [{}] {}", node_id, message);
            }
            NodeEvent::Warning { message } => {
                println!("     ⚠️  [{}] {}", node_id, message);
            }
            NodeEvent::Progress { percent, message } => {
                if let Some(msg) = message {
                    println!("     📊 [{}] {}% - {}", node_id, percent, msg);
                } else {
                    println!("     📊 [{}] {}%", node_id, percent);
                }
            }
        },
        ExecutionEvent::RunFinished { status, duration_ms, .. } => match status {
            RunStatus::Completed => println!("✨ Run completed successfully in {}ms", duration_ms),
            RunStatus::Cancelled => println!("🛑 Run cancelled after {}ms", duration_ms),
            _ => println!("💥 Run failed after {}ms", duration_ms),
        },
    }
}

fn print_summary(state: &RunState) {
    println!();
    println!("📊 Execution Summary:");
    println!("   Run ID: {}", state.run_id);
    println!("   Status: {}", state.status);
    println!("   Progress: {:.0}%", state.progress);
    if let Some(error) = &state.error {
        println!("   Error: {}", error);
    }

    let mut node_ids: Vec<_> = state.node_results.keys().collect();
    node_ids.sort();
    if !node_ids.is_empty() {
        println!();
        println!("📤 Outputs:");
        for node_id in node_ids {
            let outputs = &state.node_results[node_id];
            if outputs.is_empty() {
                continue;
            }
            println!("   Node {}:", node_id);
            let mut ports: Vec<_> = outputs.iter().collect();
            ports.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in ports {
                let rendered = serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value));
                println!("     {}: {}", key, rendered);
            }
        }
    }
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = load_workflow(file)?;
    let registry = matinodes::builtin_registry()?;

    let order = resolve_execution_order(&workflow)?;

    let unknown: Vec<&NodeSpec> = workflow
        .nodes
        .iter()
        .filter(|node| !registry.contains(&node.node_type))
        .collect();
    if !unknown.is_empty() {
        for node in &unknown {
            println!("  ❌ Node {} has unknown type '{}'", node.id, node.node_type);
        }
        bail!("{} node(s) reference unknown types", unknown.len());
    }

    println!("✅ Workflow is valid:");
    println!("   Name: {}", workflow.name);
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Connections: {}", workflow.connections.len());
    println!("   Execution order: {}", order.join(" → "));

    Ok(())
}

fn list_nodes() {
    println!("📦 Available Node Types:");
    println!();

    for spec in matinodes::builtin_specs() {
        println!("  • {} ({}, v{})", spec.node_type, spec.category, spec.version);
        println!("    {}", spec.description);
        for port in &spec.input_ports {
            let marker = if port.required { "" } else { "?" };
            println!("      in  {}{}: {}", port.name, marker, port.data_type);
        }
        for port in &spec.output_ports {
            println!("      out {}: {}", port.name, port.data_type);
        }
    }
}

fn create_example_workflow(output: &Path) -> Result<()> {
    let mut workflow = Workflow::new("Example Speech Workflow");
    workflow.description = Some("Generates a short text and reads it aloud".to_string());

    let generate_ports = matinodes::spec_for("text-generation")
        .map(|spec| spec.input_ports)
        .unwrap_or_default()
        .into_iter()
        .map(|port| {
            if port.name == "prompt" {
                port.with_default("Write a haiku about the sea")
            } else {
                port
            }
        });
    let speak_ports = matinodes::spec_for("text-to-speech")
        .map(|spec| spec.input_ports)
        .unwrap_or_default();

    let generate = NodeSpec::new("generate", "text-generation")
        .with_name("Generate Text")
        .with_config("model", "gpt-3.5-turbo")
        .with_input_ports(generate_ports);

    let speak = NodeSpec::new("speak", "text-to-speech")
        .with_name("Speak Text")
        .with_config("speed", 1.0)
        .with_input_ports(speak_ports);

    let generate_id = workflow.add_node(generate);
    let speak_id = workflow.add_node(speak);

    workflow.connect(generate_id, "text", speak_id, "text");

    let json = serde_json::to_string_pretty(&workflow)?;
    std::fs::write(output, json).with_context(|| format!("failed to write {}", output.display()))?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  mati run --file {}", output.display());

    Ok(())
}
