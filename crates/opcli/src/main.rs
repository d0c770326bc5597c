// crates/opcli/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use opcore::{ExecutionEvent, PresentableTypes, Value, Workflow, WorkflowSpec};
use opruntime::{ExecutorKind, FlowRuntime, OperationRegistry, RuntimeConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "opflow")]
#[command(about = "Operation workflow CLI", long_about = None)]
struct Cli {
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

        /// Filled values as JSON: {"<operation>": {"<input>": value}}
        #[arg(short, long)]
        input: Option<String>,

        /// Executor to use: local or threads
        #[arg(short, long)]
        executor: Option<ExecutorKind>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available operations and their parameters
    Ops,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

fn registry() -> Result<OperationRegistry> {
    let mut registry = OperationRegistry::new();
    opnodes::register_all(&mut registry)?;
    Ok(registry)
}

fn read_spec(file: &PathBuf) -> Result<WorkflowSpec> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    Ok(serde_json::from_str(&json)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            executor,
            verbose,
        } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_workflow(file, input, executor).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Ops => {
            list_operations()?;
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

/// Apply `{"<operation>": {"<input>": value}}` onto the workflow's filled values.
fn apply_inputs(workflow: &mut Workflow, input: &str) -> Result<()> {
    let json: serde_json::Value = serde_json::from_str(input)?;
    let serde_json::Value::Object(operations) = json else {
        anyhow::bail!("Input must be a JSON object");
    };

    for (operation, values) in operations {
        let id = workflow
            .find_by_name(&operation)
            .map(|op| op.id())
            .with_context(|| format!("no operation named \"{}\"", operation))?;
        let serde_json::Value::Object(values) = values else {
            anyhow::bail!("Values for \"{}\" must be a JSON object", operation);
        };
        for (name, value) in values {
            workflow.set_filled_value(id, name, Value::from_json(value))?;
        }
    }
    Ok(())
}

async fn run_workflow(
    file: PathBuf,
    input: Option<String>,
    executor: Option<ExecutorKind>,
) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let mut config = RuntimeConfig::default();
    if let Some(kind) = executor {
        config.executor = kind;
    }
    let runtime = FlowRuntime::with_registry(Arc::new(registry()?), config);

    let mut workflow = runtime.load_workflow(read_spec(&file)?)?;
    if let Some(input) = input {
        apply_inputs(&mut workflow, &input)?;
    }

    println!("📋 Workflow: {}", workflow.name);
    println!("   Operations: {}", workflow.operations().len());
    println!("   Links: {}", workflow.links().len());
    println!("   Executor: {}", runtime.executor().name());
    println!();

    // Subscribe to events for real-time output
    let mut events = runtime.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::WorkflowStarted { .. } => {
                    println!("▶️  Workflow started");
                }
                ExecutionEvent::OperationStarted { operation, .. } => {
                    println!("  ⚡ Starting operation: {}", operation);
                }
                ExecutionEvent::OperationCompleted {
                    node_id,
                    duration_ms,
                    ..
                } => {
                    println!("  ✅ Operation {} completed in {}ms", node_id, duration_ms);
                }
                ExecutionEvent::OperationSkipped { operation, .. } => {
                    println!("  ⏭️  Skipping disabled operation: {}", operation);
                }
                ExecutionEvent::OperationFailed { node_id, error, .. } => {
                    println!("  ❌ Operation {} failed: {}", node_id, error);
                }
                ExecutionEvent::WorkflowCompleted {
                    success,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("✨ Workflow completed successfully in {}ms", duration_ms);
                    } else {
                        println!("💥 Workflow failed after {}ms", duration_ms);
                    }
                }
            }
        }
    });

    let result = runtime.execute(&mut workflow).await;

    // Wait for events to finish printing
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    let results = match result {
        Ok(results) => results,
        Err(e) => {
            if !workflow.last_results().is_empty() {
                println!();
                println!("🔎 Completed before failure:");
                for (node_id, outputs) in workflow.last_results() {
                    println!("   {}: {:?}", node_id, outputs);
                }
            }
            return Err(e.into());
        }
    };

    println!();
    println!("📤 Outputs:");
    for (id, outputs) in workflow.terminal_nodes().into_iter().zip(&results) {
        let name = workflow.operation(id).map(|op| op.name()).unwrap_or("?");
        println!("   {}:", name);
        let mut keys: Vec<&String> = outputs.keys().collect();
        keys.sort();
        for key in keys {
            println!("     {}: {}", key, outputs[key]);
        }
    }

    Ok(())
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = registry()?.load_workflow(read_spec(&file)?)?;
    let order = workflow.execution_order()?;

    println!("✅ Workflow is valid:");
    println!("   Name: {}", workflow.name);
    println!("   Operations: {}", workflow.operations().len());
    println!("   Links: {}", workflow.links().len());
    println!("   Execution order:");
    for id in order {
        if let Some(op) = workflow.operation(id) {
            println!("     • {}", op.name());
        }
    }

    Ok(())
}

fn list_operations() -> Result<()> {
    println!("📦 Available Operations:");
    println!();

    let registry = registry()?;
    let presentable = PresentableTypes::standard();

    for name in registry.list_functions() {
        let operation = registry.create(&name)?;
        println!(
            "  • {} ({}) -> ({})",
            operation.name(),
            operation.input_names().join(", "),
            operation.output_names().join(", ")
        );
        let parameters = operation.as_parameter(&presentable);
        if !parameters.is_empty() {
            println!("    {}", serde_json::to_string(&parameters)?);
        }
    }

    Ok(())
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let registry = registry()?;

    let mut workflow = Workflow::new("Square and sum");
    let square = workflow.add_operation(registry.create("square")?)?;
    let sum = workflow.add_operation(registry.create("sum")?)?;
    workflow.add_link(square, sum, "square", "a")?;

    let json = serde_json::to_string_pretty(&workflow.to_spec()?)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  opflow run --file {} --input '{{\"square\": {{\"a\": 4}}}}'",
        output.display()
    );

    Ok(())
}
