//! `rusty-automation-tool` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate`        — parse a workflow JSON file and report tree shape.
//! - `run`              — execute a workflow JSON file to completion.
//! - `__invoke-function` — hidden subcommand; re-exec target for a
//!   `FunctionExec` node, never invoked directly by a user.

mod spec;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use engine::{Engine, NoopDbService, NoopStorageService, RunConfig};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "rusty-automation-tool",
    about = "Tree-shaped workflow execution engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a workflow JSON file and report its tree shape.
    Validate {
        path: PathBuf,
    },
    /// Execute a workflow JSON file to completion.
    Run {
        path: PathBuf,

        /// Keep dispatching siblings after a child fails.
        #[arg(long)]
        ignore_failure: bool,

        /// Postgres connection string. Omit to run with no persistence.
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,

        /// Directory to write captured stdout/stderr artifacts under.
        /// Omit to mirror output to this process's own stdout/stderr.
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
    },
    #[command(hide = true, name = "__invoke-function")]
    InvokeFunction {
        target: String,
        args_json: String,
        kwargs_json: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The hidden re-exec subcommand runs before logging is initialized and
    // before any argument validation beyond clap's: its stdout/stderr *are*
    // the artifact stream the parent process is capturing.
    if let Command::InvokeFunction { target, args_json, kwargs_json } = &cli.command {
        register_demo_functions();
        let args: Vec<serde_json::Value> = serde_json::from_str(args_json).unwrap_or_default();
        let kwargs: std::collections::BTreeMap<String, serde_json::Value> =
            serde_json::from_str(kwargs_json).unwrap_or_default();
        nodes::registry::run_invocation_entrypoint(target, &args, &kwargs);
    }

    tracing_subscriber::fmt::init();
    register_demo_functions();

    match cli.command {
        Command::Validate { path } => {
            let content = std::fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read file {}: {e}", path.display()));
            let parsed: spec::WorkflowSpec =
                serde_json::from_str(&content).unwrap_or_else(|e| panic!("invalid JSON: {e}"));

            match parsed.into_workflow() {
                Ok(workflow) => {
                    let count = spec::count_nodes(workflow.root());
                    println!("workflow '{}' is valid: {count} node(s)", workflow.name());
                }
                Err(e) => {
                    eprintln!("validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Run { path, ignore_failure, database_url, artifacts_dir } => {
            let content = std::fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read file {}: {e}", path.display()));
            let parsed: spec::WorkflowSpec =
                serde_json::from_str(&content).unwrap_or_else(|e| panic!("invalid JSON: {e}"));
            let workflow = parsed.into_workflow().unwrap_or_else(|e| panic!("invalid workflow: {e}"));

            let db: Arc<dyn engine::DbService> = match database_url {
                Some(url) => {
                    info!(%url, "connecting to database");
                    let pool = db::pool::create_pool(&url, 5).await.expect("failed to connect to database");
                    db::pool::run_migrations(&pool).await.expect("migration failed");
                    Arc::new(db::PostgresDbService::new(pool))
                }
                None => Arc::new(NoopDbService),
            };

            let storage: Arc<dyn engine::StorageService> = match artifacts_dir {
                Some(dir) => Arc::new(storage::LocalStorageService::new(dir)),
                None => Arc::new(NoopStorageService),
            };

            let engine = Engine::new(db, storage, RunConfig { ignore_failure });
            let code = engine.run(&workflow).await.unwrap_or_else(|e| {
                eprintln!("run failed: {e}");
                1
            });
            std::process::exit(code);
        }
        Command::InvokeFunction { .. } => unreachable!("handled above"),
    }
}

/// Registers the handful of functions the bundled example workflows target,
/// so `validate`/`run` have something runnable out of the box.
fn register_demo_functions() {
    nodes::registry::register("demo.print_args", |args, kwargs| {
        println!("args={args:?} kwargs={kwargs:?}");
        Ok(())
    });
}
