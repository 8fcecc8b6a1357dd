//! Agent loop controller CLI.
//!
//! Drives an external LLM agent against the prioritized user stories in
//! `prd.json` until every story passes or the iteration budget runs out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use looper::core::selector::{next_open_story, open_story_count};
use looper::exit_codes;
use looper::io::config::load_config;
use looper::io::gate::CommandGateRunner;
use looper::io::init::{InitOptions, LoopPaths, init_loop};
use looper::io::prd_store::load_prd;
use looper::io::provider::{build_provider, detect_provider};
use looper::logging;
use looper::run::{RunStop, run_loop};

#[derive(Parser)]
#[command(
    name = "looper",
    version,
    about = "Agent loop controller for prioritized user stories"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scaffold prd.json, config.toml and the progress log.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Check prd.json against the schema and invariants.
    Validate,
    /// Print the id of the next open story (highest priority, not passed).
    Select,
    /// Run the agent loop until all stories pass or the budget is exhausted.
    Run {
        /// Maximum number of iterations (defaults to the configured value).
        max_iterations: Option<u32>,
        /// Path to config.toml (defaults to ./config.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Validate => cmd_validate(),
        Command::Select => cmd_select(),
        Command::Run {
            max_iterations,
            config,
        } => cmd_run(max_iterations, config),
    }
}

fn cmd_init(force: bool) -> Result<i32> {
    let root = std::env::current_dir().context("resolve working directory")?;
    let paths = init_loop(&root, &InitOptions { force })?;
    println!("initialized {}", paths.prd_path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate() -> Result<i32> {
    let root = std::env::current_dir().context("resolve working directory")?;
    let paths = LoopPaths::new(root);
    let prd = load_prd(&paths.prd_path)?;
    println!(
        "{} is valid ({} stories, {} open)",
        paths.prd_path.display(),
        prd.user_stories.len(),
        open_story_count(&prd)
    );
    Ok(exit_codes::OK)
}

fn cmd_select() -> Result<i32> {
    let root = std::env::current_dir().context("resolve working directory")?;
    let paths = LoopPaths::new(root);
    let prd = load_prd(&paths.prd_path)?;
    match next_open_story(&prd) {
        Some(story) => {
            println!("{}", story.id);
            Ok(exit_codes::OK)
        }
        None => Ok(exit_codes::COMPLETE),
    }
}

fn cmd_run(max_iterations: Option<u32>, config: Option<PathBuf>) -> Result<i32> {
    let root = std::env::current_dir().context("resolve working directory")?;
    let paths = LoopPaths::new(&root);

    let config_path = config.unwrap_or_else(|| paths.config_path.clone());
    let cfg = load_config(&config_path)?;
    let max_iterations = max_iterations.unwrap_or(cfg.max_iterations_default);

    let kind = detect_provider(&cfg.llm)?;
    let provider = build_provider(kind, &cfg.llm)?;
    let gate_runner = CommandGateRunner::new(cfg.gate.command.clone());

    println!("Starting loop (max iterations: {max_iterations})");
    println!("Using provider: {kind} (model: {})", cfg.llm.model);

    let outcome = run_loop(
        &root,
        provider.as_ref(),
        &gate_runner,
        &cfg,
        max_iterations,
        |report| {
            eprintln!();
            eprintln!("{}", "=".repeat(55));
            eprintln!(
                "  Iteration {} of {max_iterations}: {}",
                report.iter, report.story_id
            );
            eprintln!("{}", "=".repeat(55));
            eprintln!("{}", report.output);
            if !report.completed.is_empty() {
                eprintln!("completed: {}", report.completed.join(", "));
            }
            if let Some(gate) = report.gate {
                eprintln!("gate: {gate:?}");
            }
        },
    )?;

    match outcome.stop {
        RunStop::Complete => {
            println!();
            println!(
                "All stories complete after {} iteration(s).",
                outcome.iterations_run
            );
            Ok(exit_codes::OK)
        }
        RunStop::BudgetExhausted { max_iterations } => {
            println!();
            println!(
                "Reached {max_iterations} iterations with stories still open. \
                 Check {} for status.",
                paths.progress_path.display()
            );
            Ok(exit_codes::EXHAUSTED)
        }
    }
}
