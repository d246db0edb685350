use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

use isvpc_state::{StateBackend, StateFile, create_backend};

mod commands;
mod config;
mod display;

use commands::{
    ExecutionSummary, destroy_plan, execute_plan, get_provider, prepare_plan, validate_resources,
};
use config::Configuration;

#[derive(Parser)]
#[command(name = "isvpc")]
#[command(about = "Declarative IBM Cloud VPC management", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Path to the JSON configuration
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        #[arg(default_value = "main.json")]
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Destroy all resources defined in the configuration file
    Destroy {
        #[arg(default_value = "main.json")]
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Inspect the state file
    State {
        /// Configuration naming the backend
        #[arg(long, default_value = "main.json")]
        file: PathBuf,

        #[command(subcommand)]
        command: StateCommands,
    },
    /// Remove a stale lock by ID
    ForceUnlock {
        lock_id: String,

        #[arg(long, default_value = "main.json")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// List every resource in state
    List,
    /// Show one resource by `type.name`
    Show { address: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file).await,
        Commands::Apply { file, auto_approve } => run_apply(&file, auto_approve).await,
        Commands::Destroy { file, auto_approve } => run_destroy(&file, auto_approve).await,
        Commands::State { file, command } => run_state_command(&file, command).await,
        Commands::ForceUnlock { lock_id, file } => run_force_unlock(&file, &lock_id).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_validated(file: &Path) -> Result<Configuration, String> {
    let mut config = Configuration::load(file)?;
    validate_resources(&mut config.resources)?;
    Ok(config)
}

async fn open_backend(config: &Configuration) -> Result<Box<dyn StateBackend>, String> {
    create_backend(&config.backend)
        .await
        .map_err(|e| format!("Backend error: {}", e))
}

async fn read_state(backend: &dyn StateBackend) -> Result<StateFile, String> {
    Ok(backend
        .read_state()
        .await
        .map_err(|e| format!("Failed to read state: {}", e))?
        .unwrap_or_default())
}

fn run_validate(file: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());
    let config = load_validated(file)?;

    println!(
        "{}",
        format!(
            "✓ {} resources validated successfully.",
            config.resources.len()
        )
        .green()
        .bold()
    );
    for resource in &config.resources {
        let kind = if resource.is_data_source() { " (data)" } else { "" };
        println!("  • {}{}", resource.id, kind);
    }
    Ok(())
}

async fn run_plan(file: &Path) -> Result<(), String> {
    let config = load_validated(file)?;
    let backend = open_backend(&config).await?;
    let state = read_state(backend.as_ref()).await?;
    let provider = get_provider(&config)?;

    let prepared = prepare_plan(provider.as_ref(), &config.resources, &state).await?;
    display::print_plan(&prepared.plan);
    Ok(())
}

fn confirm(question: &str) -> Result<bool, String> {
    println!("{}", question.yellow().bold());
    println!("  {}", "Only 'yes' will be accepted to confirm.".yellow());
    print!("\n  Enter a value: ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();
    Ok(input.trim() == "yes")
}

/// Run `operation` while holding the backend lock
async fn with_lock<F, Fut>(
    backend: &dyn StateBackend,
    operation: &str,
    f: F,
) -> Result<(), String>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    let lock = backend
        .acquire_lock(operation)
        .await
        .map_err(|e| format!("Failed to acquire state lock: {}", e))?;
    log::debug!("acquired state lock {}", lock.id);

    let result = f().await;

    if let Err(e) = backend.release_lock(&lock).await {
        eprintln!(
            "{} failed to release state lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
    result
}

fn print_summary(verb: &str, summary: &ExecutionSummary) -> Result<(), String> {
    println!();
    if summary.failed == 0 {
        println!(
            "{}",
            format!("{} complete! {} changes applied.", verb, summary.succeeded)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "{} failed. {} succeeded, {} failed.",
            verb, summary.succeeded, summary.failed
        ))
    }
}

async fn run_apply(file: &Path, auto_approve: bool) -> Result<(), String> {
    let config = load_validated(file)?;
    let backend = open_backend(&config).await?;
    let provider = get_provider(&config)?;

    with_lock(backend.as_ref(), "apply", || async {
        let mut state = read_state(backend.as_ref()).await?;
        let prepared = prepare_plan(provider.as_ref(), &config.resources, &state).await?;

        if prepared.plan.has_no_changes() {
            println!("{}", "No changes needed.".green());
            return Ok(());
        }

        display::print_plan(&prepared.plan);
        println!();

        if !auto_approve && !confirm("Do you want to perform these actions?")? {
            println!("{}", "Apply cancelled.".yellow());
            return Ok(());
        }

        println!("{}", "Applying changes...".cyan().bold());
        println!();
        let summary = execute_plan(provider, prepared, &mut state, backend.as_ref()).await?;
        print_summary("Apply", &summary)
    })
    .await
}

async fn run_destroy(file: &Path, auto_approve: bool) -> Result<(), String> {
    let config = load_validated(file)?;
    let backend = open_backend(&config).await?;
    let provider = get_provider(&config)?;

    with_lock(backend.as_ref(), "destroy", || async {
        let mut state = read_state(backend.as_ref()).await?;
        let plan = destroy_plan(&config.resources, &state);

        if plan.is_empty() {
            println!("{}", "No resources to destroy.".green());
            return Ok(());
        }

        println!("{}", "Destroy Plan:".red().bold());
        println!();
        for effect in plan.effects() {
            println!("  {} {}", "-".red().bold(), effect.resource_id());
        }
        println!();
        println!("Plan: {} to destroy.", plan.effects().len().to_string().red());
        println!();

        if !auto_approve
            && !confirm("Do you really want to destroy all resources? This cannot be undone.")?
        {
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }

        println!("{}", "Destroying resources...".red().bold());
        println!();
        let prepared = commands::PreparedPlan {
            plan,
            bindings: Default::default(),
        };
        let summary = execute_plan(provider, prepared, &mut state, backend.as_ref()).await?;
        print_summary("Destroy", &summary)
    })
    .await
}

async fn run_state_command(file: &Path, command: StateCommands) -> Result<(), String> {
    let backend_config = Configuration::load_backend(file)?;
    let backend = create_backend(&backend_config)
        .await
        .map_err(|e| format!("Backend error: {}", e))?;
    let state = read_state(backend.as_ref()).await?;

    match command {
        StateCommands::List => {
            if state.resources.is_empty() {
                println!("{}", "No resources in state.".yellow());
            }
            for address in state.addresses() {
                println!("{}", address);
            }
            Ok(())
        }
        StateCommands::Show { address } => {
            let resource = state
                .find_by_address(&address)
                .ok_or_else(|| format!("No resource {} in state", address))?;
            display::print_resource_state(resource);
            Ok(())
        }
    }
}

async fn run_force_unlock(file: &Path, lock_id: &str) -> Result<(), String> {
    let backend_config = Configuration::load_backend(file)?;
    let backend = create_backend(&backend_config)
        .await
        .map_err(|e| format!("Backend error: {}", e))?;

    if let Some(lock) = backend.current_lock().await.map_err(|e| e.to_string())? {
        log::info!("current lock: {}", lock);
    }
    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| format!("Failed to unlock: {}", e))?;
    println!("{}", format!("Lock {} released.", lock_id).green());
    Ok(())
}
