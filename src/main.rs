use clap::Parser;
use colored::*;
use eyre::{Context as _, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;
use fracture::fracture::{Fracture, resolve_shell};
use fracture::install::InstallOptions;
use fracture::lifecycle::{Context, CreateOptions, Outcome};
use fracture::picker::{FuzzyPicker, Picker, Selection};
use fracture::process::SystemRunner;
use fracture::repository::home_dir;
use fracture::status::ConsoleStatus;

fn setup_logging(level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fracture")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("fracture.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

static IN_SUBSHELL: AtomicBool = AtomicBool::new(false);
static IN_PICKER: AtomicBool = AtomicBool::new(false);

/// Exit code for a Ctrl-C, or `None` when something in the foreground owns it.
///
/// The subshell handles its own interrupts. The picker reads `^C` as a cancel
/// and restores the terminal itself.
fn on_interrupt(in_subshell: bool, in_picker: bool) -> Option<i32> {
    if in_subshell || in_picker { None } else { Some(130) }
}

fn setup_interrupt_handler() -> Result<()> {
    // children share our process group and get the same SIGINT
    ctrlc::set_handler(|| {
        if let Some(code) = on_interrupt(IN_SUBSHELL.load(Ordering::SeqCst), IN_PICKER.load(Ordering::SeqCst)) {
            std::process::exit(code);
        }
    })
    .context("Failed to set Ctrl-C handler")
}

/// Raises a flag for as long as it lives
struct FlagScope(&'static AtomicBool);

impl FlagScope {
    fn raise(flag: &'static AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for FlagScope {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Terminal picker that owns Ctrl-C while it is on screen
struct TerminalPicker;

impl Picker for TerminalPicker {
    fn pick(&self, prompt: &str, items: &[String]) -> fracture::Result<Selection<usize>> {
        let _picking = FlagScope::raise(&IN_PICKER);
        FuzzyPicker.pick(prompt, items)
    }
}

/// Print a failure with its phase and turn it into an exit code
fn exit_code(phase: &str, result: fracture::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{} failed: {}", phase, e);
            eprintln!("{} {}", format!("{}:", phase).red().bold(), e);
            1
        }
    }
}

fn run_application(cli: &Cli, config: &Config) -> Result<i32> {
    info!("Starting application");

    let runner = SystemRunner;
    let home = home_dir()?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let ctx = Context::new(&runner, home, cwd);

    let code = match &cli.command {
        None => exit_code("create", handle_create(&ctx, cli, config)),
        Some(Commands::List { json }) => exit_code("list", handle_list(&ctx, *json)),
        Some(Commands::Enter { id }) => exit_code("enter", handle_enter(&ctx, id.as_deref(), config)),
        Some(Commands::Delete { id, force, all }) => {
            exit_code("delete", handle_delete(&ctx, id.as_deref(), *force, *all))
        }
        Some(Commands::Path { id }) => exit_code("path", handle_path(&ctx, id.as_deref())),
    };
    Ok(code)
}

fn handle_create(ctx: &Context, cli: &Cli, config: &Config) -> fracture::Result<()> {
    let options = CreateOptions {
        new_branch: cli.branch.clone(),
        copy_env_files: config.copy_env_files,
        env_search_depth: config.env_search_depth,
        install_deps: config.install_deps && !cli.no_install,
        install: InstallOptions {
            copy_dependency_cache: config.copy_dependency_cache,
        },
    };
    info!("Creating fracture: {:?}", options);

    let mut status = ConsoleStatus::new();
    let created = match ctx.create(&options, &TerminalPicker, &mut status)? {
        Outcome::Done(created) => created,
        Outcome::Cancelled => {
            info!("Branch selection cancelled");
            return Ok(());
        }
    };

    let fracture = &created.fracture;
    println!(
        "{} {} {}",
        "Created fracture".green(),
        fracture.id.bold(),
        format!("<{}>", fracture.branch).dimmed()
    );
    println!("  {}", fracture.path.display());
    if created.env_files_copied > 0 {
        println!("  copied {} env file(s)", created.env_files_copied);
    }
    if let Some(warning) = &created.install_warning {
        eprintln!("{} {}", "warning: dependency install failed:".yellow().bold(), warning);
    }

    enter_fracture(ctx, fracture, config)
}

fn handle_list(ctx: &Context, json: bool) -> fracture::Result<()> {
    let fractures = ctx.list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&fractures)?);
        return Ok(());
    }
    for fracture in &fractures {
        println!("{} {}", fracture.id.bold(), format!("<{}>", fracture.branch).cyan());
    }
    Ok(())
}

fn handle_enter(ctx: &Context, id: Option<&str>, config: &Config) -> fracture::Result<()> {
    match ctx.select(id, &TerminalPicker)? {
        Outcome::Done(fracture) => enter_fracture(ctx, &fracture, config),
        Outcome::Cancelled => Ok(()),
    }
}

fn enter_fracture(ctx: &Context, fracture: &Fracture, config: &Config) -> fracture::Result<()> {
    let shell = resolve_shell(config.shell.as_deref());
    println!(
        "{} {} {}",
        "Entering".cyan(),
        fracture.id.bold(),
        format!("({})", shell).dimmed()
    );
    {
        let _entered = FlagScope::raise(&IN_SUBSHELL);
        fracture.enter(ctx.runner, &shell)?;
    }
    println!("{} {}", "Left fracture".cyan(), fracture.id);
    Ok(())
}

fn handle_delete(ctx: &Context, id: Option<&str>, force: bool, all: bool) -> fracture::Result<()> {
    if all {
        let report = ctx.delete_all(force)?;
        if report.is_empty() {
            println!("No fractures found");
            return Ok(());
        }
        for id in &report.deleted {
            println!("{} {}", "Deleted".green(), id);
        }
        if !report.failures.is_empty() {
            eprintln!("{}", "Some fractures could not be deleted:".red().bold());
            for (id, message) in &report.failures {
                eprintln!("  {} {}", id.bold(), message);
            }
        }
        return Ok(());
    }

    match ctx.select(id, &TerminalPicker)? {
        Outcome::Done(fracture) => {
            fracture.delete(ctx.runner, force)?;
            println!("{} {}", "Deleted".green(), fracture.id);
            Ok(())
        }
        Outcome::Cancelled => Ok(()),
    }
}

fn handle_path(ctx: &Context, id: Option<&str>) -> fracture::Result<()> {
    if let Outcome::Done(fracture) = ctx.select(id, &TerminalPicker)? {
        println!("{}", fracture.path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;
    setup_interrupt_handler()?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    let code = run_application(&cli, &config).context("Application failed")?;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
