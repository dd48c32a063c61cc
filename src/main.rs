use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod hold;
mod settings;
mod shell;
mod status;

/// Keep your machine awake
///
/// Luminary holds OS power assertions that stop the system from idle
/// sleeping and the display from dimming, and lets them go again when you
/// are done. Nothing is persisted: when luminary exits, every assertion it
/// took is released.
///
/// QUICK START:
///
///   luminary hold                 # stay awake until you press Enter
///   luminary hold --duration 3600 # stay awake for an hour
///   luminary toggle-shell         # flip the switch interactively
///   luminary status               # show configured assertion kinds
///
/// CONFIG:
///
///   $LUMINARY_CONFIG, or $XDG_CONFIG_HOME/luminary/config.toml
///   (falls back to ~/.config/luminary/config.toml)
#[derive(Parser)]
#[command(name = "luminary")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'luminary <command> --help' for more information on a specific command.")]
struct Cli {
    /// Path to a config file (overrides $LUMINARY_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log what would happen instead of taking real OS assertions
    #[arg(long, global = true)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "error",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and the assertion kinds luminary would take
    Status(status::StatusArgs),

    /// Prevent sleep until Enter is pressed, stdin closes, or a timeout
    ///
    /// Exits non-zero if none of the requested assertions could be taken.
    Hold(hold::HoldArgs),

    /// Interactive on/off switch driven from stdin
    ///
    /// Commands: t(oggle), s(tatus), h(elp), q(uit). An empty line toggles.
    #[command(name = "toggle-shell", alias = "shell")]
    ToggleShell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry = luminary::telemetry::init(cli.log_level());
    let settings = settings::Settings::load(cli.config, cli.dry_run)?;

    match cli.command {
        Commands::Status(ref args) => status::run(&settings, args),
        Commands::Hold(ref args) => hold::run(&settings, args),
        Commands::ToggleShell => shell::run(&settings),
    }
}
