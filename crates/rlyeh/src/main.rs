//! rlyeh - hot-reload instrumentation for JavaScript modules
//!
//! CLI driver for running the tree passes and the loader adapter outside a
//! bundler, mostly to see what they do to a given file.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Hot-reload instrumentation for JavaScript modules
#[derive(Parser, Debug)]
#[command(name = "rlyeh")]
#[command(author, version, about = "Instrument JavaScript modules for hot reloading")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (default: ./rlyeh.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the registration and lifting passes on a file and report the result
    Inspect(commands::inspect::InspectArgs),

    /// Append the export tagger to emitted code and extend its source map
    Append(commands::append::AppendArgs),
}

/// Shared settings every command receives.
pub struct Context {
    pub format: OutputFormat,
    pub use_color: bool,
    pub quiet: bool,
    pub config: config::Config,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let use_color = !cli.no_color && !cli.quiet && atty::is(atty::Stream::Stdout);
    let config = config::Config::load(cli.config.as_deref())?;

    let ctx = Context {
        format: cli.format,
        use_color,
        quiet: cli.quiet,
        config,
    };

    match cli.command {
        Commands::Inspect(args) => commands::inspect::run(args, &ctx),
        Commands::Append(args) => commands::append::run(args, &ctx),
    }
}
