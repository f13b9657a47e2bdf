mod cmd;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, run::RunArgs};
use pipeline_core::types::Role;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pipeline",
    about = "Pipeline action wizard: resolve eligible actions, configure them and commit one batch",
    version,
    propagate_version = true
)]
struct Cli {
    /// Engine config file (YAML); defaults apply when omitted or missing
    #[arg(long, global = true, env = "PIPELINE_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Date used for due-date defaults and validation (default: local today)
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the required, optional and foreign actions for a fixture's entity
    Eligible {
        /// Fixture file describing the entity, its actions and the catalog
        #[arg(long)]
        fixture: PathBuf,

        /// Resolve for this role instead of the fixture's acting user
        #[arg(long)]
        role: Option<Role>,
    },

    /// Drive the wizard end to end and commit (or cancel) the batch
    Run(RunArgs),

    /// Inspect and validate the engine config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Eligible { fixture, role } => cmd::eligible::run(&fixture, role, cli.json),
        Commands::Run(args) => cmd::config::load_engine_config(config_path)
            .and_then(|config| cmd::run::run(args, config, today, cli.json)),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
