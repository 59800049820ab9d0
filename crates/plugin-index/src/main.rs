//! plugin-index - discover the plugins available for a host version.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use miette::Result;
use std::path::PathBuf;

mod commands;
mod settings;

#[derive(Parser)]
#[command(name = "plugin-index")]
#[command(version, about = "Discover the plugins available for a host version", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
pub struct GlobalOptions {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to plugin-index.toml
    #[arg(long, global = true, env = "PLUGIN_INDEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host version to list plugins for
    #[arg(long, global = true, env = "PLUGIN_INDEX_HOST_VERSION")]
    pub host_version: Option<String>,

    /// CI server base URL
    #[arg(long, global = true, env = "PLUGIN_INDEX_CI_URL")]
    pub ci_url: Option<String>,

    /// First version that has not been released yet
    #[arg(long, global = true, env = "PLUGIN_INDEX_NEXT_VERSION")]
    pub next_version: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the plugins available for the host version
    List {
        /// Host versions to list (defaults to the configured one)
        versions: Vec<String>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which CI view a host version reads from
    View {
        /// Host version (defaults to the configured one)
        version: Option<String>,
    },

    /// Infer a plugin name from an artifact path
    Name {
        /// Artifact path relative to the build's artifact root
        path: String,
        /// URL of the CI job that built the artifact
        #[arg(long, default_value = "")]
        job_url: String,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    plugin_index_diagnostics::setup();

    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.global.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    if !cli.global.quiet {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.global.no_color {
        console::set_colors_enabled(false);
    }

    match cli.command {
        Commands::List { versions, json } => {
            commands::list(&cli.global, &versions, json).await?;
        }
        Commands::View { version } => {
            commands::view(&cli.global, version.as_deref())?;
        }
        Commands::Name { path, job_url } => {
            commands::name(&path, &job_url);
        }
        Commands::Config => {
            commands::config(&cli.global)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin, &mut std::io::stdout());
        }
    }

    Ok(())
}
