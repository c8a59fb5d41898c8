//! swctl - install the SiteWhere platform on Kubernetes
//!
//! Applies CRDs, templates, the operator and infrastructure in order, and
//! reports what was installed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use swctl::cli::{self, ConfigSubcommand, InstallArgs};

/// swctl - command line installer for the SiteWhere platform
#[derive(Parser, Debug)]
#[command(name = "swctl")]
#[command(about = "Install the SiteWhere platform on a Kubernetes cluster", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Install platform components
    Install(InstallArgs),
    /// Check that the cluster is reachable
    Check {
        /// Kubeconfig context to use instead of the current one
        #[arg(long)]
        context: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(args.debug);

    match args.command {
        Command::Install(install) => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if cli::watch_interrupts(tokio::signal::ctrl_c, on_interrupt).await {
                    std::process::exit(cli::INTERRUPTED_EXIT_CODE);
                }
            });
            cli::handle_install_command(install, cancel).await
        }
        Command::Check { context } => cli::handle_check_command(context).await,
        Command::Config { subcommand } => cli::handle_config_command(subcommand),
        Command::Version => {
            cli::display_version();
            Ok(())
        }
    }
}
