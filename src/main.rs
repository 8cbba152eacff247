//! portalop - command-line companion for the malware analysis portal

use clap::Parser;

mod cli;
mod client;
mod config;
mod error;
mod grid;
mod output;
mod report;

use cli::{Cli, Commands, GlobalOptions, ORGANIZATION_GROUPS, ORGANIZATIONS, VULNERABILITIES};
use error::{Error, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => {}
        // Already shown by the notifier
        Err(Error::Reported) => std::process::exit(1),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins; otherwise `--debug` selects debug output.
fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts).await,
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("portalop version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Grid { endpoint, action } => cli::grid::run(&opts, &endpoint, action).await,
        Commands::Org(action) => cli::grid::run(&opts, ORGANIZATIONS, action).await,
        Commands::Vuln(action) => cli::grid::run(&opts, VULNERABILITIES, action).await,
        Commands::Group(action) => cli::grid::run(&opts, ORGANIZATION_GROUPS, action).await,
        Commands::Report(command) => cli::report::run(&opts, command).await,
        Commands::Completion { shell } => {
            cli::completions::run(shell);
            Ok(())
        }
    }
}
