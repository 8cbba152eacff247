//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod completions;
pub mod context;
pub mod grid;
pub mod init;
pub mod report;
pub mod status;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// Collection behind the `org` shortcut
pub const ORGANIZATIONS: &str = "organizations";
/// Collection behind the `vuln` shortcut
pub const VULNERABILITIES: &str = "vulnerabilities";
/// Collection behind the `group` shortcut
pub const ORGANIZATION_GROUPS: &str = "organization_groups";

/// portalop - command-line companion for the malware analysis portal
#[derive(Parser, Debug)]
#[command(name = "portalop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "PORTALOP_FORMAT",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: Option<OutputFormat>,

    /// Override config file location
    #[arg(long, global = true, env = "PORTALOP_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the portal host (e.g. http://localhost:5001)
    #[arg(long, global = true, env = "PORTALOP_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Override the API key from the config file
    #[arg(long, global = true, env = "PORTALOP_API_KEY", hide = true)]
    pub api_key: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "PORTALOP_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize portalop configuration
    Init,

    /// Show configuration status
    Status,

    /// Display version information
    Version,

    /// Browse and edit any collection
    Grid {
        /// Collection endpoint (e.g. organizations, vulnerabilities)
        endpoint: String,

        #[command(subcommand)]
        action: RecordCommands,
    },

    /// Manage organizations
    #[command(subcommand)]
    Org(RecordCommands),

    /// Manage vulnerabilities
    #[command(subcommand)]
    Vuln(RecordCommands),

    /// Manage organization groups
    #[command(subcommand)]
    Group(RecordCommands),

    /// View analysis reports of a sample
    #[command(subcommand)]
    Report(ReportCommands),

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   portalop completion bash > /etc/bash_completion.d/portalop
  zsh:    portalop completion zsh > \"${fpath[1]}/_portalop\"
  fish:   portalop completion fish > ~/.config/fish/completions/portalop.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Record operations on one collection
#[derive(Subcommand, Debug, Clone)]
pub enum RecordCommands {
    /// List all records
    List {
        /// Hide a field from the columns (repeatable)
        #[arg(long = "exclude", short = 'x')]
        exclude: Vec<String>,
    },

    /// Show one record
    Get {
        /// Record identifier
        id: String,
    },

    /// Edit fields of a record
    Set {
        /// Record identifier
        id: String,

        /// Assignments as field=value
        #[arg(required = true, value_parser = args::parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Create a record
    Add {
        /// Assignments as field=value
        #[arg(required = true, value_parser = args::parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Delete a record
    Delete {
        /// Record identifier
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Per-environment dynamic analysis summary
    Dynamic {
        /// SHA-256 of the sample
        hash: String,

        /// Submission id
        #[arg(long)]
        sid: Option<String>,
    },

    /// Sample details with static analysis and antivirus results
    Sample {
        /// SHA-256 of the sample
        hash: String,

        /// Also show the dynamic analysis of this submission
        #[arg(long)]
        sid: Option<String>,
    },

    /// List sandbox environments
    Environments,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_grid_set() {
        let cli = Cli::try_parse_from([
            "portalop",
            "grid",
            "organizations",
            "set",
            "7",
            "abbreviation=CERT-EU",
            "is_sla=true",
        ])
        .unwrap();

        match cli.command {
            Commands::Grid {
                endpoint,
                action: RecordCommands::Set { id, fields },
            } => {
                assert_eq!(endpoint, "organizations");
                assert_eq!(id, "7");
                assert_eq!(fields[1], ("is_sla".to_string(), "true".to_string()));
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_assignment() {
        let result = Cli::try_parse_from(["portalop", "org", "add", "abbreviation"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_report_dynamic_with_sid() {
        let cli =
            Cli::try_parse_from(["portalop", "report", "dynamic", "abc", "--sid", "12"]).unwrap();

        match cli.command {
            Commands::Report(ReportCommands::Dynamic { hash, sid }) => {
                assert_eq!(hash, "abc");
                assert_eq!(sid.as_deref(), Some("12"));
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }
}
