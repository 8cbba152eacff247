//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::Result;

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "portalop Configuration Status".bold());

    match Config::load_at(opts.config_ref()) {
        Ok(config) => {
            let config_path = Config::resolve_path(opts.config_ref())?;
            println!("Config file: {}", config_path.display().to_string().cyan());
            println!();

            if config.api_key.is_some() {
                println!("{} API key configured", "✓".green());
            } else if opts.api_key.is_some() {
                println!("{} API key from environment", "✓".green());
            } else {
                println!("{} API key not configured", "✗".red());
                println!("  → Run 'portalop init' to configure");
            }

            let host = opts.api_host_ref().unwrap_or(config.api_host());
            println!("{} API host: {}", "○".dimmed(), host.cyan());

            let prefs = &config.preferences;
            if let Some(ref format) = prefs.format {
                println!("{} Default format: {}", "○".dimmed(), format);
            }
            println!(
                "{} Hidden grid fields: {}",
                "○".dimmed(),
                prefs.exclude_keys.join(", ")
            );
            println!(
                "{} Rate limit: {} req/s, {} concurrent report fetches",
                "○".dimmed(),
                prefs.requests_per_second,
                prefs.max_concurrent
            );

            println!();
        }
        Err(_) => {
            println!("{} Configuration not found", "✗".red());
            println!();
            println!(
                "Run {} to create a configuration file.",
                "portalop init".cyan()
            );
            println!();
        }
    }

    Ok(())
}
