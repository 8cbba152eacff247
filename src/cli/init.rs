//! Init command implementation

use colored::Colorize;
use dialoguer::{Input, Password, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::cli::ORGANIZATIONS;
use crate::client::{CollectionResource, PortalClient};
use crate::config::{Config, DEFAULT_API_HOST};
use crate::error::Result;

/// Run the init command
///
/// Prompts for the portal host and API key, checks them by listing the
/// organizations the key can see, and saves the config. Preferences of an
/// existing config are kept.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}", "Welcome to portalop!".bold().green());
    println!("Let's set up your portal configuration.\n");

    let mut config = Config::load_at(opts.config_ref()).unwrap_or_default();
    let theme = ColorfulTheme::default();

    let default_host = opts
        .api_host
        .clone()
        .or_else(|| config.api_host.clone())
        .unwrap_or_else(|| DEFAULT_API_HOST.to_string());
    let api_host: String = Input::with_theme(&theme)
        .with_prompt("Portal host")
        .default(default_host)
        .interact_text()?;

    let api_key: String = Password::with_theme(&theme)
        .with_prompt("Enter your portal API key")
        .interact()?;

    println!("\n{}", "Verifying API key...".cyan());
    let client = std::sync::Arc::new(PortalClient::new(&api_host, Some(api_key.clone()))?);
    let organizations = CollectionResource::new(client, ORGANIZATIONS).list().await?;
    println!(
        "{} Key accepted, {} organization(s) visible",
        "✓".green(),
        organizations.len()
    );

    config.api_key = Some(api_key);
    config.api_host = if api_host == DEFAULT_API_HOST {
        None
    } else {
        Some(api_host)
    };
    config.save_at(opts.config_ref())?;

    let config_path = Config::resolve_path(opts.config_ref())?;
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "portalop status".cyan());
    println!("  {} - List organizations", "portalop org list".cyan());

    Ok(())
}
