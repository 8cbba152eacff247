//! Command execution context
//!
//! Loads the config once, merges the global overrides into it, and builds
//! the shared API client the grid and report commands run on.

use std::sync::Arc;

use log::debug;

use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{CollectionResource, PortalClient};
use crate::config::Config;
use crate::error::{ConfigError, Error, Result};
use crate::grid::{CrudGridEngine, GridOptions};
use crate::output::notify::{Notifier, TerminalNotifier};
use crate::report::ReportAggregator;

/// Context for command execution containing config, client, and runtime options.
pub struct CommandContext {
    /// Config with command-line overrides applied
    pub config: Config,
    /// API client (Arc-wrapped for concurrent requests)
    pub client: Arc<PortalClient>,
    /// Resolved output format
    pub format: OutputFormat,
    /// Where operation outcomes are reported
    pub notifier: Arc<dyn Notifier>,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// A missing config file is fine when the API key comes from the
    /// command line or the environment.
    ///
    /// # Errors
    /// Returns error if the config cannot be read or no API key is available.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = match Config::load_at(opts.config_ref()) {
            Ok(config) => config,
            Err(Error::Config(ConfigError::NotFound)) if opts.api_key.is_some() => {
                Config::default()
            }
            Err(err) => return Err(err),
        };

        if let Some(host) = &opts.api_host {
            config.api_host = Some(host.clone());
        }
        if let Some(key) = &opts.api_key {
            config.api_key = Some(key.clone());
        }
        config.validate_auth()?;

        let format = resolve_format(opts.format, &config);
        debug!("Using API host {} with {:?} output", config.api_host(), format);

        let client = Arc::new(PortalClient::with_rate_limit(
            config.api_host(),
            config.api_key.clone(),
            config.preferences.requests_per_second,
        )?);

        Ok(Self {
            config,
            client,
            format,
            notifier: Arc::new(TerminalNotifier),
        })
    }

    /// Resource bound to `endpoint` on the shared client.
    pub fn resource(&self, endpoint: &str) -> CollectionResource<PortalClient> {
        CollectionResource::new(Arc::clone(&self.client), endpoint)
    }

    /// Grid engine for `endpoint`; `extra_exclude` adds to the configured
    /// exclusion set.
    pub fn grid(&self, endpoint: &str, extra_exclude: &[String]) -> CrudGridEngine<PortalClient> {
        let mut options = GridOptions {
            exclude_keys: self.config.preferences.exclude_keys.clone(),
            ..GridOptions::default()
        };
        options.exclude_keys.extend(extra_exclude.iter().cloned());

        CrudGridEngine::new(self.resource(endpoint), options, Arc::clone(&self.notifier))
    }

    pub fn aggregator(&self) -> ReportAggregator<PortalClient> {
        ReportAggregator::new(Arc::clone(&self.client), Arc::clone(&self.notifier))
            .max_concurrent(self.config.preferences.max_concurrent)
    }
}

/// Flag or environment first, then the config preference, then table.
fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
    flag.or_else(|| {
        config
            .preferences
            .format
            .as_deref()
            .and_then(|f| f.parse().ok())
    })
    .unwrap_or_default()
}
