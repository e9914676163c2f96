use anyhow::{Context, Result};
use kickoff_model::AppConfig;
use std::path::Path;

/// Layer configuration: built-in defaults, then `kickoff.toml` (or the
/// explicit `--config` file, which must exist), then `KICKOFF__*` environment
/// variables such as `KICKOFF__SERVER__PORT=8080`.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name("kickoff").required(false),
    };

    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&AppConfig::default())?)
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("KICKOFF")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to load configuration")?;

    let config: AppConfig = settings
        .try_deserialize()
        .context("Invalid configuration")?;
    tracing::debug!(calendar = %config.calendar.path, team = %config.team.name, "Configuration loaded");
    Ok(config)
}
