use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub grid: GridConfig,
    pub schema: SchemaConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    pub page_size: usize,
    /// Page sizes offered by the pager
    pub page_sizes: Vec<usize>,
    /// Quiet period before a context filter change triggers a reload
    pub context_debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Maximum nesting depth expanded for object and list types
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("AGGVIEW_CONFIG").unwrap_or_else(|_| "config".to_string());
    load_settings_from(&config_path)
}

/// Builds settings from the built-in defaults, an optional file at `path`
/// (extension resolved by the `config` crate) and `AGGVIEW__*` variables.
pub fn load_settings_from(path: &str) -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .set_default("grid.page_size", 10)?
        .set_default("grid.page_sizes", vec![10, 20, 50])?
        .set_default("grid.context_debounce_ms", 500)?
        .set_default("schema.max_depth", 8)?
        .set_default("backend.endpoint", "http://127.0.0.1:3000/graphql")?
        .set_default("backend.timeout_ms", 15_000)?
        .set_default("logging.log_dir", "logs")?
        .set_default("logging.stdout_level", "info")?
        .set_default("logging.file_level", "debug")?
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix("AGGVIEW").separator("__"))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
