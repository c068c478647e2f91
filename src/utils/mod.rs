/// Logging setup.
pub mod telemetry;
/// TOML configuration and the reloadable config manager.
pub mod toml_config;
