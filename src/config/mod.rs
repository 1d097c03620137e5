// Configuration module entry point
// Loads application configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, EmptyListPolicy};

/// Prefix for environment overrides, e.g. `EMPLOYEES__SERVER__PORT=9000`
const ENV_PREFIX: &str = "EMPLOYEES";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from an in-memory TOML document layered over the defaults
    #[cfg(test)]
    pub fn from_toml_str(content: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 30)?
            .set_default("http.server_name", "employee-directory/0.1")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("directory.empty_list", "ok")?
            .set_default("directory.seed", "builtin")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
