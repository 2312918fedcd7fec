//! Configuration module.
//!
//! Supports JSON configuration files, environment variable overrides,
//! and sensible compiled-in defaults.
//!
//! # Module Structure
//!
//! - [`server`]: Server behavior (CORS, cleanup cadence, buffers, room log)
//! - [`game`]: Game limits (name lengths, round-second bounds, room codes)
//! - [`logging`]: Logging configuration
//! - [`crate::config::loader`]: Configuration loading functions
//! - [`crate::config::validation`]: Configuration validation
//! - [`crate::config::defaults`]: Default value functions

pub mod defaults;
pub mod game;
pub mod loader;
pub mod logging;
pub mod server;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use game::GameLimitsConfig;
pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use server::ServerConfig;
pub use validation::validate;

use defaults::default_port;

/// Root configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// TCP port the server binds on
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameLimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            server: ServerConfig::default(),
            game: GameLimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
