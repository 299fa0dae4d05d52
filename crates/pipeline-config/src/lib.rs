//! Configuration & Logging: a single environment-resolved snapshot consumed
//! by every other crate, plus the `tracing` bootstrap.

mod config;
mod error;
mod logging;
mod provider;

pub use config::Config;
pub use error::ConfigError;
pub use logging::init as init_logging;
pub use provider::{LogLevel, Provider};
