//! Logging setup for the ferry binary.
//!
//! Log lines go to stderr; stdout is reserved for run outputs.
mod config;
pub use config::LoggerConfig;

mod error;
pub use error::{LoggerError, LoggerResult};

mod format;
pub use format::LoggerFormat;

mod init;
pub use init::init_logger;

mod level;
pub use level::LoggerLevel;

mod timer;
pub use timer::UtcRfc3339;
