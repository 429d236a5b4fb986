//! GitHub Actions implementation of the registration service seam.
mod client;
pub use client::{GithubConfig, GithubRegistry};

mod error;
pub use error::ConfigError;

mod wire;
