use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Which lifecycle a run drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Provision workers and wait for them to register.
    Start,
    /// Terminate known instances and deregister their workers.
    Stop,
}

impl FromStr for Mode {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Mode::Start),
            "stop" => Ok(Mode::Stop),
            other => Err(ModelError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Start => "start",
            Mode::Stop => "stop",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitive() {
        assert_eq!("start".parse::<Mode>().unwrap(), Mode::Start);
        assert_eq!(" STOP ".parse::<Mode>().unwrap(), Mode::Stop);
    }

    #[test]
    fn rejects_unknown_mode() {
        for bad in ["", "restart", "st art"] {
            assert!(
                matches!(bad.parse::<Mode>(), Err(ModelError::UnknownMode(_))),
                "expected error for {bad:?}"
            );
        }
    }
}
