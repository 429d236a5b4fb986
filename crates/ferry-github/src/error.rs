use reqwest::StatusCode;
use thiserror::Error;

use ferry_core::RegistrationError;

/// Invalid client settings, detected before any request is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("repository '{0}' must have the form owner/repo")]
    Repository(String),

    #[error("api token is empty")]
    MissingToken,

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Map a non-success response onto the registration error taxonomy.
///
/// GitHub signals an exhausted primary rate limit with `403` and
/// `x-ratelimit-remaining: 0`, secondary limits with `429`.
pub(crate) fn from_status(
    op: &'static str,
    status: StatusCode,
    rate_limit_exhausted: bool,
    body: String,
) -> RegistrationError {
    let message = truncate(body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => RegistrationError::RateLimited { op, message },
        StatusCode::FORBIDDEN if rate_limit_exhausted => {
            RegistrationError::RateLimited { op, message }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RegistrationError::Unauthorized { op, message }
        }
        StatusCode::NOT_FOUND => RegistrationError::NotFound { op },
        s if s.is_server_error() => RegistrationError::Unavailable { op, message },
        s => RegistrationError::Api {
            op,
            status: s.as_u16(),
            message,
        },
    }
}

pub(crate) fn from_transport(op: &'static str, err: reqwest::Error) -> RegistrationError {
    if err.is_decode() {
        RegistrationError::Decode {
            op,
            message: err.to_string(),
        }
    } else {
        RegistrationError::Unavailable {
            op,
            message: err.to_string(),
        }
    }
}

fn truncate(mut body: String) -> String {
    const MAX: usize = 256;
    if body.len() > MAX {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_onto_error_kinds() {
        let kind = |status, exhausted| from_status("op", status, exhausted, String::new()).kind();

        assert_eq!(kind(StatusCode::UNAUTHORIZED, false), "unauthorized");
        assert_eq!(kind(StatusCode::FORBIDDEN, false), "unauthorized");
        assert_eq!(kind(StatusCode::FORBIDDEN, true), "rate_limited");
        assert_eq!(kind(StatusCode::TOO_MANY_REQUESTS, false), "rate_limited");
        assert_eq!(kind(StatusCode::NOT_FOUND, false), "not_found");
        assert_eq!(kind(StatusCode::BAD_GATEWAY, false), "unavailable");
        assert_eq!(kind(StatusCode::UNPROCESSABLE_ENTITY, false), "api");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let err = from_status("op", StatusCode::BAD_REQUEST, false, "x".repeat(1000));
        match err {
            RegistrationError::Api { message, status, .. } => {
                assert_eq!(status, 400);
                assert!(message.len() < 300);
                assert!(message.ends_with("..."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
