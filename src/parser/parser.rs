use chrono::Duration;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::error::AuthError;
use crate::config::sources::TtlUnit;
use crate::sources::FetchedToken;

/// Extract token and optional TTL from a login response body.
///
/// `token_pointer` and `ttl_pointer` are JSON pointers (`/idToken`, `/expires_in`).
/// The TTL may be a number or a numeric string, since Google's identity APIs
/// report `expiresIn` as a string.
pub fn parse_login_response(
    body: &str,
    token_pointer: &str,
    ttl_pointer: Option<&str>,
    ttl_unit: TtlUnit,
) -> Result<FetchedToken, AuthError> {
    let json: Value = serde_json::from_str(body).map_err(|e| {
        warn!("login response is not valid JSON: {}", e);
        AuthError::Authentication(format!("login response is not valid JSON: {}", e))
    })?;

    let value = json
        .pointer(token_pointer)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AuthError::Authentication(format!(
                "login response field '{}' not found or not a string",
                token_pointer
            ))
        })?
        .to_owned();

    let ttl = match ttl_pointer {
        None => None,
        Some(pointer) => Some(parse_ttl(&json, pointer, ttl_unit)?),
    };

    debug!(ttl = ?ttl, "login response parsed");
    Ok(FetchedToken { value, ttl })
}

fn parse_ttl(json: &Value, pointer: &str, unit: TtlUnit) -> Result<Duration, AuthError> {
    let raw = json.pointer(pointer).ok_or_else(|| {
        AuthError::Authentication(format!("login response field '{}' not found", pointer))
    })?;

    let amount = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .filter(|amount| *amount >= 0)
    .ok_or_else(|| {
        AuthError::Authentication(format!(
            "login response field '{}' is not a non-negative integer: {}",
            pointer, raw
        ))
    })?;

    match unit {
        TtlUnit::Seconds => Duration::try_seconds(amount),
        TtlUnit::Milliseconds => Duration::try_milliseconds(amount),
    }
    .ok_or_else(|| {
        AuthError::Authentication(format!(
            "login response field '{}' is out of range: {}",
            pointer, raw
        ))
    })
}
