//! Authenticated identity of the current storefront user.
//!
//! SYSTEM CONTEXT
//! ==============
//! A [`Session`] is owned by the store and rebuilt from durable storage on
//! startup. Logged-out sessions carry no identity at all; logged-in sessions
//! always carry an integer role.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde_json::Value;

use crate::util::storage::{AUTH_TOKEN_KEY, Storage, USER_EMAIL_KEY, USER_NAME_KEY, USER_ROLE_KEY};

pub const ROLE_ADMIN: i64 = 1;
pub const ROLE_MANAGER: i64 = 2;
pub const ROLE_USER: i64 = 3;

/// Errors from coercing a wire or stored role value to an integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("role is not numeric: {0}")]
    NotNumeric(String),

    #[error("role is not a finite integer: {0}")]
    NotInteger(String),
}

/// Coerce a JSON role value to an integer id.
///
/// Accepts integers, integral floats, and strings that trim to an integer.
///
/// # Errors
///
/// Returns an error for booleans, null, arrays, objects, non-numeric strings,
/// and fractional or out-of-range numbers.
pub fn coerce_role(value: &Value) -> Result<i64, RoleError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            let f = n.as_f64().unwrap_or(f64::NAN);
            float_to_role(f).ok_or_else(|| RoleError::NotInteger(n.to_string()))
        }
        Value::String(s) => coerce_role_str(s),
        other => Err(RoleError::NotNumeric(other.to_string())),
    }
}

/// Coerce a stored role string to an integer id.
///
/// # Errors
///
/// Returns an error when the string is not an integer.
pub fn coerce_role_str(raw: &str) -> Result<i64, RoleError> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) => float_to_role(f).ok_or_else(|| RoleError::NotInteger(raw.to_owned())),
        Err(_) => Err(RoleError::NotNumeric(raw.to_owned())),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_role(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then(|| f as i64)
}

/// Identity held by the store. The bearer token is not part of it: the token
/// lives only in durable storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub logged_in: bool,
    pub name: String,
    pub email: String,
    pub role: Option<i64>,
}

impl Session {
    /// The logged-out session.
    #[must_use]
    pub fn logged_out() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn logged_in(name: String, email: String, role: i64) -> Self {
        Self { logged_in: true, name, email, role: Some(role) }
    }

    /// Rebuild a session from durable storage.
    ///
    /// Best-effort: the stored token is not verified with the server. A
    /// present token with a missing or malformed role is a corrupt record;
    /// it yields `Err` so the caller can discard it.
    ///
    /// # Errors
    ///
    /// Returns an error when a token is stored but the role cannot be coerced.
    pub fn rehydrate(storage: &dyn Storage) -> Result<Self, RoleError> {
        if !storage.contains(AUTH_TOKEN_KEY) {
            return Ok(Self::logged_out());
        }
        let raw_role = storage.get(USER_ROLE_KEY).unwrap_or_default();
        let role = coerce_role_str(&raw_role)?;
        Ok(Self::logged_in(
            storage.get(USER_NAME_KEY).unwrap_or_default(),
            storage.get(USER_EMAIL_KEY).unwrap_or_default(),
            role,
        ))
    }

    #[must_use]
    pub fn has_role(&self, role: i64) -> bool {
        self.logged_in && self.role == Some(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.has_role(ROLE_MANAGER)
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.has_role(ROLE_USER)
    }
}
