use super::CSRF_SESSION_KEY;
use crate::session::Session;
use serde_json::Value;

/// Outcome of checking a POST against the session token map.
///
/// [`begin`](CsrfState::begin) consumes the token stored for the
/// endpoint the moment the check starts. A pending state is then
/// settled with [`resolve`](CsrfState::resolve); the other states pass
/// straight through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsrfState {
    /// No token was issued for this endpoint, so there is nothing to
    /// enforce.
    Disabled,
    /// A token was issued and has now been consumed; the submitted
    /// value still has to be compared.
    TokenPending {
        /// The stored token, kept raw so damaged entries also reach
        /// the comparison and fail it.
        expected: Value,
    },
    /// The submitted value matched the stored token.
    Validated,
    /// The submitted value was missing or did not match.
    Rejected,
}

impl CsrfState {
    /// Start a check for `endpoint`, consuming its stored token.
    ///
    /// The token entry is removed before any comparison happens, so a
    /// token is spent even when the request it arrived with is
    /// rejected. Sessions without an entry for the endpoint are left
    /// untouched.
    pub fn begin(session: &Session, endpoint: &str) -> Self {
        let armed = session.read(|data| {
            data.get(CSRF_SESSION_KEY)
                .and_then(Value::as_object)
                .map(|values| values.contains_key(endpoint))
                .unwrap_or(false)
        });
        if !armed {
            return Self::Disabled;
        }

        let expected = session.update(|data| {
            data.get_mut(CSRF_SESSION_KEY)
                .and_then(Value::as_object_mut)
                .and_then(|values| values.remove(endpoint))
        });
        match expected {
            Some(expected) => Self::TokenPending { expected },
            None => Self::Disabled,
        }
    }

    /// Settle a pending check against the submitted form value.
    ///
    /// The submitted value is trimmed before comparison; the stored
    /// token is compared as-is. A stored entry that is not a string
    /// can never match.
    pub fn resolve(self, submitted: Option<&str>) -> Self {
        match self {
            Self::TokenPending { expected } => match (submitted, expected) {
                (Some(value), Value::String(token)) if value.trim() == token => Self::Validated,
                _ => Self::Rejected,
            },
            other => other,
        }
    }

    /// Whether the request may proceed to its handler.
    pub fn allows(&self) -> bool {
        matches!(self, Self::Disabled | Self::Validated)
    }
}
