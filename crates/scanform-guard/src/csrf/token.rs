use super::CSRF_SESSION_KEY;
use crate::session::Session;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use serde_json::{Map, Value};
use std::fmt;

/// Length of a generated token in characters.
pub const TOKEN_LENGTH: usize = 32;

/// A CSRF token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generate a new random token of [`TOKEN_LENGTH`] characters.
    pub fn generate() -> Self {
        let token = OsRng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(token)
    }

    /// Generate a token for `endpoint` and store it in the session.
    ///
    /// Any token previously issued for the same endpoint is replaced,
    /// so re-rendering a form invalidates the copy already on screen.
    pub fn issue(session: &Session, endpoint: &str) -> Self {
        let token = Self::generate();
        let value = Value::String(token.0.clone());
        session.update(|data| {
            let values = data
                .entry(CSRF_SESSION_KEY)
                .or_insert_with(|| Value::Object(Map::new()));
            if !values.is_object() {
                *values = Value::Object(Map::new());
            }
            if let Some(values) = values.as_object_mut() {
                values.insert(endpoint.to_string(), value);
            }
        });
        token
    }

    /// Create a token from an existing string.
    pub fn new(token: String) -> Self {
        Self(token)
    }

    /// Get the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CsrfToken").field(&"***").finish()
    }
}

impl fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("test-session".to_string(), Map::new())
    }

    #[test]
    fn generated_tokens_are_alphanumeric_and_sized() {
        let token = CsrfToken::generate();
        assert_eq!(token.as_str().len(), TOKEN_LENGTH);
        assert!(token.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(CsrfToken::generate(), CsrfToken::generate());
    }

    #[test]
    fn issue_stores_the_token_under_the_endpoint() {
        let session = session();
        let token = CsrfToken::issue(&session, "scan");

        let stored = session
            .get_value(CSRF_SESSION_KEY)
            .and_then(|values| values.get("scan").cloned());
        assert_eq!(stored, Some(Value::String(token.as_str().to_string())));
        assert!(session.is_dirty());
    }

    #[test]
    fn issue_replaces_a_previous_token() {
        let session = session();
        let first = CsrfToken::issue(&session, "scan");
        let second = CsrfToken::issue(&session, "scan");
        assert_ne!(first, second);

        let stored = session
            .get_value(CSRF_SESSION_KEY)
            .and_then(|values| values.get("scan").cloned());
        assert_eq!(stored, Some(Value::String(second.as_str().to_string())));
    }

    #[test]
    fn issue_keeps_tokens_for_other_endpoints() {
        let session = session();
        let scan = CsrfToken::issue(&session, "scan");
        let other = CsrfToken::issue(&session, "other");

        let values = session.get_value(CSRF_SESSION_KEY).expect("token map");
        assert_eq!(values.get("scan"), Some(&Value::String(scan.to_string())));
        assert_eq!(values.get("other"), Some(&Value::String(other.to_string())));
    }

    #[test]
    fn issue_replaces_a_corrupted_token_map() {
        let session = session();
        session.insert(CSRF_SESSION_KEY, "not a map").unwrap();

        let token = CsrfToken::issue(&session, "scan");
        let stored = session
            .get_value(CSRF_SESSION_KEY)
            .and_then(|values| values.get("scan").cloned());
        assert_eq!(stored, Some(Value::String(token.to_string())));
    }

    #[test]
    fn debug_never_prints_the_token() {
        let token = CsrfToken::generate();
        let rendered = format!("{token:?}");
        assert_eq!(rendered, "CsrfToken(\"***\")");
        assert!(!rendered.contains(token.as_str()));
    }
}
