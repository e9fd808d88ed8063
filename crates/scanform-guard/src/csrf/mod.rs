//! Session-backed CSRF protection.
//!
//! Tokens are issued per endpoint and stored in the session under
//! [`CSRF_SESSION_KEY`], keyed by endpoint name. A POST to a guarded
//! endpoint is checked only when a token was issued for it: rendering
//! the form arms the guard, and endpoints that never issue a token are
//! left alone. Each token is consumed by the first POST that arrives,
//! whether or not it validates, so a token never survives the attempt
//! it was spent on.

mod layer;
mod state;
mod token;

pub use layer::CsrfGuardLayer;
pub use state::CsrfState;
pub use token::CsrfToken;

/// Session key holding the per-endpoint token map.
pub const CSRF_SESSION_KEY: &str = "csrf_values";

/// Form field carrying the submitted token.
pub const CSRF_FORM_FIELD: &str = "csrf_form";
