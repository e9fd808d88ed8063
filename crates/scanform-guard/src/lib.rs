//! # scanform-guard
//!
//! Request hardening for the Scanform service: server-side sessions with
//! a signed cookie, a per-endpoint CSRF token guard, and a configurable
//! string sanitiser for submitted form values.

#![warn(missing_docs)]

pub mod csrf;
pub mod sanitise;
pub mod session;

pub use csrf::{CsrfGuardLayer, CsrfState, CsrfToken};
pub use sanitise::{sanitise_string, AllowItem, AllowSet, SanitiseOptions};
pub use session::{Session, SessionLayer, SessionStore};
