//! Scan records built from form submissions.

use scanform_guard::{sanitise_string, SanitiseOptions};
use scanform_http::FormData;
use serde_json::{json, Map, Value};

/// Session key the record list accumulates under.
pub const RECORDS_SESSION_KEY: &str = "records";

/// The scan form's fields with their typed defaults, in form order.
fn field_defaults() -> [(&'static str, Value); 19] {
    [
        ("p", json!("none")),
        ("sp", json!("none")),
        ("po", json!("*")),
        ("src", json!("*")),
        ("sbd", json!(".")),
        ("ruh", Value::Null),
        ("rua", Value::Null),
        ("ruf", Value::Null),
        ("ri", json!(86400)),
        ("rf", json!("json")),
        ("so", json!("passive")),
        ("pr", json!(0)),
        ("vf", Value::Null),
        ("alt", Value::Null),
        ("nbf", Value::Null),
        ("exp", Value::Null),
        ("inc", Value::Null),
        ("rqs", json!("no")),
        ("esa", Value::Null),
    ]
}

/// Sanitiser configuration for submitted field values.
///
/// Report addresses and policy values carry URL and list punctuation
/// the default set strips, so those characters are allowed here on top
/// of the defaults.
pub fn field_options() -> SanitiseOptions {
    SanitiseOptions {
        allow_underscore: true,
        allow_at_symbol: true,
        additional: vec!['.', ':', '/', '!', '*', '=', '+', ',', ';', '%'],
        ..SanitiseOptions::default()
    }
}

/// Build one record from a submitted form.
///
/// Each field takes the sanitised submitted value when the form
/// carries it, and the typed default otherwise. A non-empty submitted
/// `inc` collapses the record to that single field.
pub fn build_record(form: &FormData) -> Map<String, Value> {
    let options = field_options();
    let mut record = Map::new();
    for (name, default) in field_defaults() {
        let value = match form.get(name) {
            Some(raw) => Value::String(sanitise_string(raw, &options)),
            None => default,
        };
        record.insert(name.to_string(), value);
    }

    let collapse = matches!(record.get("inc"), Some(Value::String(inc)) if !inc.is_empty());
    if collapse {
        let mut collapsed = Map::new();
        if let Some(inc) = record.remove("inc") {
            collapsed.insert("inc".to_string(), inc);
        }
        return collapsed;
    }
    record
}
