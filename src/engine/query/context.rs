use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{\s*filter\.([A-Za-z0-9_\-.]+)\s*\}\}$").unwrap());

/// Path of a `{{filter.<path>}}` placeholder, if `s` is one.
fn placeholder_path(s: &str) -> Option<&str> {
    PLACEHOLDER_REGEX
        .captures(s.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Looks up a dotted path in the dashboard filter value. Numeric segments
/// index into arrays.
pub fn lookup<'a>(dashboard: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(dashboard, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Replaces `{{filter.<path>}}` strings anywhere in `filter` with the
/// dashboard value at `<path>`. Unresolved placeholders are left as they are.
/// Returns a new value; `filter` is not modified.
pub fn inject_context(filter: &Value, dashboard: &Value) -> Value {
    match filter {
        Value::String(s) => match placeholder_path(s) {
            Some(path) => match lookup(dashboard, path) {
                Some(value) => value.clone(),
                None => {
                    debug!(target: "aggview::query", path, "Context placeholder left unresolved");
                    filter.clone()
                }
            },
            None => filter.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| inject_context(item, dashboard))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), inject_context(v, dashboard)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Turns the configured as-of value into the `at` argument.
///
/// RFC 3339 timestamps are normalized to UTC, bare dates become midnight UTC,
/// anything else is passed on as an opaque version token. A placeholder that
/// does not resolve to a string yields `None`.
pub fn resolve_as_of(raw: &str, dashboard: &Value) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let literal = match placeholder_path(raw) {
        Some(path) => match lookup(dashboard, path)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        },
        None => raw.to_string(),
    };
    if literal.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(&literal) {
        return Some(
            ts.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }
    if let Ok(date) = NaiveDate::parse_from_str(&literal, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(midnight.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    Some(literal)
}
