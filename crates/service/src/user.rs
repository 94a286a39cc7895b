//! Read helpers over `User` records.

use serde_json::{json, Value};

use crate::record::{truthy, Record};

pub const USER_DOCTYPE: &str = "User";

/// Role names from the `roles` child rows (`[{"role": "..."}]`).
pub fn roles(user: &Record) -> Vec<String> {
    user.get("roles")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| match row {
                    Value::Object(o) => o.get("role").and_then(Value::as_str),
                    Value::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn has_role(user: &Record, role: &str) -> bool {
    roles(user).iter().any(|r| r == role)
}

/// Append a role row; returns false when the role was already present.
pub fn add_role(user: &mut Record, role: &str) -> bool {
    if has_role(user, role) {
        return false;
    }
    let mut rows = user.get("roles").and_then(Value::as_array).cloned().unwrap_or_default();
    rows.push(json!({ "role": role }));
    user.set("roles", Value::Array(rows));
    true
}

/// A user governed by a role profile must not get roles assigned directly.
pub fn has_role_profile(user: &Record) -> bool {
    let named = user.get_str("role_profile_name").map(|s| !s.trim().is_empty()).unwrap_or(false);
    let listed = user.get("role_profiles").and_then(Value::as_array).map(|a| !a.is_empty()).unwrap_or(false);
    named || listed
}

/// Users are enabled unless the flag is explicitly falsy.
pub fn is_enabled(user: &Record) -> bool {
    user.get("enabled").map(truthy).unwrap_or(true)
}
