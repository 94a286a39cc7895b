use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{truthy, Record};

/// Fields projected for each roster entry.
pub const ROSTER_FIELDS: [&str; 5] = ["full_name", "user_image", "name", "first_name", "enabled"];

/// One row of the roster listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub full_name: Option<String>,
    pub user_image: Option<String>,
    pub first_name: Option<String>,
    pub enabled: bool,
}

impl From<&Record> for RosterEntry {
    fn from(r: &Record) -> Self {
        let text = |f: &str| r.get_str(f).map(str::to_string);
        Self {
            name: r.name.clone(),
            full_name: text("full_name"),
            user_image: text("user_image"),
            first_name: text("first_name"),
            enabled: r.get("enabled").map(truthy).unwrap_or(false),
        }
    }
}

/// Outcome of an onboarding batch; both lists hold `User` records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OnboardOutcome {
    pub success_users: Vec<Record>,
    pub failed_users: Vec<Record>,
}

/// Users to onboard as they arrive over HTTP: a list, or a JSON-encoded list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UsersParam {
    List(Vec<String>),
    Encoded(String),
}

impl UsersParam {
    pub fn into_list(self) -> Result<Vec<String>, serde_json::Error> {
        match self {
            UsersParam::List(v) => Ok(v),
            UsersParam::Encoded(s) => serde_json::from_str::<Vec<String>>(&s),
        }
    }
}

/// Text used when the designated role or the roster profile is missing.
pub fn missing_role_message(role: &str) -> String {
    format!("You do not have a {role} role. Please contact your administrator to add your user profile as a {role}.")
}

pub fn missing_profile_message(role: &str) -> String {
    format!("You do not have a {role} profile. Please contact your administrator to add your user profile as a {role}.")
}

/// Roster profile attributes mirrored from a `User` record.
pub fn profile_fields(user: &Record) -> serde_json::Map<String, Value> {
    let mut f = serde_json::Map::new();
    f.insert("name".into(), Value::String(user.name.clone()));
    f.insert("user".into(), Value::String(user.name.clone()));
    for key in ["full_name", "first_name", "user_image"] {
        f.insert(key.into(), user.get(key).cloned().unwrap_or(Value::Null));
    }
    f.insert("enabled".into(), Value::from(1));
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn users_param_accepts_list_or_encoded_list() {
        let p: UsersParam = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(p.into_list().unwrap(), vec!["a", "b"]);
        let p: UsersParam = serde_json::from_value(json!("[\"c\"]")).unwrap();
        assert_eq!(p.into_list().unwrap(), vec!["c"]);
        let p: UsersParam = serde_json::from_value(json!("not json")).unwrap();
        assert!(p.into_list().is_err());
    }

    #[test]
    fn roster_entry_from_record() {
        let f = json!({"full_name": "Jane Doe", "first_name": "Jane", "enabled": 1}).as_object().cloned().unwrap();
        let e = RosterEntry::from(&Record::new("Roster User", "jane@example.com", f));
        assert_eq!(e.name, "jane@example.com");
        assert_eq!(e.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(e.user_image, None);
        assert!(e.enabled);
    }
}
