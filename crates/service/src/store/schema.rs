//! Doctype schemas and permissions shared by every store backend.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use configs::{AppConfig, DocTypeConfig, RosterConfig};

use crate::errors::ServiceError;
use crate::record::{strip_reserved, Fields, Record};
use crate::session::{Session, SYSTEM_MANAGER};
use crate::user::USER_DOCTYPE;

pub const FILE_DOCTYPE: &str = "File";

const NOT_PERMITTED: &str = "Not permitted";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTypeSpec {
    pub name: String,
    pub required: Vec<String>,
    /// Empty: any signed-in user.
    pub read_roles: Vec<String>,
    /// Empty: any signed-in user.
    pub write_roles: Vec<String>,
}

impl DocTypeSpec {
    pub fn open(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: Vec::new(), read_roles: Vec::new(), write_roles: Vec::new() }
    }

    pub fn required<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.required = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn read_roles<I: IntoIterator<Item = S>, S: Into<String>>(mut self, roles: I) -> Self {
        self.read_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn write_roles<I: IntoIterator<Item = S>, S: Into<String>>(mut self, roles: I) -> Self {
        self.write_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    fn allows(roles: &[String], session: &Session) -> bool {
        if session.is_guest() {
            return false;
        }
        session.is_privileged() || roles.is_empty() || roles.iter().any(|r| session.has_role(r))
    }
}

impl From<&DocTypeConfig> for DocTypeSpec {
    fn from(c: &DocTypeConfig) -> Self {
        Self {
            name: c.name.clone(),
            required: c.required.clone(),
            read_roles: c.read_roles.clone(),
            write_roles: c.write_roles.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocTypeRegistry {
    specs: HashMap<String, DocTypeSpec>,
}

impl DocTypeRegistry {
    /// `User`, `File` and the roster profile doctype.
    pub fn builtin(roster: &RosterConfig) -> Self {
        let mut reg = Self::default();
        reg.register(DocTypeSpec::open(USER_DOCTYPE).read_roles([SYSTEM_MANAGER]).write_roles([SYSTEM_MANAGER]));
        reg.register(DocTypeSpec::open(FILE_DOCTYPE).required(["file_url"]));
        reg.register(
            DocTypeSpec::open(roster.profile_doctype.clone())
                .required(["user"])
                .read_roles([roster.designated_role.clone()])
                .write_roles([SYSTEM_MANAGER]),
        );
        reg
    }

    /// Built-ins plus `[[doctypes]]`; configured entries replace built-ins of the same name.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let mut reg = Self::builtin(&cfg.roster);
        for dt in &cfg.doctypes {
            reg.register(DocTypeSpec::from(dt));
        }
        reg
    }

    pub fn register(&mut self, spec: DocTypeSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn spec(&self, doctype: &str) -> Result<&DocTypeSpec, ServiceError> {
        self.specs
            .get(doctype)
            .ok_or_else(|| ServiceError::Validation(format!("DocType {} not found", doctype)))
    }

    pub fn can_read(&self, session: &Session, doctype: &str) -> Result<bool, ServiceError> {
        let spec = self.spec(doctype)?;
        Ok(DocTypeSpec::allows(&spec.read_roles, session))
    }

    pub fn check_read(&self, session: &Session, doctype: &str) -> Result<(), ServiceError> {
        if self.can_read(session, doctype)? {
            Ok(())
        } else {
            Err(ServiceError::permission(NOT_PERMITTED, format!("No permission to read {}", doctype)))
        }
    }

    pub fn check_write(&self, session: &Session, doctype: &str) -> Result<&DocTypeSpec, ServiceError> {
        let spec = self.spec(doctype)?;
        if DocTypeSpec::allows(&spec.write_roles, session) {
            Ok(spec)
        } else {
            Err(ServiceError::permission(NOT_PERMITTED, format!("Insufficient Permission for {}", doctype)))
        }
    }

    pub fn validate(&self, spec: &DocTypeSpec, fields: &Fields) -> Result<(), ServiceError> {
        let missing: Vec<&str> = spec
            .required
            .iter()
            .filter(|f| match fields.get(f.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(format!("{}: value missing for {}", spec.name, missing.join(", "))))
        }
    }

    /// Permission check, naming and validation for a new record.
    pub fn prepare_insert(&self, session: &Session, doctype: &str, mut fields: Fields) -> Result<Record, ServiceError> {
        let spec = self.check_write(session, doctype)?;
        let name = match fields.get("name") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => new_name(),
        };
        strip_reserved(&mut fields);
        self.validate(spec, &fields)?;
        let mut record = Record::new(doctype, name, fields);
        record.owner = session.user.clone();
        Ok(record)
    }

    /// Permission check and validation for an update; store-owned metadata comes from `existing`.
    pub fn prepare_save(&self, session: &Session, existing: &Record, incoming: Record) -> Result<Record, ServiceError> {
        let spec = self.check_write(session, &existing.doctype)?;
        let mut fields = incoming.fields;
        strip_reserved(&mut fields);
        self.validate(spec, &fields)?;
        Ok(Record {
            doctype: existing.doctype.clone(),
            name: existing.name.clone(),
            owner: existing.owner.clone(),
            creation: existing.creation,
            modified: Utc::now(),
            fields,
        })
    }
}

/// Random 10-character id for records inserted without a `name`.
fn new_name() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> DocTypeRegistry {
        let mut reg = DocTypeRegistry::builtin(&RosterConfig::default());
        reg.register(DocTypeSpec::open("Note").required(["title"]).write_roles(["Editor"]));
        reg
    }

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn unknown_doctype_is_validation_error() {
        let err = registry().spec("Nope").unwrap_err();
        assert_eq!(err, ServiceError::Validation("DocType Nope not found".into()));
    }

    #[test]
    fn guest_can_do_nothing() {
        let reg = registry();
        assert!(!reg.can_read(&Session::guest(), "File").unwrap());
        assert!(reg.check_write(&Session::guest(), "File").is_err());
    }

    #[test]
    fn write_roles_gate_inserts() {
        let reg = registry();
        let editor = Session::new("ed", ["Editor"]);
        let viewer = Session::new("vi", ["Viewer"]);
        assert!(reg.prepare_insert(&editor, "Note", fields(json!({"title": "t"}))).is_ok());
        let err = reg.prepare_insert(&viewer, "Note", fields(json!({"title": "t"}))).unwrap_err();
        assert!(matches!(err, ServiceError::Permission { .. }));
        assert!(reg.can_read(&viewer, "Note").unwrap());
    }

    #[test]
    fn roster_doctype_readable_with_designated_role_only() {
        let reg = registry();
        assert!(reg.can_read(&Session::new("a", ["Roster User"]), "Roster User").unwrap());
        assert!(!reg.can_read(&Session::new("b", ["Other"]), "Roster User").unwrap());
    }

    #[test]
    fn required_fields_enforced() {
        let reg = registry();
        let err = reg.prepare_insert(&Session::system(), "Note", fields(json!({"title": " "}))).unwrap_err();
        assert_eq!(err, ServiceError::Validation("Note: value missing for title".into()));
    }

    #[test]
    fn insert_uses_supplied_name_or_generates_one() {
        let reg = registry();
        let s = Session::system();
        let r = reg.prepare_insert(&s, "Note", fields(json!({"name": "n-1", "title": "t"}))).unwrap();
        assert_eq!(r.name, "n-1");
        assert_eq!(r.owner, "Administrator");
        assert!(r.get("name").is_none());
        let g = reg.prepare_insert(&s, "Note", fields(json!({"title": "t"}))).unwrap();
        assert_eq!(g.name.len(), 10);
    }

    #[test]
    fn configured_doctypes_extend_builtins() {
        let mut cfg = AppConfig::default();
        cfg.doctypes.push(DocTypeConfig { name: "Task".into(), required: vec!["subject".into()], ..Default::default() });
        let reg = DocTypeRegistry::from_config(&cfg);
        assert!(reg.spec("Task").is_ok());
        assert!(reg.spec("File").is_ok());
    }
}
