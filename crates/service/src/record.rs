//! The unit the document store deals in: a named record of some doctype with an
//! open attribute map.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied attribute map.
pub type Fields = serde_json::Map<String, Value>;

/// Keys owned by the store; never kept inside [`Record::fields`].
pub const RESERVED_FIELDS: [&str; 5] = ["doctype", "name", "owner", "creation", "modified"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub doctype: String,
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default = "Utc::now")]
    pub creation: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn new(doctype: impl Into<String>, name: impl Into<String>, fields: Fields) -> Self {
        let now = Utc::now();
        let mut fields = fields;
        strip_reserved(&mut fields);
        Self { doctype: doctype.into(), name: name.into(), owner: String::new(), creation: now, modified: now, fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if !RESERVED_FIELDS.contains(&field.as_str()) {
            self.fields.insert(field, value);
        }
    }

    /// Overlay `incoming` onto the attribute map; store-owned keys are ignored.
    pub fn merge(&mut self, incoming: &Fields) {
        for (k, v) in incoming {
            self.set(k.clone(), v.clone());
        }
    }

    /// Value of a field for filtering and ordering, store-owned keys included.
    pub fn value_of(&self, field: &str) -> Value {
        match field {
            "doctype" => Value::String(self.doctype.clone()),
            "name" => Value::String(self.name.clone()),
            "owner" => Value::String(self.owner.clone()),
            "creation" => Value::String(self.creation.to_rfc3339()),
            "modified" => Value::String(self.modified.to_rfc3339()),
            other => self.fields.get(other).cloned().unwrap_or(Value::Null),
        }
    }

    /// Copy keeping only the listed attributes.
    pub fn project(&self, fields: &[String]) -> Record {
        let kept = self
            .fields
            .iter()
            .filter(|(k, _)| fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Record { fields: kept, ..self.clone() }
    }
}

pub fn strip_reserved(fields: &mut Fields) {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
}

/// Frappe-style truthiness for flag fields stored as `0/1`, booleans or strings.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Total order used for `order_by`: nulls first, then numbers, strings, everything else.
/// Strings compare case-insensitively, ties broken by byte order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()).then_with(|| x.cmp(y)),
        _ => match rank(a).cmp(&rank(b)) {
            Ordering::Equal => a.to_string().cmp(&b.to_string()),
            other => other,
        },
    }
}
