use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{doctype} {name} not found")]
    NotFound { doctype: String, name: String },
    #[error("{doctype} {name} already exists")]
    Duplicate { doctype: String, name: String },
    #[error("database error: {0}")]
    Db(String),
}
