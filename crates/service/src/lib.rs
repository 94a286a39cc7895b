//! Document operations and the user roster on top of a pluggable document store.
//! - `store` holds the capability trait and its JSON-file and Postgres backends.
//! - `documents` and `functions` expose the generic CRUD facade.
//! - `roster` lists and onboards users holding the designated role.

pub mod errors;
pub mod record;
pub mod user;
pub mod session;
pub mod storage;
pub mod store;
pub mod documents;
pub mod functions;
pub mod roster;
pub mod runtime;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
pub use record::{Fields, Record};
pub use session::{Session, SessionTokens};
pub use store::DocumentStore;
