//! Roster module: the users holding the designated role, and onboarding of new
//! ones.

pub mod domain;
pub mod service;

pub use service::RosterService;
