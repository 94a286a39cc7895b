//! Storage primitives for the service layer
//!
//! Contains the JSON-file map that backs the file document store.

pub mod json_map_store;
