//! Cross-crate building blocks: logging setup, runtime environment checks and
//! the small wire types shared by the HTTP surface.

pub mod types;
pub mod utils;
pub mod env;
