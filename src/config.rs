//! Configuration loader and schema types.
//!
//! This module exposes the settings that drive the engine, the library
//! scan, the session adapter and logging, plus helpers to load them from
//! disk and the environment.

mod load;
mod schema;

pub use schema::*;
