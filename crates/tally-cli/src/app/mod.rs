//! Application-level utilities for the Tally CLI.
//!
//! This module provides:
//! - Path resolution for config and database files
//! - The per-invocation context handed to every command handler

mod context;
mod resolver;

pub use context::AppContext;
