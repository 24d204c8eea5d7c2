//! Converts Graphviz call/caller graphs into deduplicated function
//! relationship listings and aggregates them per directory and per project.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub use error::{DotrelError, Result};
