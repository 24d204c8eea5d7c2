// src/core/graph/mod.rs
//! Graph description ingestion
//!
//! Reads Graphviz DOT documents (as emitted by Doxygen for per-function call
//! and caller graphs) into a small in-memory model of declared nodes and edges.

mod lexer;
mod loader;
mod model;

pub use lexer::SyntaxError;
pub use loader::{parse_dot, GraphLoader};
pub use model::{Edge, Graph, Node};
