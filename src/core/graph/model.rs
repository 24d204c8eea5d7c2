// src/core/graph/model.rs
use std::collections::HashMap;

/// A node statement from a graph document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Node identifier, quotes removed
    pub identifier: String,
    /// Raw `label` attribute, if the document gave one
    pub raw_label: Option<String>,
}

impl Node {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_label: None,
        }
    }

    pub fn with_label(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_label: Some(label.into()),
        }
    }
}

/// A directed reference between two node identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub destination: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// In-memory form of one graph document.
///
/// Nodes are unique by identifier and kept in declaration order. Only nodes that
/// have their own node statement are recorded; identifiers that appear solely in
/// edges stay dangling.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub name: Option<String>,
    pub directed: bool,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(name: Option<String>, directed: bool) -> Self {
        Self {
            name,
            directed,
            ..Self::default()
        }
    }

    /// Declare a node, merging with an earlier declaration of the same identifier.
    /// A later label replaces an earlier one; a missing label keeps the earlier one.
    pub fn declare_node(&mut self, identifier: &str, label: Option<String>) {
        match self.index.get(identifier) {
            Some(&i) => {
                if label.is_some() {
                    self.nodes[i].raw_label = label;
                }
            }
            None => {
                self.index.insert(identifier.to_string(), self.nodes.len());
                self.nodes.push(Node {
                    identifier: identifier.to_string(),
                    raw_label: label,
                });
            }
        }
    }

    pub fn add_edge(&mut self, source: &str, destination: &str) {
        self.edges.push(Edge::new(source, destination));
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, identifier: &str) -> Option<&Node> {
        self.index.get(identifier).map(|&i| &self.nodes[i])
    }
}
