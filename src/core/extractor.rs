use std::collections::{BTreeSet, HashMap};
use std::fmt;
use serde::{Deserialize, Serialize};

use super::graph::Graph;
use super::resolver::NameResolver;

/// Directional interpretation of a graph's edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Call graph: edges point from caller to callee
    Forward,
    /// Caller graph: edges point from callee to caller
    Inverted,
}

impl Category {
    /// Format line written into listing headers
    pub fn format_descriptor(&self) -> &'static str {
        match self {
            Category::Forward => "caller -> callee",
            Category::Inverted => "callee -> caller",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Forward => f.write_str("forward"),
            Category::Inverted => f.write_str("inverted"),
        }
    }
}

/// Deduplicated relationship strings, always iterated in lexicographic order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipSet(BTreeSet<String>);

impl RelationshipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the relationship was already present
    pub fn insert(&mut self, relationship: impl Into<String>) -> bool {
        self.0.insert(relationship.into())
    }

    pub fn union_with(&mut self, other: RelationshipSet) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, relationship: &str) -> bool {
        self.0.contains(relationship)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RelationshipSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for RelationshipSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Relationships of one category, as produced by combining a category directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResult {
    pub category: Category,
    pub relationships: RelationshipSet,
}

/// Derives `caller -> callee` strings from graph edges
pub struct RelationshipExtractor {
    resolver: NameResolver,
}

impl RelationshipExtractor {
    pub fn new(resolver: NameResolver) -> Self {
        Self { resolver }
    }

    /// Resolve every declared node once
    pub fn name_map(&self, graph: &Graph) -> HashMap<String, String> {
        graph
            .nodes()
            .iter()
            .map(|node| (node.identifier.clone(), self.resolver.resolve(node)))
            .collect()
    }

    /// Build the relationship set for a graph under the given category.
    ///
    /// Endpoints without a node statement keep their raw identifier. Inverted
    /// graphs have each edge flipped so the string reads destination first.
    pub fn extract(&self, graph: &Graph, category: Category) -> RelationshipSet {
        let names = self.name_map(graph);
        let name_of = |id: &str| names.get(id).map(String::as_str).unwrap_or(id).to_string();

        graph
            .edges
            .iter()
            .map(|edge| {
                let source = name_of(&edge.source);
                let destination = name_of(&edge.destination);
                match category {
                    Category::Forward => format!("{} -> {}", source, destination),
                    Category::Inverted => format!("{} -> {}", destination, source),
                }
            })
            .collect()
    }
}

impl Default for RelationshipExtractor {
    fn default() -> Self {
        Self::new(NameResolver::new())
    }
}
