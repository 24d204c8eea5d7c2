// src/core/mod.rs
mod aggregator;
mod engine;
mod extractor;
mod layout;
mod master;
mod resolver;
mod sink;

// Graph description ingestion
pub mod graph;

pub use graph::{Edge, Graph, GraphLoader, Node};
pub use resolver::NameResolver;
pub use extractor::{Category, CategoryResult, RelationshipExtractor, RelationshipSet};
pub use sink::{parse_listing, RelationshipSink};
pub use layout::{CategoryClassifier, Layout};
pub use aggregator::{Collected, CombineOutcome, DirectoryAggregator};
pub use master::{render_master, CategorySource, MasterAggregator, MasterOutcome, MasterResult};

// Export the main engine
pub use engine::{
    CombinedSummary, DirectoryReport, Engine, FileOutcome, MasterSummary, RunReport, SkippedFile,
};
