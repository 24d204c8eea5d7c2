use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{DotrelError, Result};
use super::aggregator::DirectoryAggregator;
use super::extractor::{Category, RelationshipSet};
use super::layout::Layout;
use super::sink::RelationshipSink;

const BANNER: &str = "# ==========================================================";

/// Where a category's relationships are taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySource {
    /// The combined listing left by a previous combine step
    Combined(PathBuf),
    /// No combined listing: union the per-file listings under this directory
    Rescan(PathBuf),
}

impl CategorySource {
    pub fn describe(&self) -> String {
        match self {
            CategorySource::Combined(path) => format!("combined listing {}", path.display()),
            CategorySource::Rescan(dir) => format!("rescan of {}", dir.display()),
        }
    }
}

/// Project-wide relationships split by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MasterResult {
    pub forward: RelationshipSet,
    pub inverted: RelationshipSet,
}

impl MasterResult {
    pub fn forward_count(&self) -> usize {
        self.forward.len()
    }

    pub fn inverted_count(&self) -> usize {
        self.inverted.len()
    }

    pub fn total(&self) -> usize {
        self.forward.len() + self.inverted.len()
    }
}

/// Result of a master build plus where it came from
#[derive(Debug, Clone)]
pub struct MasterOutcome {
    pub result: MasterResult,
    pub output_path: PathBuf,
    pub sources: Vec<(Category, CategorySource)>,
}

/// Builds the project-wide master listing from the two category directories
pub struct MasterAggregator {
    layout: Layout,
    aggregator: DirectoryAggregator,
    sink: RelationshipSink,
}

impl MasterAggregator {
    pub fn new(layout: Layout) -> Self {
        Self {
            aggregator: DirectoryAggregator::new(layout.clone()),
            layout,
            sink: RelationshipSink::new(),
        }
    }

    /// Pick the source for a category, or `None` when its directory is absent
    pub fn source_for(&self, root: &Path, category: Category) -> Option<CategorySource> {
        let dir = self.layout.category_dir(root, category);
        if !dir.is_dir() {
            return None;
        }

        let combined = self.layout.combined_path(&dir);
        if combined.is_file() {
            Some(CategorySource::Combined(combined))
        } else {
            Some(CategorySource::Rescan(dir))
        }
    }

    /// Load the relationships a source points at
    pub fn load(&self, source: &CategorySource) -> Result<RelationshipSet> {
        match source {
            CategorySource::Combined(path) => self.sink.read(path),
            CategorySource::Rescan(dir) => Ok(self.aggregator.collect(dir)?.relationships),
        }
    }

    /// Gather both categories under `root` and write the master listing.
    ///
    /// An unreadable combined listing falls back to a rescan of its directory.
    /// Fails only when neither category directory exists.
    pub fn build_master(&self, root: &Path) -> Result<MasterOutcome> {
        let mut result = MasterResult::default();
        let mut sources = Vec::new();

        for category in [Category::Inverted, Category::Forward] {
            let Some(source) = self.source_for(root, category) else {
                debug!("No {} category directory under {}", category, root.display());
                continue;
            };

            debug!("Reading {} relationships from {}", category, source.describe());
            let (source, relationships) = match self.load(&source) {
                Ok(relationships) => (source, relationships),
                Err(e) if matches!(source, CategorySource::Combined(_)) => {
                    warn!(
                        "Could not read {}: {}; rescanning per-file listings",
                        source.describe(),
                        e.cause()
                    );
                    let rescan = CategorySource::Rescan(self.layout.category_dir(root, category));
                    let relationships = self.load(&rescan)?;
                    (rescan, relationships)
                }
                Err(e) => return Err(e),
            };
            match category {
                Category::Inverted => result.inverted = relationships,
                Category::Forward => result.forward = relationships,
            }
            sources.push((category, source));
        }

        if sources.is_empty() {
            error!(
                "Neither {} nor {} exists under {}",
                self.layout.config().inverted_dir,
                self.layout.config().forward_dir,
                root.display()
            );
            return Err(DotrelError::NoCategoryDirectories {
                root: root.to_path_buf(),
            });
        }

        let output_path = self.layout.master_path(root);
        let content = render_master(&result, &directory_name(root));
        std::fs::write(&output_path, content).map_err(|e| DotrelError::io(&output_path, e))?;

        info!(
            "Master listing written to {} ({} inverted, {} forward)",
            output_path.display(),
            result.inverted_count(),
            result.forward_count()
        );

        Ok(MasterOutcome {
            result,
            output_path,
            sources,
        })
    }
}

/// Render the master listing: inverted section, forward section, statistics
pub fn render_master(result: &MasterResult, root_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# MASTER FUNCTION RELATIONSHIP FILE");
    let _ = writeln!(out, "# Generated on: {}\n", root_name);

    write_section(&mut out, "CALLEE -> CALLER RELATIONSHIPS", &result.inverted);
    out.push_str("\n\n");
    write_section(&mut out, "CALLER -> CALLEE RELATIONSHIPS", &result.forward);

    out.push_str("\n\n");
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "# STATISTICS");
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "# Total callee->caller relationships: {}", result.inverted_count());
    let _ = writeln!(out, "# Total caller->callee relationships: {}", result.forward_count());
    let _ = writeln!(out, "# Total relationships: {}", result.total());
    out
}

fn write_section(out: &mut String, title: &str, relationships: &RelationshipSet) {
    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "# {}", title);
    let _ = writeln!(out, "# Total: {}", relationships.len());
    let _ = writeln!(out, "{}\n", BANNER);
    for relationship in relationships.iter() {
        let _ = writeln!(out, "{}", relationship);
    }
}

fn directory_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string())
}
