use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use crate::error::{DotrelError, Result};
use super::extractor::{Category, RelationshipSet};

/// Writes and reads relationship listings.
///
/// A listing is a block of `#` header lines, a blank line, then one
/// `caller -> callee` line per relationship in lexicographic order. Files are
/// always rewritten in full.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelationshipSink;

impl RelationshipSink {
    pub fn new() -> Self {
        Self
    }

    /// Render the listing for a single graph file
    pub fn render_file_listing(
        &self,
        relationships: &RelationshipSet,
        source_name: &str,
        category: Category,
    ) -> String {
        let header = [
            format!("# Function call relationships from {}", source_name),
            format!("# Total relationships: {}", relationships.len()),
            format!("# Format: {}", category.format_descriptor()),
        ];
        Self::render(&header, relationships)
    }

    /// Render the union listing for a whole directory
    pub fn render_combined_listing(
        &self,
        relationships: &RelationshipSet,
        dir_name: &str,
        category: Category,
    ) -> String {
        let header = [
            format!(
                "# Combined function call relationships from all dot files in {}",
                dir_name
            ),
            format!("# Total unique relationships: {}", relationships.len()),
            format!("# Format: {}", category.format_descriptor()),
        ];
        Self::render(&header, relationships)
    }

    fn render(header: &[String], relationships: &RelationshipSet) -> String {
        let mut out = String::new();
        for line in header {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');
        for relationship in relationships.iter() {
            let _ = writeln!(out, "{}", relationship);
        }
        out
    }

    /// Write a per-file listing; `source` is the graph file it came from
    pub fn write(
        &self,
        path: &Path,
        relationships: &RelationshipSet,
        source: &Path,
        category: Category,
    ) -> Result<()> {
        let source_name = file_name(source);
        let content = self.render_file_listing(relationships, &source_name, category);
        write_listing(path, &content)
    }

    /// Write a combined listing for the directory the file is placed in
    pub fn write_combined(
        &self,
        path: &Path,
        relationships: &RelationshipSet,
        category: Category,
    ) -> Result<()> {
        let dir_name = path.parent().map(file_name).unwrap_or_default();
        let content = self.render_combined_listing(relationships, &dir_name, category);
        write_listing(path, &content)
    }

    /// Read the relationship lines of any listing, ignoring headers and blanks
    pub fn read(&self, path: &Path) -> Result<RelationshipSet> {
        let content = std::fs::read_to_string(path).map_err(|e| DotrelError::io(path, e))?;
        Ok(parse_listing(&content))
    }
}

/// Relationship lines of a listing: everything that is neither blank nor a `#` comment
pub fn parse_listing(content: &str) -> RelationshipSet {
    content
        .lines()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
        .map(str::trim)
        .collect()
}

fn write_listing(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| DotrelError::io(path, e))?;
    debug!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
