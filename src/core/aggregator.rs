use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use super::extractor::{Category, CategoryResult, RelationshipSet};
use super::layout::Layout;
use super::sink::RelationshipSink;

/// Outcome of combining one directory
#[derive(Debug, Clone)]
pub struct CombineOutcome {
    pub result: CategoryResult,
    /// Where the combined listing was written
    pub output_path: PathBuf,
    /// Per-file listings that were merged
    pub sources: Vec<PathBuf>,
    /// Per-file listings that could not be read
    pub unreadable: Vec<PathBuf>,
}

/// Per-file listings found beneath a directory and their union
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub relationships: RelationshipSet,
    pub sources: Vec<PathBuf>,
    pub unreadable: Vec<PathBuf>,
}

/// Unions the per-file listings of one category directory
pub struct DirectoryAggregator {
    layout: Layout,
    sink: RelationshipSink,
}

impl DirectoryAggregator {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            sink: RelationshipSink::new(),
        }
    }

    /// Union of every per-file listing beneath `dir`; unreadable listings are
    /// logged and left out
    pub fn collect(&self, dir: &Path) -> Result<Collected> {
        let mut collected = Collected::default();

        for artifact in self.layout.find_artifacts(dir)? {
            match self.sink.read(&artifact) {
                Ok(set) => {
                    collected.relationships.union_with(set);
                    collected.sources.push(artifact);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", artifact.display(), e.cause());
                    collected.unreadable.push(artifact);
                }
            }
        }

        Ok(collected)
    }

    /// Combine the listings of `dir` and write the combined listing.
    ///
    /// The category only labels the output; relationship strings are taken as
    /// they were written.
    pub fn combine(&self, dir: &Path, category: Category) -> Result<CombineOutcome> {
        let output_dir = self.layout.output_dir(dir);
        let Collected {
            relationships,
            sources,
            unreadable,
        } = self.collect(&output_dir)?;

        let output_path = self.layout.combined_path(dir);
        self.sink
            .write_combined(&output_path, &relationships, category)?;

        info!(
            "Combined {} listings into {} ({} unique relationships)",
            sources.len(),
            output_path.display(),
            relationships.len()
        );

        Ok(CombineOutcome {
            result: CategoryResult {
                category,
                relationships,
            },
            output_path,
            sources,
            unreadable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use std::fs;

    fn aggregator() -> DirectoryAggregator {
        DirectoryAggregator::new(Layout::new(&LayoutConfig::default()))
    }

    fn listing(lines: &[&str]) -> String {
        let mut out = String::from("# Function call relationships from x.dot\n# Total relationships: 0\n# Format: caller -> callee\n\n");
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_duplicate_lines_across_files_count_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_relationships.txt"), listing(&["x -> y"])).unwrap();
        fs::write(dir.path().join("b_relationships.txt"), listing(&["x -> y"])).unwrap();

        let outcome = aggregator().combine(dir.path(), Category::Forward).unwrap();
        assert_eq!(outcome.result.relationships.len(), 1);
        assert_eq!(outcome.sources.len(), 2);

        let written = fs::read_to_string(&outcome.output_path).unwrap();
        assert!(written.contains("# Total unique relationships: 1\n"));
    }

    #[test]
    fn test_combine_is_exact_union_and_ignores_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_relationships.txt"), listing(&["a -> b", "b -> c"])).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c_relationships.txt"), listing(&["c -> d"])).unwrap();
        fs::write(dir.path().join("all_function_relationships.txt"), listing(&["stale -> entry"])).unwrap();

        let outcome = aggregator().combine(dir.path(), Category::Inverted).unwrap();
        let lines: Vec<_> = outcome.result.relationships.iter().collect();
        assert_eq!(lines, vec!["a -> b", "b -> c", "c -> d"]);
        assert_eq!(outcome.result.category, Category::Inverted);

        let written = fs::read_to_string(&outcome.output_path).unwrap();
        assert!(written.contains("# Format: callee -> caller\n"));
        assert!(!written.contains("stale"));
    }

    #[test]
    fn test_dot_files_dir_combines_into_parent() {
        let dir = tempfile::tempdir().unwrap();
        let category_dir = dir.path().join("caller_callee_graph");
        fs::create_dir_all(category_dir.join("dot_files")).unwrap();
        fs::write(category_dir.join("f_relationships.txt"), listing(&["f -> g"])).unwrap();

        let outcome = aggregator()
            .combine(&category_dir.join("dot_files"), Category::Forward)
            .unwrap();
        assert_eq!(outcome.output_path, category_dir.join("all_function_relationships.txt"));
        assert!(outcome.result.relationships.contains("f -> g"));

        let written = fs::read_to_string(&outcome.output_path).unwrap();
        assert!(written.starts_with(
            "# Combined function call relationships from all dot files in caller_callee_graph\n"
        ));
    }

    #[test]
    fn test_empty_directory_writes_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = aggregator().combine(dir.path(), Category::Forward).unwrap();
        assert!(outcome.result.relationships.is_empty());
        assert!(outcome.output_path.exists());
    }
}
