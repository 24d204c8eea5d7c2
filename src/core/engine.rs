// src/core/engine.rs
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DotrelError, Result};
use super::{
    Category, CategoryClassifier, CombineOutcome, DirectoryAggregator, GraphLoader, Layout,
    MasterAggregator, MasterOutcome, RelationshipExtractor, RelationshipSink,
};

/// A graph file that was left out of the batch
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub cause: String,
}

/// What one processed graph file produced
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub output_path: PathBuf,
    pub category: Category,
    pub relationships: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinedSummary {
    pub path: PathBuf,
    pub category: Category,
    pub unique_relationships: usize,
    pub listings_merged: usize,
    pub listings_unreadable: usize,
}

impl From<&CombineOutcome> for CombinedSummary {
    fn from(outcome: &CombineOutcome) -> Self {
        Self {
            path: outcome.output_path.clone(),
            category: outcome.result.category,
            unique_relationships: outcome.result.relationships.len(),
            listings_merged: outcome.sources.len(),
            listings_unreadable: outcome.unreadable.len(),
        }
    }
}

/// Per-directory batch report
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub directory: PathBuf,
    /// `None` when each file was classified by its own name
    pub category: Option<Category>,
    pub processed: Vec<FileOutcome>,
    pub skipped: Vec<SkippedFile>,
    pub combined: Option<CombinedSummary>,
}

impl DirectoryReport {
    fn new(directory: &Path, category: Option<Category>) -> Self {
        Self {
            directory: directory.to_path_buf(),
            category,
            processed: Vec::new(),
            skipped: Vec::new(),
            combined: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MasterSummary {
    pub path: PathBuf,
    pub inverted: usize,
    pub forward: usize,
    pub total: usize,
    pub sources: Vec<String>,
}

impl From<&MasterOutcome> for MasterSummary {
    fn from(outcome: &MasterOutcome) -> Self {
        Self {
            path: outcome.output_path.clone(),
            inverted: outcome.result.inverted_count(),
            forward: outcome.result.forward_count(),
            total: outcome.result.total(),
            sources: outcome
                .sources
                .iter()
                .map(|(category, source)| format!("{}: {}", category, source.describe()))
                .collect(),
        }
    }
}

/// Report of a full pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub directories: Vec<DirectoryReport>,
    pub master: Option<MasterSummary>,
    /// Set when the master step could not produce a listing
    pub master_error: Option<String>,
}

impl RunReport {
    pub fn files_processed(&self) -> usize {
        self.directories.iter().map(|d| d.processed.len()).sum()
    }

    pub fn files_skipped(&self) -> usize {
        self.directories.iter().map(|d| d.skipped.len()).sum()
    }
}

/// Main orchestration engine: graph files in, relationship listings out
pub struct Engine {
    config: Config,
    layout: Layout,
    classifier: CategoryClassifier,
    loader: GraphLoader,
    extractor: RelationshipExtractor,
    sink: RelationshipSink,
    aggregator: DirectoryAggregator,
    master: MasterAggregator,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let layout = Layout::new(&config.layout);
        let classifier = CategoryClassifier::new(&config.classification, &config.layout);

        debug!("Loaded configuration: {:?}", config);

        Self {
            aggregator: DirectoryAggregator::new(layout.clone()),
            master: MasterAggregator::new(layout.clone()),
            loader: GraphLoader::new(),
            extractor: RelationshipExtractor::default(),
            sink: RelationshipSink::new(),
            classifier,
            layout,
            config,
        }
    }

    /// Create an engine from a config file, falling back to defaults
    pub fn from_config_path(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Category for `path`: the explicit one if given, else the naming convention
    fn category_for(&self, path: &Path, explicit: Option<Category>) -> Category {
        explicit.unwrap_or_else(|| self.classifier.classify(path))
    }

    /// Category shared by every file of `dir`: the explicit one, else the one
    /// named by a configured category directory
    fn directory_category(&self, dir: &Path, explicit: Option<Category>) -> Option<Category> {
        explicit.or_else(|| {
            self.classifier
                .directory_category(&self.layout.output_dir(dir))
        })
    }

    /// Load one graph file, extract its relationships and write its listing
    pub fn process_file(&self, dot_file: &Path, category: Category) -> Result<FileOutcome> {
        let graph = self.loader.load_file(dot_file)?;
        let relationships = self.extractor.extract(&graph, category);
        let output_path = self.layout.artifact_path(dot_file);

        self.sink
            .write(&output_path, &relationships, dot_file, category)?;

        info!(
            "Function relationships written to {} ({} relationships)",
            output_path.display(),
            relationships.len()
        );

        Ok(FileOutcome {
            source: dot_file.to_path_buf(),
            output_path,
            category,
            relationships: relationships.len(),
        })
    }

    /// Write per-file listings for every graph file in `dir`.
    ///
    /// A file that fails to load or write is logged and recorded as skipped; the
    /// rest of the batch continues.
    pub fn extract_directory(&self, dir: &Path, category: Option<Category>) -> Result<DirectoryReport> {
        let dot_files = self.layout.find_dot_files(dir)?;
        let category = self.directory_category(dir, category);
        let mut report = DirectoryReport::new(dir, category);

        info!("Found {} graph files in {}", dot_files.len(), dir.display());

        for dot_file in dot_files {
            let file_category = self.category_for(&dot_file, category);
            debug!("Processing {} as {}", dot_file.display(), file_category);

            match self.process_file(&dot_file, file_category) {
                Ok(outcome) => report.processed.push(outcome),
                Err(e) => {
                    warn!("Skipping {}: {}", dot_file.display(), e.cause());
                    report.skipped.push(SkippedFile {
                        path: dot_file,
                        cause: e.cause(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Combine the per-file listings of `dir` into its combined listing
    pub fn combine_directory(&self, dir: &Path, category: Option<Category>) -> Result<CombineOutcome> {
        let category = self.category_for(&self.layout.output_dir(dir), category);
        self.aggregator.combine(dir, category)
    }

    /// Extract every graph file in `dir`, then combine the results
    pub fn process_directory(&self, dir: &Path, category: Option<Category>) -> Result<DirectoryReport> {
        let mut report = self.extract_directory(dir, category)?;

        if report.processed.is_empty() && report.skipped.is_empty() {
            warn!("No graph files found in {}", dir.display());
            return Ok(report);
        }

        match self.combine_directory(dir, category) {
            Ok(outcome) => report.combined = Some(CombinedSummary::from(&outcome)),
            Err(e) => warn!("Could not combine {}: {}", dir.display(), e),
        }

        info!(
            "{}: {} files processed, {} skipped",
            dir.display(),
            report.processed.len(),
            report.skipped.len()
        );

        Ok(report)
    }

    /// Build the master listing for `root`, resolved to an absolute path so
    /// that `.` still places the master beside the project directory
    pub fn build_master(&self, root: &Path) -> Result<MasterOutcome> {
        let root = resolve_root(root)?;
        self.master.build_master(&root)
    }

    /// Run the whole pipeline under `root`.
    ///
    /// Each category directory present is processed with its own category. When
    /// neither exists, `root` itself is processed with per-file classification.
    /// A master failure is recorded in the report; listings already written stay.
    pub fn run(&self, root: &Path) -> Result<RunReport> {
        let root = &resolve_root(root)?;

        info!("Processing graph files in {}", root.display());

        let category_dirs: Vec<(Category, PathBuf)> = [Category::Inverted, Category::Forward]
            .into_iter()
            .map(|category| (category, self.layout.category_dir(root, category)))
            .filter(|(_, dir)| dir.is_dir())
            .collect();

        let mut directories = Vec::new();
        if category_dirs.is_empty() {
            debug!("No category directories, treating {} as a loose directory", root.display());
            directories.push(self.process_directory(root, None)?);
        } else {
            for (category, dir) in &category_dirs {
                match self.process_directory(dir, Some(*category)) {
                    Ok(report) => directories.push(report),
                    Err(e) => warn!("Skipping {}: {}", dir.display(), e),
                }
            }
        }

        let (master, master_error) = match self.build_master(root) {
            Ok(outcome) => (Some(MasterSummary::from(&outcome)), None),
            Err(e) => (None, Some(e.to_string())),
        };

        let report = RunReport {
            root: root.to_path_buf(),
            directories,
            master,
            master_error,
        };

        info!(
            "Processing complete: {} files processed, {} skipped",
            report.files_processed(),
            report.files_skipped()
        );

        Ok(report)
    }
}

/// Absolute, symlink-free form of an existing project root
fn resolve_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(DotrelError::NotADirectory(root.to_path_buf()));
    }
    root.canonicalize().map_err(|e| DotrelError::io(root, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CGRAPH: &str = r#"digraph "main"
{
  Node1 [label="main"];
  Node2 [label="parse\l(args)"];
  Node1 -> Node2;
}
"#;

    fn engine() -> Engine {
        Engine::new(Config::default())
    }

    #[test]
    fn test_process_file_writes_listing_next_to_graph() {
        let dir = tempfile::tempdir().unwrap();
        let dot = dir.path().join("main_cgraph.dot");
        fs::write(&dot, CGRAPH).unwrap();

        let outcome = engine().process_file(&dot, Category::Forward).unwrap();
        assert_eq!(outcome.output_path, dir.path().join("main_cgraph_relationships.txt"));
        assert_eq!(outcome.relationships, 1);

        let written = fs::read_to_string(&outcome.output_path).unwrap();
        assert!(written.ends_with("\n\nmain -> parse\n"));
    }

    #[test]
    fn test_loose_directory_classifies_per_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main_cgraph.dot"), CGRAPH).unwrap();
        fs::write(dir.path().join("main_icgraph.dot"), CGRAPH).unwrap();

        let report = engine().extract_directory(dir.path(), None).unwrap();
        let categories: Vec<_> = report.processed.iter().map(|f| f.category).collect();
        assert_eq!(categories, vec![Category::Forward, Category::Inverted]);

        let inverted = fs::read_to_string(dir.path().join("main_icgraph_relationships.txt")).unwrap();
        assert!(inverted.contains("# Format: callee -> caller\n\nparse -> main\n"));
    }

    #[test]
    fn test_explicit_category_overrides_file_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main_icgraph.dot"), CGRAPH).unwrap();

        let report = engine()
            .extract_directory(dir.path(), Some(Category::Forward))
            .unwrap();
        assert_eq!(report.processed[0].category, Category::Forward);
    }

    #[test]
    fn test_bad_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_cgraph.dot"), "this is not dot").unwrap();
        fs::write(dir.path().join("b_cgraph.dot"), CGRAPH).unwrap();

        let report = engine().process_directory(dir.path(), None).unwrap();
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, dir.path().join("a_cgraph.dot"));
        assert_eq!(report.combined.as_ref().unwrap().unique_relationships, 1);
    }

    #[test]
    fn test_run_without_category_dirs_reports_master_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main_cgraph.dot"), CGRAPH).unwrap();

        let report = engine().run(dir.path()).unwrap();
        assert_eq!(report.files_processed(), 1);
        assert!(report.master.is_none());
        assert!(report.master_error.as_deref().unwrap().contains("No category directories"));
        assert!(dir.path().join("main_cgraph_relationships.txt").exists());
        assert!(dir.path().join("all_function_relationships.txt").exists());
    }

    #[test]
    fn test_configured_category_dir_applies_without_explicit_category() {
        let dir = tempfile::tempdir().unwrap();
        let icg = dir.path().join("icg");
        fs::create_dir(&icg).unwrap();
        fs::write(icg.join("main.dot"), CGRAPH).unwrap();

        let mut config = Config::default();
        config.layout.inverted_dir = "icg".to_string();
        let engine = Engine::new(config);

        let report = engine.process_directory(&icg, None).unwrap();
        assert_eq!(report.category, Some(Category::Inverted));
        assert_eq!(report.processed[0].category, Category::Inverted);

        let combined = fs::read_to_string(icg.join("all_function_relationships.txt")).unwrap();
        assert!(combined.contains("# Format: callee -> caller\n\nparse -> main\n"));
    }

    #[test]
    fn test_run_resolves_relative_root_components() {
        let parent = tempfile::tempdir().unwrap();
        let base = parent.path().canonicalize().unwrap();
        let forward = base.join("graphs/caller_callee_graph");
        fs::create_dir_all(&forward).unwrap();
        fs::write(forward.join("main_cgraph.dot"), CGRAPH).unwrap();

        let report = engine().run(&forward.join("..")).unwrap();
        assert_eq!(report.root, base.join("graphs"));

        let master = report.master.unwrap();
        assert_eq!(master.path, base.join("master_function_relationships.txt"));
        let written = fs::read_to_string(&master.path).unwrap();
        assert!(written.starts_with("# MASTER FUNCTION RELATIONSHIP FILE\n# Generated on: graphs\n"));
    }

    #[test]
    fn test_run_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = engine().run(&dir.path().join("missing"));
        assert!(matches!(result, Err(DotrelError::NotADirectory(_))));
    }
}
