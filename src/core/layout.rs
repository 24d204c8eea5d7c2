use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::{ClassificationConfig, LayoutConfig};
use crate::error::{DotrelError, Result};
use super::extractor::Category;

/// Maps file and directory names to a category.
///
/// This is the only place the naming convention is interpreted; everything
/// downstream receives an explicit `Category`.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    markers: Vec<String>,
    inverted_dir: String,
    forward_dir: String,
}

impl CategoryClassifier {
    pub fn new(classification: &ClassificationConfig, layout: &LayoutConfig) -> Self {
        Self {
            markers: classification
                .inverted_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            inverted_dir: layout.inverted_dir.clone(),
            forward_dir: layout.forward_dir.clone(),
        }
    }

    /// Category of a configured category directory, `None` for any other path
    pub fn directory_category(&self, dir: &Path) -> Option<Category> {
        let name = dir.file_name()?.to_string_lossy();
        if name == self.inverted_dir.as_str() {
            Some(Category::Inverted)
        } else if name == self.forward_dir.as_str() {
            Some(Category::Forward)
        } else {
            None
        }
    }

    /// Classify by the final path component. Configured category directory
    /// names win over the inverted markers.
    pub fn classify(&self, path: &Path) -> Category {
        if let Some(category) = self.directory_category(path) {
            return category;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if self.markers.iter().any(|marker| name.contains(marker.as_str())) {
            Category::Inverted
        } else {
            Category::Forward
        }
    }
}

/// Where graph files are found and where listings are written
#[derive(Debug, Clone)]
pub struct Layout {
    config: LayoutConfig,
}

impl Layout {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Graph files belonging to `dir`, sorted by path.
    ///
    /// A `dot_files` subdirectory takes precedence: when present only its direct
    /// children are used, otherwise `dir` is searched recursively.
    pub fn find_dot_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(DotrelError::NotADirectory(dir.to_path_buf()));
        }

        let dot_files_dir = dir.join(&self.config.dot_files_dir);
        let walker = if dot_files_dir.is_dir() {
            WalkDir::new(&dot_files_dir).min_depth(1).max_depth(1)
        } else {
            WalkDir::new(dir).min_depth(1)
        };

        Ok(self.walk_files(walker, |path| self.is_dot_file(path)))
    }

    /// Per-file listings beneath `dir`, excluding combined and master listings
    pub fn find_artifacts(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(DotrelError::NotADirectory(dir.to_path_buf()));
        }

        Ok(self.walk_files(WalkDir::new(dir).min_depth(1), |path| self.is_artifact(path)))
    }

    fn walk_files(&self, walker: WalkDir, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walker.sort_by_file_name() {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && keep(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    warn!("Skipping unreadable entry {}: {}", path, e);
                }
            }
        }
        files
    }

    pub fn is_dot_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.config.dot_extension)
    }

    pub fn is_artifact(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        name.ends_with(&self.config.artifact_suffix)
            && name != self.config.combined_file
            && name != self.config.master_file
    }

    /// Directory that receives listings for `dir`: its parent when `dir` is the
    /// `dot_files` subdirectory, otherwise `dir` itself
    pub fn output_dir(&self, dir: &Path) -> PathBuf {
        let is_dot_files = dir
            .file_name()
            .is_some_and(|name| name == self.config.dot_files_dir.as_str());

        match dir.parent() {
            Some(parent) if is_dot_files => parent.to_path_buf(),
            _ => dir.to_path_buf(),
        }
    }

    /// Listing path for one graph file
    pub fn artifact_path(&self, dot_file: &Path) -> PathBuf {
        let dir = dot_file.parent().unwrap_or_else(|| Path::new(""));
        let stem = dot_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        self.output_dir(dir)
            .join(format!("{}{}", stem, self.config.artifact_suffix))
    }

    pub fn combined_path(&self, dir: &Path) -> PathBuf {
        self.output_dir(dir).join(&self.config.combined_file)
    }

    pub fn category_dir(&self, root: &Path, category: Category) -> PathBuf {
        match category {
            Category::Inverted => root.join(&self.config.inverted_dir),
            Category::Forward => root.join(&self.config.forward_dir),
        }
    }

    pub fn master_path(&self, root: &Path) -> PathBuf {
        if !self.config.master_in_parent {
            return root.join(&self.config.master_file);
        }

        match root.parent() {
            Some(parent) => parent.join(&self.config.master_file),
            None => root.join(&self.config.master_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn layout() -> Layout {
        Layout::new(&LayoutConfig::default())
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_classifier_uses_markers_case_insensitively() {
        let classifier =
            CategoryClassifier::new(&ClassificationConfig::default(), &LayoutConfig::default());
        assert_eq!(classifier.classify(Path::new("x/main_icgraph.dot")), Category::Inverted);
        assert_eq!(classifier.classify(Path::new("Callee_Caller_Graph")), Category::Inverted);
        assert_eq!(classifier.classify(Path::new("x/main_cgraph.dot")), Category::Forward);
        assert_eq!(classifier.classify(Path::new("callee_caller/main.dot")), Category::Forward);
    }

    #[test]
    fn test_classifier_honours_configured_category_dirs() {
        let layout = LayoutConfig {
            inverted_dir: "icg".to_string(),
            forward_dir: "cg_icgraph".to_string(),
            ..LayoutConfig::default()
        };
        let classifier = CategoryClassifier::new(&ClassificationConfig::default(), &layout);

        assert_eq!(classifier.classify(Path::new("graphs/icg")), Category::Inverted);
        assert_eq!(classifier.classify(Path::new("graphs/cg_icgraph")), Category::Forward);
        assert_eq!(classifier.directory_category(Path::new("graphs/other")), None);
        assert_eq!(classifier.classify(Path::new("graphs/icg/main.dot")), Category::Forward);
    }

    #[test]
    fn test_dot_files_subdirectory_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("stray.dot"));
        touch(&dir.path().join("dot_files/b_cgraph.dot"));
        touch(&dir.path().join("dot_files/a_cgraph.dot"));
        touch(&dir.path().join("dot_files/nested/deep.dot"));
        touch(&dir.path().join("dot_files/readme.txt"));

        let found = layout().find_dot_files(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("dot_files/a_cgraph.dot"),
                dir.path().join("dot_files/b_cgraph.dot"),
            ]
        );
    }

    #[test]
    fn test_recursive_search_without_dot_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("top.dot"));
        touch(&dir.path().join("sub/inner.dot"));
        touch(&dir.path().join("sub/inner.png"));

        let found = layout().find_dot_files(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&dir.path().join("sub/inner.dot")));
    }

    #[test]
    fn test_find_dot_files_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = layout().find_dot_files(&dir.path().join("missing"));
        assert!(matches!(result, Err(DotrelError::NotADirectory(_))));
    }

    #[test]
    fn test_artifact_placement_moves_out_of_dot_files() {
        let layout = layout();
        assert_eq!(
            layout.artifact_path(Path::new("g/callee_caller_graph/dot_files/f_icgraph.dot")),
            PathBuf::from("g/callee_caller_graph/f_icgraph_relationships.txt")
        );
        assert_eq!(
            layout.artifact_path(Path::new("g/loose/f_cgraph.dot")),
            PathBuf::from("g/loose/f_cgraph_relationships.txt")
        );
        assert_eq!(
            layout.combined_path(Path::new("g/caller_callee_graph/dot_files")),
            PathBuf::from("g/caller_callee_graph/all_function_relationships.txt")
        );
    }

    #[test]
    fn test_find_artifacts_skips_aggregate_listings() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a_relationships.txt"));
        touch(&dir.path().join("deep/b_relationships.txt"));
        touch(&dir.path().join("all_function_relationships.txt"));
        touch(&dir.path().join("master_function_relationships.txt"));
        touch(&dir.path().join("notes.txt"));

        let found = layout().find_artifacts(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("a_relationships.txt"),
                dir.path().join("deep/b_relationships.txt"),
            ]
        );
    }

    #[test]
    fn test_master_path() {
        let mut config = LayoutConfig::default();
        let root = Path::new("/work/graphs");
        assert_eq!(
            Layout::new(&config).master_path(root),
            PathBuf::from("/work/master_function_relationships.txt")
        );

        config.master_in_parent = false;
        assert_eq!(
            Layout::new(&config).master_path(root),
            PathBuf::from("/work/graphs/master_function_relationships.txt")
        );
    }
}
