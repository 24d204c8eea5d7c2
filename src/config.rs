use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DotrelError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory layout and artifact naming
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Naming convention used to tell inverted graphs from forward ones
    #[serde(default)]
    pub classification: ClassificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Extension of graph description files (without the dot)
    pub dot_extension: String,

    /// Name of the subdirectory that holds raw graph files inside a category directory
    pub dot_files_dir: String,

    /// Suffix of per-file relationship listings
    pub artifact_suffix: String,

    /// Name of the combined listing written into each category directory
    pub combined_file: String,

    /// Name of the project-wide master listing
    pub master_file: String,

    /// Category directory holding inverted (callee -> caller) graphs
    pub inverted_dir: String,

    /// Category directory holding forward (caller -> callee) graphs
    pub forward_dir: String,

    /// Write the master listing next to the project root instead of inside it
    pub master_in_parent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Case-insensitive substrings that mark a file or directory name as inverted
    pub inverted_markers: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dot_extension: "dot".to_string(),
            dot_files_dir: "dot_files".to_string(),
            artifact_suffix: "_relationships.txt".to_string(),
            combined_file: "all_function_relationships.txt".to_string(),
            master_file: "master_function_relationships.txt".to_string(),
            inverted_dir: "callee_caller_graph".to_string(),
            forward_dir: "caller_callee_graph".to_string(),
            master_in_parent: true,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            inverted_markers: vec!["_icgraph".to_string(), "callee_caller".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            classification: ClassificationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DotrelError::io(path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| DotrelError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| DotrelError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| DotrelError::io(path, e))?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = ["Dotrel.toml", "dotrel.toml", ".dotrel.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}
