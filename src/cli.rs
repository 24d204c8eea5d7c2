use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use anyhow::{bail, Result};

use crate::config::Config;
use crate::core::{Category, CombinedSummary, Engine, MasterSummary};

#[derive(Parser)]
#[command(name = "dotrel")]
#[command(about = "Turns call-graph DOT files into deduplicated function relationship listings")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the processing report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, combine and build the master listing for a project
    Run {
        /// Project root holding the category directories
        #[arg(short, long, env = "DOT_FILES_DIRECTORY", default_value = ".")]
        dir: PathBuf,
    },

    /// Write per-file listings for one directory and combine them
    Extract {
        /// Directory containing graph files
        dir: PathBuf,

        /// Category for every file (defaults to the naming convention)
        #[arg(long, value_enum)]
        category: Option<Category>,
    },

    /// Combine existing per-file listings of one directory
    Combine {
        /// Directory containing per-file listings
        dir: PathBuf,

        /// Category recorded in the header (defaults to the naming convention)
        #[arg(long, value_enum)]
        category: Option<Category>,
    },

    /// Build the master listing from the category directories
    Master {
        /// Project root holding the category directories
        #[arg(short, long, env = "DOT_FILES_DIRECTORY", default_value = ".")]
        dir: PathBuf,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination of the configuration file
        #[arg(short, long, default_value = "dotrel.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn execute(self, engine: Engine) -> Result<()> {
        let json = self.json;
        match self.command {
            Commands::Run { dir } => {
                let report = engine.run(&dir)?;
                if json {
                    print_json(&report)?;
                } else {
                    for directory in &report.directories {
                        println!(
                            "{}: {} processed, {} skipped",
                            directory.directory.display(),
                            directory.processed.len(),
                            directory.skipped.len()
                        );
                        for skipped in &directory.skipped {
                            println!("  skipped {}: {}", skipped.path.display(), skipped.cause);
                        }
                        if let Some(combined) = &directory.combined {
                            print_combined(combined);
                        }
                    }
                    if let Some(master) = &report.master {
                        print_master(master);
                    }
                    println!(
                        "Processed {} files, skipped {}",
                        report.files_processed(),
                        report.files_skipped()
                    );
                }
                if let Some(error) = report.master_error {
                    bail!("Master aggregation failed: {}", error);
                }
                Ok(())
            }
            Commands::Extract { dir, category } => {
                let report = engine.process_directory(&dir, category)?;
                if json {
                    print_json(&report)?;
                } else {
                    for file in &report.processed {
                        println!("{} -> {} ({} relationships)", file.source.display(), file.output_path.display(), file.relationships);
                    }
                    for skipped in &report.skipped {
                        println!("skipped {}: {}", skipped.path.display(), skipped.cause);
                    }
                    if let Some(combined) = &report.combined {
                        print_combined(combined);
                    }
                }
                Ok(())
            }
            Commands::Combine { dir, category } => {
                let outcome = engine.combine_directory(&dir, category)?;
                let summary = CombinedSummary::from(&outcome);
                if json {
                    print_json(&summary)?;
                } else {
                    print_combined(&summary);
                }
                Ok(())
            }
            Commands::Master { dir } => {
                let outcome = engine.build_master(&dir)?;
                let summary = MasterSummary::from(&outcome);
                if json {
                    print_json(&summary)?;
                } else {
                    print_master(&summary);
                }
                Ok(())
            }
            Commands::InitConfig { path, force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                Config::default().save(&path)?;
                println!("Wrote default configuration to {}", path.display());
                Ok(())
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_combined(combined: &CombinedSummary) {
    println!(
        "Combined {} listings into {} ({} unique {} relationships)",
        combined.listings_merged,
        combined.path.display(),
        combined.unique_relationships,
        combined.category
    );
}

fn print_master(master: &MasterSummary) {
    println!("Master listing: {}", master.path.display());
    println!("  callee -> caller: {}", master.inverted);
    println!("  caller -> callee: {}", master.forward);
    println!("  total:            {}", master.total);
}
