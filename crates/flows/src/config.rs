use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use dts_import::{MAPPING_CANDIDATES, TGA_TOTAL_LABELS, TRANSACTIONS_CANDIDATES};

/// Bounds for programs-per-agency in the drilldown.
pub const MIN_TOP_N: usize = 5;
pub const MAX_TOP_N: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Pipeline settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Folder searched for both input files.
    pub data_dir: PathBuf,
    /// Skips discovery for the transactions file when set.
    pub transactions_path: Option<PathBuf>,
    /// Skips discovery for the mapping file when set.
    pub mapping_path: Option<PathBuf>,
    pub transactions_candidates: Vec<String>,
    pub mapping_candidates: Vec<String>,
    pub tga_total_labels: Vec<String>,
    pub top_n: usize,
    pub include_unmapped: bool,
    pub unmapped_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            data_dir: PathBuf::from("data").join("raw"),
            transactions_path: None,
            mapping_path: None,
            transactions_candidates: owned(TRANSACTIONS_CANDIDATES),
            mapping_candidates: owned(MAPPING_CANDIDATES),
            tga_total_labels: owned(TGA_TOTAL_LABELS),
            top_n: 20,
            include_unmapped: true,
            unmapped_limit: 50,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// `top_n` clamped to the supported range.
    pub fn effective_top_n(&self) -> usize {
        clamp_top_n(self.top_n)
    }
}

pub fn clamp_top_n(n: usize) -> usize {
    n.clamp(MIN_TOP_N, MAX_TOP_N)
}
