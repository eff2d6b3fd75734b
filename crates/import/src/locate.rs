use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filename fragments tried, in order, when looking for the deposits/withdrawals CSV.
pub const TRANSACTIONS_CANDIDATES: &[&str] =
    &["deposits", "withdrawals", "operating cash", "dwoc", "opcash"];

/// Filename fragments tried, in order, when looking for the category mapping CSV.
pub const MAPPING_CANDIDATES: &[&str] =
    &["category_map", "cat_map", "mapping", "rollup", "opcash_category_map"];

const CSV_EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum LocateError {
    #[error(
        "Could not locate {what} CSV under {}: {reason}. Looked for {candidates:?}. Found: {found:?}",
        dir.display()
    )]
    NotFound {
        what: String,
        dir: PathBuf,
        reason: &'static str,
        candidates: Vec<String>,
        found: Vec<String>,
    },
    #[error("IO error reading {}: {source}", dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Finds input files in a single folder by case-insensitive filename fragments.
#[derive(Debug, Clone)]
pub struct FileLocator {
    dir: PathBuf,
}

impl FileLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All `*.csv` files directly inside the folder, sorted by file name.
    /// A missing folder yields `Ok(None)`.
    fn csv_files(&self) -> Result<Option<Vec<PathBuf>>, LocateError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LocateError::Io {
                    dir: self.dir.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| LocateError::Io {
                    dir: self.dir.clone(),
                    source,
                })?
                .path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(CSV_EXTENSION));
            if is_csv && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(Some(files))
    }

    /// Returns the first file matching the earliest candidate that matches anything.
    ///
    /// Candidates are tried in priority order: a later candidate is only consulted
    /// once every file has failed the earlier ones.
    pub fn find_first<S: AsRef<str>>(
        &self,
        what: &str,
        candidates: &[S],
    ) -> Result<PathBuf, LocateError> {
        let not_found = |reason: &'static str, found: Vec<String>| LocateError::NotFound {
            what: what.to_string(),
            dir: self.dir.clone(),
            reason,
            candidates: candidates.iter().map(|c| c.as_ref().to_owned()).collect(),
            found,
        };

        let files = match self.csv_files()? {
            Some(files) => files,
            None => return Err(not_found("folder does not exist", Vec::new())),
        };
        if files.is_empty() {
            return Err(not_found("no CSV files in folder", Vec::new()));
        }

        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();

        for candidate in candidates {
            let candidate: &str = candidate.as_ref();
            let needle = candidate.to_lowercase();
            if let Some(i) = names.iter().position(|n| n.to_lowercase().contains(&needle)) {
                tracing::debug!("Matched '{candidate}' → {}", files[i].display());
                return Ok(files[i].clone());
            }
        }

        Err(not_found("no filename matched", names))
    }

    pub fn find_transactions_csv(&self) -> Result<PathBuf, LocateError> {
        self.find_first("deposits/withdrawals", TRANSACTIONS_CANDIDATES)
    }

    pub fn find_category_map_csv(&self) -> Result<PathBuf, LocateError> {
        self.find_first("category mapping", MAPPING_CANDIDATES)
    }
}
