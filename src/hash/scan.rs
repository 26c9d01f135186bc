// Directory scanning module
// Depth-first traversal that hashes every eligible file as it is reached

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::vec;

use tracing::{debug, trace, warn};

use super::error::HashUtilityError;
use super::hash::{self, HashAlgorithm, HashResult};
use super::path_utils;
use super::wildcard::ExclusionSet;

// Re-export HashUtilityError as ScanError for scan call sites
pub type ScanError = HashUtilityError;

/// What a read error during traversal does to the rest of the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Warn and keep going
    #[default]
    Skip,
    /// Stop at the first error
    Abort,
}

/// Statistics collected during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files_hashed: usize,
    pub files_failed: usize,
    pub files_excluded: usize,
    pub dirs_excluded: usize,
    /// Directories that could not be listed, subtree lost
    pub dirs_failed: usize,
    /// Entries that were neither a file nor a directory when visited
    pub entries_skipped: usize,
    pub bytes_hashed: u64,
}

/// Engine for hashing every file below a root
#[derive(Debug, Clone, Default)]
pub struct ScanEngine {
    algorithm: HashAlgorithm,
    exclusions: ExclusionSet,
    error_policy: ErrorPolicy,
}

impl ScanEngine {
    /// Create a new ScanEngine for the given algorithm with no exclusions
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Lazily walk the tree below `root`, yielding one item per hashed or failed file
    ///
    /// The root itself goes through the same exclusion checks as any other entry.
    pub fn walk(&self, root: &Path) -> Walk<'_> {
        Walk {
            engine: self,
            root: Some(root.to_path_buf()),
            stack: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Hash the tree below `root` and write one `<digest> <path>` line per file
    ///
    /// Every line is flushed as soon as it is written. Read errors are handled
    /// according to the engine's error policy; a failure to write the output
    /// always stops the scan.
    pub fn scan<W: Write>(&self, root: &Path, out: &mut W) -> Result<ScanStats, ScanError> {
        debug!(
            root = %root.display(),
            algorithm = %self.algorithm,
            "Scanning"
        );

        let mut walk = self.walk(root);
        for item in walk.by_ref() {
            match item {
                Ok(result) => {
                    result
                        .write_line(out)
                        .and_then(|_| out.flush())
                        .map_err(|e| HashUtilityError::from_io_error(e, "writing output", None))?;
                }
                Err(e) => match self.error_policy {
                    ErrorPolicy::Skip => warn!("Skipping: {}", e.summary()),
                    ErrorPolicy::Abort => return Err(e),
                },
            }
        }

        let stats = walk.into_stats();
        debug!(
            files_hashed = stats.files_hashed,
            files_failed = stats.files_failed,
            files_excluded = stats.files_excluded,
            dirs_excluded = stats.dirs_excluded,
            dirs_failed = stats.dirs_failed,
            entries_skipped = stats.entries_skipped,
            bytes_hashed = stats.bytes_hashed,
            "Scan complete"
        );
        Ok(stats)
    }
}

/// Lazy depth-first traversal
///
/// Keeps one listing per level instead of recursing, so entries come out in
/// enumeration order with each directory's exclusion checked before anything
/// inside it is read. A listing is read in full when the walk descends and
/// its handle is closed right away, so depth is not bounded by open files.
pub struct Walk<'a> {
    engine: &'a ScanEngine,
    root: Option<PathBuf>,
    stack: Vec<(PathBuf, vec::IntoIter<io::Result<PathBuf>>)>,
    stats: ScanStats,
}

impl Walk<'_> {
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn into_stats(self) -> ScanStats {
        self.stats
    }

    /// Decide what to do with one path; returns an item only for files
    /// that were hashed or failed, and for unreadable directories
    fn visit(&mut self, path: PathBuf) -> Option<Result<HashResult, ScanError>> {
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                // dangling symlink or removed since it was listed
                trace!(path = %path.display(), error = %e, "Skipping unreachable entry");
                self.stats.entries_skipped += 1;
                return None;
            }
        };

        let engine = self.engine;
        let name = path_utils::basename(&path);
        let exclusions = &engine.exclusions;

        if metadata.is_file() {
            if let Some(pattern) = exclusions.excluded_file(name) {
                debug!(path = %path.display(), pattern = pattern.as_str(), "Excluded file");
                self.stats.files_excluded += 1;
                return None;
            }
            return Some(self.hash_file(path, metadata.len()));
        }

        if metadata.is_dir() {
            if let Some(pattern) = exclusions.excluded_dir(name) {
                debug!(path = %path.display(), pattern = pattern.as_str(), "Excluded directory");
                self.stats.dirs_excluded += 1;
                return None;
            }
            return match fs::read_dir(&path) {
                Ok(entries) => {
                    let entries: Vec<_> = entries.map(|e| e.map(|e| e.path())).collect();
                    trace!(
                        path = %path.display(),
                        depth = self.stack.len(),
                        entries = entries.len(),
                        "Descending"
                    );
                    self.stack.push((path, entries.into_iter()));
                    None
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    self.stats.entries_skipped += 1;
                    None
                }
                Err(e) => {
                    self.stats.dirs_failed += 1;
                    Some(Err(HashUtilityError::from_io_error(
                        e,
                        "reading directory",
                        Some(path),
                    )))
                }
            };
        }

        trace!(path = %path.display(), "Skipping special file");
        self.stats.entries_skipped += 1;
        None
    }

    fn hash_file(&mut self, path: PathBuf, len: u64) -> Result<HashResult, ScanError> {
        let algorithm = self.engine.algorithm;
        match hash::digest(&path, algorithm) {
            Ok(hash) => {
                self.stats.files_hashed += 1;
                self.stats.bytes_hashed += len;
                Ok(HashResult {
                    algorithm,
                    hash,
                    file_path: path,
                })
            }
            Err(e) => {
                self.stats.files_failed += 1;
                Err(e)
            }
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<HashResult, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            if let Some(item) = self.visit(root) {
                return Some(item);
            }
        }

        loop {
            let (dir, entries) = self.stack.last_mut()?;
            match entries.next() {
                None => {
                    self.stack.pop();
                }
                Some(Ok(path)) => {
                    if let Some(item) = self.visit(path) {
                        return Some(item);
                    }
                }
                Some(Err(e)) => {
                    let dir = dir.clone();
                    self.stats.dirs_failed += 1;
                    return Some(Err(HashUtilityError::from_io_error(
                        e,
                        "listing directory",
                        Some(dir),
                    )));
                }
            }
        }
    }
}
