//! Command-line surface: argument parsing and logging setup.

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use crate::hash::{
    BasenamePattern, ErrorPolicy, ExclusionSet, HashAlgorithm, PathRequirement, ScanEngine,
};

/// Recursively compute hashes for all files in a directory.
///
/// Prints one `<digest> <path>` line per file.
#[derive(Debug, Parser)]
#[command(name = "hashr", version, about)]
#[command(group(
    ArgGroup::new("hash")
        .args(["md5", "sha1", "sha256", "sha512", "algorithm_name"])
        .multiple(false)
))]
pub struct Cli {
    /// File or root directory to hash
    #[arg(value_name = "FILE_OR_ROOT_DIR", value_parser = parse_root)]
    pub root: PathBuf,

    /// Use MD5 (this is the default)
    #[arg(long)]
    pub md5: bool,

    /// Use SHA1
    #[arg(long)]
    pub sha1: bool,

    /// Use SHA256
    #[arg(long)]
    pub sha256: bool,

    /// Use SHA512
    #[arg(long)]
    pub sha512: bool,

    /// Select the algorithm by name (md5, sha1, sha256, sha512)
    #[arg(
        long = "algorithm",
        value_name = "NAME",
        hide = true,
        value_parser = parse_algorithm
    )]
    pub algorithm_name: Option<HashAlgorithm>,

    /// Files not to hash (Unix-style wildcards, matched against the file name)
    #[arg(
        long = "xf",
        value_name = "FILE",
        num_args = 1..,
        action = ArgAction::Append,
        value_parser = parse_pattern
    )]
    pub exclude_files: Vec<BasenamePattern>,

    /// Directories not to scan (Unix-style wildcards, matched against the directory name)
    #[arg(
        long = "xd",
        value_name = "DIR",
        num_args = 1..,
        action = ArgAction::Append,
        value_parser = parse_pattern
    )]
    pub exclude_dirs: Vec<BasenamePattern>,

    /// Stop at the first file that cannot be read instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Selected algorithm, MD5 when no flag is given
    pub fn algorithm(&self) -> HashAlgorithm {
        if let Some(algorithm) = self.algorithm_name {
            algorithm
        } else if self.sha1 {
            HashAlgorithm::Sha1
        } else if self.sha256 {
            HashAlgorithm::Sha256
        } else if self.sha512 {
            HashAlgorithm::Sha512
        } else {
            HashAlgorithm::Md5
        }
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        if self.strict {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::Skip
        }
    }

    /// Build the scan engine described by the arguments
    pub fn engine(&self) -> ScanEngine {
        let exclusions = ExclusionSet::from_compiled(
            self.exclude_files.clone(),
            self.exclude_dirs.clone(),
        );
        ScanEngine::new(self.algorithm())
            .with_exclusions(exclusions)
            .with_error_policy(self.error_policy())
    }
}

fn parse_root(raw: &str) -> Result<PathBuf, String> {
    PathRequirement::existing()
        .validate(raw)
        .map_err(|e| e.summary())
}

fn parse_algorithm(raw: &str) -> Result<HashAlgorithm, String> {
    raw.parse::<HashAlgorithm>().map_err(|e| e.summary())
}

fn parse_pattern(raw: &str) -> Result<BasenamePattern, String> {
    BasenamePattern::new(raw).map_err(|e| e.summary())
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the verbosity flag
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // try_init: a second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
