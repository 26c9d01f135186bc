// Wildcard pattern matching module
// Shell-style basename matching for file and directory exclusions

use std::ffi::OsStr;

use glob::{MatchOptions, Pattern};

use super::error::HashUtilityError;

/// Shell-style matching: `*` crosses every character, dots included,
/// and case follows the platform convention.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: !cfg!(windows),
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled basename pattern
///
/// Supports:
/// - `*.tmp` - any name ending in .tmp
/// - `file?.bin` - file1.bin, fileA.bin, etc.
/// - `[abc]*` - names starting with a, b, or c
/// - `[!.]*` - names not starting with a dot
#[derive(Debug, Clone)]
pub struct BasenamePattern {
    source: String,
    pattern: Pattern,
}

impl BasenamePattern {
    pub fn new(source: &str) -> Result<Self, HashUtilityError> {
        let pattern = Pattern::new(&normalize(source)).map_err(|e| {
            HashUtilityError::InvalidArguments {
                message: format!("Invalid wildcard pattern '{}': {}", source, e),
            }
        })?;

        Ok(Self {
            source: source.to_string(),
            pattern,
        })
    }

    /// Whole-name match against a single basename
    pub fn matches(&self, name: &OsStr) -> bool {
        self.pattern.matches_with(&name.to_string_lossy(), MATCH_OPTIONS)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Ordered file and directory exclusion patterns
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    files: Vec<BasenamePattern>,
    dirs: Vec<BasenamePattern>,
}

impl ExclusionSet {
    /// Create an empty set that excludes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile both pattern lists, failing on the first invalid pattern
    pub fn from_patterns<F, D>(files: F, dirs: D) -> Result<Self, HashUtilityError>
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Ok(Self {
            files: compile(files)?,
            dirs: compile(dirs)?,
        })
    }

    pub fn from_compiled(files: Vec<BasenamePattern>, dirs: Vec<BasenamePattern>) -> Self {
        Self { files, dirs }
    }

    /// First file pattern matching the basename
    pub fn excluded_file(&self, name: &OsStr) -> Option<&BasenamePattern> {
        self.files.iter().find(|p| p.matches(name))
    }

    /// First directory pattern matching the basename
    pub fn excluded_dir(&self, name: &OsStr) -> Option<&BasenamePattern> {
        self.dirs.iter().find(|p| p.matches(name))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    pub fn file_patterns(&self) -> &[BasenamePattern] {
        &self.files
    }

    pub fn dir_patterns(&self) -> &[BasenamePattern] {
        &self.dirs
    }
}

fn compile<I>(patterns: I) -> Result<Vec<BasenamePattern>, HashUtilityError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| BasenamePattern::new(p.as_ref()))
        .collect()
}

/// Rewrite a shell pattern into the dialect glob accepts.
///
/// `**` means the same as `*` against a single name, but glob rejects it
/// outside a whole path component, so star runs collapse. A `[` with no
/// closing `]` matches itself, as in fnmatch, instead of being an error.
/// Character classes are copied untouched.
fn normalize(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 2);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                if !out.ends_with('*') {
                    out.push('*');
                }
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end + 1;
                }
                None => {
                    out.push_str("[[]");
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Index of the `]` closing the class opened at `start`, if any.
/// A `]` right after `[` or `[!` is a member, not the end.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars[j.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| j + offset)
}
