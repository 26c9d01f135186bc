// Path utilities
// Basename extraction and validation of user-supplied paths

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use super::error::HashUtilityError;

/// The standard input/output marker
pub const DASH: &str = "-";

/// Final component of a path, as used for exclusion matching
///
/// `.` and `/` have no name and yield the empty string; a trailing `..`
/// yields `..`.
pub fn basename(path: &Path) -> &OsStr {
    match path.components().next_back() {
        Some(Component::Normal(name)) => name,
        Some(Component::ParentDir) => OsStr::new(".."),
        _ => OsStr::new(""),
    }
}

/// Write a path without lossy conversion
#[cfg(unix)]
pub fn write_path<W: Write + ?Sized>(out: &mut W, path: &Path) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    out.write_all(path.as_os_str().as_bytes())
}

/// Write a path without lossy conversion
#[cfg(not(unix))]
pub fn write_path<W: Write + ?Sized>(out: &mut W, path: &Path) -> io::Result<()> {
    write!(out, "{}", path.display())
}

/// Required existence of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    MustExist,
    MustNotExist,
    Either,
}

/// Required type of an existing path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Dir,
    Any,
}

/// Constraints checked against a command-line path argument
#[derive(Debug, Clone, Copy)]
pub struct PathRequirement {
    pub existence: Existence,
    pub kind: PathKind,
    pub dash_ok: bool,
}

impl PathRequirement {
    /// Any existing file or directory, `-` rejected
    pub const fn existing() -> Self {
        Self {
            existence: Existence::MustExist,
            kind: PathKind::Any,
            dash_ok: false,
        }
    }

    pub fn with_kind(mut self, kind: PathKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_existence(mut self, existence: Existence) -> Self {
        self.existence = existence;
        self
    }

    pub fn with_dash(mut self, dash_ok: bool) -> Self {
        self.dash_ok = dash_ok;
        self
    }

    /// Validate a raw argument and turn it into a path
    pub fn validate(&self, raw: &str) -> Result<PathBuf, HashUtilityError> {
        let path = PathBuf::from(raw);

        if raw == DASH {
            if !self.dash_ok {
                return Err(invalid(&path, "standard input/output (-) not allowed"));
            }
            if self.kind == PathKind::Dir {
                return Err(invalid(&path, "standard input/output (-) not allowed as directory path"));
            }
            return Ok(path);
        }

        // exists() follows symlinks, so a dangling link does not exist
        let exists = path.exists();
        match self.existence {
            Existence::MustExist if !exists => {
                return Err(HashUtilityError::FileNotFound { path });
            }
            Existence::MustNotExist if exists => {
                return Err(invalid(&path, "path exists"));
            }
            _ => {}
        }

        if exists {
            match self.kind {
                PathKind::File if !path.is_file() => return Err(invalid(&path, "path is not a file")),
                PathKind::Dir if !path.is_dir() => return Err(invalid(&path, "path is not a directory")),
                _ => {}
            }
        }

        Ok(path)
    }
}

fn invalid(path: &Path, reason: &str) -> HashUtilityError {
    HashUtilityError::InvalidPath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
