// Hash Core Library
// Digest computation, exclusion matching and tree scanning

pub mod error;
pub mod hash;
pub mod path_utils;
pub mod scan;
pub mod wildcard;

// Re-export commonly used types for convenience
pub use error::HashUtilityError;
pub use hash::{digest, digest_bytes, digest_reader, HashAlgorithm, HashResult};
pub use path_utils::{PathKind, PathRequirement};
pub use scan::{ErrorPolicy, ScanEngine, ScanStats, Walk};
pub use wildcard::{BasenamePattern, ExclusionSet};
