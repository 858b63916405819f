pub mod output;
pub mod types;
pub mod version;

// Re-export commonly used types at crate root
pub use output::{TableRenderer, TableRow};
pub use types::{
    ConflictOccurrence, ConflictRecord, DependencyCheck, DependencyRecord, LatestVersion,
    SourceKind, name_from_url,
};
pub use version::{NOT_AVAILABLE, NOT_CACHED, Staleness, VersionError, VersionTriple};
