pub mod analyzer;
pub mod cache;
pub mod cli;
pub mod config;
pub mod conflicts;
pub mod detector;
pub mod hosts;
pub mod normalizer;
pub mod parsers;
pub mod report;
pub mod resolver;

// Re-export core types for convenience
pub use scu_core::{
    ConflictRecord, DependencyCheck, DependencyRecord, LatestVersion, SourceKind, Staleness,
    TableRenderer, TableRow, VersionTriple,
};
