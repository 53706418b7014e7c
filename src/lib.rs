//! Tankobon - Chapter Archive to Volume Directory Packing Library
//!
//! This crate provides an asynchronous, declarative API for organizing a
//! directory of loosely-named manga chapter archives (`.cbz`) into
//! per-volume directories with normalized, sortable naming.
//!
//! The pipeline: a naming pattern parses heterogeneous filename conventions
//! into canonical chapter identities (including decimal "extra" chapters), a
//! range resolver turns a chapter-range or batch expression into a concrete
//! gap-checked chapter list, and a bounded worker pool validates, moves, and
//! extracts each matched archive into its `"<series> v<NN>/Chapter NNN"`
//! destination.
//!
//! # Getting Started
//!
//! Configure a run via the `TankobonConfig` builder, then pack a single
//! volume or a batch:
//!
//! ```rust,no_run
//! use tankobon::prelude::*;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> tankobon::error::Result<()> {
//!     let config = TankobonConfig::builder()
//!         .series("Berserk")
//!         .source_path(PathBuf::from("./incoming/berserk"))
//!         .nb_workers(4usize)
//!         .build()?;
//!
//!     // Pack chapters 1..=3 into "Berserk v01" and 4..=6 into "Berserk v02"
//!     let specs = resolve_batch(&config.series, "v01:1..3-v02:4..6")?;
//!     for result in config.pack_batch(&specs).await? {
//!         println!(
//!             "volume {:02}: {}",
//!             result.volume,
//!             if result.succeeded() { "ok" } else { "failed" }
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Matching and range resolution fail fast before any filesystem mutation;
//! per-chapter failures during execution are isolated and aggregated into
//! the returned [`types::VolumeResult`].

pub mod config;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod path_utils;
pub mod pattern;
pub mod plan;
pub mod range;
pub mod tankobon;
pub mod types;

// Publicly expose the main `TankobonConfig` struct and its builder
pub use tankobon::TankobonConfig;
pub use tankobon::TankobonConfigBuilder;

// Re-export error and core types for direct access
pub use types::{
    ChapterIdentity, ChapterNumber, ChapterOutcome, ChapterRange, ChapterResult, ChapterTask,
    SkipReason, VolumeResult, VolumeSpec,
};

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types and functions, allowing you to
/// import everything you need with a single `use tankobon::prelude::*;`.
pub mod prelude {
    pub use super::{
        ChapterIdentity, ChapterNumber, ChapterOutcome, ChapterRange, ChapterResult, ChapterTask,
        SkipReason, TankobonConfig, TankobonConfigBuilder, VolumeResult, VolumeSpec, error, types,
    };
    pub use crate::config::SourceConfig;
    pub use crate::executor::Executor;
    pub use crate::matcher::{ChapterMatches, find_archives, match_chapters};
    pub use crate::pattern::{NamingPattern, resolve_pattern};
    pub use crate::plan::{build_tasks, format_chapter_dir, format_volume_dir};
    pub use crate::range::{read_batch_file, resolve_batch, resolve_range};
    pub use regex::Regex;
    pub use std::path::{Path, PathBuf};
}
