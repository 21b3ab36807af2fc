//! Spreadstitch - Manga Spread Stitching Library
//!
//! This crate rewrites right-to-left comic archives (CBZ) so that consecutive pages are
//! merged into double-page spreads. Readers that show one image at a time then display
//! each spread the way it was printed.
//!
//! # Getting Started
//!
//! Configure a conversion with the `SpreadConfig` builder, then run one of its entry points.
//!
//! ```rust,no_run
//! use spreadstitch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> spreadstitch::error::Result<()> {
//!     // 1. Configure the conversion
//!     let config = SpreadConfig::builder()
//!         .font_path(PathBuf::from("./fonts/DejaVuSans.ttf"))
//!         .delete_originals(false)
//!         .build()?;
//!
//!     // 2. Convert some chapters in place; a failing chapter does not stop the others
//!     let report = config
//!         .convert_chapters(vec![
//!             PathBuf::from("./manga/ch01.cbz"),
//!             PathBuf::from("./manga/ch02.cbz"),
//!         ])
//!         .await?;
//!     println!("{} converted, {} failed", report.succeeded.len(), report.failed.len());
//!
//!     // 3. Or combine chapters into a single volume archive
//!     let volume = config
//!         .assemble_volume(vec![
//!             PathBuf::from("./manga/ch03.cbz"),
//!             PathBuf::from("./manga/ch04.cbz"),
//!         ])
//!         .await?;
//!     println!("Volume written to {}", volume.output.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! The pipeline stages are public as well: [`loader`] extracts and probes pages,
//! [`validator`] checks geometry and fixes parity, [`stitcher`] composes spreads,
//! [`render`] draws the warning page and [`generator`] packs the result.

pub mod canvas;
mod converter;
pub mod error;
pub mod generator;
pub mod loader;
pub mod path_utils;
pub mod render;
pub mod spreadstitch;
pub mod stitcher;
pub mod types;
pub mod validator;
mod volume;

// Publicly expose the main `SpreadConfig` struct and its builder
pub use spreadstitch::SpreadConfig;
pub use spreadstitch::SpreadConfigBuilder;

// Re-export error and core types for direct access
pub use render::{TrueTypeFace, Typeface, WarningPage};
pub use types::{
    BatchReport, ChapterFailure, ChapterOutcome, ChapterStage, DimensionTolerance, ExecutionMode,
    Page, ReferenceDimensions, ValidatedPages, VolumeOutcome,
};
pub use validator::Validator;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use spreadstitch::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        BatchReport, ChapterFailure, ChapterOutcome, ChapterStage, DimensionTolerance,
        ExecutionMode, Page, ReferenceDimensions, SpreadConfig, SpreadConfigBuilder,
        TrueTypeFace, Typeface, ValidatedPages, Validator, VolumeOutcome, WarningPage, error,
        generator, types,
    };
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}
