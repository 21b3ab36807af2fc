//! Core data types and reports for the spreadstitch pipeline.
//!
//! This module defines the fundamental data structures used throughout spreadstitch:
//! - Pages and their geometry (`Page`, `ReferenceDimensions`, `DimensionTolerance`)
//! - The validator's output (`ValidatedPages`)
//! - Chapter state tracking (`ChapterStage`) and the `ExecutionMode` of a run
//! - Reporting types (`ChapterOutcome`, `ChapterFailure`, `BatchReport`, `VolumeOutcome`)

use std::fmt;
use std::path::{Path, PathBuf};

use image::{ColorType, ImageDecoder, ImageReader};

use crate::error::Result;

/// One image extracted from an archive.
///
/// A page's identity is its path; it is owned by the workspace it was extracted into.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
}

impl Page {
    /// Reads the geometry and color mode of an image from its header, without decoding pixels.
    pub fn probe(path: &Path) -> Result<Self> {
        let decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            color: decoder.color_type(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The width/height/mode every page of a chapter is expected to match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceDimensions {
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
}

impl ReferenceDimensions {
    pub fn of(page: &Page) -> Self {
        Self {
            width: page.width,
            height: page.height,
            color: page.color,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Pixel windows used by the validator to tell resize drift from a structurally different page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DimensionTolerance {
    /// How many pixels a page may exceed the reference in either dimension.
    pub oversize: u32,
    /// Half-width window: a narrower page whose doubled width lands within
    /// `reference.width ± spread` means the reference was already a spread.
    pub spread: u32,
}

impl Default for DimensionTolerance {
    fn default() -> Self {
        Self {
            oversize: 0,
            spread: 100,
        }
    }
}

/// Output of the dimension validator: an even-length, reading-ordered page list.
#[derive(Debug, Clone)]
pub struct ValidatedPages {
    pub pages: Vec<Page>,
    pub reference: ReferenceDimensions,
    /// A blank page was inserted to make the page count even.
    pub blank_inserted: bool,
    /// The chronologically first page was an oversized white filler and got replaced.
    pub first_page_replaced: bool,
}

/// Where a chapter conversion is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChapterStage {
    #[default]
    Start,
    Loaded,
    Validated,
    Stitched,
    Built,
    Done,
}

impl fmt::Display for ChapterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChapterStage::Start => "start",
            ChapterStage::Loaded => "loaded",
            ChapterStage::Validated => "validated",
            ChapterStage::Stitched => "stitched",
            ChapterStage::Built => "built",
            ChapterStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of converting one chapter archive in place.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterOutcome {
    pub archive: PathBuf,
    /// Spread images written, warning page included.
    pub spreads: usize,
    pub warning_page: bool,
    pub blank_inserted: bool,
    pub first_page_replaced: bool,
    /// Where the unstitched archive was moved, `None` when it was deleted.
    pub original: Option<PathBuf>,
    pub stage: ChapterStage,
}

/// A chapter that failed inside a batch, with the reason it was reported under.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterFailure {
    pub archive: PathBuf,
    pub reason: String,
}

/// Aggregated result of converting several chapters independently.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchReport {
    pub succeeded: Vec<ChapterOutcome>,
    pub failed: Vec<ChapterFailure>,
}

impl BatchReport {
    /// True when every chapter converted; drives the process exit status.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of assembling several chapters into one combined archive.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeOutcome {
    pub output: PathBuf,
    pub chapters: usize,
    /// Stitched spreads across all chapters, warning page excluded.
    pub spreads: usize,
    pub warning_page: bool,
    pub originals_deleted: bool,
}

/// Specifies how a list of archives is to be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionMode {
    /// Every archive is converted in place, independently of the others.
    Chapters,
    /// The archives are stitched and combined into a single volume archive.
    Volume,
}

/// Image extensions accepted as pages.
const SUPPORTED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Utility function: whether a path names an image the pipeline treats as a page.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            SUPPORTED_IMAGE_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}
