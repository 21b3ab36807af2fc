use std::path::PathBuf;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::Semaphore;

use crate::converter::convert_chapter;
use crate::error::{Error, Result};
use crate::render::{
    DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE, DEFAULT_WARNING_TEXT, TrueTypeFace, Typeface,
    WarningPage, locate_font,
};
use crate::types::{
    BatchReport, ChapterFailure, ChapterOutcome, DimensionTolerance, ExecutionMode, VolumeOutcome,
};
use crate::validator::Validator;
use crate::volume::assemble_volume;

/// The spreadstitch conversion configuration, built declaratively using the builder pattern.
///
/// This struct carries every behavioral flag and tunable of the pipeline: what happens to
/// the unstitched originals, whether a warning page is written and how it looks, and the
/// tolerances used to validate page geometry. Once configured, it executes conversions via:
///
/// - [`convert_chapter`](SpreadConfig::convert_chapter): One archive, converted in place
/// - [`convert_chapters`](SpreadConfig::convert_chapters): Many archives, each independently
/// - [`assemble_volume`](SpreadConfig::assemble_volume): Many archives, combined into one
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use spreadstitch::prelude::*;
/// # #[tokio::main]
/// # async fn main() -> spreadstitch::error::Result<()> {
/// let config = SpreadConfig::builder()
///     .font_path(PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"))
///     .delete_originals(false)
///     .build()?;
///
/// let outcome = config.convert_chapter(Path::new("manga/ch01.cbz")).await?;
/// println!("Wrote {} spreads", outcome.spreads);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct SpreadConfig {
    /// Delete the unstitched archives instead of renaming them aside.
    ///
    /// When `false`, `a.cbz` is moved to `a{original_suffix}.cbz` once the stitched archive is
    /// built, and chapters that look already converted are refused.
    #[builder(default = "false")]
    pub delete_originals: bool,

    /// Do not write the page telling readers the archive starts on its last page.
    #[builder(default = "false")]
    pub skip_warning_page: bool,

    /// Advisory text centered on the warning page.
    #[builder(default = "DEFAULT_WARNING_TEXT.to_string()")]
    pub warning_text: String,

    /// Font file the warning page is drawn with.
    ///
    /// A bare file name is also looked up in the platform font directories. A font that
    /// cannot be found fails the conversion; there is no fallback typeface.
    #[builder(default = "PathBuf::from(DEFAULT_FONT_PATH)")]
    pub font_path: PathBuf,

    /// Font size of the warning text, in pixels.
    #[builder(default = "DEFAULT_FONT_SIZE")]
    pub font_size: f32,

    /// Typeface overriding `font_path`, e.g. an embedded font or a test double.
    #[builder(default)]
    pub typeface: Option<Arc<dyn Typeface>>,

    /// Pixels a page may exceed the reference dimensions by before it is rejected.
    ///
    /// Spreads keep the reference size, so a tolerated page is clipped when stitched: extra
    /// height is cut off, and extra width of the left page is covered by the right page.
    #[builder(default = "0")]
    pub oversize_tolerance: u32,

    /// Window around the reference width within which a doubled page width means the
    /// reference is already a spread.
    #[builder(default = "100")]
    pub spread_tolerance: u32,

    /// Container suffix accepted by the loader, without the dot.
    #[builder(default = "\"cbz\".to_string()")]
    pub archive_extension: String,

    /// Suffix appended to the file stem of an unstitched archive that is kept.
    #[builder(default = "\"_original\".to_string()")]
    pub original_suffix: String,

    /// Embed a ComicInfo.xml marking the output as stitched, so it is never re-paired.
    #[builder(default = "true")]
    pub write_comic_info: bool,

    /// Upper bound on chapters processed concurrently.
    #[builder(default = "num_cpus::get()")]
    pub max_concurrent: usize,
}

impl std::fmt::Debug for SpreadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadConfig")
            .field("delete_originals", &self.delete_originals)
            .field("skip_warning_page", &self.skip_warning_page)
            .field("warning_text", &self.warning_text)
            .field("font_path", &self.font_path)
            .field("font_size", &self.font_size)
            .field(
                "typeface",
                if self.typeface.is_some() {
                    &"Some(Typeface)"
                } else {
                    &"None"
                },
            )
            .field("oversize_tolerance", &self.oversize_tolerance)
            .field("spread_tolerance", &self.spread_tolerance)
            .field("archive_extension", &self.archive_extension)
            .field("original_suffix", &self.original_suffix)
            .field("write_comic_info", &self.write_comic_info)
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

impl SpreadConfig {
    /// Creates a new builder for configuring `SpreadConfig`.
    pub fn builder() -> SpreadConfigBuilder {
        SpreadConfigBuilder::default()
    }

    pub fn tolerance(&self) -> DimensionTolerance {
        DimensionTolerance {
            oversize: self.oversize_tolerance,
            spread: self.spread_tolerance,
        }
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.tolerance())
    }

    /// Performs validation checks on the inputs of an execution mode before any file is touched.
    ///
    /// # Arguments
    ///
    /// * `archives` - The archives about to be processed
    /// * `mode` - The intended execution mode:
    ///   - [`ExecutionMode::Chapters`]: at least one archive
    ///   - [`ExecutionMode::Volume`]: at least two archives
    pub fn preflight_check(&self, archives: &[PathBuf], mode: ExecutionMode) -> Result<&Self> {
        if self.max_concurrent == 0 {
            return Err(Error::Other(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        match mode {
            ExecutionMode::Chapters => {
                if archives.is_empty() {
                    return Err(Error::Other("No archives given to convert.".to_string()));
                }
            }
            ExecutionMode::Volume => {
                if archives.len() < 2 {
                    return Err(Error::Other(format!(
                        "A volume needs at least two chapters, got {}.",
                        archives.len()
                    )));
                }
            }
        }

        Ok(self)
    }

    /// Resolves the warning page for this configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - `skip_warning_page` is set
    /// * `Ok(Some(WarningPage))` - The injected typeface, or the font loaded from `font_path`
    /// * `Err(Error::Typeface)` - The font file is missing or invalid
    pub fn resolve_warning_page(&self) -> Result<Option<WarningPage>> {
        if self.skip_warning_page {
            return Ok(None);
        }

        let typeface: Arc<dyn Typeface> = match &self.typeface {
            Some(typeface) => Arc::clone(typeface),
            None => {
                let font_path = locate_font(&self.font_path).ok_or_else(|| {
                    Error::Typeface(format!(
                        "font '{}' not found. Pass a font file or skip the warning page.",
                        self.font_path.display()
                    ))
                })?;
                Arc::new(TrueTypeFace::from_file(&font_path)?)
            }
        };

        Ok(Some(WarningPage::new(
            typeface,
            self.warning_text.clone(),
            self.font_size,
        )))
    }

    // --- Core conversion entry points ---

    /// Converts one chapter archive in place so consecutive pages are merged into spreads.
    ///
    /// # Returns
    ///
    /// * `Ok(ChapterOutcome)` - The stitched archive replaced the original
    /// * `Err(Error)` - `InvalidArchive`, `DimensionMismatch`, `NamingConflict`, `BuildError`,
    ///   or `Typeface`; the original archive is left untouched
    pub async fn convert_chapter(&self, archive: &std::path::Path) -> Result<ChapterOutcome> {
        let warning = self.resolve_warning_page()?.map(Arc::new);
        convert_chapter(self, archive, warning).await
    }

    /// Converts each archive independently on the bounded worker pool.
    ///
    /// A failing chapter is logged and reported in [`BatchReport::failed`]; it never aborts
    /// its siblings. Only configuration problems (e.g. an unusable typeface) fail the batch.
    pub async fn convert_chapters(&self, archives: Vec<PathBuf>) -> Result<BatchReport> {
        self.preflight_check(&archives, ExecutionMode::Chapters)?;
        let warning = self.resolve_warning_page()?.map(Arc::new);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = Vec::with_capacity(archives.len());

        for archive in archives.iter().cloned() {
            let config = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let warning = warning.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await?;
                convert_chapter(&config, &archive, warning).await
            }));
        }

        let results = try_join_all(tasks).await.map_err(|e| {
            Error::AsyncTaskError(format!("Failed to join chapter conversion tasks: {}", e))
        })?;

        // Results come back in dispatch order, so they pair with their archive by index.
        let mut report = BatchReport::default();
        for (archive, result) in archives.into_iter().zip(results) {
            match result {
                Ok(outcome) => report.succeeded.push(outcome),
                Err(e) => report.failed.push(ChapterFailure {
                    archive,
                    reason: e.to_string(),
                }),
            }
        }

        Ok(report)
    }

    /// Stitches several chapters and combines them into one archive next to the first one,
    /// named `first.stem + "-" + last.name`, with a single shared warning page.
    ///
    /// # Returns
    ///
    /// * `Ok(VolumeOutcome)` - The combined archive was written
    /// * `Err(Error::AlreadyAssembled)` - The combined path already exists; nothing was done
    /// * `Err(Error::VolumeAborted)` - A chapter failed; no combined archive was written
    pub async fn assemble_volume(&self, archives: Vec<PathBuf>) -> Result<VolumeOutcome> {
        self.preflight_check(&archives, ExecutionMode::Volume)?;
        let warning = self.resolve_warning_page()?.map(Arc::new);
        assemble_volume(self, archives, warning).await
    }
}

impl SpreadConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(size) = self.font_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(format!("Invalid font_size: {}", size));
            }
        }
        if let Some(extension) = &self.archive_extension {
            if extension.is_empty() || extension.starts_with('.') {
                return Err(format!(
                    "Invalid archive_extension '{}': expected a suffix without the dot",
                    extension
                ));
            }
        }
        if let Some(suffix) = &self.original_suffix {
            if suffix.is_empty() {
                return Err("original_suffix must not be empty".to_string());
            }
        }
        if let Some(0) = self.max_concurrent {
            return Err("max_concurrent must be at least 1".to_string());
        }

        Ok(())
    }
}
