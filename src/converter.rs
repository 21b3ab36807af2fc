//! In-place conversion of a single chapter archive.
//!
//! A chapter moves through `Start -> Loaded -> Validated -> Stitched -> Built -> Done`. Every
//! step up to `Stitched` happens inside a private temporary workspace; the original archive
//! is only touched once the stitched archive has been fully written next to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};
use crate::generator::build_archive;
use crate::loader::load_pages;
use crate::path_utils::{
    get_file_name_lossy, get_file_stem_lossy, has_original_suffix, original_sibling_path,
    staging_path,
};
use crate::render::WarningPage;
use crate::spreadstitch::SpreadConfig;
use crate::stitcher::stitch_pages;
use crate::types::{ChapterOutcome, ChapterStage};
use crate::validator::Validator;

/// Tracks one chapter archive through its conversion stages.
#[derive(Debug, Clone)]
pub(crate) struct ChapterJob {
    pub archive: PathBuf,
    name: String,
    stage: ChapterStage,
}

impl ChapterJob {
    pub fn new(archive: &Path) -> Self {
        Self {
            archive: archive.to_path_buf(),
            name: get_file_name_lossy(archive),
            stage: ChapterStage::Start,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ChapterStage {
        self.stage
    }

    fn advance(&mut self, next: ChapterStage) {
        log::debug!("[{}] {} -> {}", self.name, self.stage, next);
        self.stage = next;
    }
}

/// What the blocking half of a conversion produced inside its workspace.
#[derive(Debug)]
pub(crate) struct PreparedChapter {
    /// Directory holding only the finished, numbered images.
    pub out_dir: PathBuf,
    pub spreads: Vec<PathBuf>,
    pub warning_page: bool,
    pub blank_inserted: bool,
    pub first_page_replaced: bool,
}

/// Loads, validates and stitches a chapter inside `workspace`. Blocking.
///
/// The workspace gets three subdirectories: `archive` for the extracted entries,
/// `synthetic` for generated blank pages and `out` for the finished spreads.
pub(crate) fn prepare_chapter(
    job: &mut ChapterJob,
    workspace: &Path,
    validator: &Validator,
    archive_extension: &str,
    warning: Option<&WarningPage>,
) -> Result<PreparedChapter> {
    let extract_dir = workspace.join("archive");
    let synthetic_dir = workspace.join("synthetic");
    let out_dir = workspace.join("out");
    for dir in [&extract_dir, &synthetic_dir, &out_dir] {
        std::fs::create_dir_all(dir)?;
    }

    let pages = load_pages(&job.archive, &extract_dir, archive_extension)?;
    log::debug!("[{}] {} page(s) extracted", job.name, pages.len());
    job.advance(ChapterStage::Loaded);

    let validated = validator.validate(pages, &synthetic_dir)?;
    if validated.blank_inserted {
        log::info!("[{}] Odd page count, added a blank page", job.name);
    }
    job.advance(ChapterStage::Validated);

    let pair_count = validated.pages.len() / 2;
    let spreads = stitch_pages(validated.pages, &validated.reference, &out_dir, warning)?;
    job.advance(ChapterStage::Stitched);

    Ok(PreparedChapter {
        out_dir,
        warning_page: spreads.len() > pair_count,
        spreads,
        blank_inserted: validated.blank_inserted,
        first_page_replaced: validated.first_page_replaced,
    })
}

/// Refuses chapters whose conversion would clobber or duplicate a kept original.
///
/// Returns where the original will be moved, or `None` when originals are deleted.
fn check_naming(config: &SpreadConfig, archive: &Path) -> Result<Option<PathBuf>> {
    if config.delete_originals {
        return Ok(None);
    }

    if has_original_suffix(archive, &config.original_suffix) {
        return Err(Error::NamingConflict(
            archive.to_path_buf(),
            format!(
                "name already ends in '{}', it looks like a kept original",
                config.original_suffix
            ),
        ));
    }

    let sibling = original_sibling_path(archive, &config.original_suffix);
    if sibling.exists() {
        return Err(Error::NamingConflict(
            archive.to_path_buf(),
            format!(
                "{} already exists, this chapter was probably converted before",
                get_file_name_lossy(&sibling)
            ),
        ));
    }

    Ok(Some(sibling))
}

/// Converts one chapter archive in place.
///
/// Errors are logged with the archive name and the last stage reached before being returned.
pub(crate) async fn convert_chapter(
    config: &SpreadConfig,
    archive: &Path,
    warning: Option<Arc<WarningPage>>,
) -> Result<ChapterOutcome> {
    let mut job = ChapterJob::new(archive);
    log::info!("[{}] Starting...", job.name);

    match run_chapter(config, &mut job, warning).await {
        Ok(outcome) => {
            log::info!("[{}] Done!", job.name);
            Ok(outcome)
        }
        Err(e) => {
            log::error!("[{}] Failed after stage '{}': {}", job.name, job.stage, e);
            Err(e)
        }
    }
}

async fn run_chapter(
    config: &SpreadConfig,
    job: &mut ChapterJob,
    warning: Option<Arc<WarningPage>>,
) -> Result<ChapterOutcome> {
    let aside = check_naming(config, &job.archive)?;

    let workspace = tempfile::Builder::new()
        .prefix("spreadstitch-")
        .tempdir()?;

    let (returned_job, prepared) = {
        let mut blocking_job = job.clone();
        let workspace_path = workspace.path().to_path_buf();
        let validator = config.validator();
        let extension = config.archive_extension.clone();

        spawn_blocking(move || {
            let prepared = prepare_chapter(
                &mut blocking_job,
                &workspace_path,
                &validator,
                &extension,
                warning.as_deref(),
            );
            (blocking_job, prepared)
        })
        .await?
    };
    *job = returned_job;
    let prepared = prepared?;

    let staging = staging_path(&job.archive);
    let title = config
        .write_comic_info
        .then(|| get_file_stem_lossy(&job.archive));
    if let Err(e) = build_archive(&prepared.out_dir, &staging, title.as_deref()).await {
        discard_staging(&staging).await;
        return Err(e);
    }
    job.advance(ChapterStage::Built);

    if let Err(e) = commit_replacement(&job.archive, &staging, aside.as_deref()).await {
        discard_staging(&staging).await;
        return Err(e);
    }
    job.advance(ChapterStage::Done);

    Ok(ChapterOutcome {
        archive: job.archive.clone(),
        spreads: prepared.spreads.len(),
        warning_page: prepared.warning_page,
        blank_inserted: prepared.blank_inserted,
        first_page_replaced: prepared.first_page_replaced,
        original: aside,
        stage: job.stage,
    })
}

/// Moves the original aside when it is kept, then renames `staging` over `archive`.
///
/// Without `aside` the rename replaces the original in one step, so a failure leaves it in place.
async fn commit_replacement(archive: &Path, staging: &Path, aside: Option<&Path>) -> Result<()> {
    if let Some(aside) = aside {
        fs::rename(archive, aside).await?;
        log::info!(
            "[{}] Original kept as {}",
            get_file_name_lossy(archive),
            get_file_name_lossy(aside)
        );
    }

    if let Err(e) = fs::rename(staging, archive).await {
        if let Some(aside) = aside {
            if let Err(restore) = fs::rename(aside, archive).await {
                log::error!(
                    "Could not restore {} from {}: {}",
                    archive.display(),
                    aside.display(),
                    restore
                );
            }
        }
        return Err(e.into());
    }
    Ok(())
}

async fn discard_staging(staging: &Path) {
    if fs::try_exists(staging).await.unwrap_or(false) {
        if let Err(e) = fs::remove_file(staging).await {
            log::warn!("Could not remove {}: {}", staging.display(), e);
        }
    }
}
