//! Assembly of several chapters into one combined volume archive.
//!
//! Chapters are stitched without their own warning pages, pooled under names prefixed with
//! their reversed 1-based ordinal (`001_` is the last chapter given) and packed together
//! with one shared warning page. The originals are never modified unless deletion is
//! requested, and nothing is written if any chapter fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::spawn_blocking;

use crate::converter::{ChapterJob, prepare_chapter};
use crate::error::{Error, Result};
use crate::generator::build_archive;
use crate::path_utils::{
    get_file_name_lossy, get_file_stem_lossy, staging_path, volume_output_path,
    volume_page_file_name,
};
use crate::render::WarningPage;
use crate::spreadstitch::SpreadConfig;
use crate::types::{Page, VolumeOutcome, is_supported_image};
use crate::validator::Validator;

/// File name of the shared warning page, sorting ahead of every pooled spread.
const VOLUME_WARNING_PAGE: &str = "000_000.png";

pub(crate) async fn assemble_volume(
    config: &SpreadConfig,
    archives: Vec<PathBuf>,
    warning: Option<Arc<WarningPage>>,
) -> Result<VolumeOutcome> {
    let (first, last) = match (archives.first(), archives.last()) {
        (Some(first), Some(last)) if archives.len() >= 2 => (first, last),
        _ => {
            return Err(Error::Other(
                "A volume needs at least two chapters.".to_string(),
            ));
        }
    };

    let output = volume_output_path(first, last);
    if output.exists() {
        return Err(Error::AlreadyAssembled(output));
    }
    let volume_name = get_file_name_lossy(&output);
    log::info!(
        "[{}] Starting volume of {} chapters...",
        volume_name,
        archives.len()
    );

    let workspace = tempfile::Builder::new()
        .prefix("spreadstitch-volume-")
        .tempdir()?;
    let pool_dir = workspace.path().join("volume");
    fs::create_dir(&pool_dir).await?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
    let mut tasks = Vec::with_capacity(archives.len());

    // Ordinals run over the reversed list so the last chapter sorts first.
    for (index, archive) in archives.iter().rev().enumerate() {
        let ordinal = index + 1;
        let archive = archive.clone();
        let chapter_dir = workspace.path().join(format!("chapter_{:03}", ordinal));
        let pool_dir = pool_dir.clone();
        let validator = config.validator();
        let extension = config.archive_extension.clone();
        let semaphore = Arc::clone(&semaphore);

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await?;
            spawn_blocking(move || {
                stitch_into_pool(
                    ordinal,
                    &archive,
                    &chapter_dir,
                    &pool_dir,
                    &validator,
                    &extension,
                )
            })
            .await?
        }));
    }

    let results = try_join_all(tasks).await.map_err(|e| {
        Error::AsyncTaskError(format!("Failed to join volume chapter tasks: {}", e))
    })?;

    let mut failed = Vec::new();
    let mut spreads = 0;
    for (archive, result) in archives.iter().rev().zip(results) {
        match result {
            Ok(count) => spreads += count,
            Err(_) => failed.push(archive.clone()),
        }
    }
    if !failed.is_empty() {
        failed.reverse();
        log::error!(
            "[{}] {} chapter(s) failed, no volume was written",
            volume_name,
            failed.len()
        );
        return Err(Error::VolumeAborted {
            volume: output,
            failed,
        });
    }

    let warning_page = match warning {
        Some(warning) => {
            write_volume_warning(&pool_dir, warning).await?;
            true
        }
        None => false,
    };

    let staging = staging_path(&output);
    let title = config.write_comic_info.then(|| get_file_stem_lossy(&output));
    if let Err(e) = build_archive(&pool_dir, &staging, title.as_deref()).await {
        if let Err(cleanup) = fs::remove_file(&staging).await {
            log::debug!("No staging file to remove at {}: {}", staging.display(), cleanup);
        }
        return Err(e);
    }
    fs::rename(&staging, &output).await?;

    // The volume is committed; from here on failures are only reported.
    let originals_deleted = config.delete_originals && delete_originals(&archives).await;

    log::info!(
        "[{}] Done with volume! You can find it at {}",
        volume_name,
        output.display()
    );

    Ok(VolumeOutcome {
        output,
        chapters: archives.len(),
        spreads,
        warning_page,
        originals_deleted,
    })
}

/// Deletes every archive, logging the ones that cannot be removed.
///
/// Returns whether all of them are gone.
async fn delete_originals(archives: &[PathBuf]) -> bool {
    let mut all_deleted = true;
    for archive in archives {
        match fs::remove_file(archive).await {
            Ok(()) => log::debug!("[{}] Deleted original", get_file_name_lossy(archive)),
            Err(e) => {
                log::warn!(
                    "[{}] Could not delete original: {}",
                    get_file_name_lossy(archive),
                    e
                );
                all_deleted = false;
            }
        }
    }
    all_deleted
}

/// Stitches one chapter in its own workspace and moves the spreads into the volume pool.
///
/// # Returns
///
/// * `Ok(usize)` - Number of spreads pooled
fn stitch_into_pool(
    ordinal: usize,
    archive: &Path,
    chapter_dir: &Path,
    pool_dir: &Path,
    validator: &Validator,
    archive_extension: &str,
) -> Result<usize> {
    let mut job = ChapterJob::new(archive);
    log::info!("\t[{}] Starting...", job.name());

    std::fs::create_dir_all(chapter_dir)?;
    let prepared = prepare_chapter(&mut job, chapter_dir, validator, archive_extension, None)
        .inspect_err(|e| {
            log::error!(
                "\t[{}] Failed after stage '{}': {}",
                job.name(),
                job.stage(),
                e
            )
        })?;

    for spread in &prepared.spreads {
        let pooled = pool_dir.join(volume_page_file_name(
            ordinal,
            &get_file_name_lossy(spread),
        ));
        std::fs::rename(spread, &pooled)?;
    }

    log::info!("\t[{}] Done!", job.name());
    Ok(prepared.spreads.len())
}

/// Writes the shared warning page sized like the first pooled spread.
async fn write_volume_warning(pool_dir: &Path, warning: Arc<WarningPage>) -> Result<()> {
    let mut pooled = Vec::new();
    let mut entries = fs::read_dir(pool_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_supported_image(&path) {
            pooled.push(path);
        }
    }
    pooled.sort();

    let sample = match pooled.into_iter().next() {
        Some(sample) => sample,
        None => {
            return Err(Error::Other(
                "No stitched pages to size the warning page from".to_string(),
            ));
        }
    };

    let destination = pool_dir.join(VOLUME_WARNING_PAGE);
    spawn_blocking(move || {
        let page = Page::probe(&sample)?;
        warning.write(&destination, page.color, page.width, page.height)
    })
    .await?
}
