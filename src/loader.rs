//! Page set loader: unpacks a chapter archive and returns its pages in reading order.
//!
//! Source archives store pages in forward (left-to-right) filename order. Sorting them
//! in descending filename order yields the right-to-left reading order the stitcher
//! consumes, so the first returned page is the chronologically last page of the chapter.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::generator::cbz::{COMIC_INFO_ENTRY, STITCHED_MARKER};
use crate::path_utils::{has_extension, is_hidden_file};
use crate::types::{Page, is_supported_image};

/// Extracts `archive` into `destination` and returns its pages in descending filename order.
///
/// # Arguments
///
/// * `archive` - Path of the chapter archive
/// * `destination` - Empty directory the archive is unpacked into; the caller owns its cleanup
/// * `archive_extension` - Container suffix the archive must carry (without the dot)
///
/// # Errors
///
/// * [`Error::InvalidArchive`] - the path is missing, has the wrong suffix, is not a readable
///   zip container, or contains no images
/// * [`Error::NamingConflict`] - the archive was already stitched by this tool
pub fn load_pages(archive: &Path, destination: &Path, archive_extension: &str) -> Result<Vec<Page>> {
    if !archive.is_file() {
        return Err(Error::InvalidArchive(
            archive.to_path_buf(),
            format!("{} is not a valid path! Skipping file", archive.display()),
        ));
    }
    if !has_extension(archive, archive_extension) {
        return Err(Error::InvalidArchive(
            archive.to_path_buf(),
            format!(
                "{} is not a {}! Skipping file",
                archive.display(),
                archive_extension
            ),
        ));
    }
    if !destination.is_dir() {
        return Err(Error::InvalidPath(
            destination.to_path_buf(),
            "Extraction destination is not a directory".to_string(),
        ));
    }

    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file).map_err(|e| {
        Error::InvalidArchive(
            archive.to_path_buf(),
            format!("{} is not a readable zip container: {}", archive.display(), e),
        )
    })?;

    if is_already_stitched(&mut zip)? {
        return Err(Error::NamingConflict(
            archive.to_path_buf(),
            "archive already contains stitched spreads, skipping file. Convert the original archive instead."
                .to_string(),
        ));
    }

    zip.extract(destination)?;

    let image_paths = collect_images(destination)?;
    if image_paths.is_empty() {
        return Err(Error::InvalidArchive(
            archive.to_path_buf(),
            format!("{} contains no images! Skipping file", archive.display()),
        ));
    }

    let mut pages = image_paths
        .par_iter()
        .map(|path| Page::probe(path))
        .collect::<Result<Vec<Page>>>()?;

    // In reverse, because we want right to left.
    pages.par_sort_by(|a, b| b.path.cmp(&a.path));

    log::debug!("[{}] loaded {} page(s)", archive.display(), pages.len());

    Ok(pages)
}

/// Whether the archive carries the ComicInfo marker written by the archive builder.
fn is_already_stitched(zip: &mut ZipArchive<File>) -> Result<bool> {
    let mut entry = match zip.by_name(COMIC_INFO_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let mut content = String::new();
    if entry.read_to_string(&mut content).is_err() {
        // Unreadable metadata from another tool is not ours.
        return Ok(false);
    }
    Ok(content.contains(STITCHED_MARKER))
}

/// Collects image files below `directory`, walking nested folders and skipping hidden
/// entries, `__MACOSX` resource forks and non-image files.
fn collect_images(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    let mut pending = vec![directory.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();

            if is_hidden_file(&path) || path.ends_with("__MACOSX") {
                continue;
            }

            if path.is_dir() {
                pending.push(path);
            } else if is_supported_image(&path) {
                images.push(path);
            }
        }
    }

    Ok(images)
}
