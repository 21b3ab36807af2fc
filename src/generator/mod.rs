//! Generator module provides the archive writing interface and the CBZ implementation.
//!
//! [`build_archive`] is the archive builder used by the chapter converter and the volume
//! assembler: it packs a directory of finished spreads into a CBZ at a destination path.

use crate::error::{Error, Result};
use crate::path_utils::is_hidden_file;
use crate::types::is_supported_image;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod cbz;

use cbz::Cbz;

/// Common interface for archive generators.
///
/// A generator is created for one output file, receives pages in order, optionally
/// receives metadata, and is consumed by [`Generator::save`].
///
/// This is where further output formats plug in. [`Cbz`] is the only implementation
/// today and the one [`build_archive`] drives.
#[async_trait]
pub trait Generator {
    /// Creates a new generator writing to `output_path`, replacing any existing file there.
    fn new(output_path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Adds an image as the next page, stored under its own file name.
    ///
    /// # Parameters
    /// * `image_path` - Path to the image file to add as a page
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// Embeds metadata describing the stitched archive.
    ///
    /// # Parameters
    /// * `title` - Title of the archive (usually its file stem)
    /// * `total_pages_in_file` - The total number of pages added to this file
    async fn set_metadata(&mut self, title: &str, total_pages_in_file: usize) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the archive and writes it to disk.
    async fn save(self) -> Result<()>;
}

/// Packs every image in `source_dir` (ascending file name order) into a CBZ at `destination`.
///
/// # Arguments
///
/// * `source_dir` - Directory of finished spread images
/// * `destination` - Archive path, overwritten if it exists
/// * `title` - When set, a stitched-archive `ComicInfo.xml` with this title is embedded
///
/// # Returns
///
/// * `Ok(usize)` - Number of pages written
/// * `Err(Error::BuildError)` - `source_dir` is not a directory or packing failed
pub async fn build_archive(
    source_dir: &Path,
    destination: &Path,
    title: Option<&str>,
) -> Result<usize> {
    if !source_dir.is_dir() {
        return Err(Error::BuildError(
            destination.to_path_buf(),
            format!("{} is not a directory", source_dir.display()),
        ));
    }

    pack_directory(source_dir, destination, title)
        .await
        .map_err(|e| match e {
            Error::BuildError(..) => e,
            other => Error::BuildError(destination.to_path_buf(), other.to_string()),
        })
}

async fn pack_directory(
    source_dir: &Path,
    destination: &Path,
    title: Option<&str>,
) -> Result<usize> {
    let mut pages: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(source_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && !is_hidden_file(&path) && is_supported_image(&path) {
            pages.push(path);
        }
    }
    pages.sort();

    let mut generator = Cbz::new(destination)?;
    for page in &pages {
        generator.add_page(page).await?;
    }
    if let Some(title) = title {
        generator.set_metadata(title, pages.len()).await?;
    }
    generator.save().await?;

    log::debug!(
        "Packed {} page(s) from {} into {}",
        pages.len(),
        source_dir.display(),
        destination.display()
    );
    Ok(pages.len())
}
