//! Path utilities and the naming rules of converted archives.
//!
//! This module owns every file name the pipeline derives: the `_original` sibling an
//! unstitched chapter is moved to, the combined volume name, hidden staging files used
//! for atomic replacement, and the zero-padded page names written into archives.

use std::path::{Path, PathBuf};

/// Extension of every image the pipeline synthesizes (spreads, blanks, warning pages).
pub const OUTPUT_IMAGE_EXTENSION: &str = "png";

/// Gets the file name from a path with fallback to lossy conversion.
///
/// # Arguments
///
/// * `path` - The path to extract the file name from
///
/// # Returns
///
/// * `String` - The file name, using lossy conversion if necessary
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gets the file stem from a path with fallback to lossy conversion.
pub fn get_file_stem_lossy(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Checks if a filename starts with a dot (hidden file) using safe conversion.
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Case-insensitive extension check, `expected` given without the leading dot.
pub fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// The sibling an unstitched archive is moved to: `a.cbz` -> `a_original.cbz`.
///
/// # Arguments
///
/// * `archive` - Path of the chapter archive
/// * `suffix` - Suffix appended to the file stem (e.g. `_original`)
pub fn original_sibling_path(archive: &Path, suffix: &str) -> PathBuf {
    let stem = get_file_stem_lossy(archive);
    let file_name = match archive.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    archive.with_file_name(file_name)
}

/// Whether the archive's own stem already carries the original suffix.
pub fn has_original_suffix(archive: &Path, suffix: &str) -> bool {
    archive
        .file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

/// Combined output path of a volume: `first.stem + "-" + last.name`, next to `first`.
pub fn volume_output_path(first: &Path, last: &Path) -> PathBuf {
    let file_name = format!(
        "{}-{}",
        get_file_stem_lossy(first),
        get_file_name_lossy(last)
    );
    first.with_file_name(file_name)
}

/// Hidden sibling a new archive is written to before it replaces `destination`.
pub fn staging_path(destination: &Path) -> PathBuf {
    destination.with_file_name(format!(".{}.partial", get_file_name_lossy(destination)))
}

/// Name of the `page_number`-th image of a single-chapter conversion (`001.png`).
pub fn page_file_name(page_number: usize) -> String {
    format!("{:03}.{}", page_number, OUTPUT_IMAGE_EXTENSION)
}

/// Name of a stitched chapter page once pooled into a volume (`002_001.png`).
pub fn volume_page_file_name(chapter_ordinal: usize, page_file_name: &str) -> String {
    format!("{:03}_{}", chapter_ordinal, page_file_name)
}
