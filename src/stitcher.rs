//! Spread stitching: pairs validated pages into double-wide images.
//!
//! Pages arrive in right-to-left reading order. Each consecutive pair becomes one spread
//! with the earlier page on the left and the next on the right, which reads correctly
//! right-to-left when the archive is viewed left-to-right.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::canvas::{convert_to, paste, white_canvas};
use crate::error::{Error, Result};
use crate::path_utils::page_file_name;
use crate::render::WarningPage;
use crate::types::{Page, ReferenceDimensions};

/// Stitches `pages` into spreads numbered from `001` in `out_dir`.
///
/// When `warning` is given and the chapter has more than two pages, the warning page is
/// written first at double the reference width. A two-page chapter is a single spread and
/// gets no warning page.
///
/// # Arguments
///
/// * `pages` - Validated, even-length pages in right-to-left reading order
/// * `reference` - The chapter's reference dimensions
/// * `out_dir` - Directory the numbered spreads are written to
/// * `warning` - Warning page to prepend, if any
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Written files in page order
pub fn stitch_pages(
    pages: Vec<Page>,
    reference: &ReferenceDimensions,
    out_dir: &Path,
    warning: Option<&WarningPage>,
) -> Result<Vec<PathBuf>> {
    if pages.len() % 2 != 0 {
        return Err(Error::Other(format!(
            "Cannot stitch an odd number of pages ({})",
            pages.len()
        )));
    }

    let spread_width = reference.width * 2;
    let mut written = Vec::with_capacity(pages.len() / 2 + 1);
    let mut first_page_number = 1;

    if let Some(warning) = warning {
        if pages.len() > 2 {
            let path = out_dir.join(page_file_name(first_page_number));
            warning.write(&path, reference.color, spread_width, reference.height)?;
            written.push(path);
            first_page_number += 1;
        }
    }

    let spreads = pages
        .par_chunks_exact(2)
        .enumerate()
        .map(|(index, pair)| {
            let path = out_dir.join(page_file_name(first_page_number + index));
            stitch_pair(&pair[0], &pair[1], reference, &path)?;
            Ok(path)
        })
        .collect::<Result<Vec<PathBuf>>>()?;

    written.extend(spreads);
    Ok(written)
}

/// Composes `left` and `right` onto a white, double-width canvas in the left page's color mode.
///
/// The white fill covers any residual sub-tolerance size drift of either page.
pub fn stitch_pair(
    left: &Page,
    right: &Page,
    reference: &ReferenceDimensions,
    destination: &Path,
) -> Result<()> {
    let left_image = image::open(&left.path)?;
    let right_image = image::open(&right.path)?;

    let mode = left_image.color();
    let mut canvas = white_canvas(mode, reference.width * 2, reference.height);
    let mode = canvas.color();

    paste(&mut canvas, &convert_to(left_image, mode), 0, 0);
    paste(
        &mut canvas,
        &convert_to(right_image, mode),
        i64::from(reference.width),
        0,
    );

    canvas.save(destination)?;
    Ok(())
}
