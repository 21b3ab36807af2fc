//! Dimension validation and parity correction for one chapter's pages.
//!
//! The validator establishes the chapter's reference dimensions, swaps an accidental
//! oversized white filler page for a correctly sized blank, rejects pages whose geometry
//! means the archive is already irregularly paginated, and pads odd chapters with a blank
//! so that every page has a spread partner.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::canvas::white_canvas;
use crate::error::{Error, Result};
use crate::path_utils::OUTPUT_IMAGE_EXTENSION;
use crate::types::{DimensionTolerance, Page, ReferenceDimensions, ValidatedPages};

/// Validates pages of one chapter against the chapter's reference dimensions.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    tolerance: DimensionTolerance,
}

impl Validator {
    pub fn new(tolerance: DimensionTolerance) -> Self {
        Self { tolerance }
    }

    /// Validates and parity-corrects a chapter's pages.
    ///
    /// # Arguments
    ///
    /// * `pages` - Pages in descending filename (right-to-left reading) order
    /// * `scratch_dir` - Directory a synthesized blank page is written to
    ///
    /// # Returns
    ///
    /// * `Ok(ValidatedPages)` - An even-length page list in the same order, padded with a
    ///   blank page at the front when the input was odd
    /// * `Err(Error::DimensionMismatch)` - A page is larger than the reference or is half of it
    pub fn validate(&self, mut pages: Vec<Page>, scratch_dir: &Path) -> Result<ValidatedPages> {
        let reference = match pages.first() {
            Some(page) => ReferenceDimensions::of(page),
            None => {
                return Err(Error::Other("No pages to validate".to_string()));
            }
        };

        let mut blank: Option<Page> = None;
        let mut first_page_replaced = false;

        // The last element is the chronologically first page of the chapter. An oversized page
        // there is tolerated only when it is plain white filler.
        let last_index = pages.len() - 1;
        if last_index > 0 && self.is_irregular(&pages[last_index], &reference) {
            let first_page = &pages[last_index];
            if is_uniform_white(&first_page.path)? {
                log::warn!(
                    "{} {}x{} is an oversized white page, replacing it with a {}x{} blank",
                    first_page.path.display(),
                    first_page.width,
                    first_page.height,
                    reference.width,
                    reference.height
                );
                pages[last_index] = self.blank_page(&mut blank, &reference, scratch_dir)?;
                first_page_replaced = true;
            }
        }

        if let Some(page) = pages
            .par_iter()
            .find_first(|page| self.is_irregular(page, &reference))
        {
            return Err(Error::DimensionMismatch {
                page: page.path.clone(),
                found: page.dimensions(),
                expected: reference.dimensions(),
            });
        }

        let mut blank_inserted = false;
        if pages.len() % 2 != 0 {
            // Insert at the front so the blank lands at the end of the chapter and the true
            // first page keeps its partner inside this chapter.
            let blank_page = self.blank_page(&mut blank, &reference, scratch_dir)?;
            log::warn!(
                "Odd page count ({}), inserting blank page {}",
                pages.len(),
                blank_page.path.display()
            );
            pages.insert(0, blank_page);
            blank_inserted = true;
        }

        debug_assert!(pages.len() % 2 == 0);

        Ok(ValidatedPages {
            pages,
            reference,
            blank_inserted,
            first_page_replaced,
        })
    }

    /// A page is irregular when it is larger than the reference (most likely a spread), or when
    /// doubling its width lands within the spread window of the reference width (the reference
    /// itself was a spread and this page is an unpaired single).
    pub fn is_irregular(&self, page: &Page, reference: &ReferenceDimensions) -> bool {
        let oversized = page.width > reference.width.saturating_add(self.tolerance.oversize)
            || page.height > reference.height.saturating_add(self.tolerance.oversize);
        if oversized {
            return true;
        }

        if page.width >= reference.width {
            return false;
        }

        let doubled = u64::from(page.width) * 2;
        let lower = u64::from(reference.width.saturating_sub(self.tolerance.spread));
        let upper = u64::from(reference.width) + u64::from(self.tolerance.spread);
        let half_of_spread = doubled >= lower && doubled <= upper;

        log::debug!(
            "{} doubled width ratio {:.3} against reference {}",
            page.path.display(),
            doubled as f64 / f64::from(reference.width.max(1)),
            reference.width
        );

        half_of_spread
    }

    /// Returns the chapter's blank page, writing it on first use.
    fn blank_page(
        &self,
        cached: &mut Option<Page>,
        reference: &ReferenceDimensions,
        scratch_dir: &Path,
    ) -> Result<Page> {
        if let Some(page) = cached {
            return Ok(page.clone());
        }

        let path: PathBuf = scratch_dir.join(format!("blank.{}", OUTPUT_IMAGE_EXTENSION));
        let canvas = white_canvas(reference.color, reference.width, reference.height);
        canvas.save(&path)?;

        let page = Page {
            path,
            width: reference.width,
            height: reference.height,
            color: canvas.color(),
        };
        *cached = Some(page.clone());
        Ok(page)
    }
}

/// Whether the image at `path` is a single uniform color equal to opaque white.
pub fn is_uniform_white(path: &Path) -> Result<bool> {
    let rgba = image::open(path)?.to_rgba8();
    Ok(rgba
        .as_raw()
        .par_chunks_exact(4)
        .all(|pixel| pixel == [u8::MAX; 4]))
}
