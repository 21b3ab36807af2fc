//! Warning page rendering.
//!
//! A stitched archive opens on its chronologically last spread, so by default the first
//! page written is an advisory telling readers to start from the back. Text is drawn
//! through the [`Typeface`] trait so tests and embedders can inject their own glyph source;
//! [`TrueTypeFace`] is the font-file backed implementation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{FontVec, PxScale};
use image::{ColorType, DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::canvas::convert_to;
use crate::error::{Error, Result};
use crate::path_utils::get_file_name_lossy;

/// Default advisory printed on the warning page.
pub const DEFAULT_WARNING_TEXT: &str = "This manga is read Right to Left! Go to the last page :)";
/// Default font file for the warning page.
pub const DEFAULT_FONT_PATH: &str = "arial.ttf";
/// Default font size, in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 40.0;

const FONT_DIRS: &[&str] = &[
    "C:\\Windows\\Fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "/usr/share/fonts",
    "/usr/local/share/fonts",
];

/// Finds a font file by path, or by bare file name in the platform font directories.
///
/// Directory lookups match the file name case-insensitively and descend into
/// subdirectories, since Linux distributions file fonts by foundry.
pub fn locate_font(font: &Path) -> Option<PathBuf> {
    if font.is_file() {
        return Some(font.to_path_buf());
    }

    let is_bare_name = font.parent().is_none_or(|p| p.as_os_str().is_empty());
    if !is_bare_name {
        return None;
    }
    let wanted = font.file_name()?.to_string_lossy().to_lowercase();

    let mut dirs: Vec<PathBuf> = FONT_DIRS.iter().map(PathBuf::from).collect();
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(Path::new(&home).join(".fonts"));
        dirs.push(Path::new(&home).join(".local/share/fonts"));
    }

    dirs.iter().find_map(|dir| find_font_in(dir, &wanted, 4))
}

fn find_font_in(dir: &Path, wanted: &str, depth: usize) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if get_file_name_lossy(&path).to_lowercase() == wanted {
            return Some(path);
        }
    }

    if depth == 0 {
        return None;
    }
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| find_font_in(sub, wanted, depth - 1))
}

/// A source of glyphs able to measure and draw a single line of text.
pub trait Typeface: Send + Sync {
    /// Width and height of `text` rendered at `size` pixels.
    fn text_size(&self, text: &str, size: f32) -> (u32, u32);

    /// Draws `text` with its top-left corner at (`x`, `y`).
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        color: Rgba<u8>,
        x: i32,
        y: i32,
        size: f32,
        text: &str,
    );
}

/// A TrueType/OpenType font loaded from disk.
pub struct TrueTypeFace {
    font: FontVec,
}

impl TrueTypeFace {
    /// Loads a font file. There is no fallback font: a missing or unparsable file is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            Error::Typeface(format!("cannot read font '{}': {}", path.display(), e))
        })?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| Error::Typeface(format!("invalid font '{}': {}", path.display(), e)))?;
        Ok(Self { font })
    }

    /// Parses font data already held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(data)
            .map_err(|e| Error::Typeface(format!("invalid font data: {}", e)))?;
        Ok(Self { font })
    }
}

impl Typeface for TrueTypeFace {
    fn text_size(&self, text: &str, size: f32) -> (u32, u32) {
        text_size(PxScale::from(size), &self.font, text)
    }

    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        color: Rgba<u8>,
        x: i32,
        y: i32,
        size: f32,
        text: &str,
    ) {
        draw_text_mut(canvas, color, x, y, PxScale::from(size), &self.font, text);
    }
}

impl fmt::Debug for TrueTypeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFace").finish_non_exhaustive()
    }
}

/// The advisory page: text, size and the typeface it is drawn with.
#[derive(Clone)]
pub struct WarningPage {
    typeface: Arc<dyn Typeface>,
    text: String,
    font_size: f32,
}

impl WarningPage {
    pub fn new(typeface: Arc<dyn Typeface>, text: impl Into<String>, font_size: f32) -> Self {
        Self {
            typeface,
            text: text.into(),
            font_size,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Renders black text centered on a white canvas of the given size and color mode.
    pub fn render(&self, color: ColorType, width: u32, height: u32) -> DynamicImage {
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([u8::MAX; 4]));
        let (text_width, text_height) = self.typeface.text_size(&self.text, self.font_size);

        let x = (i64::from(width) - i64::from(text_width)) / 2;
        let y = (i64::from(height) - i64::from(text_height)) / 2;
        self.typeface.draw_text(
            &mut canvas,
            Rgba([0, 0, 0, u8::MAX]),
            x as i32,
            y as i32,
            self.font_size,
            &self.text,
        );

        convert_to(DynamicImage::ImageRgba8(canvas), color)
    }

    /// Renders the page and writes it to `destination`.
    pub fn write(
        &self,
        destination: &Path,
        color: ColorType,
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.render(color, width, height).save(destination)?;
        log::debug!(
            "Wrote {}x{} warning page to {}",
            width,
            height,
            destination.display()
        );
        Ok(())
    }
}

impl fmt::Debug for WarningPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarningPage")
            .field("text", &self.text)
            .field("font_size", &self.font_size)
            .finish_non_exhaustive()
    }
}
