//! Common test utilities and constants for the spreadstitch crate.
//!
//! Provides functions for setting up test directories, building chapter archives
//! from synthetic pages, inspecting the archives a conversion produced, and a
//! font-free `Typeface` double for warning pages.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use rand::{Rng, distributions::Alphanumeric};
use spreadstitch::prelude::*;
use std::io::{Cursor, Read, Write};
use std::time::Duration;
use tokio::fs;
use zip::write::SimpleFileOptions;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const LONG_TEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Page size used by most fixtures, wide enough for the default spread window.
#[allow(dead_code)]
pub const PAGE_WIDTH: u32 = 300;
#[allow(dead_code)]
pub const PAGE_HEIGHT: u32 = 400;

/// Helper function to create a clean, uniquely named test directory.
#[allow(dead_code)]
pub async fn setup_test_dir(sub_path: &str) -> PathBuf {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    fs::create_dir_all(&test_dir).await.unwrap();
    test_dir
}

/// One image entry of a synthetic chapter archive.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct PageSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color: Rgb<u8>,
}

#[allow(dead_code)]
impl PageSpec {
    pub fn new(name: &str, width: u32, height: u32, color: Rgb<u8>) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            color,
        }
    }

    /// A standard-size page filled with a color derived from `shade`.
    pub fn standard(name: &str, shade: u8) -> Self {
        Self::new(name, PAGE_WIDTH, PAGE_HEIGHT, shade_color(shade))
    }

    pub fn white(name: &str, width: u32, height: u32) -> Self {
        Self::new(name, width, height, Rgb([255, 255, 255]))
    }

    pub fn encode(&self) -> Vec<u8> {
        let image = RgbImage::from_pixel(self.width, self.height, self.color);
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }
}

/// A distinct, never-white color per shade so pages can be told apart after stitching.
#[allow(dead_code)]
pub fn shade_color(shade: u8) -> Rgb<u8> {
    Rgb([shade, 255 - shade, 60])
}

/// `count` standard pages named `001.png` ..., page `n` colored with shade `n * 10`.
#[allow(dead_code)]
pub fn standard_pages(count: usize) -> Vec<PageSpec> {
    (1..=count)
        .map(|n| PageSpec::standard(&format!("{:03}.png", n), (n * 10) as u8))
        .collect()
}

/// Writes a CBZ at `archive` holding `pages`, each under its own name.
#[allow(dead_code)]
pub fn create_chapter(archive: &Path, pages: &[PageSpec]) {
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(archive).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for page in pages {
        zip.start_file(page.name.as_str(), options).unwrap();
        zip.write_all(&page.encode()).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a standard chapter of `count` pages and returns its path.
#[allow(dead_code)]
pub fn create_standard_chapter(dir: &Path, name: &str, count: usize) -> PathBuf {
    let archive = dir.join(name);
    create_chapter(&archive, &standard_pages(count));
    archive
}

/// Entry names of an archive in storage order.
#[allow(dead_code)]
pub fn list_entries(archive: &Path) -> Vec<String> {
    let file = std::fs::File::open(archive).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    zip.file_names().map(str::to_string).collect::<Vec<_>>()
}

/// Image entry names of an archive, sorted.
#[allow(dead_code)]
pub fn list_image_entries(archive: &Path) -> Vec<String> {
    let mut names: Vec<String> = list_entries(archive)
        .into_iter()
        .filter(|name| name.ends_with(".png"))
        .collect();
    names.sort();
    names
}

/// Decodes one image entry of an archive.
#[allow(dead_code)]
pub fn read_entry_image(archive: &Path, name: &str) -> DynamicImage {
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    image::load_from_memory(&bytes).unwrap()
}

/// Reads the ComicInfo.xml from a CBZ file and returns its content.
#[allow(dead_code)]
pub fn get_comic_info_xml(archive: &Path) -> String {
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name("ComicInfo.xml").unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

/// RGB of the pixel at (`x`, `y`).
#[allow(dead_code)]
pub fn pixel_at(image: &DynamicImage, x: u32, y: u32) -> Rgb<u8> {
    *image.to_rgb8().get_pixel(x, y)
}

/// A typeface drawing every glyph as a solid block, so tests never need a font file.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct BlockFace;

impl Typeface for BlockFace {
    fn text_size(&self, text: &str, size: f32) -> (u32, u32) {
        let glyph = (size / 2.0).max(1.0) as u32;
        (glyph * text.chars().count() as u32, size.max(1.0) as u32)
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
        let (width, height) = self.text_size(text, size);
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                let (px, py) = (x + dx, y + dy);
                if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height()
                {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

/// A builder preset for tests: block typeface, small pool.
#[allow(dead_code)]
pub fn test_config_builder() -> SpreadConfigBuilder {
    let mut builder = SpreadConfig::builder();
    builder
        .typeface(Arc::new(BlockFace) as Arc<dyn Typeface>)
        .font_size(20.0f32)
        .max_concurrent(2usize);
    builder
}
