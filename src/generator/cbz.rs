use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::path_utils::get_file_name_lossy;
use crate::types::is_supported_image;
use async_trait::async_trait;
use memmap2::MmapOptions;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive entry holding ComicInfo metadata.
pub const COMIC_INFO_ENTRY: &str = "ComicInfo.xml";

/// Written into the ComicInfo notes of every archive this crate produces; the loader
/// refuses archives carrying it so spreads are never paired a second time.
pub const STITCHED_MARKER: &str = "spreadstitch: pages stitched into spreads";

const COMIC_INFO_TEMPLATE: &str = include_str!("../../templates/ComicInfo.xml");

/// A generator for creating CBZ (Comic Book ZIP) files.
///
/// Pages are stored under their own file names, which the stitcher already numbers, so
/// archive order equals the order pages were added in.
pub struct Cbz {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    page_count: usize, // pages added so far
}

#[async_trait]
impl Generator for Cbz {
    fn new(output_path: &Path) -> Result<Self> {
        let options: SimpleFileOptions = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(output_path)?;
        let zip = ZipWriter::new(file);

        Ok(Cbz {
            zip: Some(zip),
            options,
            page_count: 0,
        })
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        if !is_supported_image(image_path) {
            return Err(Error::Unsupported(format!(
                "Image format of '{}'",
                image_path.display()
            )));
        }

        let file = fs::File::open(image_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open image file '{}': {}", image_path.display(), e),
            ))
        })?;

        let file_std = file.into_std().await;
        let options = self.options;
        let file_name = get_file_name_lossy(image_path);

        let zip = match self.zip.as_mut() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        // Create the read-only memory map
        let mmap = spawn_blocking(move || unsafe { MmapOptions::new().map(&file_std) })
            .await
            .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        zip.start_file(file_name, options)?;
        zip.write_all(&mmap[..])?;

        self.page_count += 1;

        Ok(self)
    }

    async fn set_metadata(&mut self, title: &str, total_pages_in_file: usize) -> Result<&mut Self> {
        let escape_xml = |text: &str| -> String {
            text.replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('"', "&quot;")
                .replace('\'', "&apos;")
        };

        let xml = COMIC_INFO_TEMPLATE
            .replace("%title%", &escape_xml(title))
            .replace("%pagecount%", &total_pages_in_file.to_string())
            .replace("%notes%", &escape_xml(STITCHED_MARKER));

        let zip = match self.zip.as_mut() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        zip.start_file(COMIC_INFO_ENTRY, self.options)?;
        zip.write_all(xml.as_bytes())?;

        Ok(self)
    }

    async fn save(mut self) -> Result<()> {
        let zip = match self.zip.take() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        // Finish writing the zip file in a blocking task
        spawn_blocking(move || match zip.finish() {
            Ok(_) => Ok(()),
            Err(e) => Err(Error::Zip(e)),
        })
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        log::debug!("Finished CBZ with {} page(s)", self.page_count);
        Ok(())
    }
}
