//! Custom error types and result handling for spreadstitch operations.
//!
//! Every operation returns a [`Result<T>`], a type alias for `std::result::Result<T, Error>`.
//! Errors are chapter-scoped: the chapter converter reports them per archive and a
//! volume turns any chapter failure into [`Error::VolumeAborted`].
//!
use std::path::PathBuf;

/// Type alias for Results with spreadstitch errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all spreadstitch operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image decoding/encoding errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Semaphore(#[from] tokio::sync::AcquireError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::spreadstitch::SpreadConfigBuilderError),
    /// The archive path does not exist, has the wrong suffix, or is not a readable container
    #[error("[{}] {1}", .0.display())]
    InvalidArchive(PathBuf, String),
    /// A page's geometry is outside tolerance or signals an already stitched spread
    #[error("{} {}x{} doesn't match {}x{}", .page.display(), .found.0, .found.1, .expected.0, .expected.1)]
    DimensionMismatch {
        page: PathBuf,
        found: (u32, u32),
        expected: (u32, u32),
    },
    /// Converting would overwrite or reprocess an already converted chapter
    #[error("[{}] {1}", .0.display())]
    NamingConflict(PathBuf, String),
    /// Repackaging the finished spreads failed
    #[error("Failed to build archive '{}': {1}", .0.display())]
    BuildError(PathBuf, String),
    /// The combined volume output already exists
    #[error(
        "[{}] file name already exists, stopping. Delete the file and retry to proceed. (Was this volume already converted?)",
        .0.display()
    )]
    AlreadyAssembled(PathBuf),
    /// The warning page typeface could not be loaded
    #[error("Typeface unavailable: {0}")]
    Typeface(String),
    /// At least one chapter of a volume failed, so nothing was written
    #[error("[{}] Terminating volume since {} chapter(s) failed", .volume.display(), .failed.len())]
    VolumeAborted { volume: PathBuf, failed: Vec<PathBuf> },
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for unsupported operations or formats (e.g., unknown image extension)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Error for failed asynchronous tasks
    #[error("Asynchronous task failed: {0}")]
    AsyncTaskError(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
