use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::AssetError;

/// Where an asset's bytes come from.
///
/// An enum rather than a trait object: the set of sources is closed and
/// descriptors need to clone and store them.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// Bytes already in memory, e.g. from a file picker.
    Memory { label: String, bytes: Arc<[u8]> },
    /// A file on the local file system.
    File(PathBuf),
}

impl ByteSource {
    #[must_use]
    pub fn from_bytes(label: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            label: label.into(),
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Display label: the upload name or the file name.
    #[must_use]
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Self::Memory { label, .. } => Cow::Borrowed(label.as_str()),
            Self::File(path) => path
                .file_name()
                .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy()),
        }
    }

    /// Label without its extension; used as the clip name of an upload.
    #[must_use]
    pub fn stem(&self) -> String {
        let label = self.label();
        Path::new(&*label)
            .file_stem()
            .map_or_else(|| label.to_string(), |stem| stem.to_string_lossy().into_owned())
    }

    /// Reads the bytes without blocking the async runtime.
    pub async fn read_bytes(&self) -> Result<Arc<[u8]>, AssetError> {
        match self {
            Self::Memory { bytes, .. } => Ok(Arc::clone(bytes)),
            Self::File(path) => tokio::fs::read(path)
                .await
                .map(Arc::from)
                .map_err(|e| self.io_error(&e)),
        }
    }

    /// Reads the bytes on the calling thread.
    pub fn read_bytes_blocking(&self) -> Result<Arc<[u8]>, AssetError> {
        match self {
            Self::Memory { bytes, .. } => Ok(Arc::clone(bytes)),
            Self::File(path) => std::fs::read(path)
                .map(Arc::from)
                .map_err(|e| self.io_error(&e)),
        }
    }

    fn io_error(&self, err: &std::io::Error) -> AssetError {
        AssetError::Io {
            label: self.label().into_owned(),
            reason: err.to_string(),
        }
    }
}
