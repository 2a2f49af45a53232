use super::upload::FailedFile;
use serde::Serialize;
use std::path::Path;

/// Broad failure categories reported to clients.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Empty,
    NoValidFiles,
    PersistenceFailure,
    PartialUploadFailure,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Missing required parameter: date")]
    MissingDate,
    #[error("Invalid date format. Expected YYYY-MM-DD, got: {0}")]
    InvalidDate(String),
    #[error("No files were uploaded")]
    NoFiles,
    #[error("No valid image files were uploaded ({0} skipped)")]
    NoValidFiles(usize),
    #[error("Directory does not exist: {}", .0.display())]
    NotFound(Box<Path>),
    #[error("No images found in directory: {}", .0.display())]
    Empty(Box<Path>),
    #[error("Failed to upload any files ({} failed)", .0.len())]
    UploadFailed(Vec<FailedFile>),
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: Box<Path>,
        source: std::io::Error,
    },
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: Box<Path>,
        source: std::io::Error,
    },
    #[error("Invalid catalog data in {}: {source}", .path.display())]
    CatalogData {
        path: Box<Path>,
        source: serde_json::Error,
    },
    #[error("Update lock error: {0}")]
    Lock(std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingDate | Self::InvalidDate(_) | Self::NoFiles => ErrorKind::InvalidInput,
            Self::NoValidFiles(_) => ErrorKind::NoValidFiles,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Empty(_) => ErrorKind::Empty,
            Self::UploadFailed(_)
            | Self::Write { .. }
            | Self::Read { .. }
            | Self::CatalogData { .. }
            | Self::Lock(_)
            | Self::Io(_) => ErrorKind::PersistenceFailure,
        }
    }

    pub(crate) fn write<P: AsRef<Path>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf().into_boxed_path();
        move |source| Self::Write { path, source }
    }

    pub(crate) fn read<P: AsRef<Path>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf().into_boxed_path();
        move |source| Self::Read { path, source }
    }
}
