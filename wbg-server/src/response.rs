//! JSON bodies returned by the endpoints.
//!
//! Every endpoint answers with a normal status code and reports failures through `success` and
//! `message`, so browser code only has to handle one shape per endpoint.

use serde::Serialize;
use wbg_gallery::{
    DateBucket, Error, ErrorKind, FailedFile, FolderStatus, ReconcileReport, SkippedFile,
    StoredImage, UploadReport,
};

#[derive(Debug, Default, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub date: String,
    pub files: Vec<StoredImage>,
    pub file_count: usize,
    #[serde(rename = "filePaths")]
    pub file_paths: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl UploadResponse {
    pub fn from_report(report: UploadReport) -> Self {
        let error = report.problem();
        let message = match &report.sync_error {
            Some(sync_error) => format!(
                "Files uploaded but the gallery catalog could not be updated: {}",
                sync_error
            ),
            None if !report.failed.is_empty() => format!(
                "Uploaded {} of {} files",
                report.stored.len(),
                report.stored.len() + report.failed.len()
            ),
            None => "Files uploaded successfully".to_string(),
        };
        let file_paths = report.paths();

        Self {
            success: report.sync_error.is_none(),
            message,
            date: report.date.to_string(),
            file_count: report.stored.len(),
            files: report.stored,
            file_paths,
            skipped: report.skipped,
            failed: report.failed,
            error,
        }
    }

    pub fn from_error(date: &str, error: Error) -> Self {
        let kind = error.kind();
        let message = error.to_string();
        let failed = match error {
            Error::UploadFailed(failed) => failed,
            _ => vec![],
        };

        Self {
            message,
            date: valid_date(date),
            failed,
            error: Some(kind),
            ..Self::default()
        }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn too_large(limit: usize) -> Self {
        Self {
            message: format!("Upload body exceeds {} bytes", limit),
            error: Some(ErrorKind::InvalidInput),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub date: String,
    pub images: Vec<String>,
    pub directory_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ListResponse {
    pub fn from_images(date: &DateBucket, images: Vec<String>) -> Self {
        Self {
            success: true,
            date: date.to_string(),
            count: Some(images.len()),
            images,
            directory_exists: true,
            ..Self::default()
        }
    }

    pub fn from_error(date: &str, error: Error) -> Self {
        Self {
            date: valid_date(date),
            directory_exists: matches!(error, Error::Empty(_)),
            message: Some(error.to_string()),
            error: Some(error.kind()),
            ..Self::default()
        }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub folder_count: usize,
    pub folders: Vec<FolderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ReconcileResponse {
    pub fn from_report(report: ReconcileReport) -> Self {
        Self {
            success: true,
            message: "Folder list updated successfully".to_string(),
            folder_count: report.active.len(),
            folders: report.folders,
            error: None,
        }
    }

    pub fn from_error(error: Error) -> Self {
        Self {
            message: error.to_string(),
            error: Some(error.kind()),
            ..Self::default()
        }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Minimal body used when nothing more specific can be produced.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl FailureResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

fn valid_date(input: &str) -> String {
    let input = input.trim();

    if DateBucket::is_valid(input) {
        input.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn list_error_shapes() {
        let missing = serde_json::to_value(ListResponse::from_error(
            "2024-01-01",
            Error::NotFound(Path::new("gallery/2024-01-01").into()),
        ))
        .unwrap();
        assert_eq!(missing["success"], false);
        assert_eq!(missing["directory_exists"], false);
        assert_eq!(missing["date"], "2024-01-01");
        assert_eq!(missing["error"], "not_found");
        assert!(missing.get("count").is_none());

        let empty = serde_json::to_value(ListResponse::from_error(
            "2024-01-01",
            Error::Empty(Path::new("gallery/2024-01-01").into()),
        ))
        .unwrap();
        assert_eq!(empty["directory_exists"], true);
        assert_eq!(empty["images"], serde_json::json!([]));
        assert_eq!(
            empty["message"],
            "No images found in directory: gallery/2024-01-01"
        );
    }

    #[test]
    fn upload_error_omits_invalid_date() {
        let value = serde_json::to_value(UploadResponse::from_error(
            "01-01-2024",
            Error::InvalidDate("01-01-2024".to_string()),
        ))
        .unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["date"], "");
        assert_eq!(value["error"], "invalid_input");
        assert_eq!(value["filePaths"], serde_json::json!([]));
        assert_eq!(
            value["message"],
            "Invalid date format. Expected YYYY-MM-DD, got: 01-01-2024"
        );
    }
}
