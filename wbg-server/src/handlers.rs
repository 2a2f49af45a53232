use super::{
    response::{FailureResponse, ListResponse, ReconcileResponse, UploadResponse},
    AppState,
};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::any::Any;
use std::collections::HashMap;
use wbg_gallery::{parse_date, IncomingFile};

const DATE_FIELD: &str = "date";
const IMAGE_FIELDS: [&str; 2] = ["images", "images[]"];

struct UploadForm {
    date: String,
    files: Vec<IncomingFile>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, MultipartError> {
    let mut date = String::new();
    let mut files = vec![];

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == DATE_FIELD {
            date = field.text().await?;
        } else if IMAGE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let mime_type = field.content_type().map(str::to_string);
            let content = field.bytes().await?;

            // Browsers send an empty, unnamed part when no file was chosen.
            if !file_name.is_empty() {
                files.push(IncomingFile::new(file_name, content.to_vec(), mime_type));
            }
        } else {
            log::debug!("Ignoring form field {}", name);
        }
    }

    Ok(UploadForm { date, files })
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<UploadResponse> {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            log::warn!("Rejected upload: {}", rejection);
            return Json(UploadResponse::failure(format!(
                "Invalid upload request: {}",
                rejection
            )));
        }
    };

    let timeout = state.upload_timeout;

    match tokio::time::timeout(timeout, process_upload(state, multipart)).await {
        Ok(response) => Json(response),
        Err(_) => {
            log::error!("Upload exceeded {} seconds", timeout.as_secs());
            Json(UploadResponse::failure(format!(
                "Upload did not complete within {} seconds",
                timeout.as_secs()
            )))
        }
    }
}

async fn process_upload(state: AppState, multipart: Multipart) -> UploadResponse {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(error) if error.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            log::warn!("Upload rejected: body exceeds {} bytes", state.max_upload_bytes);
            return UploadResponse::too_large(state.max_upload_bytes);
        }
        Err(error) => {
            log::warn!("Failed to read upload form: {}", error);
            return UploadResponse::failure(format!("Failed to read upload: {}", error));
        }
    };

    log::info!(
        "Upload request for {:?} with {} file(s)",
        form.date,
        form.files.len()
    );

    let gallery = state.gallery.clone();
    let date = form.date.clone();

    match tokio::task::spawn_blocking(move || gallery.submit(&date, form.files)).await {
        Ok(Ok(report)) => UploadResponse::from_report(report),
        Ok(Err(error)) => {
            log::warn!("Upload for {:?} failed: {}", form.date, error);
            UploadResponse::from_error(&form.date, error)
        }
        Err(error) => {
            log::error!("Upload task failed: {}", error);
            UploadResponse::failure("Internal error while storing the upload")
        }
    }
}

pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<ListResponse> {
    let input = params.get(DATE_FIELD).cloned().unwrap_or_default();

    let date = match parse_date(&input) {
        Ok(date) => date,
        Err(error) => return Json(ListResponse::from_error(&input, error)),
    };

    let gallery = state.gallery.clone();
    let bucket = date.clone();

    match tokio::task::spawn_blocking(move || gallery.list_images(&bucket)).await {
        Ok(Ok(images)) => Json(ListResponse::from_images(&date, images)),
        Ok(Err(error)) => Json(ListResponse::from_error(&input, error)),
        Err(error) => {
            log::error!("Listing task failed: {}", error);
            Json(ListResponse::failure("Internal error while listing images"))
        }
    }
}

pub async fn update_folder_list(State(state): State<AppState>) -> Json<ReconcileResponse> {
    let gallery = state.gallery.clone();

    match tokio::task::spawn_blocking(move || gallery.reconcile()).await {
        Ok(Ok(report)) => Json(ReconcileResponse::from_report(report)),
        Ok(Err(error)) => {
            log::warn!("Folder index rebuild failed: {}", error);
            Json(ReconcileResponse::from_error(error))
        }
        Err(error) => {
            log::error!("Folder index task failed: {}", error);
            Json(ReconcileResponse::failure(
                "Internal error while rebuilding the folder list",
            ))
        }
    }
}

pub async fn invalid_upload_method(method: Method) -> Json<UploadResponse> {
    Json(UploadResponse::failure(format!(
        "Invalid request method. Expected POST, got {}",
        method
    )))
}

/// Last-resort response for a panicking handler.
pub fn panic_response(error: Box<dyn Any + Send + 'static>) -> Response {
    let detail = error
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| error.downcast_ref::<&str>().copied())
        .unwrap_or("unknown error");

    log::error!("Request handler panicked: {}", detail);

    Json(FailureResponse::new("Internal server error")).into_response()
}
