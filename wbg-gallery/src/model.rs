use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::path::Path;
use std::str::FromStr;

/// Extensions (lower-case) recognized as gallery images when scanning folders.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

const GENERIC_MIME_TYPE: &str = "application/octet-stream";

lazy_static::lazy_static! {
    static ref DATE_BUCKET_RE: regex::Regex =
        regex::Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
    static ref UNSAFE_FILE_NAME_CHARS_RE: regex::Regex =
        regex::Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
#[error("Invalid date format. Expected YYYY-MM-DD, got: {0}")]
pub struct InvalidDateBucket(pub String);

/// A `YYYY-MM-DD` partition key.
///
/// Only the shape is checked, so values like `2024-13-40` are accepted. Because every field has a
/// fixed width, the derived lexicographic ordering is also chronological.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateBucket(String);

impl DateBucket {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(value: &str) -> bool {
        DATE_BUCKET_RE.is_match(value)
    }

    /// Parse the final component of a path as a date bucket.
    pub fn from_dir_name<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .file_name()
            .and_then(|value| value.to_str())
            .and_then(|value| value.parse().ok())
    }
}

impl std::fmt::Display for DateBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DateBucket {
    type Err = InvalidDateBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidDateBucket(s.to_string()))
        }
    }
}

impl TryFrom<String> for DateBucket {
    type Error = InvalidDateBucket;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidDateBucket(value))
        }
    }
}

impl From<DateBucket> for String {
    fn from(value: DateBucket) -> Self {
        value.0
    }
}

impl AsRef<str> for DateBucket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A file received from a client, before screening.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IncomingFile {
    pub name: String,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
}

impl IncomingFile {
    pub fn new<N: Into<String>>(name: N, content: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            content,
            mime_type,
        }
    }

    /// Decide whether the file is accepted as an image.
    ///
    /// A declared `image/*` type is accepted outright. When the client declared nothing useful
    /// (no type, or the generic octet-stream type), we fall back to the extension.
    pub fn is_image(&self) -> bool {
        match self.mime_type.as_deref().map(str::trim) {
            Some(mime_type) if mime_type.starts_with("image/") => true,
            None | Some("") | Some(GENERIC_MIME_TYPE) => has_image_extension(&self.name),
            Some(_) => false,
        }
    }
}

/// A persisted upload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StoredImage {
    /// Name the client supplied.
    pub name: String,
    /// Public path, rooted at the store's public prefix.
    pub path: String,
    #[serde(skip)]
    pub storage_name: String,
}

pub fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
}

pub fn has_image_extension(file_name: &str) -> bool {
    extension(file_name)
        .map(|value| IMAGE_EXTENSIONS.contains(&value.as_str()))
        .unwrap_or(false)
}

pub fn mime_type_for_extension(file_name: &str) -> Option<&'static str> {
    match extension(file_name)?.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Strip everything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    UNSAFE_FILE_NAME_CHARS_RE.replace_all(name, "").into_owned()
}

/// Time-based token in the style of seconds and microseconds as hex (13 characters).
pub fn storage_token() -> String {
    let now = Utc::now();

    format!(
        "{:08x}{:05x}",
        now.timestamp(),
        now.timestamp_subsec_micros()
    )
}

pub fn storage_name(token: &str, original_name: &str) -> String {
    format!("{}_{}", token, sanitize_file_name(original_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_bucket_checks_shape_only() {
        assert!("2024-01-01".parse::<DateBucket>().is_ok());
        assert!("2024-13-40".parse::<DateBucket>().is_ok());
        assert!("01-01-2024".parse::<DateBucket>().is_err());
        assert!("2024-1-01".parse::<DateBucket>().is_err());
        assert!(" 2024-01-01".parse::<DateBucket>().is_err());
        assert!("2024-01-01\n".parse::<DateBucket>().is_err());
        // Non-ASCII digits are rejected.
        assert!("２０２４-01-01".parse::<DateBucket>().is_err());
    }

    #[test]
    fn date_buckets_sort_chronologically() {
        let mut values = vec!["2023-12-31", "2024-02-01", "2024-01-15"]
            .into_iter()
            .map(|value| value.parse::<DateBucket>().unwrap())
            .collect::<Vec<_>>();
        values.sort();

        assert_eq!(
            values.iter().map(DateBucket::as_str).collect::<Vec<_>>(),
            vec!["2023-12-31", "2024-01-15", "2024-02-01"]
        );
    }

    #[test]
    fn screening() {
        let png = IncomingFile::new("a.png", vec![1], Some("image/png".to_string()));
        let txt = IncomingFile::new("b.txt", vec![1], Some("text/plain".to_string()));
        let unlabeled = IncomingFile::new("c.JPG", vec![1], None);
        let generic = IncomingFile::new("d.webp", vec![1], Some(GENERIC_MIME_TYPE.to_string()));
        let generic_text = IncomingFile::new("e.txt", vec![1], Some(GENERIC_MIME_TYPE.to_string()));
        let mislabeled = IncomingFile::new("f.png", vec![1], Some("text/plain".to_string()));

        assert!(png.is_image());
        assert!(!txt.is_image());
        assert!(unlabeled.is_image());
        assert!(generic.is_image());
        assert!(!generic_text.is_image());
        assert!(!mislabeled.is_image());
    }

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_file_name("my photo (1).JPG"), "myphoto1.JPG");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_file_name("a_b-c.png"), "a_b-c.png");
    }

    #[test]
    fn storage_names_are_prefixed_with_token() {
        let token = storage_token();
        assert_eq!(token.len(), 13);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            storage_name(&token, "sunset 1.png"),
            format!("{}_sunset1.png", token)
        );
    }

    #[test]
    fn extensions() {
        assert!(has_image_extension("x.SVG"));
        assert!(!has_image_extension("x.heic"));
        assert!(!has_image_extension("png"));
        assert_eq!(mime_type_for_extension("x.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_type_for_extension("x.txt"), None);
    }
}
