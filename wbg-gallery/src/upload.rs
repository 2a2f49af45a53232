use super::{error::ErrorKind, DateBucket, Error, Gallery, IncomingFile, StoredImage};
use serde::Serialize;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FailedFile {
    pub name: String,
    pub reason: String,
}

/// Outcome of an upload that persisted at least one file.
#[derive(Debug)]
pub struct UploadReport {
    pub date: DateBucket,
    /// Persisted files, in upload order.
    pub stored: Vec<StoredImage>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
    /// Set when the files were written but the folder index or catalog could not be updated.
    pub sync_error: Option<Error>,
}

impl UploadReport {
    pub fn paths(&self) -> Vec<String> {
        self.stored.iter().map(|image| image.path.clone()).collect()
    }

    /// The most serious problem encountered, if any.
    pub fn problem(&self) -> Option<ErrorKind> {
        match &self.sync_error {
            Some(error) => Some(error.kind()),
            None if !self.failed.is_empty() => Some(ErrorKind::PartialUploadFailure),
            None => None,
        }
    }
}

/// Check a client-supplied date, ignoring surrounding whitespace.
pub fn parse_date(input: &str) -> Result<DateBucket, Error> {
    let input = input.trim();

    if input.is_empty() {
        Err(Error::MissingDate)
    } else {
        input
            .parse()
            .map_err(|_| Error::InvalidDate(input.to_string()))
    }
}

impl Gallery {
    /// Validate and persist a batch of files for a date, then update the index and catalog.
    ///
    /// Nothing is written unless the date is valid and at least one file passes screening.
    /// Failures after the files are written are reported in [`UploadReport::sync_error`]; the
    /// written files are kept.
    pub fn submit(&self, date: &str, files: Vec<IncomingFile>) -> Result<UploadReport, Error> {
        let date = parse_date(date)?;

        if files.is_empty() {
            return Err(Error::NoFiles);
        }

        let (accepted, rejected): (Vec<_>, Vec<_>) =
            files.into_iter().partition(IncomingFile::is_image);

        let skipped = rejected
            .into_iter()
            .map(|file| {
                log::info!("File {} skipped: not an image", file.name);

                SkippedFile {
                    reason: format!(
                        "not an image ({})",
                        file.mime_type.as_deref().unwrap_or("unknown type")
                    ),
                    name: file.name,
                }
            })
            .collect::<Vec<_>>();

        if accepted.is_empty() {
            return Err(Error::NoValidFiles(skipped.len()));
        }

        self.store.ensure_bucket(&date)?;

        let mut stored = Vec::with_capacity(accepted.len());
        let mut failed = vec![];

        for file in &accepted {
            match self.store.write_image(&date, file) {
                Ok(image) => {
                    log::info!("Stored {} as {}", image.name, image.path);
                    stored.push(image);
                }
                Err(error) => {
                    log::error!("Failed to store {}: {}", file.name, error);
                    failed.push(FailedFile {
                        name: file.name.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        if stored.is_empty() {
            return Err(Error::UploadFailed(failed));
        }

        let paths = stored.iter().map(|image| image.path.clone()).collect();
        let sync_error = self.sync(&date, paths).err();

        if let Some(error) = &sync_error {
            log::error!("Files for {} stored but catalog update failed: {}", date, error);
        }

        Ok(UploadReport {
            date,
            stored,
            skipped,
            failed,
            sync_error,
        })
    }

    fn sync(&self, date: &DateBucket, paths: Vec<String>) -> Result<(), Error> {
        self.lock.run(|| {
            self.index.add_if_absent(&self.store, date)?;
            self.catalog.upsert(date, paths, self.policy)?;
            Ok(())
        })
    }
}
