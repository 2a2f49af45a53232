use super::{store::replace_file, DateBucket, Error, Store};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const EMPTY_FOLDER_NOTE: &str = "Directory exists but contains no images";

/// Plain-text list of active dates, newest first, one per line.
#[derive(Clone, Debug)]
pub struct FolderIndex {
    path: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FolderStatus {
    pub name: DateBucket,
    pub has_images: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReconcileReport {
    /// Every date-named folder found, newest first.
    pub folders: Vec<FolderStatus>,
    /// The dates written to the index.
    pub active: Vec<DateBucket>,
}

impl FolderIndex {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw entries, skipping blank lines. A missing file is an empty index.
    pub fn read(&self) -> Result<Vec<String>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(error) => Err(Error::read(&self.path)(error)),
        }
    }

    /// Add a date, dropping entries whose folders have disappeared.
    pub fn add_if_absent(
        &self,
        store: &Store,
        date: &DateBucket,
    ) -> Result<Vec<DateBucket>, Error> {
        let mut dates = self
            .read()?
            .into_iter()
            .filter_map(|line| line.parse::<DateBucket>().ok())
            .filter(|existing| store.bucket_dir(existing).is_dir())
            .collect::<Vec<_>>();

        dates.push(date.clone());
        self.write(dates)
    }

    /// Rebuild the index from the folders that actually hold images.
    pub fn rebuild(&self, store: &Store) -> Result<ReconcileReport, Error> {
        let mut folders = vec![];
        let mut active = vec![];

        for bucket in store {
            let bucket = bucket?;
            let has_images = bucket.has_images()?;

            if has_images {
                active.push(bucket.date.clone());
            } else {
                log::info!("Skipping {}: no images", bucket.path.display());
            }

            folders.push(FolderStatus {
                name: bucket.date,
                has_images,
                note: if has_images {
                    None
                } else {
                    Some(EMPTY_FOLDER_NOTE)
                },
            });
        }

        let active = self.write(active)?;

        Ok(ReconcileReport { folders, active })
    }

    fn write(&self, mut dates: Vec<DateBucket>) -> Result<Vec<DateBucket>, Error> {
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();

        let mut contents = dates
            .iter()
            .map(DateBucket::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        contents.push('\n');

        replace_file(&self.path, contents.as_bytes())?;

        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, Store, FolderIndex) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), "");
        let index = FolderIndex::new(dir.path().join("folder_list.txt"));
        (dir, store, index)
    }

    fn date(value: &str) -> DateBucket {
        value.parse().unwrap()
    }

    #[test]
    fn add_if_absent_heals_and_sorts() {
        let (dir, store, index) = setup();
        std::fs::create_dir(dir.path().join("2024-01-01")).unwrap();
        std::fs::create_dir(dir.path().join("2024-03-01")).unwrap();
        std::fs::write(
            index.path(),
            "2024-01-01\n\n2023-05-05\n2024-03-01\n2024-01-01\n",
        )
        .unwrap();

        std::fs::create_dir(dir.path().join("2024-02-01")).unwrap();
        let dates = index.add_if_absent(&store, &date("2024-02-01")).unwrap();

        assert_eq!(
            dates,
            vec![date("2024-03-01"), date("2024-02-01"), date("2024-01-01")]
        );
        assert_eq!(
            std::fs::read_to_string(index.path()).unwrap(),
            "2024-03-01\n2024-02-01\n2024-01-01\n"
        );

        // Adding again leaves the file unchanged.
        index.add_if_absent(&store, &date("2024-02-01")).unwrap();
        assert_eq!(
            std::fs::read_to_string(index.path()).unwrap(),
            "2024-03-01\n2024-02-01\n2024-01-01\n"
        );
    }

    #[test]
    fn add_if_absent_creates_file() {
        let (_dir, store, index) = setup();
        index.add_if_absent(&store, &date("2024-01-01")).unwrap();

        assert_eq!(std::fs::read_to_string(index.path()).unwrap(), "2024-01-01\n");
    }

    #[test]
    fn rebuild_excludes_empty_folders() {
        let (dir, store, index) = setup();
        for name in ["2024-01-01", "2024-02-01", "2024-03-01", "other"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("2024-01-01").join("a.PNG"), "x").unwrap();
        std::fs::write(dir.path().join("2024-02-01").join("a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("2024-03-01").join("b.webp"), "x").unwrap();
        std::fs::write(dir.path().join("other").join("c.png"), "x").unwrap();
        std::fs::write(index.path(), "2025-01-01\n").unwrap();

        let report = index.rebuild(&store).unwrap();

        assert_eq!(report.active, vec![date("2024-03-01"), date("2024-01-01")]);
        assert_eq!(
            report.folders[1],
            FolderStatus {
                name: date("2024-02-01"),
                has_images: false,
                note: Some(EMPTY_FOLDER_NOTE),
            }
        );
        assert_eq!(
            std::fs::read_to_string(index.path()).unwrap(),
            "2024-03-01\n2024-01-01\n"
        );
    }

    #[test]
    fn rebuild_is_idempotent() {
        let (dir, store, index) = setup();
        std::fs::create_dir(dir.path().join("2024-01-01")).unwrap();
        std::fs::write(dir.path().join("2024-01-01").join("a.jpg"), "x").unwrap();

        let first_report = index.rebuild(&store).unwrap();
        let first = std::fs::read(index.path()).unwrap();
        let second_report = index.rebuild(&store).unwrap();
        let second = std::fs::read(index.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_report, second_report);
    }

    #[test]
    fn rebuild_of_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("missing"), "");
        let index = FolderIndex::new(dir.path().join("folder_list.txt"));

        assert!(matches!(index.rebuild(&store), Err(Error::NotFound(_))));
        assert!(!index.path().exists());
    }
}
