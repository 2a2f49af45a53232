use super::{
    model::{has_image_extension, storage_name, storage_token},
    DateBucket, Error, IncomingFile, StoredImage,
};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const BUCKET_DIR_SIZE: usize = 64;
const MAX_NAME_ATTEMPTS: u32 = 16;

/// The directory of date-named folders holding uploaded images.
#[derive(Clone, Debug)]
pub struct Store {
    base: PathBuf,
    public_prefix: String,
}

impl Store {
    pub fn new<P: AsRef<Path>, S: AsRef<str>>(base: P, public_prefix: S) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
            public_prefix: public_prefix.as_ref().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn bucket_dir(&self, date: &DateBucket) -> PathBuf {
        self.base.join(date.as_str())
    }

    pub fn public_path(&self, date: &DateBucket, file_name: &str) -> String {
        if self.public_prefix.is_empty() {
            format!("{}/{}", date, file_name)
        } else {
            format!("{}/{}/{}", self.public_prefix, date, file_name)
        }
    }

    /// Create the folder for a date if needed.
    pub fn ensure_bucket(&self, date: &DateBucket) -> Result<PathBuf, Error> {
        let dir = self.bucket_dir(date);
        std::fs::create_dir_all(&dir).map_err(Error::write(&dir))?;

        Ok(dir)
    }

    /// Persist one file under a fresh unique name in the date's folder.
    ///
    /// The folder must already exist.
    pub fn write_image(
        &self,
        date: &DateBucket,
        file: &IncomingFile,
    ) -> Result<StoredImage, std::io::Error> {
        let dir = self.bucket_dir(date);
        let mut attempt = 0;

        loop {
            let token = if attempt == 0 {
                storage_token()
            } else {
                format!("{}{:x}", storage_token(), attempt)
            };
            let storage_name = storage_name(&token, &file.name);
            let path = dir.join(&storage_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut output) => {
                    if let Err(error) = output.write_all(&file.content) {
                        let _ = std::fs::remove_file(&path);
                        return Err(error);
                    }

                    return Ok(StoredImage {
                        name: file.name.clone(),
                        path: self.public_path(date, &storage_name),
                        storage_name,
                    });
                }
                Err(error)
                    if error.kind() == std::io::ErrorKind::AlreadyExists
                        && attempt < MAX_NAME_ATTEMPTS =>
                {
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Public paths of the readable images in a date's folder, ordered by file name.
    pub fn list_images(&self, date: &DateBucket) -> Result<Vec<String>, Error> {
        let dir = self.bucket_dir(date);

        if !dir.is_dir() {
            return Err(Error::NotFound(dir.into_boxed_path()));
        }

        let names = image_file_names(&dir)?;

        if names.is_empty() {
            Err(Error::Empty(dir.into_boxed_path()))
        } else {
            Ok(names
                .iter()
                .map(|name| self.public_path(date, name))
                .collect())
        }
    }

    pub fn buckets(&self) -> BucketIterator {
        BucketIterator::new(&self.base)
    }
}

impl IntoIterator for &Store {
    type Item = Result<BucketDir, Error>;
    type IntoIter = BucketIterator;
    fn into_iter(self) -> Self::IntoIter {
        self.buckets()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BucketDir {
    pub date: DateBucket,
    pub path: PathBuf,
}

impl BucketDir {
    pub fn has_images(&self) -> Result<bool, Error> {
        has_images(&self.path)
    }
}

/// Iterates over date-named folders, newest first.
///
/// Entries that are not directories or whose names are not dates are skipped.
pub struct BucketIterator {
    base: Option<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl BucketIterator {
    fn new(base: &Path) -> Self {
        Self {
            base: Some(base.to_path_buf()),
            dirs: Vec::with_capacity(BUCKET_DIR_SIZE),
        }
    }
}

impl Iterator for BucketIterator {
    type Item = Result<BucketDir, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(next_dir) = self.dirs.pop() {
            match DateBucket::from_dir_name(&next_dir) {
                Some(date) if next_dir.is_dir() => Some(Ok(BucketDir {
                    date,
                    path: next_dir,
                })),
                _ => self.next(),
            }
        } else if let Some(base_dir) = self.base.take() {
            if base_dir.is_dir() {
                read_paths(&base_dir, &mut self.dirs)
                    .map_or_else(|error| Some(Err(error)), |_| self.next())
            } else {
                Some(Err(Error::NotFound(base_dir.into_boxed_path())))
            }
        } else {
            None
        }
    }
}

/// Whether a folder holds at least one file with a recognized image extension.
pub fn has_images<P: AsRef<Path>>(dir: P) -> Result<bool, Error> {
    let dir = dir.as_ref();

    for entry in std::fs::read_dir(dir).map_err(Error::read(dir))? {
        let entry = entry.map_err(Error::read(dir))?;

        if entry.file_type().map(|value| value.is_file()).unwrap_or(false)
            && entry
                .file_name()
                .to_str()
                .map(has_image_extension)
                .unwrap_or(false)
        {
            return Ok(true);
        }
    }

    Ok(false)
}

fn image_file_names(dir: &Path) -> Result<Vec<String>, Error> {
    let mut names = vec![];

    for entry in std::fs::read_dir(dir).map_err(Error::read(dir))? {
        let entry = entry.map_err(Error::read(dir))?;
        let path = entry.path();

        if let Some(name) = entry.file_name().to_str() {
            if has_image_extension(name) && path.is_file() && File::open(&path).is_ok() {
                names.push(name.to_string());
            }
        }
    }

    names.sort();

    Ok(names)
}

fn read_paths(dir: &Path, result: &mut Vec<PathBuf>) -> Result<(), Error> {
    for entry in std::fs::read_dir(dir).map_err(Error::read(dir))? {
        let entry = entry.map_err(Error::read(dir))?;

        result.push(entry.path());
    }

    result.sort();

    Ok(())
}

/// Replace a file's contents through a temporary file in the same directory.
pub(crate) fn replace_file<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<(), Error> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(parent).map_err(Error::write(path))?;

    let mut file = tempfile::NamedTempFile::new_in(parent).map_err(Error::write(path))?;
    file.write_all(contents).map_err(Error::write(path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(Error::write(path))?;
    }

    file.persist(path)
        .map_err(|error| Error::write(path)(error.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> DateBucket {
        value.parse().unwrap()
    }

    #[test]
    fn write_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), "assets/images/gallery/");
        let day = date("2024-01-01");

        store.ensure_bucket(&day).unwrap();
        let first = store
            .write_image(&day, &IncomingFile::new("a b.png", vec![1, 2, 3], None))
            .unwrap();
        let second = store
            .write_image(&day, &IncomingFile::new("a b.png", vec![4], None))
            .unwrap();

        assert_ne!(first.storage_name, second.storage_name);
        assert!(first.storage_name.ends_with("_ab.png"));
        assert_eq!(
            first.path,
            format!("assets/images/gallery/2024-01-01/{}", first.storage_name)
        );
        assert_eq!(
            std::fs::read(dir.path().join("2024-01-01").join(&first.storage_name)).unwrap(),
            vec![1, 2, 3]
        );

        let mut expected = vec![first.path, second.path];
        expected.sort();
        assert_eq!(store.list_images(&day).unwrap(), expected);
    }

    #[test]
    fn list_distinguishes_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path(), "");

        assert!(matches!(
            store.list_images(&date("2024-01-01")),
            Err(Error::NotFound(_))
        ));

        std::fs::create_dir(dir.path().join("2024-01-02")).unwrap();
        std::fs::write(dir.path().join("2024-01-02").join("notes.txt"), "x").unwrap();

        assert!(matches!(
            store.list_images(&date("2024-01-02")),
            Err(Error::Empty(_))
        ));
    }

    #[test]
    fn buckets_skip_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2024-01-01", "2024-03-01", "misc", "2024-1-1"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("2024-02-01"), "not a dir").unwrap();
        std::fs::write(dir.path().join("2024-03-01").join("x.gif"), "x").unwrap();

        let store = Store::new(dir.path(), "");
        let buckets = store.buckets().collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(
            buckets
                .iter()
                .map(|bucket| bucket.date.as_str())
                .collect::<Vec<_>>(),
            vec!["2024-03-01", "2024-01-01"]
        );
        assert!(buckets[0].has_images().unwrap());
        assert!(!buckets[1].has_images().unwrap());
    }

    #[test]
    fn buckets_of_missing_base() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("missing"), "");
        let mut buckets = store.buckets();

        assert!(matches!(buckets.next(), Some(Err(Error::NotFound(_)))));
        assert!(buckets.next().is_none());
    }

    #[test]
    fn replace_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("list.txt");

        replace_file(&path, b"first\n").unwrap();
        replace_file(&path, b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
