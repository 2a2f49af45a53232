use super::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Exclusive advisory lock serializing read-modify-write cycles on the index and catalog files.
///
/// The lock is taken on a separate file, so it works across processes as well as threads.
#[derive(Clone, Debug)]
pub struct UpdateLock {
    path: PathBuf,
}

impl UpdateLock {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` while holding the lock.
    pub fn run<T, F: FnOnce() -> Result<T, Error>>(&self, f: F) -> Result<T, Error> {
        if let Some(parent) = self.path.parent().filter(|value| !value.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(Error::Lock)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.path)
            .map_err(Error::Lock)?;
        let mut lock = fd_lock::RwLock::new(file);
        let _guard = lock.write().map_err(Error::Lock)?;

        log::debug!("Acquired update lock {}", self.path.display());

        f()
    }
}
