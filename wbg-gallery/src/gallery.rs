use super::{
    catalog::{Catalog, CatalogFile, CatalogPolicy},
    index::{FolderIndex, ReconcileReport},
    lock::UpdateLock,
    DateBucket, Error, Store,
};
use std::path::PathBuf;
use wbg_cli::LayoutOpts;

const LOCK_FILE_EXTENSION: &str = "lock";

/// The directory store together with the two catalog representations derived from it.
#[derive(Clone, Debug)]
pub struct Gallery {
    pub(crate) store: Store,
    pub(crate) index: FolderIndex,
    pub(crate) catalog: CatalogFile,
    pub(crate) lock: UpdateLock,
    pub(crate) policy: CatalogPolicy,
}

impl Gallery {
    pub fn new(
        store: Store,
        index: FolderIndex,
        catalog: CatalogFile,
        policy: CatalogPolicy,
    ) -> Self {
        let mut lock_path = PathBuf::from(catalog.data_path());
        let lock_name = lock_path
            .file_name()
            .map(|value| format!("{}.{}", value.to_string_lossy(), LOCK_FILE_EXTENSION))
            .unwrap_or_else(|| format!("catalog.{}", LOCK_FILE_EXTENSION));
        lock_path.set_file_name(lock_name);

        Self {
            store,
            index,
            catalog,
            lock: UpdateLock::new(lock_path),
            policy,
        }
    }

    pub fn from_layout(layout: &LayoutOpts) -> Self {
        Self::new(
            Store::new(&layout.root, layout.public_prefix()),
            FolderIndex::new(&layout.folder_list),
            CatalogFile::new(
                &layout.catalog_data,
                &layout.catalog_script,
                layout.catalog_variable.clone(),
            ),
            if layout.append {
                CatalogPolicy::Append
            } else {
                CatalogPolicy::Replace
            },
        )
    }

    pub fn with_policy(mut self, policy: CatalogPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn folder_index(&self) -> &FolderIndex {
        &self.index
    }

    pub fn catalog(&self) -> &CatalogFile {
        &self.catalog
    }

    pub fn policy(&self) -> CatalogPolicy {
        self.policy
    }

    pub fn list_images(&self, date: &DateBucket) -> Result<Vec<String>, Error> {
        self.store.list_images(date)
    }

    /// Rebuild the folder index from the directory store.
    pub fn reconcile(&self) -> Result<ReconcileReport, Error> {
        if !self.store.base().is_dir() {
            return Err(Error::NotFound(self.store.base().to_path_buf().into_boxed_path()));
        }

        let report = self.lock.run(|| self.index.rebuild(&self.store))?;

        log::info!(
            "Folder index rebuilt: {} of {} date folders active",
            report.active.len(),
            report.folders.len()
        );

        Ok(report)
    }

    /// Re-render the catalog script from the data file.
    pub fn render_catalog(&self) -> Result<Catalog, Error> {
        self.lock.run(|| {
            let catalog = self.catalog.load()?;
            self.catalog.write_script(&catalog)?;
            Ok(catalog)
        })
    }

    /// Replace the catalog data with the contents of the current script.
    pub fn import_script(&self) -> Result<Catalog, Error> {
        self.lock.run(|| self.catalog.import_script())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_sits_next_to_catalog_data() {
        let gallery = Gallery::new(
            Store::new("photos", "photos"),
            FolderIndex::new("photos/folder_list.txt"),
            CatalogFile::new("data/catalog.json", "catalog.js", "imageLocations"),
            CatalogPolicy::default(),
        );

        assert_eq!(
            gallery.lock.path(),
            std::path::Path::new("data/catalog.json.lock")
        );
    }

    #[test]
    fn reconcile_requires_root() {
        let dir = tempfile::tempdir().unwrap();
        let gallery = Gallery::new(
            Store::new(dir.path().join("missing"), ""),
            FolderIndex::new(dir.path().join("missing").join("folder_list.txt")),
            CatalogFile::new(dir.path().join("c.json"), dir.path().join("c.js"), "x"),
            CatalogPolicy::default(),
        );

        assert!(matches!(gallery.reconcile(), Err(Error::NotFound(_))));
        assert!(!dir.path().join("missing").exists());
    }
}
