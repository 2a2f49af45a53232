//! Date-bucketed image uploads for the gallery slideshow.
//!
//! Images live in a [`Store`] of `YYYY-MM-DD` folders. Two files are derived from it: the
//! [`FolderIndex`], listing the dates that have images, and the catalog ([`CatalogFile`]),
//! mapping each date to its image paths for the slideshow page. [`Gallery`] ties the three
//! together and coordinates uploads and reconciliation.

pub mod catalog;
pub mod error;
pub mod gallery;
pub mod index;
pub mod lock;
pub mod model;
pub mod store;
pub mod upload;

pub use catalog::{Catalog, CatalogFile, CatalogPolicy};
pub use error::{Error, ErrorKind};
pub use gallery::Gallery;
pub use index::{FolderIndex, FolderStatus, ReconcileReport};
pub use model::{DateBucket, IncomingFile, StoredImage};
pub use store::Store;
pub use upload::{parse_date, FailedFile, SkippedFile, UploadReport};
