//! Local file state for a node.
//!
//! The catalog tracks which filenames this node stores and under which
//! slot; the store holds the bytes on disk.

pub mod catalog;
pub mod store;

pub use catalog::{CatalogEntry, FileCatalog};
pub use store::FileStore;
