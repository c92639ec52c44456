//! Track catalog: metadata and source lookup by media id.
//!
//! The engine never scans anything itself; it is handed a `Catalog` and asks
//! it to resolve ids into `TrackMetadata` and a `SourceLocator` for the
//! decoder. `LibraryCatalog` is the directory-backed implementation.

mod library;
mod model;
mod scan;

pub use library::LibraryCatalog;
pub use model::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
