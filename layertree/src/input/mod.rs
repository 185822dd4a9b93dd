use std::path::PathBuf;

use anyhow::Result;

mod file_set;
mod scan;

pub use file_set::FileSet;
pub use scan::Scan;

/// An [Input] supplies the raster files that make up a [crate::Catalog].
///
/// The order of the returned paths becomes the catalog order. It must be deterministic for a
/// given file system state but carries no further meaning downstream.
pub trait Input {
    fn paths(&self) -> Result<Vec<PathBuf>>;
}
