use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use log::debug;

pub use geotiff::TiffTags;

use crate::catalog::{Catalog, Value};
use crate::error::Error;

mod geotiff;

/// Metadata tags of a single raster file.
pub type Tags = HashMap<String, String>;

/// Reads the metadata tags of a raster file. Each call opens the file, reads all tags and closes
/// it again before returning.
pub trait TagReader {
    fn read_tags(&self, path: &Path) -> Result<Tags>;
}

impl<R: TagReader + ?Sized> TagReader for Box<R> {
    fn read_tags(&self, path: &Path) -> Result<Tags> {
        (**self).read_tags(path)
    }
}

/// Add a column named `tag` to `catalog` holding the value of that metadata tag for every
/// record.
///
/// All files are read before the catalog is touched: if any file lacks the tag,
/// [Error::MissingTag] is returned and `catalog` is left unchanged.
pub fn augment<R: TagReader + ?Sized>(catalog: &mut Catalog, tag: &str, reader: &R) -> Result<()> {
    let mut values = Vec::with_capacity(catalog.len());
    for record in catalog.iter() {
        let mut tags = reader.read_tags(&record.file_path)?;
        let value = tags.remove(tag).ok_or_else(|| Error::MissingTag {
            tag: tag.to_string(),
            path: record.file_path.clone(),
        })?;
        values.push(Value::Str(value));
    }
    debug!("augmenting catalog with tag '{}'", tag);
    catalog.set_column(tag, values);
    Ok(())
}
