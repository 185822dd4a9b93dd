use std::path::PathBuf;

use anyhow::Result;

use crate::input::Input;

/// Input from an explicit list of files. Paths are returned as given; existence is only checked
/// at placement time.
#[derive(Default, Debug, Clone)]
pub struct FileSet {
    files: Vec<PathBuf>,
}

impl FileSet {
    pub fn new<P: Into<PathBuf>>(files: impl IntoIterator<Item = P>) -> Self {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

impl Input for FileSet {
    fn paths(&self) -> Result<Vec<PathBuf>> {
        Ok(self.files.clone())
    }
}
