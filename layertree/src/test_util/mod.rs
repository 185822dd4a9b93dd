use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::catalog::{Fields, Record, Value};
use crate::decoder::Decoder;
use crate::error::Error;
use crate::metadata::{TagReader, Tags};

/// Decodes `<name>_<day>.<ext>` file names into the fields `name` and `day`.
pub struct FakeDecoder;

impl Decoder for FakeDecoder {
    fn decode(&self, file_name: &str) -> Result<Fields> {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        match stem.split_once('_') {
            Some((name, day)) => Ok(Fields::from([
                ("name".to_string(), Value::from(name)),
                ("day".to_string(), Value::from(day)),
            ])),
            None => Err(Error::Decode {
                file_name: file_name.to_string(),
                reason: "expected <name>_<day>".to_string(),
            }
            .into()),
        }
    }
}

/// Serves canned tags per path. Unknown paths fail like an unreadable file would.
#[derive(Default)]
pub struct FakeTagReader {
    tags: HashMap<PathBuf, Tags>,
}

impl FakeTagReader {
    pub fn with<P: Into<PathBuf>>(mut self, path: P, tags: &[(&str, &str)]) -> Self {
        self.tags.insert(
            path.into(),
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }
}

impl TagReader for FakeTagReader {
    fn read_tags(&self, path: &Path) -> Result<Tags> {
        self.tags
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("cannot open {}", path.display()))
    }
}

/// A [Record] whose fields are all [Value::Str].
pub fn record(path: &str, fields: &[(&str, &str)]) -> Record {
    record_with(
        path,
        fields.iter().map(|(k, v)| (*k, Value::from(*v))).collect(),
    )
}

pub fn record_with(path: &str, fields: Vec<(&str, Value)>) -> Record {
    Record::new(
        path,
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}
