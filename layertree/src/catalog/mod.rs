use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use itertools::Itertools;
use log::debug;
use serde::Serialize;

pub(crate) use value::midnight;
pub use value::Value;

use crate::error::Error;
use crate::Decoder;

mod value;

/// Column name under which the record's file path is exposed.
pub const FILE_PATH: &str = "filepath";

/// Named values decoded from (or appended to) a single record.
pub type Fields = BTreeMap<String, Value>;

/// One row of the [Catalog]: a raster file and everything known about it.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "filepath")]
    pub file_path: PathBuf,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn new<P: Into<PathBuf>>(file_path: P, fields: Fields) -> Self {
        Self {
            file_path: file_path.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The file name without its extension. This is the name a host shows for the layer.
    pub fn display_name(&self) -> String {
        self.file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Ordered sequence of [Record]s sharing a uniform column set.
///
/// The column set is [FILE_PATH] followed by the union of all record fields. Records missing a
/// column hold [Value::Null] for it.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Catalog {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Catalog {
    /// Decode the file name of every path in `paths` and build a [Catalog] in input order.
    ///
    /// Records whose decoded fields are identical fold into one, as a table merge would. If that
    /// leaves fewer records than input files, [Error::RecordCount] is returned.
    pub fn build<P, D>(paths: &[P], decoder: &D) -> Result<Self>
    where
        P: AsRef<Path>,
        D: Decoder + ?Sized,
    {
        let decoded = paths
            .iter()
            .map(|path| decode_record(path.as_ref(), decoder))
            .collect::<Result<Vec<_>>>()?;
        let records = decoded
            .into_iter()
            .unique_by(|record| record.fields.clone())
            .collect_vec();
        if records.len() != paths.len() {
            return Err(Error::RecordCount {
                expected: paths.len(),
                actual: records.len(),
            }
            .into());
        }
        debug!("built catalog of {} records", records.len());
        Ok(Self::from_records(records))
    }

    /// Assemble a [Catalog] from `records`, filling in [Value::Null] for missing columns.
    pub fn from_records(mut records: Vec<Record>) -> Self {
        let field_columns = records
            .iter()
            .flat_map(|record| record.fields.keys())
            .unique()
            .cloned()
            .collect_vec();
        for record in &mut records {
            for column in &field_columns {
                record.fields.entry(column.clone()).or_default();
            }
        }
        let columns = std::iter::once(FILE_PATH.to_string())
            .chain(field_columns)
            .collect_vec();
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Set column `name` to `values`, one per record in order. An existing column of the same
    /// name is overwritten.
    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.records.len());
        for (record, value) in self.records.iter_mut().zip(values) {
            record.fields.insert(name.to_string(), value);
        }
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }
}

fn decode_record<D: Decoder + ?Sized>(path: &Path, decoder: &D) -> Result<Record> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::Decode {
            file_name: path.to_string_lossy().to_string(),
            reason: "path has no UTF-8 file name".to_string(),
        })?;
    Ok(Record::new(path, decoder.decode(file_name)?))
}
