use std::path::Path;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::catalog::{midnight, Fields, Value};
use crate::error::Error;
use crate::Decoder;

/// Naming convention that splits the file stem by a delimiter into a fixed, ordered list of
/// fields.
///
/// Empty parts decode to [Value::Null]. The number of parts must match the number of fields.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Delimited {
    pub delimiter: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
}

#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Str,
    Int,
    /// A timestamp in the given `strftime` format. Date-only formats resolve to midnight.
    DateTime { format: String },
}

impl Delimited {
    pub fn new(delimiter: impl ToString, fields: Vec<FieldDef>) -> Self {
        Self {
            delimiter: delimiter.to_string(),
            fields,
        }
    }
}

impl FieldDef {
    pub fn new(name: impl ToString, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

impl Decoder for Delimited {
    fn decode(&self, file_name: &str) -> Result<Fields> {
        let decode_err = |reason: String| Error::Decode {
            file_name: file_name.to_string(),
            reason,
        };
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(file_name);
        let parts = stem.split(self.delimiter.as_str()).collect::<Vec<_>>();
        if parts.len() != self.fields.len() {
            return Err(decode_err(format!(
                "expected {} '{}'-delimited fields but found {}",
                self.fields.len(),
                self.delimiter,
                parts.len()
            ))
            .into());
        }

        let mut fields = Fields::new();
        for (def, part) in self.fields.iter().zip(parts) {
            let value = def
                .kind
                .parse(part)
                .map_err(|reason| decode_err(format!("field '{}': {}", def.name, reason)))?;
            fields.insert(def.name.clone(), value);
        }
        Ok(fields)
    }
}

impl FieldKind {
    fn parse(&self, part: &str) -> Result<Value, String> {
        if part.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            FieldKind::Str => Ok(Value::from(part)),
            FieldKind::Int => part
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|err| format!("'{}' is not an integer ({})", part, err)),
            FieldKind::DateTime { format } => NaiveDateTime::parse_from_str(part, format)
                .or_else(|_| NaiveDate::parse_from_str(part, format).map(midnight))
                .map(Value::DateTime)
                .map_err(|err| format!("'{}' does not match '{}' ({})", part, format, err)),
        }
    }
}
