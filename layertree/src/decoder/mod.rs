use anyhow::Result;

pub use delimited::{Delimited, FieldDef, FieldKind};

use crate::catalog::Fields;

pub mod delimited;

/// A [Decoder] implements one file naming convention: it turns a file name into the named
/// [crate::catalog::Value]s encoded in it.
///
/// Decoding must not have side effects. A name that does not follow the convention's grammar
/// fails with [crate::error::Error::Decode].
pub trait Decoder {
    fn decode(&self, file_name: &str) -> Result<Fields>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn decode(&self, file_name: &str) -> Result<Fields> {
        (**self).decode(file_name)
    }
}
