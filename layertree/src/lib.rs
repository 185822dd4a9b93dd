pub use catalog::{Catalog, Record, Value};
pub use decoder::Decoder;
pub use executor::Executor;
pub use host::Host;
pub use input::Input;
pub use metadata::TagReader;

pub mod catalog;
pub mod decoder;
pub mod error;
pub mod executor;
pub mod group;
pub mod host;
pub mod input;
pub mod metadata;
pub mod placement;
pub mod temporal;

#[cfg(test)]
mod test_util;
