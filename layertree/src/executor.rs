use anyhow::{anyhow, Result};
use itertools::Itertools;
use log::{debug, info};

use crate::catalog::Catalog;
use crate::decoder::Decoder;
use crate::host::Host;
use crate::input::Input;
use crate::metadata::{augment, TagReader, TiffTags};
use crate::placement::{place_all, Config, Style, Summary};

/// Runs the whole pipeline: input files -> decoded [Catalog] -> metadata columns -> placement
/// into a [Host].
pub struct Executor<I: Input, D: Decoder> {
    input: I,
    decoder: D,
    tags: Vec<String>,
    tag_reader: Box<dyn TagReader>,
    placement_config: Config,
}

impl<I: Input, D: Decoder> Executor<I, D> {
    pub fn new(input: I, decoder: D) -> Self {
        Self {
            input,
            decoder,
            tags: vec![],
            tag_reader: Box::new(TiffTags),
            placement_config: Config::default(),
        }
    }

    /// Add a catalog column holding metadata tag `name` of every file.
    pub fn tag(mut self, name: impl ToString) -> Self {
        self.tags.push(name.to_string());
        self
    }

    /// Replace the default [TiffTags] reader.
    pub fn tag_reader(mut self, reader: impl TagReader + 'static) -> Self {
        self.tag_reader = Box::new(reader);
        self
    }

    pub fn placement_config(mut self, config: Config) -> Self {
        self.placement_config = config;
        self
    }

    /// Scan, decode and augment. No host is involved.
    pub fn catalog(&self) -> Result<Catalog> {
        info!("Scanning...");
        let paths = self.input.paths()?;
        debug!("found {} files", paths.len());

        info!("Building catalog...");
        let mut catalog = Catalog::build(&paths, &self.decoder)?;
        for tag in &self.tags {
            info!("Reading metadata tag '{}'...", tag);
            augment(&mut catalog, tag, &self.tag_reader)?;
        }
        Ok(catalog)
    }

    pub fn execute<H: Host + ?Sized>(&self, host: &mut H) -> Result<Summary> {
        let catalog = self.catalog()?;
        debug!("Placement Config: {:#?}", self.placement_config);

        info!("Validating placement config...");
        let errors = validate(&catalog, &self.placement_config);
        if !errors.is_empty() {
            return Err(anyhow!(
                "Placement config validation failed.\n{}",
                errors.iter().map(|e| format!(" - {}", e)).join("\n")
            ));
        }

        info!("Placing {} layers...", catalog.len());
        place_all(&catalog, &self.placement_config, host)
    }
}

/// Every attribute, field and column `config` refers to, checked against the columns of
/// `catalog`.
fn validate(catalog: &Catalog, config: &Config) -> Vec<String> {
    let mut errors = vec![];
    let grouping = &config.grouping;
    for attr in &grouping.attrs {
        match grouping.derivations.get(attr) {
            Some(derivation) => {
                if !catalog.has_column(&derivation.source) {
                    errors.push(format!(
                        "derived attribute '{}' reads unknown column '{}'",
                        attr, derivation.source
                    ));
                }
                if let Err(err) = derivation.check_format() {
                    errors.push(format!("derived attribute '{}': {}", attr, err));
                }
            }
            None => {
                if !catalog.has_column(attr) {
                    errors.push(format!(
                        "grouping attribute '{}' is neither a catalog column nor a derived attribute",
                        attr
                    ));
                }
            }
        }
    }
    if let Some(field) = &config.time_field {
        if !catalog.has_column(field) {
            errors.push(format!("time field '{}' is not a catalog column", field));
        }
    }
    if let Some(Style::Column(column)) = &config.style {
        if !catalog.has_column(column) {
            errors.push(format!("style column '{}' is not a catalog column", column));
        }
    }
    errors
}
