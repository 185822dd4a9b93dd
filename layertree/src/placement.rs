use std::path::PathBuf;

use anyhow::Result;
use log::{debug, info, warn};

use crate::catalog::{Catalog, Record};
use crate::error::Error;
use crate::group::{GroupPath, GroupTree, Grouping};
use crate::host::Host;
use crate::temporal::{TemporalRange, DEFAULT_WINDOW_DAYS};

/// Style applied to each placed layer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Style {
    /// The same style file for every layer.
    File(PathBuf),
    /// Per-record style file path held in the named column. Records with no value are unstyled.
    Column(String),
}

/// What to do when a record's file does not exist.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub enum MissingFiles {
    /// Fail the run with [Error::FileNotFound].
    #[default]
    Abort,
    /// Warn and continue with the next record.
    Skip,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub grouping: Grouping,
    /// Field holding the timestamp the temporal range is derived from. No range is set when
    /// `None`.
    pub time_field: Option<String>,
    pub window_days: u32,
    pub style: Option<Style>,
    pub missing_files: MissingFiles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grouping: Grouping::default(),
            time_field: None,
            window_days: DEFAULT_WINDOW_DAYS,
            style: None,
            missing_files: MissingFiles::default(),
        }
    }
}

/// Everything needed to place one record, computed up front so that a bad record fails before
/// the host is touched.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Entry {
    pub file_path: PathBuf,
    pub name: String,
    pub group_path: GroupPath,
    pub temporal_range: Option<TemporalRange>,
    pub style: Option<PathBuf>,
}

impl Entry {
    pub fn from_record(record: &Record, config: &Config) -> Result<Self> {
        let temporal_range = config
            .time_field
            .as_ref()
            .map(|field| TemporalRange::for_record(record, field, config.window_days))
            .transpose()?;
        let style = match &config.style {
            None => None,
            Some(Style::File(path)) => Some(path.clone()),
            Some(Style::Column(column)) => record
                .field(column)
                .filter(|value| !value.is_null())
                .map(|value| PathBuf::from(value.to_string())),
        };
        Ok(Self {
            file_path: record.file_path.clone(),
            name: record.display_name(),
            group_path: config.grouping.path_for(record)?,
            temporal_range,
            style,
        })
    }
}

/// Counts reported at the end of a placement run.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct Summary {
    /// Layers created, valid or not.
    pub placed: usize,
    /// Layers the host reported as invalid.
    pub invalid: usize,
    /// Records skipped because their file was missing.
    pub skipped: usize,
}

/// One placement run against a host. Owns the [GroupTree] memo, so groups are shared between
/// records placed by the same [Placer] only.
pub struct Placer<'h, H: Host + ?Sized> {
    host: &'h mut H,
    config: &'h Config,
    groups: GroupTree<H::Group>,
    summary: Summary,
}

impl<'h, H: Host + ?Sized> Placer<'h, H> {
    pub fn new(host: &'h mut H, config: &'h Config) -> Self {
        Self {
            host,
            config,
            groups: GroupTree::default(),
            summary: Summary::default(),
        }
    }

    /// Load `record` as a layer and move it to the top of its leaf group.
    pub fn place(&mut self, record: &Record) -> Result<()> {
        if !record.file_path.exists() {
            match self.config.missing_files {
                MissingFiles::Abort => {
                    return Err(Error::FileNotFound {
                        path: record.file_path.clone(),
                    }
                    .into())
                }
                MissingFiles::Skip => {
                    warn!("File {} does not exist, skipping.", record.file_path.display());
                    self.summary.skipped += 1;
                    return Ok(());
                }
            }
        }

        let entry = Entry::from_record(record, self.config)?;
        let layer = self.host.create_layer(&entry.file_path, &entry.name)?;
        self.summary.placed += 1;
        if !self.host.is_valid(&layer) {
            warn!("Layer not valid: {}", entry.name);
            self.summary.invalid += 1;
        }

        if let Some(range) = &entry.temporal_range {
            self.host.set_temporal_range(&layer, range)?;
        }
        if let Some(style) = &entry.style {
            self.host.load_style(&layer, style)?;
            self.host.repaint(&layer)?;
        }

        if let Some(leaf) = self.groups.resolve(&entry.group_path, &mut *self.host)? {
            let node = self.host.find_node_for(&layer)?;
            self.host.move_node(node, &leaf, 0)?;
            debug!("placed '{}' in '{}'", entry.name, entry.group_path);
        }
        Ok(())
    }

    pub fn finish(self) -> Summary {
        self.summary
    }
}

/// Place every record of `catalog`, in catalog order, with a fresh [Placer].
pub fn place_all<H: Host + ?Sized>(
    catalog: &Catalog,
    config: &Config,
    host: &mut H,
) -> Result<Summary> {
    let mut placer = Placer::new(host, config);
    for record in catalog.iter() {
        placer.place(record)?;
    }
    let summary = placer.finish();
    info!(
        "Layers loaded. placed: {}, invalid: {}, skipped: {}",
        summary.placed, summary.invalid, summary.skipped
    );
    Ok(summary)
}
