use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};

use layertree::decoder::Delimited;
use layertree::group::{Derivation, Derivations, Grouping, DAY, DAY_FORMAT};
use layertree::placement::{self, MissingFiles, Style};
use layertree::temporal::DEFAULT_WINDOW_DAYS;
use layertree::Decoder;

const DEFAULT_DAY_SOURCE: &str = "datetime_1";

#[derive(Parser, Debug)]
#[command(name = "layertree", author, about)]
pub struct Config {
    /// Root directory of the data tree, laid out as `root/{version}/{grid}/{tile}/*.{extension}`.
    #[arg(short, long)]
    pub root: PathBuf,

    /// Grid name, i.e. the directory directly below each version.
    #[arg(short, long)]
    pub grid: String,

    /// Version directory glob. Repeatable. Defaults to all versions.
    ///
    /// If running in a unix-style shell, you'll need to enclose globs inside '' or they will be
    /// expanded by the shell itself.
    #[arg(long = "version", value_name = "GLOB")]
    pub versions: Vec<String>,

    /// Tile directory glob. Repeatable. Defaults to all tiles.
    #[arg(short, long = "tile", value_name = "GLOB")]
    pub tiles: Vec<String>,

    #[arg(long, default_value = "tif")]
    pub extension: String,

    /// File naming convention used to decode file names into catalog columns.
    #[arg(short, long, default_value = "yeoda")]
    pub decoder: DecoderName,

    /// Path to a [layertree::decoder::Delimited] convention in json format. Required for
    /// `--decoder delimited`.
    #[arg(long)]
    pub decoder_config: Option<PathBuf>,

    /// Metadata tag to add as a catalog column. Repeatable.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Grouping attribute, outermost first. Repeatable. Without any, layers stay at the root.
    #[arg(long, value_name = "ATTR")]
    pub group_by: Vec<String>,

    /// Derived grouping attribute in the form `name=source:format`, where `format` is a strftime
    /// format applied to the timestamp in column `source`. Repeatable.
    ///
    /// `day=datetime_1:%Y-%m-%d` is always registered unless overridden.
    ///
    /// Example:
    ///     --derive month=datetime_1:%Y-%m --group-by grid_name --group-by month
    #[arg(long = "derive", value_name = "NAME=SOURCE:FORMAT", value_parser = parse_derivation)]
    pub derivations: Vec<NamedDerivation>,

    /// Column holding the timestamp each layer's temporal range starts from.
    #[arg(long)]
    pub time_field: Option<String>,

    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,

    /// Style file applied to every layer.
    #[arg(long, conflicts_with = "style_column")]
    pub style: Option<PathBuf>,

    /// Column holding a per-layer style file path.
    #[arg(long)]
    pub style_column: Option<String>,

    /// Warn about and skip missing files instead of failing.
    #[arg(long)]
    pub skip_missing: bool,

    /// How to print the resulting layer tree.
    #[arg(short, long, default_value = "tree")]
    pub format: Format,

    /// Print the catalog as json and stop before placing anything.
    #[arg(long)]
    pub catalog: bool,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecoderName {
    Yeoda,
    Delimited,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    Tree,
    Json,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamedDerivation {
    pub name: String,
    pub derivation: Derivation,
}

fn parse_derivation(arg: &str) -> Result<NamedDerivation> {
    let err = || anyhow!("derivation must be in the form '<name>=<source>:<format>'");
    let (name, rule) = arg.split_once('=').ok_or_else(err)?;
    let (source, format) = rule.split_once(':').ok_or_else(err)?;
    if name.is_empty() || source.is_empty() || format.is_empty() {
        return Err(err());
    }
    let derivation = Derivation::new(source, format);
    derivation.check_format()?;
    Ok(NamedDerivation {
        name: name.to_string(),
        derivation,
    })
}

impl DecoderName {
    pub fn create_impl(&self, config: Option<&Path>) -> Result<Box<dyn Decoder>> {
        match self {
            DecoderName::Yeoda => Ok(Box::new(yeoda::Yeoda)),
            DecoderName::Delimited => {
                let path =
                    config.ok_or_else(|| anyhow!("--decoder delimited requires --decoder-config"))?;
                let file = File::open(path).context("read decoder config")?;
                let reader = BufReader::new(file);
                let convention: Delimited = serde_json::from_reader(reader)?;
                Ok(Box::new(convention))
            }
        }
    }
}

impl Config {
    pub fn placement_config(&self) -> placement::Config {
        let mut derivations = Derivations::default().with(
            DAY,
            Derivation::new(DEFAULT_DAY_SOURCE, DAY_FORMAT),
        );
        for named in &self.derivations {
            derivations.insert(&named.name, named.derivation.clone());
        }
        let style = match (&self.style, &self.style_column) {
            (Some(path), _) => Some(Style::File(path.clone())),
            (None, Some(column)) => Some(Style::Column(column.clone())),
            (None, None) => None,
        };
        placement::Config {
            grouping: Grouping::new(&self.group_by, derivations),
            time_field: self.time_field.clone(),
            window_days: self.window_days,
            style,
            missing_files: if self.skip_missing {
                MissingFiles::Skip
            } else {
                MissingFiles::Abort
            },
        }
    }
}
