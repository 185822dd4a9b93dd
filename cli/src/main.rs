use anyhow::Result;
use clap::Parser;
use log::info;

use layertree::host::Buffer;
use layertree::input::Scan;
use layertree::{Decoder, Executor};

use crate::config::{Config, Format};

mod config;

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::parse();
    let exe = executor(&config)?;

    if config.catalog {
        let catalog = exe.catalog()?;
        println!("{}", serde_json::to_string_pretty(catalog.records())?);
        return Ok(());
    }

    let mut host = Buffer::default();
    let summary = exe.execute(&mut host)?;
    info!("{:?}", summary);
    match config.format {
        Format::Tree => print!("{}", host),
        Format::Json => println!("{}", serde_json::to_string_pretty(&host.tree())?),
    }
    Ok(())
}

fn input(config: &Config) -> Scan {
    Scan::new(&config.root, &config.grid)
        .versions(&config.versions)
        .tiles(&config.tiles)
        .extension(&config.extension)
}

fn executor(config: &Config) -> Result<Executor<Scan, Box<dyn Decoder>>> {
    let decoder = config
        .decoder
        .create_impl(config.decoder_config.as_deref())?;
    let exe = config
        .tags
        .iter()
        .fold(Executor::new(input(config), decoder), |exe, tag| exe.tag(tag));
    Ok(exe.placement_config(config.placement_config()))
}
