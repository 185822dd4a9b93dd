use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::metadata::{TagReader, Tags};

/// Baseline ASCII tags, reported under the names GDAL gives them.
const ASCII_TAGS: &[(u16, &str)] = &[
    (269, "TIFFTAG_DOCUMENTNAME"),
    (270, "TIFFTAG_IMAGEDESCRIPTION"),
    (305, "TIFFTAG_SOFTWARE"),
    (306, "TIFFTAG_DATETIME"),
    (315, "TIFFTAG_ARTIST"),
    (316, "TIFFTAG_HOSTCOMPUTER"),
    (33432, "TIFFTAG_COPYRIGHT"),
];

/// Private tag in which GDAL stores its metadata as XML.
const GDAL_METADATA: u16 = 42112;

/// [TagReader] for (Geo)TIFF files.
///
/// Reports the baseline ASCII tags of the first image and the dataset-level items of the
/// `GDAL_METADATA` tag, i.e. what GDAL lists for the default metadata domain.
#[derive(Default, Debug, Clone, Copy)]
pub struct TiffTags;

impl TagReader for TiffTags {
    fn read_tags(&self, path: &Path) -> Result<Tags> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open raster for read: {}", path.display()))?;
        let mut decoder = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to read TIFF header: {}", path.display()))?;

        let mut tags = Tags::new();
        for (code, name) in ASCII_TAGS {
            if let Some(value) = decoder.find_tag(Tag::from_u16_exhaustive(*code))? {
                if let Ok(value) = value.into_string() {
                    tags.insert(name.to_string(), trim_nul(&value));
                }
            }
        }
        if let Some(value) = decoder.find_tag(Tag::from_u16_exhaustive(GDAL_METADATA))? {
            let xml = value
                .into_string()
                .with_context(|| format!("GDAL_METADATA is not text: {}", path.display()))?;
            tags.extend(gdal_metadata_items(&trim_nul(&xml))?);
        }
        Ok(tags)
    }
}

fn trim_nul(s: &str) -> String {
    s.trim_end_matches('\0').to_string()
}

/// Dataset-level `<Item name="...">value</Item>` entries of a `<GDALMetadata>` document. Items
/// bound to a band (`sample`), to a named `domain`, or carrying a `role` are skipped.
fn gdal_metadata_items(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<String> = None;
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"Item" => {
                current = dataset_item_name(&e)?;
                text.clear();
            }
            Event::Empty(e) if e.name().as_ref() == b"Item" => {
                if let Some(name) = dataset_item_name(&e)? {
                    items.push((name, String::new()));
                }
            }
            Event::Text(t) => {
                if current.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) if e.name().as_ref() == b"Item" => {
                if let Some(name) = current.take() {
                    items.push((name, text.trim().to_string()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(items)
}

fn dataset_item_name(e: &BytesStart) -> Result<Option<String>> {
    let mut name = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"name" => name = Some(attr.unescape_value()?.to_string()),
            b"sample" | b"domain" | b"role" => return Ok(None),
            _ => {}
        }
    }
    Ok(name)
}
