use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use globset::GlobBuilder;
use log::debug;
use walkdir::WalkDir;

use crate::input::Input;

const WILDCARD: &str = "*";
const DEFAULT_EXTENSION: &str = "tif";

/// Input from a data tree laid out as `root/{version}/{grid_name}/{tile}/*.{extension}`.
///
/// `version` and `tile` are glob patterns, each defaulting to `*`. Within a pattern `*` never
/// crosses a directory boundary.
#[derive(Debug, Clone)]
pub struct Scan {
    root: PathBuf,
    grid_name: String,
    versions: Vec<String>,
    tiles: Vec<String>,
    extension: String,
}

impl Scan {
    pub fn new<P: Into<PathBuf>>(root: P, grid_name: impl ToString) -> Self {
        Self {
            root: root.into(),
            grid_name: grid_name.to_string(),
            versions: vec![WILDCARD.to_string()],
            tiles: vec![WILDCARD.to_string()],
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Version patterns to scan. An empty list keeps the `*` default.
    pub fn versions<S: ToString>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.versions = patterns_or_wildcard(patterns);
        self
    }

    /// Tile patterns to scan. An empty list keeps the `*` default.
    pub fn tiles<S: ToString>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.tiles = patterns_or_wildcard(patterns);
        self
    }

    /// File extension without the leading dot.
    pub fn extension(mut self, extension: impl ToString) -> Self {
        self.extension = extension.to_string().trim_start_matches('.').to_string();
        self
    }
}

impl Input for Scan {
    /// Files are ordered by version pattern, then tile pattern, then by file name within the
    /// walk.
    fn paths(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(anyhow!(
                "scan root '{}' is not a directory",
                self.root.display()
            ));
        }
        let mut paths = Vec::new();
        for version in &self.versions {
            for tile in &self.tiles {
                let glob = format!(
                    "{}/{}/{}/*.{}",
                    version, self.grid_name, tile, self.extension
                );
                let found = walk_glob(&self.root, &glob)?;
                debug!("'{}' matched {} files", glob, found.len());
                paths.extend(found);
            }
        }
        Ok(paths)
    }
}

fn patterns_or_wildcard<S: ToString>(patterns: impl IntoIterator<Item = S>) -> Vec<String> {
    let patterns = patterns
        .into_iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>();
    if patterns.is_empty() {
        vec![WILDCARD.to_string()]
    } else {
        patterns
    }
}

/// All files exactly four levels below `root` whose root-relative path matches `glob`.
fn walk_glob(root: &Path, glob: &str) -> Result<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(glob)
        .literal_separator(true)
        .build()?
        .compile_matcher();
    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(4)
        .max_depth(4)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        if !matcher.is_match(entry.path().strip_prefix(root)?) {
            continue;
        }
        paths.push(entry.into_path());
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::fs::File;
    use std::path::Path;

    use anyhow::Result;
    use itertools::Itertools;
    use tempfile::tempdir;

    use crate::input::{Input, Scan};

    fn create_files(root: &Path, files: &[&str]) -> Result<()> {
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap())?;
            File::create(path)?;
        }
        Ok(())
    }

    fn relative(root: &Path, scan: Scan) -> Result<Vec<String>> {
        Ok(scan
            .paths()?
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect_vec())
    }

    #[test]
    fn defaults_match_all_versions_and_tiles() -> Result<()> {
        let root = tempdir()?;
        create_files(
            root.path(),
            &[
                "V1M0/EU500M/E048N012T1/b.tif",
                "V1M0/EU500M/E048N012T1/a.tif",
                "V1M0/EU500M/E051N015T1/c.tif",
                "V2M0/EU500M/E048N012T1/d.tif",
            ],
        )?;
        let paths = relative(root.path(), Scan::new(root.path(), "EU500M"))?;
        assert_eq!(
            paths,
            vec![
                "V1M0/EU500M/E048N012T1/a.tif",
                "V1M0/EU500M/E048N012T1/b.tif",
                "V1M0/EU500M/E051N015T1/c.tif",
                "V2M0/EU500M/E048N012T1/d.tif",
            ]
        );
        Ok(())
    }

    #[test]
    fn filters_grid_and_extension() -> Result<()> {
        let root = tempdir()?;
        create_files(
            root.path(),
            &[
                "V1M0/EU500M/E048N012T1/a.tif",
                "V1M0/EU500M/E048N012T1/a.tif.aux.xml",
                "V1M0/EU500M/E048N012T1/a.nc",
                "V1M0/AF500M/E048N012T1/b.tif",
                "V1M0/EU500M/E048N012T1/nested/c.tif",
            ],
        )?;
        let paths = relative(root.path(), Scan::new(root.path(), "EU500M"))?;
        assert_eq!(paths, vec!["V1M0/EU500M/E048N012T1/a.tif"]);
        Ok(())
    }

    #[test]
    fn ordered_by_version_then_tile_pattern() -> Result<()> {
        let root = tempdir()?;
        create_files(
            root.path(),
            &[
                "V1M0/EU500M/E048N012T1/a.tif",
                "V1M0/EU500M/E051N015T1/b.tif",
                "V2M0/EU500M/E048N012T1/c.tif",
                "V2M0/EU500M/E051N015T1/d.tif",
            ],
        )?;
        let scan = Scan::new(root.path(), "EU500M")
            .versions(["V2M0", "V1M0"])
            .tiles(["E051N015T1", "E048N012T1"]);
        assert_eq!(
            relative(root.path(), scan)?,
            vec![
                "V2M0/EU500M/E051N015T1/d.tif",
                "V2M0/EU500M/E048N012T1/c.tif",
                "V1M0/EU500M/E051N015T1/b.tif",
                "V1M0/EU500M/E048N012T1/a.tif",
            ]
        );
        Ok(())
    }

    #[test]
    fn tile_patterns() -> Result<()> {
        let root = tempdir()?;
        create_files(
            root.path(),
            &[
                "V1M0/EU500M/E048N012T1/a.tif",
                "V1M0/EU500M/E051N015T1/b.tif",
                "V1M0/EU500M/E048N015T1/c.tif",
            ],
        )?;
        let scan = Scan::new(root.path(), "EU500M")
            .tiles(["E048*"])
            .extension(".tif");
        assert_eq!(
            relative(root.path(), scan)?,
            vec![
                "V1M0/EU500M/E048N012T1/a.tif",
                "V1M0/EU500M/E048N015T1/c.tif",
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_pattern_list_is_wildcard() -> Result<()> {
        let root = tempdir()?;
        create_files(root.path(), &["V1M0/EU500M/E048N012T1/a.tif"])?;
        let scan = Scan::new(root.path(), "EU500M").versions(Vec::<String>::new());
        assert_eq!(
            relative(root.path(), scan)?,
            vec!["V1M0/EU500M/E048N012T1/a.tif"]
        );
        Ok(())
    }

    #[test]
    fn missing_root_errors() -> Result<()> {
        let root = tempdir()?;
        assert!(Scan::new(root.path().join("nope"), "EU500M").paths().is_err());
        Ok(())
    }
}
