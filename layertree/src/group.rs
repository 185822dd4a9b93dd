use std::collections::HashMap;
use std::fmt::{Display, Formatter, Write};

use anyhow::Result;
use chrono::format::{Item, StrftimeItems};
use itertools::Itertools;
use log::debug;

use crate::catalog::{Record, Value};
use crate::error::Error;
use crate::host::Host;

/// Name of the derived calendar-day attribute registered by [Derivations::day].
pub const DAY: &str = "day";
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Rule for a derived grouping attribute: the timestamp in field `source`, rendered with the
/// `strftime` `format`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Derivation {
    pub source: String,
    pub format: String,
}

impl Derivation {
    pub fn new(source: impl ToString, format: impl ToString) -> Self {
        Self {
            source: source.to_string(),
            format: format.to_string(),
        }
    }

    /// Fails with [Error::InvalidFormat] if `format` has an unknown or incomplete specifier.
    pub fn check_format(&self) -> Result<()> {
        if StrftimeItems::new(&self.format).any(|item| matches!(item, Item::Error)) {
            return Err(self.invalid_format().into());
        }
        Ok(())
    }

    pub fn derive(&self, record: &Record) -> Result<String> {
        let value = present_field(record, &self.source)?;
        let timestamp = value.as_datetime().ok_or_else(|| Error::NotATimestamp {
            field: self.source.clone(),
            value: value.to_string(),
            path: record.file_path.clone(),
        })?;
        let mut rendered = String::new();
        write!(rendered, "{}", timestamp.format(&self.format))
            .map_err(|_| self.invalid_format())?;
        Ok(rendered)
    }

    fn invalid_format(&self) -> Error {
        Error::InvalidFormat {
            format: self.format.clone(),
        }
    }
}

/// Derived attribute names and their rules. A derivation shadows a catalog column of the same
/// name.
#[derive(Default, Debug, Clone)]
pub struct Derivations(HashMap<String, Derivation>);

impl Derivations {
    /// [DAY] as the calendar day (`YYYY-MM-DD`) of the timestamp in `source`.
    pub fn day(source: impl ToString) -> Self {
        Self::default().with(DAY, Derivation::new(source, DAY_FORMAT))
    }

    pub fn with(mut self, name: impl ToString, derivation: Derivation) -> Self {
        self.insert(name, derivation);
        self
    }

    pub fn insert(&mut self, name: impl ToString, derivation: Derivation) {
        self.0.insert(name.to_string(), derivation);
    }

    pub fn get(&self, name: &str) -> Option<&Derivation> {
        self.0.get(name)
    }
}

/// Ordered grouping attributes plus the rules for those that are derived.
#[derive(Default, Debug, Clone)]
pub struct Grouping {
    pub attrs: Vec<String>,
    pub derivations: Derivations,
}

impl Grouping {
    pub fn new<S: ToString>(attrs: impl IntoIterator<Item = S>, derivations: Derivations) -> Self {
        Self {
            attrs: attrs.into_iter().map(|s| s.to_string()).collect(),
            derivations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// One group name per attribute, in attribute order.
    ///
    /// Literal attributes use the [Value] rendering as is, so a timestamp column held as text
    /// keeps its own spelling. Group timestamps through a [Derivation] to get one name per day
    /// whatever the column type.
    pub fn path_for(&self, record: &Record) -> Result<GroupPath> {
        self.attrs
            .iter()
            .map(|attr| match self.derivations.get(attr) {
                Some(derivation) => derivation.derive(record),
                None => Ok(present_field(record, attr)?.to_string()),
            })
            .collect::<Result<Vec<_>>>()
            .map(GroupPath)
    }
}

fn present_field<'r>(record: &'r Record, field: &str) -> Result<&'r Value> {
    Ok(record
        .field(field)
        .filter(|value| !value.is_null())
        .ok_or_else(|| Error::MissingField {
            field: field.to_string(),
            path: record.file_path.clone(),
        })?)
}

/// Group names from the top of the tree down to a record's leaf group.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash)]
pub struct GroupPath(Vec<String>);

impl GroupPath {
    pub fn new<S: ToString>(names: impl IntoIterator<Item = S>) -> Self {
        Self(names.into_iter().map(|s| s.to_string()).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `/`-joined address of the node at `depth` (1-based).
    pub fn address(&self, depth: usize) -> String {
        self.0.iter().take(depth).join("/")
    }
}

impl Display for GroupPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address(self.len()))
    }
}

/// Memo of the host groups created for each [GroupPath] prefix during one placement run.
///
/// A group is created at most once per address; every later path through the same address
/// reuses it. Keys are the name sequences themselves so names containing `/` cannot collide
/// with deeper addresses.
#[derive(Debug)]
pub struct GroupTree<G> {
    nodes: HashMap<Vec<String>, G>,
}

impl<G> Default for GroupTree<G> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<G: Clone> GroupTree<G> {
    /// The leaf group for `path`, creating missing groups in `host` top-down. An empty path has
    /// no leaf and touches nothing.
    pub fn resolve<H>(&mut self, path: &GroupPath, host: &mut H) -> Result<Option<G>>
    where
        H: Host<Group = G> + ?Sized,
    {
        if path.is_empty() {
            return Ok(None);
        }
        let mut parent = host.root();
        for depth in 1..=path.len() {
            let key = path.names()[..depth].to_vec();
            parent = match self.nodes.get(&key) {
                Some(group) => group.clone(),
                None => {
                    let group = host.add_group(&parent, &path.names()[depth - 1])?;
                    debug!("created group '{}'", path.address(depth));
                    self.nodes.insert(key, group.clone());
                    group
                }
            };
        }
        Ok(Some(parent))
    }

    /// [Grouping::path_for] followed by [GroupTree::resolve].
    pub fn resolve_record<H>(
        &mut self,
        record: &Record,
        grouping: &Grouping,
        host: &mut H,
    ) -> Result<(GroupPath, Option<G>)>
    where
        H: Host<Group = G> + ?Sized,
    {
        let path = grouping.path_for(record)?;
        let leaf = self.resolve(&path, host)?;
        Ok((path, leaf))
    }

    /// The memoized group at `names`, if one has been created.
    pub fn get<S: AsRef<str>>(&self, names: &[S]) -> Option<&G> {
        let key = names.iter().map(|s| s.as_ref().to_string()).collect_vec();
        self.nodes.get(&key)
    }

    /// Number of groups created so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
