use std::fmt::Debug;
use std::path::Path;

use anyhow::Result;

pub use buffer::{Buffer, Call, Layer, NodeId, TreeNode};

use crate::temporal::TemporalRange;

mod buffer;

/// Narrow capability interface onto the viewing host that owns the project layer tree.
///
/// Handles ([Host::Group], [Host::Layer], [Host::Node]) are owned by the host. Callers hold them
/// only for as long as they need them and never deduplicate for the host: [Host::add_group]
/// always creates a new group, even when a sibling with the same name exists.
pub trait Host {
    type Group: Clone + Debug;
    type Layer;
    type Node;

    /// The top of the project layer tree.
    fn root(&self) -> Self::Group;

    /// Append a new group called `name` to `parent`.
    fn add_group(&mut self, parent: &Self::Group, name: &str) -> Result<Self::Group>;

    /// Load the raster at `path` as a layer called `name`. An unreadable raster still produces a
    /// handle; check it with [Host::is_valid].
    fn create_layer(&mut self, path: &Path, name: &str) -> Result<Self::Layer>;

    fn is_valid(&self, layer: &Self::Layer) -> bool;

    /// Give `layer` a fixed, active temporal range.
    fn set_temporal_range(&mut self, layer: &Self::Layer, range: &TemporalRange) -> Result<()>;

    fn load_style(&mut self, layer: &Self::Layer, style: &Path) -> Result<()>;

    fn repaint(&mut self, layer: &Self::Layer) -> Result<()>;

    /// The layer tree node currently holding `layer`.
    fn find_node_for(&self, layer: &Self::Layer) -> Result<Self::Node>;

    /// Detach `node` from its parent and insert it into `parent` at `index`.
    fn move_node(&mut self, node: Self::Node, parent: &Self::Group, index: usize) -> Result<()>;
}
