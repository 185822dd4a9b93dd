use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::host::Host;
use crate::temporal::TemporalRange;

const ROOT: NodeId = NodeId(0);

/// Index of a node in a [Buffer] layer tree. Used for groups, layers and tree nodes alike.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct NodeId(usize);

/// A host mutation recorded by [Buffer], in call order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Call {
    AddGroup {
        parent: NodeId,
        name: String,
    },
    CreateLayer {
        path: PathBuf,
        name: String,
    },
    SetTemporalRange {
        layer: NodeId,
        range: TemporalRange,
    },
    LoadStyle {
        layer: NodeId,
        style: PathBuf,
    },
    Repaint {
        layer: NodeId,
    },
    MoveNode {
        node: NodeId,
        parent: NodeId,
        index: usize,
    },
}

/// What [Buffer] knows about a layer node.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Layer {
    pub path: PathBuf,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_range: Option<TemporalRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<PathBuf>,
}

/// Owned snapshot of a [Buffer] layer tree, e.g. for serialization.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layer: Option<Layer>,
}

/// In-memory [Host] holding a project layer tree and a log of every mutation.
///
/// Like a real host, [Buffer] never deduplicates groups. New layers are inserted at the top of
/// the root. Paths registered with [Buffer::reject] produce invalid layers.
#[derive(Debug, Clone)]
pub struct Buffer {
    nodes: Vec<Node>,
    calls: Vec<Call>,
    rejected: HashSet<PathBuf>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                children: vec![],
                layer: None,
            }],
            calls: vec![],
            rejected: Default::default(),
        }
    }
}

impl Buffer {
    /// Layers created for `path` will report as invalid.
    pub fn reject<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.rejected.insert(path.into());
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn add_group_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::AddGroup { .. }))
            .count()
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).map(|node| node.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn layer(&self, id: NodeId) -> Option<&Layer> {
        self.nodes.get(id.0).and_then(|node| node.layer.as_ref())
    }

    /// Follow `path` down from the root, taking the first child with a matching name at each
    /// step.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter().try_fold(ROOT, |id, name| {
            self.children(id)
                .iter()
                .copied()
                .find(|child| self.name(*child) == Some(name.as_ref()))
        })
    }

    pub fn tree(&self) -> TreeNode {
        self.snapshot(ROOT)
    }

    fn snapshot(&self, id: NodeId) -> TreeNode {
        let node = &self.nodes[id.0];
        TreeNode {
            name: node.name.clone(),
            layer: node.layer.clone(),
            children: node
                .children
                .iter()
                .map(|child| self.snapshot(*child))
                .collect(),
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| anyhow!("unknown layer tree node {:?}", id))
    }

    fn layer_mut(&mut self, id: NodeId) -> Result<&mut Layer> {
        self.nodes
            .get_mut(id.0)
            .and_then(|node| node.layer.as_mut())
            .ok_or_else(|| anyhow!("node {:?} is not a layer", id))
    }

    fn group(&self, id: NodeId) -> Result<&Node> {
        let node = self.node(id)?;
        if node.layer.is_some() {
            return Err(anyhow!("node {:?} is a layer, not a group", id));
        }
        Ok(node)
    }

    fn push_node(
        &mut self,
        parent: NodeId,
        index: usize,
        name: &str,
        layer: Option<Layer>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            children: vec![],
            layer,
        });
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        id
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == candidate {
                return true;
            }
            match self.parent(id) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn fmt_node(&self, f: &mut Formatter<'_>, id: NodeId, depth: usize) -> std::fmt::Result {
        let node = &self.nodes[id.0];
        let indent = "  ".repeat(depth);
        match &node.layer {
            None => writeln!(f, "{}{}/", indent, node.name)?,
            Some(layer) => {
                write!(f, "{}{}", indent, node.name)?;
                if let Some(range) = &layer.temporal_range {
                    write!(f, " [{}]", range)?;
                }
                if !layer.valid {
                    write!(f, " (invalid)")?;
                }
                writeln!(f)?;
            }
        }
        for child in &node.children {
            self.fmt_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl Host for Buffer {
    type Group = NodeId;
    type Layer = NodeId;
    type Node = NodeId;

    fn root(&self) -> NodeId {
        ROOT
    }

    fn add_group(&mut self, parent: &NodeId, name: &str) -> Result<NodeId> {
        self.group(*parent)?;
        self.calls.push(Call::AddGroup {
            parent: *parent,
            name: name.to_string(),
        });
        Ok(self.push_node(*parent, usize::MAX, name, None))
    }

    fn create_layer(&mut self, path: &Path, name: &str) -> Result<NodeId> {
        self.calls.push(Call::CreateLayer {
            path: path.to_path_buf(),
            name: name.to_string(),
        });
        let layer = Layer {
            path: path.to_path_buf(),
            valid: !self.rejected.contains(path),
            temporal_range: None,
            style: None,
        };
        Ok(self.push_node(ROOT, 0, name, Some(layer)))
    }

    fn is_valid(&self, layer: &NodeId) -> bool {
        self.layer(*layer).map(|l| l.valid).unwrap_or(false)
    }

    fn set_temporal_range(&mut self, layer: &NodeId, range: &TemporalRange) -> Result<()> {
        self.layer_mut(*layer)?.temporal_range = Some(*range);
        self.calls.push(Call::SetTemporalRange {
            layer: *layer,
            range: *range,
        });
        Ok(())
    }

    fn load_style(&mut self, layer: &NodeId, style: &Path) -> Result<()> {
        self.layer_mut(*layer)?.style = Some(style.to_path_buf());
        self.calls.push(Call::LoadStyle {
            layer: *layer,
            style: style.to_path_buf(),
        });
        Ok(())
    }

    fn repaint(&mut self, layer: &NodeId) -> Result<()> {
        self.layer_mut(*layer)?;
        self.calls.push(Call::Repaint { layer: *layer });
        Ok(())
    }

    fn find_node_for(&self, layer: &NodeId) -> Result<NodeId> {
        self.node(*layer)?;
        Ok(*layer)
    }

    fn move_node(&mut self, node: NodeId, parent: &NodeId, index: usize) -> Result<()> {
        self.group(*parent)?;
        let old_parent = self
            .node(node)?
            .parent
            .ok_or_else(|| anyhow!("the root node cannot be moved"))?;
        if self.is_ancestor_or_self(node, *parent) {
            return Err(anyhow!(
                "cannot move node {:?} into itself or one of its descendants",
                node
            ));
        }
        self.calls.push(Call::MoveNode {
            node,
            parent: *parent,
            index,
        });
        self.nodes[old_parent.0].children.retain(|child| *child != node);
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(*parent);
        Ok(())
    }
}

impl Display for Buffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for child in self.children(ROOT) {
            self.fmt_node(f, *child, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use anyhow::Result;

    use crate::host::{Buffer, Call, Host};

    #[test]
    fn add_group_never_dedupes() -> Result<()> {
        let mut host = Buffer::default();
        let root = host.root();
        let a = host.add_group(&root, "a")?;
        let b = host.add_group(&root, "a")?;
        assert_ne!(a, b);
        assert_eq!(host.children(root), &[a, b]);
        assert_eq!(host.add_group_count(), 2);
        Ok(())
    }

    #[test]
    fn layers_are_created_at_top_of_root() -> Result<()> {
        let mut host = Buffer::default().reject("b.tif");
        let a = host.create_layer(Path::new("a.tif"), "a")?;
        let b = host.create_layer(Path::new("b.tif"), "b")?;
        assert_eq!(host.children(host.root()), &[b, a]);
        assert!(host.is_valid(&a));
        assert!(!host.is_valid(&b));
        Ok(())
    }

    #[test]
    fn move_node_inserts_at_index_and_detaches() -> Result<()> {
        let mut host = Buffer::default();
        let root = host.root();
        let group = host.add_group(&root, "g")?;
        let a = host.create_layer(Path::new("a.tif"), "a")?;
        let b = host.create_layer(Path::new("b.tif"), "b")?;

        let node = host.find_node_for(&a)?;
        host.move_node(node, &group, 0)?;
        let node = host.find_node_for(&b)?;
        host.move_node(node, &group, 0)?;

        assert_eq!(host.children(root), &[group]);
        assert_eq!(host.children(group), &[b, a]);
        assert_eq!(host.parent(a), Some(group));
        assert_eq!(
            host.calls().last(),
            Some(&Call::MoveNode {
                node: b,
                parent: group,
                index: 0
            })
        );
        Ok(())
    }

    #[test]
    fn cannot_move_into_layer_or_descendant() -> Result<()> {
        let mut host = Buffer::default();
        let root = host.root();
        let outer = host.add_group(&root, "outer")?;
        let inner = host.add_group(&outer, "inner")?;
        let layer = host.create_layer(Path::new("a.tif"), "a")?;
        assert!(host.move_node(outer, &inner, 0).is_err());
        assert!(host.move_node(inner, &layer, 0).is_err());
        assert!(host.add_group(&layer, "x").is_err());
        Ok(())
    }

    #[test]
    fn find_by_names() -> Result<()> {
        let mut host = Buffer::default();
        let root = host.root();
        let grid = host.add_group(&root, "E048N012T1")?;
        let day = host.add_group(&grid, "2021-06-15")?;
        assert_eq!(host.find(&["E048N012T1", "2021-06-15"]), Some(day));
        assert_eq!(host.find(&["E048N012T1", "2021-06-16"]), None);
        assert_eq!(host.find::<&str>(&[]), Some(root));
        Ok(())
    }

    #[test]
    fn display_tree() -> Result<()> {
        let mut host = Buffer::default().reject("b.tif");
        let root = host.root();
        let group = host.add_group(&root, "grid")?;
        let a = host.create_layer(Path::new("a.tif"), "a")?;
        host.move_node(a, &group, 0)?;
        host.create_layer(Path::new("b.tif"), "b")?;
        assert_eq!(host.to_string(), "b (invalid)\ngrid/\n  a\n");
        Ok(())
    }
}
