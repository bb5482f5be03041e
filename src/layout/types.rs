use serde::Serialize;

use crate::config::LayoutConfig;
use crate::ir::StepId;

/// Index of a node in a [`StepGraph`] arena.
pub type NodeIdx = usize;

/// One step (or the start node) in the diagram graph.
///
/// `children` and `parents` index into the owning [`StepGraph`]; a node may
/// have several of each.
#[derive(Debug, Clone)]
pub struct StepNode {
    pub id: StepId,
    pub internal_id: u32,
    pub level: usize,
    pub children: Vec<NodeIdx>,
    pub parents: Vec<NodeIdx>,
    pub sort_key: String,
    pub x: f32,
    pub y: f32,
    pub center_x: f32,
}

impl StepNode {
    pub(crate) fn new(id: StepId, internal_id: u32) -> Self {
        Self {
            id,
            internal_id,
            level: 0,
            children: Vec::new(),
            parents: Vec::new(),
            sort_key: String::new(),
            x: 0.0,
            y: 0.0,
            center_x: 0.0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Two nodes are the same only if both the step id and the construction
    /// counter agree.
    pub fn same_node(&self, other: &StepNode) -> bool {
        self.id == other.id && self.internal_id == other.internal_id
    }
}

/// Arena of step nodes. The start node always lives at [`StepGraph::ROOT`].
#[derive(Debug, Clone, Default)]
pub struct StepGraph {
    pub nodes: Vec<StepNode>,
}

impl StepGraph {
    pub const ROOT: NodeIdx = 0;

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: NodeIdx) -> &StepNode {
        &self.nodes[idx]
    }

    pub fn root(&self) -> &StepNode {
        &self.nodes[Self::ROOT]
    }

    /// Arena slot of the node carrying `id`, reachable or not.
    pub fn index_of(&self, id: StepId) -> Option<NodeIdx> {
        self.nodes.iter().position(|node| node.id == id)
    }

    /// Depth-first search from the start node for a node with `id`.
    ///
    /// Only nodes already linked below the start node are found.
    pub fn find_by_id(&self, id: StepId) -> Option<NodeIdx> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![Self::ROOT];
        while let Some(idx) = stack.pop() {
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            let node = &self.nodes[idx];
            if node.id == id {
                return Some(idx);
            }
            for &child in node.children.iter().rev() {
                if !seen[child] {
                    stack.push(child);
                }
            }
        }
        None
    }

    /// Links `parent` above `child`.
    ///
    /// `parents` records every declared dependency, repeats included, so a
    /// step listing the same dependency twice becomes a merge point. A child
    /// is listed once per parent instance.
    pub(crate) fn link(&mut self, parent: NodeIdx, child: NodeIdx) {
        self.nodes[child].parents.push(parent);
        if !self.contains_node(&self.nodes[parent].children, child) {
            self.nodes[parent].children.push(child);
        }
    }

    fn contains_node(&self, list: &[NodeIdx], target: NodeIdx) -> bool {
        let target = &self.nodes[target];
        list.iter()
            .any(|&candidate| self.nodes[candidate].same_node(target))
    }
}

/// Nodes of one row converging on the same horizontal anchor.
#[derive(Debug, Clone)]
pub struct RowGroup {
    pub avg_x: f32,
    pub nodes: Vec<NodeIdx>,
    pub width: f32,
}

impl RowGroup {
    pub fn new(avg_x: f32, node: NodeIdx, config: &LayoutConfig) -> Self {
        Self {
            avg_x,
            nodes: vec![node],
            width: config.span_width(1),
        }
    }

    pub fn push(&mut self, node: NodeIdx, config: &LayoutConfig) {
        self.nodes.push(node);
        self.width = config.span_width(self.nodes.len());
    }

    /// Folds `other` into this group, moving the anchor to the member-weighted
    /// mean of both anchors.
    pub fn absorb(&mut self, other: RowGroup, config: &LayoutConfig) {
        let own = self.nodes.len() as f32;
        let theirs = other.nodes.len() as f32;
        self.avg_x = (self.avg_x * own + other.avg_x * theirs) / (own + theirs);
        self.nodes.extend(other.nodes);
        self.width = config.span_width(self.nodes.len());
    }

    pub fn left(&self) -> f32 {
        self.avg_x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.avg_x + self.width / 2.0
    }
}

/// A positioned node as handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    pub id: StepId,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub center_x: f32,
    pub children: Vec<StepId>,
    pub parents: Vec<StepId>,
    pub sort_key: String,
}

/// Finished diagram: rows top to bottom, each ordered left to right by sort
/// key, plus the canvas size.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    pub rows: Vec<Vec<NodeLayout>>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn from_graph(graph: &StepGraph, rows: &[Vec<NodeIdx>], width: f32, height: f32) -> Self {
        let ids = |list: &[NodeIdx]| -> Vec<StepId> {
            list.iter().map(|&idx| graph.node(idx).id).collect()
        };
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&idx| {
                        let node = graph.node(idx);
                        NodeLayout {
                            id: node.id,
                            level: node.level,
                            x: node.x,
                            y: node.y,
                            center_x: node.center_x,
                            children: ids(&node.children),
                            parents: ids(&node.parents),
                            sort_key: node.sort_key.clone(),
                        }
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn node(&self, id: StepId) -> Option<&NodeLayout> {
        self.rows.iter().flatten().find(|node| node.id == id)
    }

    pub fn row_ids(&self) -> Vec<Vec<StepId>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|node| node.id).collect())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}
