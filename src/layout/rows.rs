use super::types::{NodeIdx, StepGraph};
use crate::config::LayoutConfig;

/// Splits the graph into rows by level, in depth-first order from the start
/// node.
///
/// A node reached again through another parent keeps its first slot; its
/// descendants were already placed when it was first reached.
pub fn build_rows(graph: &StepGraph) -> Vec<Vec<NodeIdx>> {
    let mut rows: Vec<Vec<NodeIdx>> = Vec::new();
    if graph.is_empty() {
        return rows;
    }
    let mut placed = vec![false; graph.len()];
    let mut stack = vec![StepGraph::ROOT];
    while let Some(idx) = stack.pop() {
        if placed[idx] {
            continue;
        }
        placed[idx] = true;
        let node = graph.node(idx);
        while rows.len() <= node.level {
            rows.push(Vec::new());
        }
        rows[node.level].push(idx);
        for &child in node.children.iter().rev() {
            if !placed[child] {
                stack.push(child);
            }
        }
    }
    rows
}

pub fn max_columns(rows: &[Vec<NodeIdx>]) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

pub fn graph_width(rows: &[Vec<NodeIdx>], config: &LayoutConfig) -> f32 {
    config.span_width(max_columns(rows))
}

pub fn graph_height(rows: &[Vec<NodeIdx>], config: &LayoutConfig) -> f32 {
    rows.len() as f32 * config.row_pitch()
}
