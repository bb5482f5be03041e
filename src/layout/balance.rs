use log::trace;

use super::types::{NodeIdx, RowGroup, StepGraph};
use crate::config::LayoutConfig;

// Tolerance for comparing accumulated coordinates.
const EPSILON: f32 = 1e-3;

/// Lays every row out left to right as one block centred in `graph_width`.
pub(super) fn assign_base_positions(
    graph: &mut StepGraph,
    rows: &[Vec<NodeIdx>],
    graph_width: f32,
    config: &LayoutConfig,
) {
    for (row_idx, row) in rows.iter().enumerate() {
        let y = row_idx as f32 * config.row_pitch();
        let start = (graph_width - config.span_width(row.len())) / 2.0;
        for (pos, &idx) in row.iter().enumerate() {
            let node = &mut graph.nodes[idx];
            node.x = start + pos as f32 * config.column_pitch();
            node.y = y;
            node.center_x = node.x + config.box_width / 2.0;
        }
    }
}

/// Moves nodes below the centre of their parents without letting groups in a
/// row overlap or leave `[0, graph_width]`.
///
/// Rows are handled top to bottom so every row sees its parents' final
/// positions.
pub(super) fn balance_rows(
    graph: &mut StepGraph,
    rows: &[Vec<NodeIdx>],
    graph_width: f32,
    config: &LayoutConfig,
) {
    for (row_idx, row) in rows.iter().enumerate() {
        let mut groups = group_row(graph, row, graph_width, config);
        let initial = groups.len();
        resolve_collisions(&mut groups, graph_width, config);
        trace!(row = row_idx, groups = initial, resolved = groups.len(); "Balanced row");

        for group in &groups {
            let left = group.left();
            for (pos, &idx) in group.nodes.iter().enumerate() {
                let node = &mut graph.nodes[idx];
                node.x = left + pos as f32 * config.column_pitch();
                node.center_x = node.x + config.box_width / 2.0;
            }
        }
    }
}

/// Mean `center_x` of the node's parents, or the middle of the graph.
pub(super) fn anchor_x(graph: &StepGraph, idx: NodeIdx, graph_width: f32) -> f32 {
    let parents = &graph.node(idx).parents;
    if parents.is_empty() {
        return graph_width / 2.0;
    }
    let sum: f32 = parents
        .iter()
        .map(|&parent| graph.node(parent).center_x)
        .sum();
    sum / parents.len() as f32
}

/// Clusters the row by identical anchors, ordered by anchor. Members keep
/// their row order.
pub(super) fn group_row(
    graph: &StepGraph,
    row: &[NodeIdx],
    graph_width: f32,
    config: &LayoutConfig,
) -> Vec<RowGroup> {
    let mut groups: Vec<RowGroup> = Vec::new();
    for &idx in row {
        let avg_x = anchor_x(graph, idx, graph_width);
        match groups.iter_mut().find(|group| group.avg_x == avg_x) {
            Some(group) => group.push(idx, config),
            None => groups.push(RowGroup::new(avg_x, idx, config)),
        }
    }
    groups.sort_by(|a, b| a.avg_x.total_cmp(&b.avg_x));
    groups
}

/// Alternates merging and clamping until neither changes anything.
///
/// Each merge removes a group and clamping only moves groups inwards, so the
/// loop ends after at most one merge per group plus a final quiet pass.
pub(super) fn resolve_collisions(
    groups: &mut Vec<RowGroup>,
    graph_width: f32,
    config: &LayoutConfig,
) {
    loop {
        let merged = merge_overlapping(groups, config);
        let clamped = clamp_groups(groups, graph_width);
        if !merged && !clamped {
            break;
        }
    }
}

/// Merges neighbouring groups that are closer than one horizontal margin.
fn merge_overlapping(groups: &mut Vec<RowGroup>, config: &LayoutConfig) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i + 1 < groups.len() {
        if groups[i].right() + config.h_margin > groups[i + 1].left() + EPSILON {
            let next = groups.remove(i + 1);
            groups[i].absorb(next, config);
            changed = true;
            // the wider group may now reach its left neighbour
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
    changed
}

/// Pulls groups back into `[0, graph_width]`. Only a move larger than
/// `EPSILON` counts as a change; at large coordinates `(w - half) + half` can
/// round past `w` and would otherwise be clamped again on every pass.
fn clamp_groups(groups: &mut [RowGroup], graph_width: f32) -> bool {
    let mut changed = false;
    for group in groups.iter_mut() {
        let half = group.width / 2.0;
        let target = if group.left() < -EPSILON {
            half
        } else if group.right() > graph_width + EPSILON {
            graph_width - half
        } else {
            continue;
        };
        if (group.avg_x - target).abs() > EPSILON {
            changed = true;
        }
        group.avg_x = target;
    }
    changed
}
