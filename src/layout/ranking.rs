use super::types::{NodeIdx, StepGraph};
use crate::ir::StepId;

/// Sort keys for every node of a graph, indexed by [`NodeIdx`].
#[derive(Debug, Clone, Default)]
pub(super) struct SortKeys {
    /// Key each node had when its own row was finished; rows sort by this.
    pub row_keys: Vec<String>,
    /// Key descendants extend. Merge points rewrite their parents' entries.
    pub lineage: Vec<String>,
    pub groups: usize,
}

/// Builds lineage keys row by row.
///
/// A node with one parent extends that parent's lineage. A node with several
/// parents opens a new group token `Gk`, tags every parent's lineage with it
/// and extends the first parent's tagged lineage, so later descendants of the
/// same merge point share a prefix.
pub(super) fn compute_sort_keys(graph: &StepGraph, rows: &[Vec<NodeIdx>]) -> SortKeys {
    let mut keys = SortKeys {
        row_keys: vec![String::new(); graph.len()],
        lineage: vec![String::new(); graph.len()],
        groups: 0,
    };

    for row in rows {
        for &idx in row {
            let node = graph.node(idx);
            let key = match node.parents.as_slice() {
                [] => node.id.to_string(),
                [parent] => format!("{}-{}", keys.lineage[*parent], node.id),
                parents => {
                    keys.groups += 1;
                    for &parent in parents {
                        keys.lineage[parent] =
                            tag_lineage(&keys.lineage[parent], keys.groups, graph.node(parent).id);
                    }
                    format!("{}-{}", keys.lineage[parents[0]], node.id)
                }
            };
            keys.lineage[idx] = key.clone();
            keys.row_keys[idx] = key;
        }
    }
    keys
}

/// Replaces the last `-` separated segment of `lineage` with `G<group>-<parent>`.
fn tag_lineage(lineage: &str, group: usize, parent: StepId) -> String {
    match lineage.rfind('-') {
        Some(pos) => format!("{}-G{group}-{parent}", &lineage[..pos]),
        None => format!("G{group}-{parent}"),
    }
}

/// Orders every row by plain byte-wise comparison of the row keys.
pub(super) fn sort_rows(rows: &mut [Vec<NodeIdx>], keys: &SortKeys) {
    for row in rows.iter_mut() {
        row.sort_by(|a, b| keys.row_keys[*a].cmp(&keys.row_keys[*b]));
    }
}
