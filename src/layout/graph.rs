use std::collections::BTreeMap;

use log::{debug, trace, warn};

use super::error::LayoutError;
use super::types::{NodeIdx, StepGraph, StepNode};
use crate::ir::{StepId, StepMap};

/// A link that could not be made yet because the parent step was not
/// reachable from the start node when the child was added.
#[derive(Debug, Clone, Copy)]
struct DeferredAssignment {
    node: NodeIdx,
    parent_id: StepId,
}

/// Builds the step graph for one diagram.
///
/// The builder owns the counter handing out `internal_id`s, so separate
/// builders never share node identities.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    next_internal_id: u32,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_node(&mut self, graph: &mut StepGraph, id: StepId) -> NodeIdx {
        self.next_internal_id += 1;
        graph.nodes.push(StepNode::new(id, self.next_internal_id));
        graph.nodes.len() - 1
    }

    /// Builds the graph below a synthetic start node and assigns levels.
    ///
    /// Steps without dependencies hang directly below the start node.
    /// Dependencies on steps added later are resolved in follow-up passes.
    pub fn build_graph(&mut self, steps: &StepMap) -> Result<StepGraph, LayoutError> {
        if steps.contains_key(&StepId::ROOT) {
            return Err(LayoutError::ReservedStepId);
        }

        let mut graph = StepGraph::default();
        let root = self.add_node(&mut graph, StepId::ROOT);
        let mut by_id = BTreeMap::from([(StepId::ROOT, root)]);
        let mut deferred = Vec::new();

        for (&step_id, deps) in steps {
            let node = self.add_node(&mut graph, step_id);
            by_id.insert(step_id, node);
            if deps.is_empty() {
                graph.link(root, node);
                continue;
            }
            for &dep in deps {
                match find_attached(&graph, &by_id, dep) {
                    Some(parent) => graph.link(parent, node),
                    None => deferred.push(DeferredAssignment {
                        node,
                        parent_id: dep,
                    }),
                }
            }
        }

        let deferred_count = deferred.len();
        let passes = resolve_deferred(&mut graph, &by_id, deferred, steps)?;
        propagate_levels(&mut graph)?;

        debug!(
            nodes = graph.len(),
            deferred = deferred_count,
            passes = passes;
            "Built step graph"
        );
        Ok(graph)
    }
}

/// Node carrying `id` if it is already linked below the start node.
///
/// Links are only ever made below reachable parents, so a node is reachable
/// exactly when it is the start node or has a parent. This gives the same
/// answer as [`StepGraph::find_by_id`] without walking the graph.
fn find_attached(
    graph: &StepGraph,
    by_id: &BTreeMap<StepId, NodeIdx>,
    id: StepId,
) -> Option<NodeIdx> {
    by_id
        .get(&id)
        .copied()
        .filter(|&idx| idx == StepGraph::ROOT || !graph.node(idx).parents.is_empty())
}

/// Re-scans pending links until all are made. Fails once a full pass makes
/// no progress.
fn resolve_deferred(
    graph: &mut StepGraph,
    by_id: &BTreeMap<StepId, NodeIdx>,
    mut pending: Vec<DeferredAssignment>,
    steps: &StepMap,
) -> Result<usize, LayoutError> {
    let mut passes = 0;
    while !pending.is_empty() {
        passes += 1;
        let before = pending.len();
        pending.retain(|item| match find_attached(graph, by_id, item.parent_id) {
            Some(parent) => {
                graph.link(parent, item.node);
                false
            }
            None => true,
        });
        trace!(pass = passes, remaining = pending.len(); "Deferred assignment pass");

        if pending.len() == before {
            return Err(stalled_error(graph, &pending, steps));
        }
    }
    Ok(passes)
}

fn stalled_error(
    graph: &StepGraph,
    pending: &[DeferredAssignment],
    steps: &StepMap,
) -> LayoutError {
    // A parent that is a known step but never became reachable sits on a cycle
    // or below one; a missing parent is reported first since it is the cause.
    let missing = pending
        .iter()
        .find(|item| !steps.contains_key(&item.parent_id));
    let err = match missing {
        Some(item) => LayoutError::UnresolvedDependency {
            step: graph.node(item.node).id,
            dependency: item.parent_id,
        },
        None => LayoutError::CyclicDependency {
            step: graph.node(pending[0].node).id,
        },
    };
    warn!(pending = pending.len(); "Step graph could not be completed: {err}");
    err
}

/// Gives every node its longest distance from the start node.
///
/// Depth-first with an explicit stack of `(node, next child)` frames. A node
/// is on the current path from the moment it is entered until its last child
/// has been handled.
fn propagate_levels(graph: &mut StepGraph) -> Result<(), LayoutError> {
    let mut on_stack = vec![false; graph.len()];
    let mut visited = vec![false; graph.len()];
    let mut stack: Vec<(NodeIdx, usize)> = Vec::new();
    enter_node(graph, StepGraph::ROOT, 0, &mut on_stack, &mut visited, &mut stack)?;

    while let Some(frame) = stack.last_mut() {
        let (idx, pos) = *frame;
        match graph.nodes[idx].children.get(pos).copied() {
            Some(child) => {
                frame.1 += 1;
                let next = graph.nodes[idx].level + 1;
                enter_node(graph, child, next, &mut on_stack, &mut visited, &mut stack)?;
            }
            None => {
                on_stack[idx] = false;
                stack.pop();
            }
        }
    }
    Ok(())
}

fn enter_node(
    graph: &mut StepGraph,
    idx: NodeIdx,
    level: usize,
    on_stack: &mut [bool],
    visited: &mut [bool],
    stack: &mut Vec<(NodeIdx, usize)>,
) -> Result<(), LayoutError> {
    if on_stack[idx] {
        let step = graph.node(idx).id;
        warn!(step:% = step; "Cycle detected during level assignment");
        return Err(LayoutError::CyclicDependency { step });
    }
    // A revisit that does not deepen the node cannot deepen its descendants.
    if visited[idx] && graph.nodes[idx].level >= level {
        return Ok(());
    }

    let node = &mut graph.nodes[idx];
    node.level = node.level.max(level);
    visited[idx] = true;
    on_stack[idx] = true;
    stack.push((idx, 0));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(entries: &[(u64, &[u64])]) -> StepMap {
        entries
            .iter()
            .map(|(id, deps)| (StepId(*id), deps.iter().map(|d| StepId(*d)).collect()))
            .collect()
    }

    fn level_of(graph: &StepGraph, id: u64) -> usize {
        graph.node(graph.index_of(StepId(id)).unwrap()).level
    }

    #[test]
    fn independent_steps_hang_below_root() {
        let graph = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[]), (2, &[]), (3, &[])]))
            .unwrap();
        assert_eq!(graph.root().children.len(), 3);
        assert_eq!(graph.root().level, 0);
        for id in 1..=3 {
            assert_eq!(level_of(&graph, id), 1);
        }
    }

    #[test]
    fn forward_references_are_resolved() {
        // 1 depends on 3, which is only added after it.
        let graph = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[3]), (2, &[1]), (3, &[])]))
            .unwrap();
        assert_eq!(level_of(&graph, 3), 1);
        assert_eq!(level_of(&graph, 1), 2);
        assert_eq!(level_of(&graph, 2), 3);
        let one = graph.index_of(StepId(1)).unwrap();
        assert_eq!(graph.node(one).parents.len(), 1);
    }

    #[test]
    fn level_is_longest_path() {
        // 4 is reachable as 1 -> 4 and 1 -> 2 -> 3 -> 4.
        let graph = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[]), (2, &[1]), (3, &[2]), (4, &[1, 3])]))
            .unwrap();
        assert_eq!(level_of(&graph, 4), 4);
    }

    #[test]
    fn duplicate_dependencies_keep_both_parent_entries() {
        let graph = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[]), (2, &[1, 1])]))
            .unwrap();
        let one = graph.index_of(StepId(1)).unwrap();
        let two = graph.index_of(StepId(2)).unwrap();
        assert_eq!(graph.node(one).children, vec![two]);
        assert_eq!(graph.node(two).parents, vec![one, one]);
        assert_eq!(level_of(&graph, 2), 2);
    }

    #[test]
    fn deep_chain_does_not_exhaust_the_stack() {
        let chain: StepMap = (1..=100_000u64)
            .map(|id| {
                let deps = if id == 1 { vec![] } else { vec![StepId(id - 1)] };
                (StepId(id), deps)
            })
            .collect();
        let graph = GraphBuilder::new().build_graph(&chain).unwrap();
        assert_eq!(level_of(&graph, 100_000), 100_000);
    }

    #[test]
    fn attached_lookup_agrees_with_graph_search() {
        let mut builder = GraphBuilder::new();
        let mut graph = StepGraph::default();
        let root = builder.add_node(&mut graph, StepId::ROOT);
        let mut by_id = BTreeMap::from([(StepId::ROOT, root)]);
        for id in 1..=4 {
            let idx = builder.add_node(&mut graph, StepId(id));
            by_id.insert(StepId(id), idx);
        }
        // 1 below the start node, 2 below 1; 3 and 4 are not linked yet.
        graph.link(root, 1);
        graph.link(1, 2);

        for id in 0..=5 {
            assert_eq!(
                find_attached(&graph, &by_id, StepId(id)),
                graph.find_by_id(StepId(id)),
                "lookup of step {id}"
            );
        }
    }

    #[test]
    fn dependency_on_zero_means_start_node() {
        let graph = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[0])]))
            .unwrap();
        assert_eq!(graph.root().children.len(), 1);
        assert_eq!(level_of(&graph, 1), 1);
    }

    #[test]
    fn internal_ids_increase_per_builder() {
        let mut builder = GraphBuilder::new();
        let first = builder.build_graph(&steps(&[(1, &[])])).unwrap();
        let second = builder.build_graph(&steps(&[(1, &[])])).unwrap();
        assert!(first.nodes[1].internal_id < second.nodes[1].internal_id);
        assert!(!first.nodes[1].same_node(&second.nodes[1]));

        let fresh = GraphBuilder::new().build_graph(&steps(&[(1, &[])])).unwrap();
        assert_eq!(fresh.root().internal_id, 1);
        assert_eq!(fresh.nodes[1].internal_id, 2);
    }

    #[test]
    fn rejects_reserved_id() {
        let err = GraphBuilder::new()
            .build_graph(&steps(&[(0, &[]), (1, &[])]))
            .unwrap_err();
        assert_eq!(err, LayoutError::ReservedStepId);
    }

    #[test]
    fn reports_unknown_dependency() {
        let err = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[]), (2, &[9])]))
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnresolvedDependency {
                step: StepId(2),
                dependency: StepId(9),
            }
        );
    }

    #[test]
    fn detached_cycle_is_reported() {
        let err = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[2]), (2, &[1])]))
            .unwrap_err();
        assert!(matches!(err, LayoutError::CyclicDependency { .. }));
    }

    #[test]
    fn reachable_cycle_is_reported() {
        // 2 and 3 depend on each other but 2 is also anchored below 1.
        let err = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[]), (2, &[1, 3]), (3, &[2])]))
            .unwrap_err();
        assert!(matches!(err, LayoutError::CyclicDependency { .. }));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = GraphBuilder::new()
            .build_graph(&steps(&[(1, &[]), (2, &[1, 2])]))
            .unwrap_err();
        assert_eq!(err, LayoutError::CyclicDependency { step: StepId(2) });
    }
}
