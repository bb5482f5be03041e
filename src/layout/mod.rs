mod balance;
mod error;
mod graph;
mod ranking;
mod rows;
pub(crate) mod types;
pub use error::LayoutError;
pub use graph::GraphBuilder;
pub use rows::{build_rows, graph_height, graph_width, max_columns};
pub use types::*;

use balance::{assign_base_positions, balance_rows};
use ranking::{compute_sort_keys, sort_rows};

use crate::config::{EmptyDiagram, LayoutConfig};
use crate::ir::StepMap;
use log::{debug, info};

/// Lays out a step dependency map from scratch.
pub fn compute_layout(steps: &StepMap, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    config.validate()?;
    if steps.is_empty() && config.empty_diagram == EmptyDiagram::None {
        debug!("No steps, producing an empty diagram");
        return Ok(Layout::default());
    }

    info!(steps = steps.len(); "Computing step layout");
    let mut graph = GraphBuilder::new().build_graph(steps)?;
    let mut rows = build_rows(&graph);
    let (width, height) = sort_and_balance_rows(&mut graph, &mut rows, config);
    debug!(rows = rows.len(), width = width, height = height; "Step layout finished");

    Ok(Layout::from_graph(&graph, &rows, width, height))
}

/// Orders every row, spreads it across the graph width and pulls nodes below
/// their parents. Returns the canvas size.
pub fn sort_and_balance_rows(
    graph: &mut StepGraph,
    rows: &mut [Vec<NodeIdx>],
    config: &LayoutConfig,
) -> (f32, f32) {
    let keys = compute_sort_keys(graph, rows);
    sort_rows(rows, &keys);
    for (idx, key) in keys.row_keys.into_iter().enumerate() {
        graph.nodes[idx].sort_key = key;
    }

    let width = graph_width(rows, config);
    let height = graph_height(rows, config);
    assign_base_positions(graph, rows, width, config);
    balance_rows(graph, rows, width, config);
    (width, height)
}
