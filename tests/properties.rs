use proptest::prelude::*;
use proptest::sample::Index;

use step_diagram::{Layout, LayoutConfig, StepId, StepMap, compute_layout};

const TOLERANCE: f32 = 1e-2;

// ===================
// Strategies
// ===================

/// Random acyclic step maps. Offset `n` only depends on offsets below `n`,
/// and offsets are mapped to ids through a shuffled permutation so that
/// dependencies on steps added later occur.
fn step_map_strategy() -> impl Strategy<Value = StepMap> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), 1..24)
        .prop_flat_map(|picks| {
            let ids: Vec<u64> = (1..=picks.len() as u64).collect();
            (Just(picks), Just(ids).prop_shuffle())
        })
        .prop_map(|(picks, ids)| {
            let mut steps = StepMap::new();
            for (offset, deps) in picks.into_iter().enumerate() {
                let mut parents: Vec<StepId> = Vec::new();
                if offset > 0 {
                    for pick in deps {
                        let dep = StepId(ids[pick.index(offset)]);
                        if !parents.contains(&dep) {
                            parents.push(dep);
                        }
                    }
                }
                steps.insert(StepId(ids[offset]), parents);
            }
            steps
        })
}

fn config_strategy() -> impl Strategy<Value = LayoutConfig> {
    (20.0f32..300.0, 0.0f32..40.0).prop_map(|(box_width, h_margin)| LayoutConfig {
        box_width,
        h_margin,
        ..LayoutConfig::default()
    })
}

// ===================
// Property Test Functions
// ===================

/// Laying out the same map twice yields the same rows and positions.
fn check_layout_is_deterministic(steps: &StepMap) -> Result<(), TestCaseError> {
    let config = LayoutConfig::default();
    let first = compute_layout(steps, &config).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let second = compute_layout(steps, &config).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(first, second);
    Ok(())
}

/// Every step is placed exactly once, in the row matching its level.
fn check_rows_match_levels(steps: &StepMap) -> Result<(), TestCaseError> {
    let layout = compute_layout(steps, &LayoutConfig::default())
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(layout.node_count(), steps.len() + 1);
    for (level, row) in layout.rows.iter().enumerate() {
        for node in row {
            prop_assert_eq!(node.level, level);
        }
    }
    for (id, deps) in steps {
        let node = layout.node(*id).expect("step placed");
        for dep in deps {
            let parent = layout.node(*dep).expect("dependency placed");
            prop_assert!(parent.level < node.level);
        }
    }
    Ok(())
}

/// Boxes in a row keep at least the horizontal margin between them and stay
/// inside the canvas.
fn check_rows_do_not_overlap(layout: &Layout, config: &LayoutConfig) -> Result<(), TestCaseError> {
    for row in &layout.rows {
        let mut lefts: Vec<f32> = row.iter().map(|node| node.x).collect();
        lefts.sort_by(|a, b| a.total_cmp(b));
        for left in &lefts {
            prop_assert!(*left >= -TOLERANCE);
            prop_assert!(*left + config.box_width <= layout.width + TOLERANCE);
        }
        for pair in lefts.windows(2) {
            prop_assert!(pair[0] + config.box_width + config.h_margin <= pair[1] + TOLERANCE);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn layout_is_deterministic(steps in step_map_strategy()) {
        check_layout_is_deterministic(&steps)?;
    }

    #[test]
    fn rows_match_levels(steps in step_map_strategy()) {
        check_rows_match_levels(&steps)?;
    }

    #[test]
    fn rows_do_not_overlap(steps in step_map_strategy(), config in config_strategy()) {
        let layout = compute_layout(&steps, &config)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        check_rows_do_not_overlap(&layout, &config)?;
    }
}
