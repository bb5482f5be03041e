use crate::ir::StepId;

/// Structural problems found while building a step graph, and box geometry
/// that cannot be laid out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("step id 0 is reserved for the start node")]
    ReservedStepId,
    #[error("step {step} depends on unknown step {dependency}")]
    UnresolvedDependency { step: StepId, dependency: StepId },
    #[error("cyclic dependency involving step {step}")]
    CyclicDependency { step: StepId },
    #[error("invalid layout config: {field} must be {requirement}")]
    InvalidConfig {
        field: &'static str,
        requirement: &'static str,
    },
}
