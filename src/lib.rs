#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{EmptyDiagram, LayoutConfig, load_config};
pub use ir::{StepEntry, StepId, StepMap};
pub use layout::{Layout, LayoutError, NodeLayout, compute_layout};
pub use layout_dump::{LayoutDump, layout_to_json};
pub use parser::{ParseError, dependencies_from_step_list, parse_steps};

/// Parses `input` with [`parse_steps`] and lays it out.
pub fn layout_source(input: &str, config: &LayoutConfig) -> anyhow::Result<Layout> {
    let steps = parse_steps(input)?;
    Ok(compute_layout(&steps, config)?)
}
