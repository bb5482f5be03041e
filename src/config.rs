use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::layout::LayoutError;

/// What an empty step map lays out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptyDiagram {
    /// A single row holding only the start node.
    #[default]
    RootOnly,
    /// No rows at all.
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub box_width: f32,
    pub box_height: f32,
    pub h_margin: f32,
    pub v_margin: f32,
    pub empty_diagram: EmptyDiagram,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            box_width: 249.0,
            box_height: 75.0,
            h_margin: 1.0,
            v_margin: 50.0,
            empty_diagram: EmptyDiagram::RootOnly,
        }
    }
}

impl LayoutConfig {
    /// Horizontal distance between the left edges of two neighbouring boxes.
    pub fn column_pitch(&self) -> f32 {
        self.box_width + self.h_margin
    }

    /// Vertical distance between the tops of two consecutive rows.
    pub fn row_pitch(&self) -> f32 {
        self.box_height + self.v_margin
    }

    /// Checks that boxes have a positive size and margins are not negative.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let sizes = [("boxWidth", self.box_width), ("boxHeight", self.box_height)];
        for (field, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::InvalidConfig {
                    field,
                    requirement: "a positive number",
                });
            }
        }
        let margins = [("hMargin", self.h_margin), ("vMargin", self.v_margin)];
        for (field, value) in margins {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LayoutError::InvalidConfig {
                    field,
                    requirement: "a non-negative number",
                });
            }
        }
        Ok(())
    }

    /// Width of `count` boxes laid side by side.
    pub fn span_width(&self, count: usize) -> f32 {
        if count == 0 {
            return 0.0;
        }
        count as f32 * self.box_width + (count - 1) as f32 * self.h_margin
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutOverrides>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOverrides {
    box_width: Option<f32>,
    box_height: Option<f32>,
    h_margin: Option<f32>,
    v_margin: Option<f32>,
    empty_diagram: Option<EmptyDiagram>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(vars) = parsed.layout {
        if let Some(v) = vars.box_width {
            config.layout.box_width = v;
        }
        if let Some(v) = vars.box_height {
            config.layout.box_height = v;
        }
        if let Some(v) = vars.h_margin {
            config.layout.h_margin = v;
        }
        if let Some(v) = vars.v_margin {
            config.layout.v_margin = v;
        }
        if let Some(v) = vars.empty_diagram {
            config.layout.empty_diagram = v;
        }
    }

    config.layout.validate()?;
    Ok(config)
}
