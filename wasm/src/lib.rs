use serde::Deserialize;
use step_diagram::{EmptyDiagram, LayoutConfig, layout_source, layout_to_json};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepLayoutOptions {
    box_width: Option<f32>,
    box_height: Option<f32>,
    h_margin: Option<f32>,
    v_margin: Option<f32>,
    empty_diagram: Option<EmptyDiagram>,
}

fn build_layout_config(options: StepLayoutOptions) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(v) = options.box_width {
        config.box_width = v;
    }
    if let Some(v) = options.box_height {
        config.box_height = v;
    }
    if let Some(v) = options.h_margin {
        config.h_margin = v;
    }
    if let Some(v) = options.v_margin {
        config.v_margin = v;
    }
    if let Some(v) = options.empty_diagram {
        config.empty_diagram = v;
    }
    config
}

fn layout_json(input: &str, options: StepLayoutOptions) -> Result<String, String> {
    let config = build_layout_config(options);
    let layout = layout_source(input, &config).map_err(|error| error.to_string())?;
    layout_to_json(&layout).map_err(|error| error.to_string())
}

/// Lays out steps given as a dependency map, step list or text and returns
/// the positioned rows as JSON.
#[wasm_bindgen]
pub fn layout_steps(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<StepLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        StepLayoutOptions::default()
    };

    layout_json(input, options).map_err(|error| JsValue::from_str(&error))
}
