use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub rows: Vec<Vec<NodeDump>>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: u64,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub center_x: f32,
    pub children: Vec<u64>,
    pub parents: Vec<u64>,
    pub sort_key: String,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let rows = layout
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|node| NodeDump {
                        id: node.id.0,
                        level: node.level,
                        x: node.x,
                        y: node.y,
                        center_x: node.center_x,
                        children: node.children.iter().map(|id| id.0).collect(),
                        parents: node.parents.iter().map(|id| id.0).collect(),
                        sort_key: node.sort_key.clone(),
                    })
                    .collect()
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            rows,
        }
    }
}

pub fn layout_to_json(layout: &Layout) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_layout(layout))?)
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

/// One line per row: `level: id@x id@x ...`.
pub fn layout_summary(layout: &Layout) -> String {
    let mut out = String::new();
    for (level, row) in layout.rows.iter().enumerate() {
        out.push_str(&format!("{level}:"));
        for node in row {
            out.push_str(&format!(" {}@{:.1}", node.id, node.x));
        }
        out.push('\n');
    }
    out.push_str(&format!("size: {:.1}x{:.1}\n", layout.width, layout.height));
    out
}
