//! Subcommand implementations.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use stage_core::persist::{load_document, save_document};
use stage_core::{
    DisplayList, EntityGeometry, EntityId, Point, SceneDocument, StageResult, Text, Transform,
};

use crate::{CliConfig, Command};

/// Counts reported by `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    /// Root entity id.
    pub root: EntityId,
    /// Root name.
    pub root_name: String,
    /// Entities including the root.
    pub entities: usize,
    /// Attached components across all entities.
    pub components: usize,
}

/// Run one subcommand, writing its report to `out`.
///
/// # Errors
///
/// Returns an error if a scene cannot be read, parsed or written.
pub fn run(config: &CliConfig, command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::New { out: path } => {
            let count = new_scene(config, path)?;
            writeln!(out, "Wrote {} ({count} entities)", path.display())?;
        }
        Command::Validate { scene, json } => {
            let summary = validate_scene(config, scene)?;
            if *json {
                serde_json::to_writer_pretty(&mut *out, &summary)?;
                writeln!(out)?;
            } else {
                writeln!(
                    out,
                    "{}: {} entities, {} components (root {:?})",
                    scene.display(),
                    summary.entities,
                    summary.components,
                    summary.root_name
                )?;
            }
        }
        Command::Layout { scene, json } => {
            let rows = layout_scene(config, scene)?;
            if *json {
                serde_json::to_writer_pretty(&mut *out, &rows)?;
                writeln!(out)?;
            } else {
                write_outline(out, &rows)?;
            }
        }
        Command::Paint { scene } => {
            let list = paint_scene(config, scene)?;
            serde_json::to_writer_pretty(&mut *out, &list)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// The starter scene: a "Title" text and a "StartButton" button.
///
/// # Errors
///
/// Returns an error if the elements cannot be created.
pub fn starter_scene(config: &CliConfig) -> StageResult<SceneDocument> {
    let mut doc = SceneDocument::with_config(config.document_config());

    let title = doc.create_text_element("Title", None)?;
    doc.update_component::<Text, _>(title, |t| {
        t.set_text("Stage");
        t.set_pixel_size(48)
    });
    doc.update_component::<Transform, _>(title, |t| t.set_position(Point::new(100.0, 80.0)));

    let start = doc.create_button_element("StartButton", None)?;
    doc.update_component::<Transform, _>(start, |t| t.set_position(Point::new(100.0, 160.0)));

    doc.run_pending();
    Ok(doc)
}

/// Write the starter scene to `path`; returns its entity count.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn new_scene(config: &CliConfig, path: &Path) -> Result<usize> {
    let doc = starter_scene(config)?;
    save_document(&doc, path).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Created starter scene at {}", path.display());
    Ok(doc.entity_count())
}

/// Load a scene and run its pending layout.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_scene(config: &CliConfig, path: &Path) -> Result<SceneDocument> {
    let mut doc = SceneDocument::with_config(config.document_config());
    load_document(&mut doc, path).with_context(|| format!("loading {}", path.display()))?;
    let refreshed = doc.run_pending();
    tracing::debug!("Laid out {refreshed} entities from {}", path.display());
    Ok(doc)
}

/// Summarize a scene file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn validate_scene(config: &CliConfig, path: &Path) -> Result<SceneSummary> {
    let doc = load_scene(config, path)?;
    let tree = doc.tree();
    let root = doc.root();
    Ok(SceneSummary {
        root,
        root_name: tree.get(root).map(|e| e.name().to_string()).unwrap_or_default(),
        entities: tree.len(),
        components: tree
            .pre_order()
            .iter()
            .filter_map(|id| tree.get(*id))
            .map(|e| e.components().len())
            .sum(),
    })
}

/// Resolved geometry of every entity in a scene file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn layout_scene(config: &CliConfig, path: &Path) -> Result<Vec<EntityGeometry>> {
    Ok(load_scene(config, path)?.geometry_report())
}

/// Paint a scene file into a display list.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn paint_scene(config: &CliConfig, path: &Path) -> Result<DisplayList> {
    let doc = load_scene(config, path)?;
    let mut list = DisplayList::new();
    doc.paint(&mut list);
    tracing::debug!("Painted {} commands", list.len());
    Ok(list)
}

fn write_outline(out: &mut impl Write, rows: &[EntityGeometry]) -> Result<()> {
    let mut depths: HashMap<EntityId, usize> = HashMap::new();
    for row in rows {
        let depth = row
            .parent
            .and_then(|p| depths.get(&p))
            .map_or(0, |d| d + 1);
        depths.insert(row.id, depth);
        writeln!(
            out,
            "{:indent$}{} at ({:.1}, {:.1}) size {:.1}x{:.1} rot {:.1} z {}",
            "",
            row.name,
            row.canvas_origin.x,
            row.canvas_origin.y,
            row.local_rect.width,
            row.local_rect.height,
            row.rotation,
            row.z,
            indent = depth * 2
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_scene_layout() {
        let doc = starter_scene(&CliConfig::new()).expect("starter");
        let rows = doc.geometry_report();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Title", "StartButton"]);
        assert_eq!(rows[1].position, Point::new(100.0, 160.0));
        assert!(!doc.has_pending());
    }

    #[test]
    fn test_outline_indents_children() {
        let mut doc = starter_scene(&CliConfig::new()).expect("starter");
        let parent = doc.geometry_report()[1].id;
        doc.create_text_element("Label", Some(parent)).expect("create");
        doc.run_pending();

        let mut out = Vec::new();
        write_outline(&mut out, &doc.geometry_report()).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let label = text.lines().nth(2).expect("third line");
        assert!(label.starts_with("  Label at (100.0, 160.0)"));
    }
}
