//! This module turns a finished run into the document handed to the renderer.
//!
//! The renderer needs, for each tile, its four bonds and whether it is final, and for each
//! cell of the oriented assembly, which tile occupies it.

use crate::orientation::Orientation;
use crate::tiler::Run;
use crate::types::{Tile, TilerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the renderer needs to draw one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssemblyExport {
    pub machine: String,
    pub input: String,
    pub orientation: Orientation,
    pub width: usize,
    pub height: usize,
    /// False when the trace was cut off or the machine never halted.
    pub complete: bool,
    pub output: Option<String>,
    /// Tiles referenced by `cells`, keyed by name.
    pub tiles: BTreeMap<String, Tile>,
    /// Tile names indexed `[y][x]`, `null` for empty cells.
    pub cells: Vec<Vec<Option<String>>>,
}

impl AssemblyExport {
    pub fn new(machine: &str, run: &Run) -> Self {
        let oriented = &run.oriented;
        let mut tiles = BTreeMap::new();

        let cells = oriented
            .cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|slot| {
                        slot.as_ref().map(|tile| {
                            tiles
                                .entry(tile.name.clone())
                                .or_insert_with(|| Tile::clone(tile));
                            tile.name.clone()
                        })
                    })
                    .collect()
            })
            .collect();

        Self {
            machine: machine.to_string(),
            input: run.input.clone(),
            orientation: oriented.orientation,
            width: oriented.width,
            height: oriented.height,
            complete: run.is_complete(),
            output: run.assembly().output().map(str::to_string),
            tiles,
            cells,
        }
    }

    pub fn to_json(&self) -> Result<String, TilerError> {
        serde_json::to_string_pretty(self).map_err(|e| TilerError::ExportError(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self, TilerError> {
        serde_json::from_str(content).map_err(|e| TilerError::ExportError(e.to_string()))
    }
}

/// File name of the export for one input, `<machine>-<input>.json`.
pub fn output_file_name(machine: &str, input: &str) -> String {
    format!("{machine}-{input}.json")
}
