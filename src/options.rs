//! Run configuration shared by every input of a run.

use crate::orientation::Orientation;
use crate::types::{TilerError, DEFAULT_BOUNDARY_SYMBOL, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options controlling growth, layout and which traces are kept.
///
/// Missing keys in a config file take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// Maximum number of assembly rows, 0 for unbounded.
    pub max_depth: usize,
    /// Counter-clockwise quarter turns, 0 to 3.
    pub rotation: u8,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub boundary_symbol: String,
    /// Keep traces that hit `max_depth` instead of skipping them.
    pub ignore_depth_failure: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            rotation: 0,
            flip_horizontal: false,
            flip_vertical: false,
            boundary_symbol: DEFAULT_BOUNDARY_SYMBOL.to_string(),
            ignore_depth_failure: false,
        }
    }
}

impl Options {
    /// Reads options from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, TilerError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TilerError::FileError(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, TilerError> {
        let options: Self = serde_json::from_str(content)
            .map_err(|e| TilerError::OptionError(format!("Malformed config: {e}")))?;
        options.validate()?;

        Ok(options)
    }

    pub fn validate(&self) -> Result<(), TilerError> {
        self.orientation()?;

        let mut chars = self.boundary_symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() && c != '#' => Ok(()),
            _ => Err(TilerError::OptionError(format!(
                "boundary symbol must be one printable character other than '#', got {:?}",
                self.boundary_symbol
            ))),
        }
    }

    pub fn orientation(&self) -> Result<Orientation, TilerError> {
        Orientation::new(self.rotation, self.flip_horizontal, self.flip_vertical)
    }
}
