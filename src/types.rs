//! This module defines the core data structures shared by the tile compiler and the assembly
//! engine: the parsed Turing machine, the Wang tiles generated from it, and the crate error type.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Index;
use thiserror::Error;

use crate::Rule;

/// The default boundary symbol wrapped around every input tape.
pub const DEFAULT_BOUNDARY_SYMBOL: &str = "*";
/// The machine name used when a description has no `NAME` directive and no file name.
pub const DEFAULT_MACHINE_NAME: &str = "machine";
/// The state the head starts in when a description has no `START` directive.
pub const DEFAULT_INITIAL_STATE: &str = "1";
/// The default maximum number of assembly rows.
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// The maximum allowed size for a machine description in bytes.
pub const MAX_MACHINE_SIZE: usize = 65536; // 64KB

/// Sentinel carried on horizontal edges of tiles left of the head.
pub const LEFT_SENTINEL: &str = "L";
/// Sentinel carried on horizontal edges of tiles right of the head.
pub const RIGHT_SENTINEL: &str = "R";
/// Bond strength a site must collect before a tile may attach.
pub const TEMPERATURE: u8 = 2;

/// A Turing machine as read from a machine description.
///
/// `symbols` holds the declared alphabet followed by the boundary symbol, which is
/// also kept in `boundary_symbol` so the alphabet can be told apart from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// The name of the machine, used to name its outputs.
    pub name: String,
    /// The declared tape alphabet with the boundary symbol appended.
    pub symbols: Vec<String>,
    /// Transition rules in declaration order.
    pub transitions: Vec<Transition>,
    /// The state the head starts in.
    pub initial_state: String,
    /// Index into the input string where the head starts.
    pub initial_location: usize,
    /// The symbol marking both ends of the tape.
    pub boundary_symbol: String,
}

impl Machine {
    /// Returns the declared alphabet, without the boundary symbol.
    pub fn alphabet(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .map(String::as_str)
            .filter(move |s| *s != self.boundary_symbol)
    }

    /// Returns every state named by a transition, in order of first appearance.
    pub fn states(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.transitions
            .iter()
            .flat_map(|t| [t.old_state.as_str(), t.new_state.as_str()])
            .filter(|state| seen.insert(*state))
            .collect()
    }

    /// Checks whether `symbol` is part of the declared alphabet.
    pub fn is_alphabet_symbol(&self, symbol: &str) -> bool {
        self.alphabet().any(|s| s == symbol)
    }
}

/// A single transition rule: in `old_state` reading `read`, write `write`, perform
/// `movement` and continue in `new_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub old_state: String,
    pub read: String,
    pub write: String,
    pub movement: Move,
    pub new_state: String,
    /// Output reported when the machine halts; only valid with [`Move::Halt`].
    pub output: Option<String>,
}

impl Transition {
    /// The head signal label a transition responds to: `"<old_state> <read>"`.
    pub fn signal(&self) -> String {
        head_signal(&self.old_state, &self.read)
    }
}

/// Builds the label of the double bond that carries the head from one row to the next.
pub fn head_signal(state: &str, symbol: &str) -> String {
    format!("{state} {symbol}")
}

/// What the head does after writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// Stop the machine.
    Halt,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Move::Left => "L",
            Move::Right => "R",
            Move::Halt => "H",
        };
        f.write_str(letter)
    }
}

/// One of the four edges of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

/// Multiplicity of a bond. Two single bonds or one double bond reach the temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Strength {
    Single,
    Double,
}

impl Strength {
    pub fn value(self) -> u8 {
        match self {
            Strength::Single => 1,
            Strength::Double => 2,
        }
    }
}

impl From<Strength> for u8 {
    fn from(strength: Strength) -> Self {
        strength.value()
    }
}

impl TryFrom<u8> for Strength {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Strength::Single),
            2 => Ok(Strength::Double),
            other => Err(format!("bond strength must be 1 or 2, got {other}")),
        }
    }
}

/// A labeled bond on one edge of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bond {
    pub strength: Strength,
    pub label: String,
}

impl Bond {
    pub fn single(label: impl Into<String>) -> Self {
        Self {
            strength: Strength::Single,
            label: label.into(),
        }
    }

    pub fn double(label: impl Into<String>) -> Self {
        Self {
            strength: Strength::Double,
            label: label.into(),
        }
    }

    pub fn strength(&self) -> u8 {
        self.strength.value()
    }
}

/// The four bonds of a tile, exactly one per [`Direction`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edges {
    pub up: Bond,
    pub left: Bond,
    pub down: Bond,
    pub right: Bond,
}

impl Index<Direction> for Edges {
    type Output = Bond;

    fn index(&self, direction: Direction) -> &Bond {
        match direction {
            Direction::Up => &self.up,
            Direction::Left => &self.left,
            Direction::Down => &self.down,
            Direction::Right => &self.right,
        }
    }
}

/// An abstract Wang tile. Tiles are immutable once built and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub name: String,
    pub edges: Edges,
    /// Set on tiles generated from halting transitions.
    pub is_final: bool,
}

impl Tile {
    pub fn new(name: impl Into<String>, edges: Edges) -> Self {
        Self {
            name: name.into(),
            edges,
            is_final: false,
        }
    }

    pub fn bond(&self, direction: Direction) -> &Bond {
        &self.edges[direction]
    }

    /// The tape symbol this tile passes to the row above it.
    ///
    /// A double top bond carries `"<state> <symbol>"`; a halting tile carries
    /// `"<symbol> [<output>]"`; every other top bond is the bare symbol.
    pub fn tape_symbol(&self) -> &str {
        let label = self.edges.up.label.as_str();
        match self.edges.up.strength {
            Strength::Double => label.split_once(' ').map_or(label, |(_, symbol)| symbol),
            Strength::Single => label.split_once(' ').map_or(label, |(symbol, _)| symbol),
        }
    }

    /// The state of the head signal leaving this tile upwards, if any.
    pub fn head_state(&self) -> Option<&str> {
        match self.edges.up.strength {
            Strength::Double => self.edges.up.label.split_once(' ').map(|(state, _)| state),
            Strength::Single => None,
        }
    }

    /// The halting output written on a final tile, if any.
    pub fn output(&self) -> Option<&str> {
        if !self.is_final {
            return None;
        }
        self.edges
            .up
            .label
            .split_once(" [")
            .and_then(|(_, rest)| rest.strip_suffix(']'))
    }
}

/// Represents the errors raised while loading, validating, compiling or exporting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TilerError {
    /// Indicates a syntax error in a machine description.
    #[error("Machine parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a machine that parsed but cannot be compiled into a tile set.
    #[error("Machine validation error: {0}")]
    ValidationError(String),
    /// Indicates an input string that cannot be seeded for this machine.
    #[error("Invalid input {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },
    /// Indicates an unusable run option.
    #[error("Invalid option: {0}")]
    OptionError(String),
    /// Indicates an error reading or writing files.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates an error serializing an assembly for the renderer.
    #[error("Export error: {0}")]
    ExportError(String),
}
