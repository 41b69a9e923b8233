//! This crate compiles Turing machines into sets of Wang tiles and grows the tile
//! assemblies that trace their runs.
//! It includes modules for parsing machine descriptions, validating them, generating the
//! tile set, growing one assembly per input string, and orienting the result for rendering.

pub mod analyzer;
pub mod assembly;
pub mod compiler;
pub mod export;
pub mod loader;
pub mod options;
pub mod orientation;
pub mod parser;
pub mod programs;
pub mod tiler;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the validation entry points from the analyzer module.
pub use analyzer::{analyze, check_input, AnalysisError};
/// Re-exports the assembly engine.
pub use assembly::{Assembler, Assembly, Growth, GrowthStep, Placement, Termination};
/// Re-exports the tile set compiler.
pub use compiler::{compile, IndexCollision, IndexKind, TileSet};
/// Re-exports the renderer hand-off.
pub use export::{output_file_name, AssemblyExport};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
pub use options::Options;
pub use orientation::{OrientedAssembly, Orientation};
/// Re-exports the `parse` functions from the parser module.
pub use parser::{parse, parse_named};
/// Re-exports `BuiltinMachine`, `MachineCatalog`, `MachineInfo`, and `MACHINES` from the programs module.
pub use programs::{BuiltinMachine, MachineCatalog, MachineInfo, MACHINES};
pub use tiler::{Run, Tiler};
/// Re-exports the machine and tile types.
pub use types::{
    Bond, Direction, Edges, Machine, Move, Strength, Tile, TilerError, Transition,
    DEFAULT_BOUNDARY_SYMBOL, DEFAULT_MAX_DEPTH, MAX_MACHINE_SIZE,
};
