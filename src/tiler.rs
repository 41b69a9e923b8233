//! This module drives a whole run: one machine, one tile set, any number of inputs.

use crate::analyzer::{analyze, check_input};
use crate::assembly::{Assembler, Assembly, Growth, Termination};
use crate::compiler::{compile, TileSet};
use crate::options::Options;
use crate::orientation::{Orientation, OrientedAssembly};
use crate::types::{Machine, TilerError};
use rayon::prelude::*;
use std::sync::Arc;

/// The result of assembling one input.
#[derive(Debug, Clone)]
pub struct Run {
    pub input: String,
    /// The assembly in growth orientation, seed row first.
    pub growth: Growth,
    pub oriented: OrientedAssembly,
}

impl Run {
    pub fn termination(&self) -> Termination {
        self.growth.termination
    }

    pub fn is_complete(&self) -> bool {
        self.growth.is_complete()
    }

    pub fn assembly(&self) -> &Assembly {
        &self.growth.assembly
    }
}

/// Compiles a machine once and assembles inputs against the shared tile set.
#[derive(Debug, Clone)]
pub struct Tiler {
    machine: Arc<Machine>,
    tiles: Arc<TileSet>,
    options: Options,
    orientation: Orientation,
}

impl Tiler {
    /// Validates the options and the machine, then generates the tile set.
    ///
    /// The machine must use the boundary symbol given in `options`.
    pub fn new(machine: Machine, options: Options) -> Result<Self, TilerError> {
        options.validate()?;
        let orientation = options.orientation()?;

        if machine.boundary_symbol != options.boundary_symbol {
            return Err(TilerError::OptionError(format!(
                "machine {} uses boundary symbol {:?}, options ask for {:?}",
                machine.name, machine.boundary_symbol, options.boundary_symbol
            )));
        }
        analyze(&machine)?;

        let tiles = Arc::new(compile(&machine));

        Ok(Self {
            machine: Arc::new(machine),
            tiles,
            options,
            orientation,
        })
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Grows, trims and orients the assembly for one input.
    ///
    /// # Returns
    ///
    /// * `Ok(Run)` once growth stopped, whatever the termination.
    /// * `Err(TilerError::InvalidInput)` if the input cannot be seeded for this machine.
    pub fn assemble(&self, input: &str) -> Result<Run, TilerError> {
        check_input(&self.machine, input)?;

        tracing::info!(input, "Processing input");
        let seed = Assembly::seed(&self.machine, input);
        let growth = Assembler::new(Arc::clone(&self.tiles), seed, self.options.max_depth).run();

        match growth.termination {
            Termination::Halted => tracing::debug!(
                input,
                rows = growth.assembly.height(),
                tiles = growth.placed,
                "machine halted"
            ),
            Termination::Stalled => tracing::warn!(
                input,
                rows = growth.assembly.height(),
                "growth stopped without a halting tile"
            ),
            Termination::DepthExceeded => tracing::warn!(
                input,
                max_depth = self.options.max_depth,
                "maximum depth exceeded, trace is incomplete"
            ),
        }

        let oriented = self.orientation.apply(&growth.assembly);

        Ok(Run {
            input: input.to_string(),
            growth,
            oriented,
        })
    }

    /// Assembles every input in parallel. Results come back in input order; a rejected
    /// input does not affect the others.
    pub fn assemble_all<S>(&self, inputs: &[S]) -> Vec<Result<Run, TilerError>>
    where
        S: AsRef<str> + Sync,
    {
        inputs
            .par_iter()
            .map(|input| {
                let input = input.as_ref();
                self.assemble(input).inspect_err(|e| {
                    tracing::warn!(input, "skipping input: {e}");
                })
            })
            .collect()
    }

    /// Whether a finished run should be handed to the renderer.
    pub fn keep(&self, run: &Run) -> bool {
        run.termination() != Termination::DepthExceeded || self.options.ignore_depth_failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::MachineCatalog;

    fn tiler(name: &str, options: Options) -> Tiler {
        let machine = MachineCatalog::get_machine_by_name(name).unwrap();
        Tiler::new(machine, options).unwrap()
    }

    #[test]
    fn test_assemble_halt_immediately() {
        let tiler = tiler("halt-immediately", Options::default());
        let run = tiler.assemble("0").unwrap();

        assert!(run.is_complete());
        assert_eq!(run.assembly().width(), 3);
        assert_eq!(run.assembly().height(), 2);
        assert_eq!((run.oriented.width, run.oriented.height), (3, 2));
        assert!(tiler.keep(&run));
    }

    #[test]
    fn test_assemble_busy_beaver() {
        let tiler = tiler("busy-beaver-2", Options::default());
        let run = tiler.assemble("0000").unwrap();

        assert_eq!(run.termination(), Termination::Halted);
        let top = run.assembly().height() - 1;
        assert_eq!(top, 6);
        assert_eq!(run.assembly().tape(top).as_deref(), Some("1111"));
    }

    #[test]
    fn test_assemble_orients_result() {
        let options = Options {
            rotation: 1,
            ..Options::default()
        };
        let tiler = tiler("bit-flip", options);
        let run = tiler.assemble("01").unwrap();

        assert!(run.is_complete());
        let top = run.assembly().height() - 1;
        assert_eq!(run.assembly().tape(top).as_deref(), Some("10"));
        assert_eq!(run.oriented.width, run.assembly().height());
        assert_eq!(run.oriented.height, run.assembly().width());
        assert_eq!(
            run.oriented.cells[0][run.oriented.width - 1],
            run.assembly().rows()[0][0]
        );
    }

    #[test]
    fn test_assemble_all_skips_bad_inputs() {
        let tiler = tiler("binary-increment", Options::default());
        let results = tiler.assemble_all(&["101", "1x1", "", "0111"]);

        assert_eq!(results.len(), 4);

        let run = results[0].as_ref().unwrap();
        let top = run.assembly().height() - 1;
        assert_eq!(run.assembly().tape(top).as_deref(), Some("110"));

        assert!(matches!(results[1], Err(TilerError::InvalidInput { .. })));
        // the head has no cell to start on
        assert!(matches!(results[2], Err(TilerError::InvalidInput { .. })));

        let run = results[3].as_ref().unwrap();
        let top = run.assembly().height() - 1;
        assert_eq!(run.assembly().tape(top).as_deref(), Some("1000"));
    }

    #[test]
    fn test_depth_failure_is_kept_only_when_ignored() {
        let options = Options {
            max_depth: 3,
            ..Options::default()
        };
        let strict = tiler("binary-increment", options.clone());
        let run = strict.assemble("101").unwrap();
        assert_eq!(run.termination(), Termination::DepthExceeded);
        assert!(run.assembly().height() <= 3);
        assert!(!strict.keep(&run));

        let lenient = tiler(
            "binary-increment",
            Options {
                ignore_depth_failure: true,
                ..options
            },
        );
        assert!(lenient.keep(&lenient.assemble("101").unwrap()));
    }

    #[test]
    fn test_rejects_mismatched_boundary() {
        let machine = MachineCatalog::get_machine_by_name("bit-flip").unwrap();
        let options = Options {
            boundary_symbol: "|".to_string(),
            ..Options::default()
        };

        let error = Tiler::new(machine, options).unwrap_err();
        assert!(matches!(error, TilerError::OptionError(_)));
    }
}
