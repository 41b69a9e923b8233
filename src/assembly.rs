//! This module grows a tile assembly for one input string. Growth starts from a seed row
//! built from the input and adds one tile per step wherever the bonds at an empty site
//! reach the temperature. Rows are numbered bottom-up: row 0 is the seed row.

use crate::compiler::TileSet;
use crate::types::{head_signal, Bond, Direction, Edges, Machine, Tile, TEMPERATURE};
use std::sync::Arc;

/// One cell of the assembly matrix.
pub type Slot = Option<Arc<Tile>>;

/// One symbol of the input, annotated with whether the head starts on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub symbol: String,
    pub is_head: bool,
}

/// A rectangular matrix of placed tiles with a fixed number of columns.
///
/// Cells are only ever filled, never cleared or replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    width: usize,
    rows: Vec<Vec<Slot>>,
}

impl Assembly {
    /// Builds the seed row for `input`: one seed tile per input symbol, wrapped in two
    /// boundary tiles.
    ///
    /// The input is expected to have passed [`crate::analyzer::check_input`].
    pub fn seed(machine: &Machine, input: &str) -> Self {
        let cells: Vec<Cell> = input
            .chars()
            .enumerate()
            .map(|(i, c)| Cell {
                symbol: c.to_string(),
                is_head: i == machine.initial_location,
            })
            .collect();

        let boundary = &machine.boundary_symbol;
        let mut row = Vec::with_capacity(cells.len() + 2);
        row.push(Some(Arc::new(boundary_tile(boundary, Direction::Left))));
        for (i, cell) in cells.iter().enumerate() {
            row.push(Some(Arc::new(seed_tile(
                cell,
                &machine.initial_state,
                i + 1,
            ))));
        }
        row.push(Some(Arc::new(boundary_tile(boundary, Direction::Right))));

        Self {
            width: row.len(),
            rows: vec![row],
        }
    }

    /// Number of columns, including the two boundary columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows, including the seed row.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Slot>] {
        &self.rows
    }

    /// The tile at `(row, column)`, if the cell exists and is occupied.
    pub fn get(&self, row: usize, column: usize) -> Option<&Arc<Tile>> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.rows.iter().flatten().filter(|slot| slot.is_some()).count()
    }

    /// The tape a complete row passes upwards, without the boundary columns.
    ///
    /// Returns `None` if the row does not exist or has an empty interior cell.
    pub fn tape(&self, row: usize) -> Option<String> {
        let cells = self.rows.get(row)?;
        cells[1..self.width - 1]
            .iter()
            .map(|slot| slot.as_ref().map(|tile| tile.tape_symbol()))
            .collect()
    }

    /// The column and state of the head signal leaving `row` upwards, if any.
    pub fn head(&self, row: usize) -> Option<(usize, &str)> {
        self.rows
            .get(row)?
            .iter()
            .enumerate()
            .find_map(|(column, slot)| {
                slot.as_ref()
                    .and_then(|tile| tile.head_state())
                    .map(|state| (column, state))
            })
    }

    /// The position and tile of the halting tile, if one was placed.
    pub fn final_tile(&self) -> Option<(usize, usize, &Arc<Tile>)> {
        self.rows.iter().enumerate().find_map(|(row, cells)| {
            cells.iter().enumerate().find_map(|(column, slot)| {
                slot.as_ref()
                    .filter(|tile| tile.is_final)
                    .map(|tile| (row, column, tile))
            })
        })
    }

    /// The output the machine halted with, if any.
    pub fn output(&self) -> Option<&str> {
        self.final_tile().and_then(|(_, _, tile)| tile.output())
    }

    /// Looks for the next tile to place.
    ///
    /// Only the two topmost rows are scanned: growth proceeds strictly one row at a time,
    /// so every row below them is closed. Within the window cells are visited row by row,
    /// column by column, trying Left, Right and Up in that order. A site in row
    /// `depth_limit` or above is refused and reported through the returned flag.
    fn scan(&self, tiles: &TileSet, depth_limit: Option<usize>) -> (Option<Placement>, bool) {
        let mut blocked = false;
        let height = self.rows.len();

        for row in height.saturating_sub(2)..height {
            for column in 0..self.width {
                let Some(tile) = self.get(row, column) else {
                    continue;
                };

                if let Some(placement) = self.grow_left(tiles, tile, row, column) {
                    return (Some(placement), blocked);
                }
                if let Some(placement) = self.grow_right(tiles, tile, row, column) {
                    return (Some(placement), blocked);
                }
                if let Some(placement) = self.grow_up(tiles, tile, row, column) {
                    if depth_limit.is_some_and(|limit| placement.row >= limit) {
                        blocked = true;
                        continue;
                    }
                    return (Some(placement), blocked);
                }
            }
        }

        (None, blocked)
    }

    /// Left of `tile`, cooperating with the tile below the empty site.
    fn grow_left(
        &self,
        tiles: &TileSet,
        tile: &Tile,
        row: usize,
        column: usize,
    ) -> Option<Placement> {
        let target = column.checked_sub(1)?;
        let below = self.get(row.checked_sub(1)?, target)?;
        if self.get(row, target).is_some() || !cooperate(&tile.edges.left, &below.edges.up) {
            return None;
        }

        tiles
            .by_right_bottom(&tile.edges.left.label, &below.edges.up.label)
            .map(|candidate| Placement::new(row, target, Direction::Left, candidate))
    }

    /// Right of `tile`, cooperating with the tile below the empty site.
    fn grow_right(
        &self,
        tiles: &TileSet,
        tile: &Tile,
        row: usize,
        column: usize,
    ) -> Option<Placement> {
        let target = column + 1;
        if target >= self.width {
            return None;
        }
        let below = self.get(row.checked_sub(1)?, target)?;
        if self.get(row, target).is_some() || !cooperate(&tile.edges.right, &below.edges.up) {
            return None;
        }

        tiles
            .by_left_bottom(&tile.edges.right.label, &below.edges.up.label)
            .map(|candidate| Placement::new(row, target, Direction::Right, candidate))
    }

    /// Above `tile`. Nothing exists beside the new row yet, so the top bond has to reach
    /// the temperature on its own.
    fn grow_up(
        &self,
        tiles: &TileSet,
        tile: &Tile,
        row: usize,
        column: usize,
    ) -> Option<Placement> {
        if tile.edges.up.strength() < TEMPERATURE || self.get(row + 1, column).is_some() {
            return None;
        }

        tiles
            .by_bottom(&tile.edges.up.label)
            .map(|candidate| Placement::new(row + 1, column, Direction::Up, candidate))
    }

    /// Puts a tile into an empty cell, opening a new top row if needed.
    fn place(&mut self, placement: &Placement) {
        debug_assert!(
            placement.row + 2 >= self.rows.len(),
            "placement in row {} is below the growth window of {} rows",
            placement.row,
            self.rows.len()
        );

        if placement.row == self.rows.len() {
            self.rows.push(vec![None; self.width]);
        }

        let slot = &mut self.rows[placement.row][placement.column];
        debug_assert!(slot.is_none(), "cell is already occupied");
        *slot = Some(Arc::clone(&placement.tile));
    }

    /// Drops empty rows from the top of the assembly. The seed row is always kept.
    pub fn trim(&mut self) {
        while self.rows.len() > 1
            && self
                .rows
                .last()
                .is_some_and(|row| row.iter().all(Option::is_none))
        {
            self.rows.pop();
        }
    }
}

fn cooperate(side: &Bond, below: &Bond) -> bool {
    side.strength() + below.strength() >= TEMPERATURE
}

/// A seed tile for one input cell. The head cell signals its state upwards on a double
/// bond; every other cell offers its symbol on a single bond.
fn seed_tile(cell: &Cell, initial_state: &str, column: usize) -> Tile {
    let up = if cell.is_head {
        Bond::double(head_signal(initial_state, &cell.symbol))
    } else {
        Bond::single(&cell.symbol)
    };

    Tile::new(
        format!("seed-{column}"),
        Edges {
            up,
            left: Bond::single(""),
            down: Bond::single(""),
            right: Bond::single(""),
        },
    )
}

/// A boundary seed tile for the given end of the tape: double bond facing inwards,
/// single bond facing outwards.
fn boundary_tile(boundary: &str, end: Direction) -> Tile {
    let (name, left, right) = match end {
        Direction::Left => ("seed-boundary-left", Bond::single(""), Bond::double("")),
        _ => ("seed-boundary-right", Bond::double(""), Bond::single("")),
    };

    Tile::new(
        name,
        Edges {
            up: Bond::single(boundary),
            left,
            down: Bond::single(""),
            right,
        },
    )
}

/// A tile chosen for an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub row: usize,
    pub column: usize,
    /// Side of the existing tile the new tile grew from.
    pub direction: Direction,
    pub tile: Arc<Tile>,
}

impl Placement {
    fn new(row: usize, column: usize, direction: Direction, tile: &Arc<Tile>) -> Self {
        Self {
            row,
            column,
            direction,
            tile: Arc::clone(tile),
        }
    }
}

/// The outcome of a single growth step.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthStep {
    /// Exactly one tile was added.
    Placed(Placement),
    /// No tile fits anywhere on the frontier.
    Halted,
}

/// Why growth stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing fits any more and a halting tile was placed.
    Halted,
    /// Nothing fits any more but no halting tile was placed.
    Stalled,
    /// Growth reached the row bound; the trace is incomplete.
    DepthExceeded,
}

/// A finished assembly with the reason growth stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Growth {
    pub assembly: Assembly,
    pub termination: Termination,
    /// Tiles placed on top of the seed row.
    pub placed: usize,
}

impl Growth {
    /// True when the assembly records the full run of the machine.
    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Halted
    }
}

/// Grows one assembly against a shared tile set.
pub struct Assembler {
    tiles: Arc<TileSet>,
    assembly: Assembly,
    depth_limit: Option<usize>,
    depth_exceeded: bool,
    placed: usize,
}

impl Assembler {
    /// Creates an assembler for `seed`. `max_depth` bounds the number of rows; 0 means
    /// unbounded.
    pub fn new(tiles: Arc<TileSet>, seed: Assembly, max_depth: usize) -> Self {
        Self {
            tiles,
            assembly: seed,
            depth_limit: (max_depth > 0).then_some(max_depth),
            depth_exceeded: false,
            placed: 0,
        }
    }

    /// Adds at most one tile to the assembly.
    ///
    /// # Returns
    ///
    /// * `GrowthStep::Placed` with the placement if a tile was added.
    /// * `GrowthStep::Halted` if no tile fits anywhere on the frontier.
    pub fn step(&mut self) -> GrowthStep {
        let (placement, blocked) = self.assembly.scan(&self.tiles, self.depth_limit);
        self.depth_exceeded |= blocked;

        match placement {
            Some(placement) => {
                tracing::trace!(
                    row = placement.row,
                    column = placement.column,
                    tile = %placement.tile.name,
                    "placed tile"
                );
                self.assembly.place(&placement);
                self.placed += 1;
                GrowthStep::Placed(placement)
            }
            None => GrowthStep::Halted,
        }
    }

    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    /// Grows until no tile fits, then trims the assembly.
    pub fn run(mut self) -> Growth {
        while let GrowthStep::Placed(_) = self.step() {}

        self.assembly.trim();

        let termination = if self.depth_exceeded {
            Termination::DepthExceeded
        } else if self.assembly.final_tile().is_some() {
            Termination::Halted
        } else {
            Termination::Stalled
        };

        Growth {
            assembly: self.assembly,
            termination,
            placed: self.placed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::parser::parse;
    use crate::types::{Strength, DEFAULT_BOUNDARY_SYMBOL};

    const HALT_IMMEDIATELY: &str = "SYMBOL 0\nTRANSITION 1 0 0 H 1";

    const INCREMENT: &str = r#"
SYMBOL 0
SYMBOL 1
TRANSITION 1 0 0 R 1
TRANSITION 1 1 1 R 1
TRANSITION 1 * * L 2
TRANSITION 2 1 0 L 2
TRANSITION 2 0 1 H 2
TRANSITION 2 * 1 H 2 overflow
"#;

    fn assembler(description: &str, input: &str, max_depth: usize) -> Assembler {
        let machine = parse(description, DEFAULT_BOUNDARY_SYMBOL).unwrap();
        let tiles = Arc::new(compile(&machine));
        Assembler::new(tiles, Assembly::seed(&machine, input), max_depth)
    }

    #[test]
    fn test_seed_row() {
        let machine = parse(INCREMENT, DEFAULT_BOUNDARY_SYMBOL).unwrap();
        let seed = Assembly::seed(&machine, "101");

        assert_eq!(seed.width(), 5);
        assert_eq!(seed.height(), 1);
        assert_eq!(seed.occupied(), 5);
        assert_eq!(seed.tape(0).as_deref(), Some("101"));

        let head = seed.get(0, 1).unwrap();
        assert_eq!(head.edges.up, Bond::double("1 1"));
        assert_eq!(head.edges.down, Bond::single(""));
        assert_eq!(seed.get(0, 2).unwrap().edges.up, Bond::single("0"));
        assert_eq!(seed.head(0), Some((1, "1")));

        let left = seed.get(0, 0).unwrap();
        assert_eq!(left.edges.up, Bond::single("*"));
        assert_eq!(left.edges.right.strength, Strength::Double);
        assert_eq!(left.edges.left.strength, Strength::Single);

        let right = seed.get(0, 4).unwrap();
        assert_eq!(right.edges.left.strength, Strength::Double);
        assert_eq!(right.edges.right.strength, Strength::Single);
    }

    #[test]
    fn test_halt_immediately() {
        let growth = assembler(HALT_IMMEDIATELY, "0", 0).run();

        assert_eq!(growth.termination, Termination::Halted);
        assert!(growth.is_complete());
        assert_eq!(growth.assembly.height(), 2);
        assert_eq!(growth.placed, 3);

        let (row, column, tile) = growth.assembly.final_tile().unwrap();
        assert_eq!((row, column), (1, 1));
        assert!(tile.is_final);
        assert_eq!(tile.name, "transition-0[1 0]");

        let finals = growth.assembly.rows()[1]
            .iter()
            .flatten()
            .filter(|tile| tile.is_final)
            .count();
        assert_eq!(finals, 1);
        assert_eq!(growth.assembly.tape(1).as_deref(), Some("0"));
    }

    #[test]
    fn test_first_step_grows_the_head_upwards() {
        let mut assembler = assembler(INCREMENT, "101", 0);

        match assembler.step() {
            GrowthStep::Placed(placement) => {
                assert_eq!((placement.row, placement.column), (1, 1));
                assert_eq!(placement.direction, Direction::Up);
                assert_eq!(placement.tile.name, "transition-1[1 1]");
            }
            GrowthStep::Halted => panic!("expected a placement"),
        }
        assert_eq!(assembler.assembly().height(), 2);
    }

    #[test]
    fn test_binary_increment() {
        let growth = assembler(INCREMENT, "101", 0).run();

        assert_eq!(growth.termination, Termination::Halted);
        // six transitions, one row each
        assert_eq!(growth.assembly.height(), 7);

        let top = growth.assembly.height() - 1;
        assert_eq!(growth.assembly.tape(top).as_deref(), Some("110"));
        assert_eq!(growth.assembly.output(), None);

        // the head walks right to the boundary and back
        let columns: Vec<usize> = (0..top)
            .filter_map(|row| growth.assembly.head(row).map(|(column, _)| column))
            .collect();
        assert_eq!(columns, vec![1, 2, 3, 4, 3, 2]);

        // every cell of the finished assembly is filled
        assert_eq!(growth.assembly.occupied(), 7 * 5);
    }

    #[test]
    fn test_binary_increment_overflow() {
        let growth = assembler(INCREMENT, "11", 0).run();

        assert_eq!(growth.termination, Termination::Halted);
        let top = growth.assembly.height() - 1;
        assert_eq!(growth.assembly.tape(top).as_deref(), Some("00"));
        assert_eq!(growth.assembly.output(), Some("overflow"));
        let (_, column, _) = growth.assembly.final_tile().unwrap();
        assert_eq!(column, 0);
    }

    #[test]
    fn test_depth_limit() {
        let growth = assembler(INCREMENT, "101", 3).run();

        assert_eq!(growth.termination, Termination::DepthExceeded);
        assert!(!growth.is_complete());
        assert_eq!(growth.assembly.height(), 3);
        // rows below the bound are still complete
        assert_eq!(growth.assembly.occupied(), 3 * 5);
        assert!(growth.assembly.final_tile().is_none());
    }

    #[test]
    fn test_depth_limit_not_reached() {
        let growth = assembler(INCREMENT, "101", 7).run();

        assert_eq!(growth.termination, Termination::Halted);
        assert_eq!(growth.assembly.height(), 7);
    }

    #[test]
    fn test_stalls_without_transition() {
        // state 2 has no rule for 1
        let description = "SYMBOL 0\nSYMBOL 1\nTRANSITION 1 0 0 R 2\nTRANSITION 2 0 0 H 2";
        let growth = assembler(description, "01", 0).run();

        assert_eq!(growth.termination, Termination::Stalled);
        assert_eq!(growth.assembly.height(), 2);
        assert_eq!(growth.assembly.head(1), Some((2, "2")));
    }

    #[test]
    fn test_stalls_when_head_leaves_the_tape() {
        let description = "SYMBOL 0\nTRANSITION 1 0 0 R 1\nTRANSITION 1 * * R 1";
        let growth = assembler(description, "0", 0).run();

        assert_eq!(growth.termination, Termination::Stalled);
        // the head reaches the right boundary column and cannot move past it
        assert_eq!(growth.assembly.height(), 3);
        assert_eq!(growth.assembly.occupied(), 3 * 3);
    }

    #[test]
    fn test_growth_is_monotonic() {
        let mut assembler = assembler(INCREMENT, "0110", 0);
        let mut previous = assembler.assembly().clone();

        while let GrowthStep::Placed(placement) = assembler.step() {
            let current = assembler.assembly();
            assert_eq!(current.occupied(), previous.occupied() + 1);

            for (row, cells) in previous.rows().iter().enumerate() {
                for (column, slot) in cells.iter().enumerate() {
                    if let Some(tile) = slot {
                        let kept = current.get(row, column).unwrap();
                        assert!(Arc::ptr_eq(tile, kept));
                    }
                }
            }
            assert!(Arc::ptr_eq(
                current.get(placement.row, placement.column).unwrap(),
                &placement.tile
            ));
            previous = current.clone();
        }
    }

    #[test]
    fn test_trim_drops_empty_top_rows() {
        let machine = parse(HALT_IMMEDIATELY, DEFAULT_BOUNDARY_SYMBOL).unwrap();
        let mut assembly = Assembly::seed(&machine, "0");
        assembly.rows.push(vec![None; assembly.width()]);
        assembly.rows.push(vec![None; assembly.width()]);

        assembly.trim();
        assert_eq!(assembly.height(), 1);
        assembly.trim();
        assert_eq!(assembly.height(), 1);
    }
}
