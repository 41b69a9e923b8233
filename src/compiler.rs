//! This module compiles a [`Machine`] into a pool of Wang tiles and the three indices the
//! assembly engine uses to find the tile that fits an empty site.
//!
//! The pool has three families, generated in a fixed order:
//!
//! * transition tiles, one per transition, recognized from below by a double bond carrying
//!   the head signal `"<state> <symbol>"`;
//! * movement tiles, which receive the head from the side and pass it up as a new signal;
//! * replication tiles, which copy untouched symbols one row up.

use crate::types::{
    head_signal, Bond, Edges, Machine, Move, Tile, LEFT_SENTINEL, RIGHT_SENTINEL,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type LabelIndex = HashMap<String, Arc<Tile>>;
type PairIndex = HashMap<String, HashMap<String, Arc<Tile>>>;

/// Which index a lookup or collision refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Keyed by the Down label.
    Bottom,
    /// Keyed by the Left and Down labels.
    LeftBottom,
    /// Keyed by the Right and Down labels.
    RightBottom,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::Bottom => "bottom",
            IndexKind::LeftBottom => "left-bottom",
            IndexKind::RightBottom => "right-bottom",
        };
        f.write_str(name)
    }
}

/// Two tiles of the pool shared an index key; the later one was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCollision {
    pub index: IndexKind,
    pub key: String,
    pub displaced: String,
    pub kept: String,
}

/// The compiled tile pool and its lookup indices. Read-only once built.
#[derive(Debug, Default)]
pub struct TileSet {
    tiles: Vec<Arc<Tile>>,
    by_bottom: LabelIndex,
    by_left_bottom: PairIndex,
    by_right_bottom: PairIndex,
    collisions: Vec<IndexCollision>,
}

impl TileSet {
    /// Builds the indices over `tiles` in one pass. Later tiles win key collisions.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        let mut set = TileSet {
            tiles: tiles.into_iter().map(Arc::new).collect(),
            ..TileSet::default()
        };

        for tile in &set.tiles {
            let down = tile.edges.down.label.as_str();
            let displaced = set.by_bottom.insert(down.to_string(), Arc::clone(tile));
            note_collision(&mut set.collisions, IndexKind::Bottom, down, displaced, tile);

            let left = tile.edges.left.label.as_str();
            let displaced = insert_pair(&mut set.by_left_bottom, left, down, tile);
            let key = format!("({left}, {down})");
            note_collision(&mut set.collisions, IndexKind::LeftBottom, &key, displaced, tile);

            let right = tile.edges.right.label.as_str();
            let displaced = insert_pair(&mut set.by_right_bottom, right, down, tile);
            let key = format!("({right}, {down})");
            note_collision(&mut set.collisions, IndexKind::RightBottom, &key, displaced, tile);
        }

        set
    }

    /// Every tile of the pool, in generation order.
    pub fn tiles(&self) -> &[Arc<Tile>] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Finds a tile by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Tile>> {
        self.tiles.iter().find(|tile| tile.name == name)
    }

    /// The tile whose Down edge carries `down`.
    pub fn by_bottom(&self, down: &str) -> Option<&Arc<Tile>> {
        self.by_bottom.get(down)
    }

    /// The tile whose Left and Down edges carry `left` and `down`.
    pub fn by_left_bottom(&self, left: &str, down: &str) -> Option<&Arc<Tile>> {
        self.by_left_bottom.get(left).and_then(|tiles| tiles.get(down))
    }

    /// The tile whose Right and Down edges carry `right` and `down`.
    pub fn by_right_bottom(&self, right: &str, down: &str) -> Option<&Arc<Tile>> {
        self.by_right_bottom.get(right).and_then(|tiles| tiles.get(down))
    }

    /// Number of distinct keys held by an index.
    pub fn index_len(&self, index: IndexKind) -> usize {
        match index {
            IndexKind::Bottom => self.by_bottom.len(),
            IndexKind::LeftBottom => self.by_left_bottom.values().map(HashMap::len).sum(),
            IndexKind::RightBottom => self.by_right_bottom.values().map(HashMap::len).sum(),
        }
    }

    /// Every index entry as `(kind, first label, down label, tile)`.
    pub fn index_entries(&self) -> impl Iterator<Item = (IndexKind, &str, &str, &Arc<Tile>)> {
        let bottom = self
            .by_bottom
            .iter()
            .map(|(down, tile)| (IndexKind::Bottom, "", down.as_str(), tile));
        let left = flatten_pairs(&self.by_left_bottom, IndexKind::LeftBottom);
        let right = flatten_pairs(&self.by_right_bottom, IndexKind::RightBottom);
        bottom.chain(left).chain(right)
    }

    /// Key collisions met while indexing, in the order they happened.
    pub fn collisions(&self) -> &[IndexCollision] {
        &self.collisions
    }
}

fn insert_pair(
    index: &mut PairIndex,
    first: &str,
    down: &str,
    tile: &Arc<Tile>,
) -> Option<Arc<Tile>> {
    index
        .entry(first.to_string())
        .or_default()
        .insert(down.to_string(), Arc::clone(tile))
}

fn note_collision(
    collisions: &mut Vec<IndexCollision>,
    index: IndexKind,
    key: &str,
    displaced: Option<Arc<Tile>>,
    kept: &Tile,
) {
    if let Some(displaced) = displaced {
        collisions.push(IndexCollision {
            index,
            key: key.to_string(),
            displaced: displaced.name.clone(),
            kept: kept.name.clone(),
        });
    }
}

fn flatten_pairs(
    index: &PairIndex,
    kind: IndexKind,
) -> impl Iterator<Item = (IndexKind, &str, &str, &Arc<Tile>)> {
    index.iter().flat_map(move |(first, tiles)| {
        tiles
            .iter()
            .map(move |(down, tile)| (kind, first.as_str(), down.as_str(), tile))
    })
}

/// Compiles `machine` into its tile set.
///
/// The machine must already have passed [`crate::analyzer::analyze`]; compilation itself
/// cannot fail.
pub fn compile(machine: &Machine) -> TileSet {
    tracing::info!("Generating tile set for {}...", machine.name);

    let mut tiles = transition_tiles(machine);
    tiles.extend(movement_tiles(machine));
    tiles.extend(replication_tiles(machine));

    let set = TileSet::from_tiles(tiles);

    tracing::debug!(
        tiles = set.len(),
        collisions = set.collisions().len(),
        "tile set indexed"
    );
    for collision in set.collisions() {
        tracing::debug!(
            "{} index key {} held by {} is now {}",
            collision.index,
            collision.key,
            collision.displaced,
            collision.kept
        );
    }

    set
}

/// One tile per transition. The head arrives from below on a double bond and leaves
/// sideways towards its next cell, or stops on a final tile.
fn transition_tiles(machine: &Machine) -> Vec<Tile> {
    machine
        .transitions
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let up = match &t.output {
                Some(output) if t.movement == Move::Halt => format!("{} [{}]", t.write, output),
                _ => t.write.clone(),
            };
            let (left, right) = match t.movement {
                Move::Left => (Bond::single(&t.new_state), Bond::single(RIGHT_SENTINEL)),
                Move::Right => (Bond::single(LEFT_SENTINEL), Bond::single(&t.new_state)),
                Move::Halt => (Bond::single(LEFT_SENTINEL), Bond::single(RIGHT_SENTINEL)),
            };

            let mut tile = Tile::new(
                format!("transition-{i}[{}]", t.signal()),
                Edges {
                    up: Bond::single(up),
                    left,
                    down: Bond::double(t.signal()),
                    right,
                },
            );
            tile.is_final = t.movement == Move::Halt;
            tile
        })
        .collect()
}

/// Two tiles per state and symbol: the head enters sideways on the state label, the
/// symbol comes from below, and the pair leaves upwards as a head signal.
fn movement_tiles(machine: &Machine) -> Vec<Tile> {
    let mut tiles = Vec::new();

    for state in machine.states() {
        for symbol in &machine.symbols {
            let up = Bond::double(head_signal(state, symbol));
            let down = Bond::single(symbol);

            tiles.push(Tile::new(
                format!("movement[{state} {symbol}]-left"),
                Edges {
                    up: up.clone(),
                    left: Bond::single(LEFT_SENTINEL),
                    down: down.clone(),
                    right: Bond::single(state),
                },
            ));
            tiles.push(Tile::new(
                format!("movement[{state} {symbol}]-right"),
                Edges {
                    up,
                    left: Bond::single(state),
                    down,
                    right: Bond::single(RIGHT_SENTINEL),
                },
            ));
        }
    }

    tiles
}

/// Two tiles per symbol that copy it upwards, one for each side of the head.
fn replication_tiles(machine: &Machine) -> Vec<Tile> {
    let mut tiles = Vec::new();

    for symbol in &machine.symbols {
        for (side, sentinel) in [("left", LEFT_SENTINEL), ("right", RIGHT_SENTINEL)] {
            tiles.push(Tile::new(
                format!("replication[{symbol}]-{side}"),
                Edges {
                    up: Bond::single(symbol),
                    left: Bond::single(sentinel),
                    down: Bond::single(symbol),
                    right: Bond::single(sentinel),
                },
            ));
        }
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::{Direction, DEFAULT_BOUNDARY_SYMBOL};

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

    fn increment() -> Machine {
        parse(INCREMENT, DEFAULT_BOUNDARY_SYMBOL).unwrap()
    }

    #[test]
    fn test_pool_size() {
        let machine = increment();
        let set = compile(&machine);

        // 6 transitions, 2 states x 3 symbols x 2 movement tiles, 3 symbols x 2 copies
        assert_eq!(set.len(), 6 + 12 + 6);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_transition_tiles() {
        let set = compile(&increment());

        let moving_left = set.get("transition-3[2 1]").unwrap();
        assert_eq!(moving_left.edges.down, Bond::double("2 1"));
        assert_eq!(moving_left.edges.up, Bond::single("0"));
        assert_eq!(moving_left.edges.left, Bond::single("2"));
        assert_eq!(moving_left.edges.right, Bond::single(RIGHT_SENTINEL));
        assert!(!moving_left.is_final);

        let moving_right = set.get("transition-0[1 0]").unwrap();
        assert_eq!(moving_right.edges.left, Bond::single(LEFT_SENTINEL));
        assert_eq!(moving_right.edges.right, Bond::single("1"));

        let halting = set.get("transition-5[2 *]").unwrap();
        assert!(halting.is_final);
        assert_eq!(halting.edges.up, Bond::single("1 [overflow]"));
        assert_eq!(halting.edges.left, Bond::single(LEFT_SENTINEL));
        assert_eq!(halting.edges.right, Bond::single(RIGHT_SENTINEL));
        assert_eq!(halting.output(), Some("overflow"));
    }

    #[test]
    fn test_movement_and_replication_tiles() {
        let set = compile(&increment());

        let left = set.get("movement[2 0]-left").unwrap();
        assert_eq!(left.edges.up, Bond::double("2 0"));
        assert_eq!(left.edges.down, Bond::single("0"));
        assert_eq!(left.edges.left, Bond::single(LEFT_SENTINEL));
        assert_eq!(left.edges.right, Bond::single("2"));

        let right = set.get("movement[1 *]-right").unwrap();
        assert_eq!(right.edges.left, Bond::single("1"));
        assert_eq!(right.edges.right, Bond::single(RIGHT_SENTINEL));

        let copy = set.get("replication[1]-right").unwrap();
        assert_eq!(copy.edges.up, copy.edges.down);
        assert_eq!(copy.bond(Direction::Left), copy.bond(Direction::Right));
        assert_eq!(copy.edges.left.label, RIGHT_SENTINEL);
    }

    #[test]
    fn test_lookups_follow_the_head() {
        let set = compile(&increment());

        // a head signal from below finds its transition
        let tile = set.by_bottom("1 0").unwrap();
        assert_eq!(tile.name, "transition-0[1 0]");

        // a head moving right is received by a movement tile on its left edge
        let tile = set.by_left_bottom("1", "0").unwrap();
        assert_eq!(tile.name, "movement[1 0]-right");

        // a head moving left is received on the right edge
        let tile = set.by_right_bottom("2", "1").unwrap();
        assert_eq!(tile.name, "movement[2 1]-left");

        // sentinels find copies
        assert_eq!(
            set.by_right_bottom(LEFT_SENTINEL, "0").unwrap().name,
            "replication[0]-left"
        );
        assert_eq!(
            set.by_left_bottom(RIGHT_SENTINEL, "*").unwrap().name,
            "replication[*]-right"
        );

        assert!(set.by_bottom("3 0").is_none());
        assert!(set.by_left_bottom("3", "0").is_none());
    }

    #[test]
    fn test_index_entries_point_into_the_pool() {
        let set = compile(&increment());

        for (kind, first, down, tile) in set.index_entries() {
            assert!(set.tiles().iter().any(|t| Arc::ptr_eq(t, tile)));
            assert_eq!(tile.edges.down.label, down);
            match kind {
                IndexKind::Bottom => {}
                IndexKind::LeftBottom => assert_eq!(tile.edges.left.label, first),
                IndexKind::RightBottom => assert_eq!(tile.edges.right.label, first),
            }
        }
    }

    #[test]
    fn test_collisions_keep_the_last_tile() {
        let set = compile(&increment());

        // replication tiles come last and take over the sentinel keys they share with
        // movement tiles
        assert!(!set.collisions().is_empty());
        assert_eq!(
            set.by_left_bottom(LEFT_SENTINEL, "0").unwrap().name,
            "replication[0]-left"
        );
        assert!(set.collisions().iter().any(|c| c.index == IndexKind::LeftBottom
            && c.key == "(L, 0)"
            && c.kept == "replication[0]-left"));

        // head signals never collide in a deterministic machine
        assert!(set
            .collisions()
            .iter()
            .all(|c| !(c.index == IndexKind::Bottom && c.key.contains(' '))));
    }
}
