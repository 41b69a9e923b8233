//! This module remaps a finished assembly into the layout requested for rendering.
//! Growth always reasons bottom-up; rotations and flips are applied only afterwards.

use crate::assembly::{Assembly, Slot};
use crate::types::TilerError;
use serde::{Deserialize, Serialize};

/// A quarter-turn rotation combined with independent mirror flags.
///
/// Flips are applied to the source coordinates first, then the matrix is rotated
/// counter-clockwise `rotation` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Orientation {
    pub rotation: u8,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Orientation {
    pub fn new(
        rotation: u8,
        flip_horizontal: bool,
        flip_vertical: bool,
    ) -> Result<Self, TilerError> {
        if rotation > 3 {
            return Err(TilerError::OptionError(format!(
                "rotation must be between 0 and 3, got {rotation}"
            )));
        }

        Ok(Self {
            rotation,
            flip_horizontal,
            flip_vertical,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == 0 && !self.flip_horizontal && !self.flip_vertical
    }

    /// Returns the orientation that undoes this one.
    ///
    /// With no flip or both flips set the inverse is the opposite rotation with the same
    /// flips. A single mirror followed by a rotation is its own inverse.
    pub fn inverse(&self) -> Self {
        if self.flip_horizontal != self.flip_vertical {
            return *self;
        }

        Self {
            rotation: (4 - self.rotation % 4) % 4,
            ..*self
        }
    }

    /// Size of a `size_x` by `size_y` matrix after the transform.
    pub fn size(&self, size_x: usize, size_y: usize) -> (usize, usize) {
        if self.rotation % 2 == 1 {
            (size_y, size_x)
        } else {
            (size_x, size_y)
        }
    }

    /// Where the cell at column `x`, row `y` of a `size_x` by `size_y` matrix ends up.
    pub fn map(&self, size_x: usize, size_y: usize, x: usize, y: usize) -> (usize, usize) {
        let x = if self.flip_horizontal { size_x - 1 - x } else { x };
        let y = if self.flip_vertical { size_y - 1 - y } else { y };

        match self.rotation % 4 {
            0 => (x, y),
            1 => (size_y - 1 - y, x),
            2 => (size_x - 1 - x, size_y - 1 - y),
            _ => (y, size_x - 1 - x),
        }
    }

    /// Moves every cell of `matrix` (indexed `[y][x]`) to its new position.
    ///
    /// Returns the new column count, row count and matrix. Cell values are cloned, never
    /// altered.
    pub fn transform<T: Clone + Default>(
        &self,
        size_x: usize,
        size_y: usize,
        matrix: &[Vec<T>],
    ) -> (usize, usize, Vec<Vec<T>>) {
        let (new_x, new_y) = self.size(size_x, size_y);
        let mut result = vec![vec![T::default(); new_x]; new_y];

        for (y, row) in matrix.iter().enumerate().take(size_y) {
            for (x, value) in row.iter().enumerate().take(size_x) {
                let (to_x, to_y) = self.map(size_x, size_y, x, y);
                result[to_y][to_x] = value.clone();
            }
        }

        (new_x, new_y, result)
    }

    /// Orients a finished assembly.
    pub fn apply(&self, assembly: &Assembly) -> OrientedAssembly {
        let (width, height, cells) =
            self.transform(assembly.width(), assembly.height(), assembly.rows());

        OrientedAssembly {
            orientation: *self,
            width,
            height,
            cells,
        }
    }
}

/// An assembly after the orientation transform, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedAssembly {
    pub orientation: Orientation,
    pub width: usize,
    pub height: usize,
    /// Cells indexed `[y][x]`.
    pub cells: Vec<Vec<Slot>>,
}
