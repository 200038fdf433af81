use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::cell::CellState;
use crate::modules::rng::Chooser;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// True when `other` is exactly one unit step away along a single axis.
    pub fn is_adjacent(self, other: Point) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    /// Compass cycle right -> down -> left -> up.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Up => "up",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Side length of a square buffer of `len` cells.
///
/// Panics when `len` is not a perfect square: the grid buffer and its size
/// have diverged, which no caller can recover from.
pub fn dimension_of(len: usize) -> usize {
    let side = (len as f64).sqrt().round() as usize;
    if side.checked_mul(side) != Some(len) {
        panic!("grid buffer is not a perfect square (length {})", len);
    }
    side
}

/// Square row-major occupancy buffer (`index = x + y * size`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<u8>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![CellState::Empty.as_byte(); size * size],
        }
    }

    /// Build a grid from glyph rows (`.` empty, `#` occupied, `@` item).
    pub fn from_ascii(rows: &[&str]) -> Result<Self, String> {
        let size = rows.len();
        let mut grid = Grid::new(size);
        for (y, row) in rows.iter().enumerate() {
            let glyphs: Vec<char> = row.chars().filter(|c| !c.is_whitespace()).collect();
            if glyphs.len() != size {
                return Err(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    glyphs.len(),
                    size
                ));
            }
            for (x, glyph) in glyphs.into_iter().enumerate() {
                let state = CellState::from_glyph(glyph)
                    .ok_or_else(|| format!("unknown glyph {:?} at ({}, {})", glyph, x, y))?;
                grid.cells[x + y * size] = state.as_byte();
            }
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, point: Point) -> bool {
        let size = self.size as i64;
        let (x, y) = (point.x as i64, point.y as i64);
        x >= 0 && x < size && y >= 0 && y < size
    }

    pub fn index_of(&self, point: Point) -> Option<usize> {
        self.contains(point)
            .then(|| point.x as usize + point.y as usize * self.size)
    }

    pub fn point_at(&self, index: usize) -> Point {
        Point {
            x: (index % self.size) as i32,
            y: (index / self.size) as i32,
        }
    }

    /// `None` is the out-of-bounds sentinel.
    pub fn get(&self, point: Point) -> Option<CellState> {
        let index = self.index_of(point)?;
        CellState::from_byte(self.cells[index])
    }

    /// Stores `state` and returns the previous value, or `None` when `point`
    /// lies outside the grid (nothing is written).
    pub(crate) fn set(&mut self, point: Point, state: CellState) -> Option<CellState> {
        let index = self.index_of(point)?;
        let previous = CellState::from_byte(self.cells[index]);
        self.cells[index] = state.as_byte();
        previous
    }

    pub fn count(&self, state: CellState) -> usize {
        let byte = state.as_byte();
        self.cells.iter().filter(|b| **b == byte).count()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.cells.len()).map(|index| self.point_at(index))
    }

    pub fn points_with(&self, state: CellState) -> impl Iterator<Item = Point> + '_ {
        let byte = state.as_byte();
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, b)| **b == byte)
            .map(|(index, _)| self.point_at(index))
    }

    /// Uniformly random `Empty` cell, or `None` when the grid is full.
    pub fn pick_random_empty<C: Chooser + ?Sized>(&self, chooser: &mut C) -> Option<Point> {
        let size = dimension_of(self.cells.len());
        assert_eq!(
            size, self.size,
            "grid buffer of {} cells does not match size {}",
            self.cells.len(),
            self.size
        );

        let empty = CellState::Empty.as_byte();
        let candidates: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == empty)
            .map(|(index, _)| index)
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let index = candidates[chooser.choose(candidates.len())];
        let point = self.point_at(index);
        assert!(
            self.contains(point),
            "random empty cell {} lies outside the {}x{} grid",
            point,
            size,
            size
        );
        Some(point)
    }

    /// One line of glyphs per row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.size);
        for row in self.cells.chunks(self.size.max(1)) {
            for byte in row {
                out.push(CellState::from_byte(*byte).unwrap_or_default().glyph());
            }
            out.push('\n');
        }
        out
    }

    /// Raw byte dump with row indices, for debugging.
    pub fn print_matrix(&self) -> String {
        let mut out = String::new();
        for (y, row) in self.cells.chunks(self.size.max(1)).enumerate() {
            out.push_str(&format!("{:<2}:   ", y));
            let values: Vec<String> = row.iter().map(|b| b.to_string()).collect();
            out.push_str(&values.join("   "));
            out.push('\n');
        }
        out.push_str(&"-".repeat(40));
        out.push('\n');
        out
    }
}
