use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// State of a single grid cell. Stored as one byte in the grid buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Empty,
    /// Part of the agent body.
    Occupied,
    /// Consumable item.
    Item,
}

impl CellState {
    pub const fn as_byte(self) -> u8 {
        match self {
            CellState::Empty => 0,
            CellState::Occupied => 1,
            CellState::Item => 2,
        }
    }

    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(CellState::Empty),
            1 => Some(CellState::Occupied),
            2 => Some(CellState::Item),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CellState::Empty => "empty",
            CellState::Occupied => "occupied",
            CellState::Item => "item",
        }
    }

    pub const fn glyph(self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Occupied => '#',
            CellState::Item => '@',
        }
    }

    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(CellState::Empty),
            '#' => Some(CellState::Occupied),
            '@' => Some(CellState::Item),
            _ => None,
        }
    }

    /// Whether the agent may move onto a cell in this state.
    pub const fn is_passable(self) -> bool {
        matches!(self, CellState::Empty | CellState::Item)
    }
}

impl Default for CellState {
    fn default() -> Self {
        CellState::Empty
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for CellState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(glyph), None) = (chars.next(), chars.next()) {
            if let Some(state) = CellState::from_glyph(glyph) {
                return Ok(state);
            }
        }

        match trimmed.to_lowercase().as_str() {
            "empty" => Ok(CellState::Empty),
            "occupied" | "snake" => Ok(CellState::Occupied),
            "item" | "food" | "apple" => Ok(CellState::Item),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_match_buffer_encoding() {
        for state in [CellState::Empty, CellState::Occupied, CellState::Item] {
            assert_eq!(CellState::from_byte(state.as_byte()), Some(state));
        }
        assert_eq!(CellState::from_byte(3), None);
    }

    #[test]
    fn parses_labels_glyphs_and_aliases() {
        assert_eq!("#".parse::<CellState>(), Ok(CellState::Occupied));
        assert_eq!(" Apple ".parse::<CellState>(), Ok(CellState::Item));
        assert_eq!("empty".parse::<CellState>(), Ok(CellState::Empty));
        assert!("wall".parse::<CellState>().is_err());
    }

    #[test]
    fn only_empty_and_item_are_passable() {
        assert!(CellState::Empty.is_passable());
        assert!(CellState::Item.is_passable());
        assert!(!CellState::Occupied.is_passable());
    }
}
