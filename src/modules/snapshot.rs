use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::modules::cell::CellState;
use crate::modules::engine::{Engine, Status};
use crate::modules::grid::Point;
use crate::modules::rng::Chooser;

/// Point-in-time view of an engine, for `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub captured_at: String,
    pub status: Status,
    pub tick: u64,
    pub generation: u64,
    pub grid_size: usize,
    pub score: usize,
    pub item_count: usize,
    /// Tail first, head last.
    pub body: Vec<Point>,
    pub items: Vec<Point>,
    /// One glyph row per grid row.
    pub rows: Vec<String>,
}

impl GridSnapshot {
    pub fn capture<C: Chooser>(engine: &Engine<C>) -> Self {
        let (items, rows) = match engine.grid() {
            Some(grid) => (
                grid.points_with(CellState::Item).collect(),
                grid.to_ascii().lines().map(str::to_string).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            captured_at: Utc::now().to_rfc3339(),
            status: engine.status(),
            tick: engine.tick(),
            generation: engine.generation(),
            grid_size: engine.grid_size(),
            score: engine.score(),
            item_count: engine.item_count(),
            body: engine.body().collect(),
            items,
            rows,
        }
    }

    pub fn head(&self) -> Option<Point> {
        self.body.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::rng::FirstChoice;

    #[test]
    fn captures_running_engine() {
        let mut engine = Engine::with_chooser(FirstChoice);
        engine.initialize(3, 1).unwrap();
        engine.step();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status, Status::Running);
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.score, 1);
        assert_eq!(snapshot.body, vec![Point::new(0, 0), Point::new(1, 0)]);
        assert_eq!(snapshot.head(), Some(Point::new(1, 0)));
        assert_eq!(snapshot.items, vec![Point::new(2, 0)]);
        assert_eq!(snapshot.rows, vec!["##@", "...", "..."]);
    }

    #[test]
    fn uninitialized_engine_has_empty_snapshot() {
        let engine = Engine::with_chooser(FirstChoice);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status, Status::Uninitialized);
        assert_eq!(snapshot.grid_size, 0);
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.head(), None);
    }

    #[test]
    fn serializes_to_json() {
        let mut engine = Engine::with_chooser(FirstChoice);
        engine.initialize(2, 1).unwrap();
        let json = serde_json::to_value(engine.snapshot()).unwrap();
        assert_eq!(json["grid_size"], 2);
        assert_eq!(json["status"], "Running");
        assert_eq!(json["rows"][0], "#@");
    }
}
