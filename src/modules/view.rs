use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::rc::Rc;

use crate::modules::cell::CellState;
use crate::modules::engine::Engine;
use crate::modules::grid::Point;
use crate::modules::observer::{CellSubscription, ScoreSubscription};
use crate::modules::rng::Chooser;

/// Result of one [`TerminalView::render`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Cells repainted in this frame, row-major.
    pub repainted: Vec<Point>,
    pub score_changed: bool,
    pub text: String,
}

/// Terminal rendering adapter.
///
/// Subscribes one callback per cell and one for the score; each callback only
/// marks its target dirty. `render` repaints the dirty set and counts how
/// often every cell was painted, which the debug overlay shows.
pub struct TerminalView {
    size: usize,
    show_overlay: bool,
    dirty: Rc<RefCell<BTreeSet<(i32, i32)>>>,
    score_dirty: Rc<Cell<bool>>,
    renders: HashMap<Point, u64>,
    _cells: Vec<CellSubscription>,
    _score: ScoreSubscription,
}

impl TerminalView {
    /// Subscribes to every cell of the engine's current grid. Everything
    /// starts dirty so the first render is a full paint.
    pub fn attach<C: Chooser>(engine: &Engine<C>) -> Self {
        let size = engine.grid_size();
        let dirty = Rc::new(RefCell::new(BTreeSet::new()));
        let score_dirty = Rc::new(Cell::new(true));

        let mut cells = Vec::with_capacity(size * size);
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                dirty.borrow_mut().insert((y, x));
                let dirty = Rc::clone(&dirty);
                cells.push(engine.watch_cell(Point::new(x, y), move || {
                    dirty.borrow_mut().insert((y, x));
                }));
            }
        }

        let flag = Rc::clone(&score_dirty);
        let score = engine.watch_score(move || flag.set(true));

        Self {
            size,
            show_overlay: engine.config().show_debug_overlay,
            dirty,
            score_dirty,
            renders: HashMap::new(),
            _cells: cells,
            _score: score,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn set_overlay(&mut self, show: bool) {
        self.show_overlay = show;
    }

    /// Number of cells waiting for a repaint.
    pub fn pending(&self) -> usize {
        self.dirty.borrow().len()
    }

    pub fn render_count(&self, point: Point) -> u64 {
        self.renders.get(&point).copied().unwrap_or(0)
    }

    pub fn render<C: Chooser>(&mut self, engine: &Engine<C>) -> Frame {
        let repainted: Vec<Point> = std::mem::take(&mut *self.dirty.borrow_mut())
            .into_iter()
            .map(|(y, x)| Point::new(x, y))
            .collect();
        for point in &repainted {
            *self.renders.entry(*point).or_default() += 1;
        }
        let score_changed = self.score_dirty.replace(false);

        let mut text = String::new();
        let _ = writeln!(text, "Score: {}", engine.score());
        for y in 0..self.size as i32 {
            for x in 0..self.size as i32 {
                text.push(glyph_at(engine, Point::new(x, y)));
                text.push(' ');
            }
            if self.show_overlay {
                text.push_str("  ");
                for x in 0..self.size as i32 {
                    let _ = write!(text, "{:>3}", self.render_count(Point::new(x, y)));
                }
            }
            text.truncate(text.trim_end().len());
            text.push('\n');
        }

        Frame {
            repainted,
            score_changed,
            text,
        }
    }
}

/// Glyph for a cell as painted by the view; the out-of-bounds sentinel paints
/// as empty.
pub fn glyph_at<C: Chooser>(engine: &Engine<C>, point: Point) -> char {
    engine
        .cell_state(point)
        .unwrap_or(CellState::Empty)
        .glyph()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::config::EngineConfig;
    use crate::modules::rng::FirstChoice;

    fn engine(size: usize, items: usize) -> Engine<FirstChoice> {
        let mut engine = Engine::with_chooser(FirstChoice);
        engine.initialize(size, items).unwrap();
        engine
    }

    #[test]
    fn first_render_paints_everything() {
        let engine = engine(3, 1);
        let mut view = TerminalView::attach(&engine);
        assert_eq!(view.pending(), 9);

        let frame = view.render(&engine);
        assert_eq!(frame.repainted.len(), 9);
        assert!(frame.score_changed);
        assert_eq!(frame.text, "Score: 0\n# @ .\n. . .\n. . .\n");
        assert_eq!(view.pending(), 0);
    }

    #[test]
    fn step_repaints_only_touched_cells() {
        let mut engine = engine(3, 1);
        let mut view = TerminalView::attach(&engine);
        view.render(&engine);

        engine.step();
        let frame = view.render(&engine);
        assert_eq!(frame.repainted, vec![Point::new(1, 0), Point::new(2, 0)]);
        assert!(frame.score_changed);
        assert_eq!(view.render_count(Point::new(1, 0)), 2);
        assert_eq!(view.render_count(Point::new(2, 2)), 1);

        let idle = view.render(&engine);
        assert!(idle.repainted.is_empty());
        assert!(!idle.score_changed);
    }

    #[test]
    fn reset_repaints_whole_grid() {
        let mut engine = engine(1, 0);
        let mut view = TerminalView::attach(&engine);
        view.render(&engine);

        engine.step();
        let frame = view.render(&engine);
        assert_eq!(frame.repainted, vec![Point::new(0, 0)]);
        assert_eq!(frame.text, "Score: 0\n#\n");
    }

    #[test]
    fn overlay_shows_render_counts() {
        let mut engine = Engine::with_chooser(FirstChoice);
        engine
            .configure(EngineConfig {
                show_debug_overlay: true,
                ..EngineConfig::new(2, 1)
            })
            .unwrap();
        let mut view = TerminalView::attach(&engine);
        let frame = view.render(&engine);
        assert_eq!(frame.text, "Score: 0\n# @     1  1\n. .     1  1\n");
    }

    #[test]
    fn dropping_view_unsubscribes() {
        let engine = engine(3, 1);
        let view = TerminalView::attach(&engine);
        assert_eq!(engine.observers().cell_watchers(), 9);
        assert_eq!(engine.observers().score_watchers(), 1);
        drop(view);
        assert_eq!(engine.observers().cell_watchers(), 0);
        assert_eq!(engine.observers().score_watchers(), 0);
    }

    #[test]
    fn glyph_at_treats_out_of_bounds_as_empty() {
        let engine = engine(2, 1);
        assert_eq!(glyph_at(&engine, Point::new(0, 0)), '#');
        assert_eq!(glyph_at(&engine, Point::new(5, 5)), '.');
    }
}
