use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::modules::cell::CellState;
use crate::modules::config::{ConfigError, EngineConfig};
use crate::modules::grid::{Direction, Grid, Point};
use crate::modules::observer::{CellSubscription, Change, Observers, ScoreSubscription};
use crate::modules::rng::{self, Chooser};
use crate::modules::snapshot::GridSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("engine is not initialized")]
    Uninitialized,
    #[error("point {point} lies outside the {size}x{size} grid")]
    OutOfBounds { point: Point, size: usize },
    #[error("cell {0} belongs to the agent body")]
    BodyCell(Point),
    #[error("cell {point} is not next to the head at {head}")]
    NotAdjacent { point: Point, head: Point },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Uninitialized,
    Running,
}

/// Why a round ended and the grid was rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    /// Every neighbour of the head is occupied or off the grid.
    NoLegalMove,
    /// The last item was consumed and no empty cell is left for a new one.
    NoRoomForItem,
}

impl ResetReason {
    pub const fn label(self) -> &'static str {
        match self {
            ResetReason::NoLegalMove => "no legal move",
            ResetReason::NoRoomForItem => "no room for item",
        }
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The engine has no grid; nothing happened.
    Idle,
    /// The head moved onto an empty cell and the tail followed.
    Moved { direction: Direction, head: Point },
    /// The head moved onto an item and the body grew by one.
    Consumed { direction: Direction, head: Point },
    /// The round ended and a fresh grid was built.
    Reset {
        reason: ResetReason,
        final_score: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub tick: u64,
    pub generation: u64,
    pub outcome: StepOutcome,
    /// Score after the step.
    pub score: usize,
    /// Invalidations in the order observers received them.
    pub changes: Vec<Change>,
}

#[derive(Debug)]
struct Round {
    grid: Grid,
    body: VecDeque<Point>,
    item_count: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct WriteEffect {
    consumed: bool,
    reset: Option<ResetReason>,
}

/// Grid simulation engine: an occupancy grid, a self-steering agent and
/// consumable items, with fine-grained change notifications.
///
/// Every public mutation runs to completion before observers are called;
/// changes are queued while mutating and dispatched at the end in order.
pub struct Engine<C: Chooser = StdRng> {
    config: EngineConfig,
    chooser: C,
    round: Option<Round>,
    observers: Observers,
    pending: Vec<Change>,
    generation: u64,
    tick: u64,
}

impl Engine<StdRng> {
    /// Engine with an entropy-seeded RNG, initialized from `config`.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::seeded(config, None)
    }

    pub fn seeded(config: EngineConfig, seed: Option<u64>) -> Result<Self, EngineError> {
        let mut engine = Engine::with_chooser(rng::seeded(seed));
        engine.configure(config)?;
        Ok(engine)
    }
}

impl<C: Chooser> Engine<C> {
    /// Uninitialized engine using `chooser` for every random decision.
    pub fn with_chooser(chooser: C) -> Self {
        Self {
            config: EngineConfig::default(),
            chooser,
            round: None,
            observers: Observers::new(),
            pending: Vec::new(),
            generation: 0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> Status {
        if self.round.is_some() {
            Status::Running
        } else {
            Status::Uninitialized
        }
    }

    pub fn is_running(&self) -> bool {
        self.round.is_some()
    }

    /// Number of grids built so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of move steps taken over the engine lifetime.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.round.as_ref().map(|round| &round.grid)
    }

    pub fn grid_size(&self) -> usize {
        self.grid().map(Grid::size).unwrap_or(0)
    }

    pub fn cell_state(&self, point: Point) -> Option<CellState> {
        self.grid()?.get(point)
    }

    pub fn score(&self) -> usize {
        self.round
            .as_ref()
            .map(|round| round.body.len().saturating_sub(1))
            .unwrap_or(0)
    }

    pub fn item_count(&self) -> usize {
        self.round.as_ref().map(|round| round.item_count).unwrap_or(0)
    }

    /// Body points from tail (oldest) to head.
    pub fn body(&self) -> impl Iterator<Item = Point> + '_ {
        self.round
            .iter()
            .flat_map(|round| round.body.iter().copied())
    }

    pub fn head(&self) -> Option<Point> {
        self.round.as_ref()?.body.back().copied()
    }

    pub fn tail(&self) -> Option<Point> {
        self.round.as_ref()?.body.front().copied()
    }

    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    pub fn watch_cell<F>(&self, point: Point, callback: F) -> CellSubscription
    where
        F: FnMut() + 'static,
    {
        self.observers.watch_cell(point, callback)
    }

    pub fn watch_score<F>(&self, callback: F) -> ScoreSubscription
    where
        F: FnMut() + 'static,
    {
        self.observers.watch_score(callback)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::capture(self)
    }

    pub fn pick_random_empty_cell(&mut self) -> Option<Point> {
        let round = self.round.as_ref()?;
        round.grid.pick_random_empty(&mut self.chooser)
    }

    /// Builds a fresh `grid_size`×`grid_size` grid with one seed segment and
    /// up to `item_count` items, keeping the rest of the configuration.
    pub fn initialize(&mut self, grid_size: usize, item_count: usize) -> Result<(), EngineError> {
        let config = EngineConfig {
            grid_size,
            item_count,
            ..self.config
        };
        self.apply_config(config, true)?;
        Ok(())
    }

    /// Replaces the configuration. The grid is rebuilt when the grid size or
    /// item count changed, or when the engine was not running. Returns
    /// whether a rebuild happened.
    pub fn configure(&mut self, config: EngineConfig) -> Result<bool, EngineError> {
        let rebuild = self.round.is_none() || self.config.requires_rebuild(&config);
        self.apply_config(config, rebuild)?;
        Ok(rebuild)
    }

    /// Host attribute update, see [`EngineConfig::apply_attribute`].
    ///
    /// Any [`ConfigError`], whether the value does not parse or the result
    /// fails validation, discards the grid exactly like [`Engine::configure`].
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<bool, EngineError> {
        let mut config = self.config;
        match config.apply_attribute(name, value) {
            Ok(false) => Ok(false),
            Ok(true) => {
                self.configure(config)?;
                Ok(true)
            }
            Err(err) => {
                self.discard();
                self.flush();
                Err(err.into())
            }
        }
    }

    /// Writes `value` at `point` with the full side effects of a move: item
    /// accounting, body growth on `Occupied`, notification and replenishment
    /// once the last item is gone.
    ///
    /// Cells that belong to the body cannot be overwritten here; the body
    /// only shrinks from the tail during a step. An `Occupied` write extends
    /// the head and must land next to it. Eating the last item with no empty
    /// cell left rebuilds the grid.
    pub fn set_cell_state(&mut self, point: Point, value: CellState) -> Result<(), EngineError> {
        let round = self.round.as_ref().ok_or(EngineError::Uninitialized)?;
        match round.grid.get(point) {
            None => {
                return Err(EngineError::OutOfBounds {
                    point,
                    size: round.grid.size(),
                });
            }
            Some(CellState::Occupied) => return Err(EngineError::BodyCell(point)),
            Some(_) => {}
        }
        if value == CellState::Occupied {
            if let Some(head) = round.body.back().copied() {
                if !head.is_adjacent(point) {
                    return Err(EngineError::NotAdjacent { point, head });
                }
            }
        }

        let effect = self.write(point, value);
        if let Some(reason) = effect.reset {
            self.reset(reason);
        }
        self.flush();
        Ok(())
    }

    /// Advances the agent by one cell.
    pub fn step(&mut self) -> StepResult {
        self.tick += 1;
        let outcome = self.advance();
        trace!(tick = self.tick, ?outcome, "step");
        let changes = self.flush();
        StepResult {
            tick: self.tick,
            generation: self.generation,
            outcome,
            score: self.score(),
            changes,
        }
    }

    fn apply_config(&mut self, config: EngineConfig, rebuild: bool) -> Result<(), EngineError> {
        if let Err(err) = config.validate() {
            self.discard();
            self.flush();
            return Err(err.into());
        }

        self.config = config;
        if rebuild {
            self.rebuild();
            self.flush();
        }
        Ok(())
    }

    fn advance(&mut self) -> StepOutcome {
        let Some(head) = self.head() else {
            return StepOutcome::Idle;
        };

        let Some((direction, next)) = self.find_legal_move(head) else {
            return self.reset(ResetReason::NoLegalMove);
        };

        if self.cell_state(next) == Some(CellState::Empty) {
            self.remove_tail();
        }

        let effect = self.write(next, CellState::Occupied);
        if let Some(reason) = effect.reset {
            return self.reset(reason);
        }

        if effect.consumed {
            StepOutcome::Consumed {
                direction,
                head: next,
            }
        } else {
            StepOutcome::Moved {
                direction,
                head: next,
            }
        }
    }

    /// Tries the four directions in a uniformly shuffled order and returns
    /// the first one leading onto an empty or item cell.
    fn find_legal_move(&mut self, head: Point) -> Option<(Direction, Point)> {
        let mut candidates = Direction::ALL;
        rng::shuffle(&mut candidates, &mut self.chooser);

        let grid = self.grid()?;
        candidates
            .into_iter()
            .map(|direction| (direction, head.offset(direction)))
            .find(|(_, next)| grid.get(*next).is_some_and(CellState::is_passable))
    }

    fn remove_tail(&mut self) {
        let Some(tail) = self.round.as_mut().and_then(|round| round.body.pop_front()) else {
            return;
        };
        self.write(tail, CellState::Empty);
        self.pending.push(Change::Score);
    }

    /// Single cell write. Replenishment is flattened into this call and
    /// places exactly one item when the write consumed the last one.
    fn write(&mut self, point: Point, value: CellState) -> WriteEffect {
        let Some(round) = self.round.as_mut() else {
            return WriteEffect::default();
        };

        let Some(previous) = round.grid.get(point) else {
            return WriteEffect::default();
        };
        let consumed = previous == CellState::Item;
        if consumed {
            round.item_count = round.item_count.saturating_sub(1);
        }

        if value == CellState::Occupied {
            round.body.push_back(point);
            self.pending.push(Change::Score);
        }

        round.grid.set(point, value);
        if value == CellState::Item {
            round.item_count += 1;
        }
        self.pending.push(Change::Cell(point));

        if !consumed || round.item_count > 0 {
            return WriteEffect {
                consumed,
                reset: None,
            };
        }

        match round.grid.pick_random_empty(&mut self.chooser) {
            Some(spot) => {
                round.grid.set(spot, CellState::Item);
                round.item_count += 1;
                self.pending.push(Change::Cell(spot));
                WriteEffect {
                    consumed,
                    reset: None,
                }
            }
            None => WriteEffect {
                consumed,
                reset: Some(ResetReason::NoRoomForItem),
            },
        }
    }

    fn reset(&mut self, reason: ResetReason) -> StepOutcome {
        let final_score = self.score();
        info!(
            generation = self.generation,
            tick = self.tick,
            final_score,
            %reason,
            "round over; rebuilding grid"
        );
        self.rebuild();
        StepOutcome::Reset {
            reason,
            final_score,
        }
    }

    fn rebuild(&mut self) {
        let size = self.config.grid_size;
        let mut grid = Grid::new(size);
        let mut body = VecDeque::new();

        let Some(seed) = grid.pick_random_empty(&mut self.chooser) else {
            panic!("a freshly built {}x{} grid has no empty cell", size, size);
        };
        grid.set(seed, CellState::Occupied);
        body.push_back(seed);

        let mut placed = 0;
        while placed < self.config.item_count {
            let Some(spot) = grid.pick_random_empty(&mut self.chooser) else {
                break;
            };
            grid.set(spot, CellState::Item);
            placed += 1;
        }

        self.generation += 1;
        debug!(
            generation = self.generation,
            grid_size = size,
            items = placed,
            requested_items = self.config.item_count,
            "grid initialized"
        );

        self.pending.extend(grid.points().map(Change::Cell));
        self.pending.push(Change::Score);
        self.round = Some(Round {
            grid,
            body,
            item_count: placed,
        });
    }

    fn discard(&mut self) {
        if let Some(round) = self.round.take() {
            self.pending.extend(round.grid.points().map(Change::Cell));
            self.pending.push(Change::Score);
        }
    }

    fn flush(&mut self) -> Vec<Change> {
        let changes = std::mem::take(&mut self.pending);
        self.observers.notify_all(&changes);
        changes
    }
}

impl<C: Chooser> fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("status", &self.status())
            .field("generation", &self.generation)
            .field("tick", &self.tick)
            .field("score", &self.score())
            .field("item_count", &self.item_count())
            .finish()
    }
}
