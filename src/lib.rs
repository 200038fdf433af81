pub mod modules;

pub use modules::cell::CellState;
pub use modules::config::{self, ConfigError, EngineConfig, MAX_GRID_SIZE};
pub use modules::engine::{
    Engine, EngineError, ResetReason, Status, StepOutcome, StepResult,
};
pub use modules::grid::{Direction, Grid, Point, dimension_of};
pub use modules::observer::{CellSubscription, Change, Observers, ScoreSubscription};
pub use modules::rng::{self, Chooser, FirstChoice};
pub use modules::scheduler::{FRAME, FrameScheduler, run_ticks};
pub use modules::snapshot::GridSnapshot;
pub use modules::stats::RunStats;
pub use modules::view::{Frame, TerminalView};
