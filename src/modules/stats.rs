use serde::{Deserialize, Serialize};

use crate::modules::engine::{ResetReason, StepOutcome, StepResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub ticks: u64,
    pub move_count: u64,
    pub consume_count: u64,
    pub idle_count: u64,
    pub resets_no_legal_move: u64,
    pub resets_no_room_for_item: u64,
    pub best_score: usize,
}

impl RunStats {
    pub fn record(&mut self, result: &StepResult) {
        self.ticks = self.ticks.saturating_add(1);
        match &result.outcome {
            StepOutcome::Idle => self.idle_count = self.idle_count.saturating_add(1),
            StepOutcome::Moved { .. } => self.move_count = self.move_count.saturating_add(1),
            StepOutcome::Consumed { .. } => {
                self.consume_count = self.consume_count.saturating_add(1)
            }
            StepOutcome::Reset {
                reason,
                final_score,
            } => {
                match reason {
                    ResetReason::NoLegalMove => {
                        self.resets_no_legal_move = self.resets_no_legal_move.saturating_add(1)
                    }
                    ResetReason::NoRoomForItem => {
                        self.resets_no_room_for_item =
                            self.resets_no_room_for_item.saturating_add(1)
                    }
                }
                self.best_score = self.best_score.max(*final_score);
            }
        }
        self.best_score = self.best_score.max(result.score);
    }

    pub fn resets(&self) -> u64 {
        self.resets_no_legal_move
            .saturating_add(self.resets_no_room_for_item)
    }

    pub fn summary(&self) -> String {
        format!(
            "ticks={} moves={} consumed={} resets={} (no legal move={}, no room for item={}) best_score={}",
            self.ticks,
            self.move_count,
            self.consume_count,
            self.resets(),
            self.resets_no_legal_move,
            self.resets_no_room_for_item,
            self.best_score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::engine::Engine;
    use crate::modules::grid::{Direction, Point};
    use crate::modules::rng::FirstChoice;

    fn result(outcome: StepOutcome, score: usize) -> StepResult {
        StepResult {
            tick: 1,
            generation: 1,
            outcome,
            score,
            changes: Vec::new(),
        }
    }

    #[test]
    fn counts_each_outcome() {
        let mut stats = RunStats::default();
        let head = Point::new(0, 0);
        stats.record(&result(
            StepOutcome::Moved {
                direction: Direction::Up,
                head,
            },
            0,
        ));
        stats.record(&result(
            StepOutcome::Consumed {
                direction: Direction::Up,
                head,
            },
            1,
        ));
        stats.record(&result(
            StepOutcome::Reset {
                reason: ResetReason::NoLegalMove,
                final_score: 4,
            },
            0,
        ));
        stats.record(&result(StepOutcome::Idle, 0));

        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.move_count, 1);
        assert_eq!(stats.consume_count, 1);
        assert_eq!(stats.idle_count, 1);
        assert_eq!(stats.resets(), 1);
        assert_eq!(stats.best_score, 4);
    }

    #[test]
    fn tracks_engine_run() {
        let mut engine = Engine::with_chooser(FirstChoice);
        engine.initialize(2, 3).unwrap();
        let mut stats = RunStats::default();
        for _ in 0..3 {
            stats.record(&engine.step());
        }
        assert_eq!(stats.consume_count, 2);
        assert_eq!(stats.resets_no_room_for_item, 1);
        assert_eq!(stats.best_score, 3);
        assert!(stats.summary().contains("best_score=3"));
    }
}
