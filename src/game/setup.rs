//! Setup-phase placement order.
//!
//! With `n` seats there are `4n` steps. Each step pair is one seat placing a
//! settlement (even step) and then a road (odd step). The first round walks
//! the seats forwards starting at `first_seat`, the second round walks them
//! backwards, so the last seat of round one places twice in a row.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetupPlacement {
    Settlement,
    Road,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupStep {
    pub seat: usize,
    pub placement: SetupPlacement,
    pub second_round: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOrder {
    steps: Vec<SetupStep>,
}

impl SetupOrder {
    pub fn new(num_seats: usize, first_seat: usize) -> Self {
        debug_assert!(num_seats > 0 && first_seat < num_seats);
        let steps = (0..num_seats * 4)
            .map(|step| {
                let turn_index = step / 2;
                let offset = if turn_index < num_seats {
                    turn_index
                } else {
                    num_seats - 1 - (turn_index - num_seats)
                };
                SetupStep {
                    seat: (first_seat + offset) % num_seats,
                    placement: if step % 2 == 0 {
                        SetupPlacement::Settlement
                    } else {
                        SetupPlacement::Road
                    },
                    second_round: turn_index >= num_seats,
                }
            })
            .collect();
        Self { steps }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, step: usize) -> Option<SetupStep> {
        self.steps.get(step).copied()
    }

    pub fn seat_for_step(&self, step: usize) -> Option<usize> {
        self.step(step).map(|s| s.seat)
    }

    pub fn is_complete(&self, step: usize) -> bool {
        step >= self.steps.len()
    }

    /// Seat that acts first in normal play: whoever placed the final road.
    pub fn last_seat(&self) -> Option<usize> {
        self.steps.last().map(|s| s.seat)
    }

    pub fn seats(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().map(|s| s.seat)
    }
}
