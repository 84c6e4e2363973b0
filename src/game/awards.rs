//! Contest rule shared by Longest Route and Largest Army.
//!
//! The holder keeps the award on ties. A challenger needs a score strictly
//! above the current standard and at least the threshold. A holder whose own
//! score falls below the threshold loses the award before challengers are
//! compared.

use serde::{Deserialize, Serialize};

pub const AWARD_POINTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Award {
    #[strum(to_string = "Longest Route")]
    LongestRoute,
    #[strum(to_string = "Largest Army")]
    LargestArmy,
}

impl Award {
    pub const fn rule(self) -> AwardRule {
        match self {
            Award::LongestRoute => LONGEST_ROUTE,
            Award::LargestArmy => LARGEST_ARMY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardRule {
    pub threshold: u8,
}

pub const LONGEST_ROUTE: AwardRule = AwardRule { threshold: 5 };
pub const LARGEST_ARMY: AwardRule = AwardRule { threshold: 3 };

impl AwardRule {
    /// Standard a challenger must beat while the award is unheld.
    pub const fn floor(self) -> u8 {
        self.threshold - 1
    }

    /// New holder given every seat's current score.
    pub fn contest(self, holder: Option<usize>, scores: &[u8]) -> Option<usize> {
        let mut holder = holder.filter(|seat| *seat < scores.len());
        let mut standard = self.floor();
        if let Some(seat) = holder {
            if scores[seat] < self.threshold {
                holder = None;
            } else {
                standard = scores[seat];
            }
        }
        for (seat, &score) in scores.iter().enumerate() {
            if score > standard && score >= self.threshold {
                holder = Some(seat);
                standard = score;
            }
        }
        holder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_to_threshold_takes_unheld_award() {
        assert_eq!(LONGEST_ROUTE.contest(None, &[4, 5, 3]), Some(1));
        assert_eq!(LONGEST_ROUTE.contest(None, &[4, 4, 3]), None);
    }

    #[test]
    fn tie_keeps_incumbent() {
        assert_eq!(LONGEST_ROUTE.contest(Some(0), &[5, 5]), Some(0));
    }

    #[test]
    fn strictly_longer_challenger_takes_over() {
        assert_eq!(LONGEST_ROUTE.contest(Some(0), &[5, 6]), Some(1));
    }

    #[test]
    fn holder_below_threshold_loses_award() {
        assert_eq!(LONGEST_ROUTE.contest(Some(0), &[4, 3]), None);
        // The standard resets, so a challenger only needs the threshold.
        assert_eq!(LONGEST_ROUTE.contest(Some(0), &[3, 5]), Some(1));
    }

    #[test]
    fn simultaneous_challengers_resolve_to_the_first_with_the_best_score() {
        assert_eq!(LONGEST_ROUTE.contest(None, &[6, 7, 7]), Some(1));
    }

    #[test]
    fn largest_army_uses_threshold_three() {
        assert_eq!(LARGEST_ARMY.contest(None, &[2, 0]), None);
        assert_eq!(LARGEST_ARMY.contest(None, &[3, 0]), Some(0));
        assert_eq!(LARGEST_ARMY.contest(Some(0), &[3, 3]), Some(0));
        assert_eq!(LARGEST_ARMY.contest(Some(0), &[3, 4]), Some(1));
    }
}
