//! Per-location player standing and the derived access tier.
//!
//! Access tiers and their price modifiers:
//!
//! | standing      | tier | price modifier |
//! |---------------|------|----------------|
//! | [-100, -50)   |  -3  | 0.70           |
//! | [-50, -25)    |  -2  | 0.80           |
//! | [-25, 0)      |  -1  | 0.90           |
//! | [0, 25)       |   0  | 1.00           |
//! | [25, 50)      |   1  | 1.10           |
//! | [50, 75)      |   2  | 1.20           |
//! | [75, 100]     |   3  | 1.30           |

use serde::{Deserialize, Serialize};

pub const MIN_STANDING: i32 = -100;
pub const MAX_STANDING: i32 = 100;

/// Player standing at one settlement. Standing is clamped at the point of
/// mutation; the tier and price modifier are derived, never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub standing: i32,
}

impl ReputationRecord {
    pub fn new(standing: i32) -> Self {
        Self {
            standing: standing.clamp(MIN_STANDING, MAX_STANDING),
        }
    }

    /// Access tier in [-3, 3], stepped at -50, -25, 0, 25, 50 and 75.
    pub fn access_level(&self) -> i8 {
        match self.standing {
            i32::MIN..=-51 => -3,
            -50..=-26 => -2,
            -25..=-1 => -1,
            0..=24 => 0,
            25..=49 => 1,
            50..=74 => 2,
            _ => 3,
        }
    }

    /// Base price modifier: 1 + tier × 0.1.
    pub fn price_modifier(&self) -> f64 {
        1.0 + f64::from(self.access_level()) * 0.1
    }

    /// Shift standing by `delta`, clamping into [-100, 100]. Returns the
    /// change actually applied.
    pub fn shift(&mut self, delta: i32) -> i32 {
        let before = self.standing;
        self.standing = self
            .standing
            .saturating_add(delta)
            .clamp(MIN_STANDING, MAX_STANDING);
        self.standing - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tiers_step_at_documented_thresholds() {
        let cases = [
            (-100, -3),
            (-51, -3),
            (-50, -2),
            (-26, -2),
            (-25, -1),
            (-1, -1),
            (0, 0),
            (24, 0),
            (25, 1),
            (49, 1),
            (50, 2),
            (74, 2),
            (75, 3),
            (100, 3),
        ];
        for (standing, tier) in cases {
            assert_eq!(
                ReputationRecord::new(standing).access_level(),
                tier,
                "standing {standing}"
            );
        }
    }

    #[test]
    fn modifier_is_ten_percent_per_tier() {
        assert!((ReputationRecord::new(-80).price_modifier() - 0.7).abs() < 1e-12);
        assert!((ReputationRecord::new(0).price_modifier() - 1.0).abs() < 1e-12);
        assert!((ReputationRecord::new(90).price_modifier() - 1.3).abs() < 1e-12);
    }

    #[test]
    fn shift_reports_applied_change() {
        let mut rec = ReputationRecord::new(95);
        assert_eq!(rec.shift(20), 5);
        assert_eq!(rec.standing, MAX_STANDING);
        assert_eq!(rec.shift(10), 0);

        let mut rec = ReputationRecord::new(-95);
        assert_eq!(rec.shift(-20), -5);
        assert_eq!(rec.standing, MIN_STANDING);
    }

    proptest! {
        #[test]
        fn standing_always_in_range(start in -100i32..=100, deltas in proptest::collection::vec(-300i32..=300, 0..20)) {
            let mut rec = ReputationRecord::new(start);
            for d in deltas {
                rec.shift(d);
                prop_assert!((MIN_STANDING..=MAX_STANDING).contains(&rec.standing));
                prop_assert!((-3..=3).contains(&rec.access_level()));
            }
        }
    }
}
