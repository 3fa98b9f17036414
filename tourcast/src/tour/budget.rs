//! Word budgets.
//!
//! Spoken narration is budgeted at a fixed speaking rate: a tour of `d`
//! minutes gets `d × words_per_minute` words, split across the selected
//! interests. The split is either even (integer division, remainder dropped)
//! or follows the planner's time allocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::interest::Interest;
use super::plan::TimeAllocation;
use super::request::TourRequest;

/// Default speaking rate.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 150;

/// Default relative tolerance around a word target.
pub const DEFAULT_WORD_TOLERANCE: f64 = 0.10;

/// How per-interest word targets are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStrategy {
    /// Equal integer split of the total; the planner is advisory.
    #[default]
    Even,
    /// Per-interest minutes from the planner, converted at the speaking rate.
    Planned,
}

/// Total words for a duration, saturating on overflow.
#[must_use]
pub const fn total_words(duration_minutes: u32, words_per_minute: u32) -> u32 {
    duration_minutes.saturating_mul(words_per_minute)
}

/// Even share of `total` across `n` interests; `total` itself when `n` is zero.
#[must_use]
pub fn words_per_interest(total: u32, n: usize) -> u32 {
    match u32::try_from(n) {
        Ok(0) => total,
        Ok(n) => total / n,
        Err(_) => 0,
    }
}

/// Introduction length for a tour of `total` words.
#[must_use]
pub fn intro_words(total: u32) -> u32 {
    (total / 8).clamp(40, 300)
}

/// Conclusion length for a tour of `total` words.
#[must_use]
pub fn conclusion_words(total: u32) -> u32 {
    (total / 10).clamp(30, 150)
}

/// Accepted word-count range around a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordWindow {
    /// Inclusive lower bound, at least 1.
    pub lower: u32,
    /// Inclusive upper bound.
    pub upper: u32,
}

impl WordWindow {
    /// Window of `target ± tolerance`, lower bound rounded down and upper
    /// bound rounded up. Tolerance is clamped to `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn around(target: u32, tolerance: f64) -> Self {
        // Basis points keep the bounds exact for tolerances like 0.1.
        let bp = (tolerance.clamp(0.0, 1.0) * 10_000.0).round() as u64;
        let target = u64::from(target);
        let lower = target * (10_000 - bp) / 10_000;
        let upper = (target * (10_000 + bp)).div_ceil(10_000);
        let lower = u32::try_from(lower).unwrap_or(u32::MAX).max(1);
        let upper = u32::try_from(upper).unwrap_or(u32::MAX).max(lower);
        Self { lower, upper }
    }

    /// Returns `true` if `words` lies inside the window.
    #[must_use]
    pub fn contains(&self, words: usize) -> bool {
        u32::try_from(words).is_ok_and(|w| (self.lower..=self.upper).contains(&w))
    }
}

/// Word targets for one tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourBudget {
    /// Duration times the speaking rate.
    pub total_words: u32,
    /// Even share per selected interest.
    pub words_per_interest: u32,
    /// Target per selected interest, in domain order.
    pub sections: BTreeMap<Interest, u32>,
    /// Introduction target passed to the orchestrator.
    pub intro_words: u32,
    /// Conclusion target passed to the orchestrator.
    pub conclusion_words: u32,
    /// The strategy that produced `sections`.
    pub strategy: BudgetStrategy,
}

impl TourBudget {
    /// Even split: every selected interest gets `total / n` words.
    #[must_use]
    pub fn even(request: &TourRequest, words_per_minute: u32) -> Self {
        let total = total_words(request.duration_minutes(), words_per_minute);
        let share = words_per_interest(total, request.interests().len());
        Self {
            total_words: total,
            words_per_interest: share,
            sections: request.interests().iter().map(|i| (i, share)).collect(),
            intro_words: intro_words(total),
            conclusion_words: conclusion_words(total),
            strategy: BudgetStrategy::Even,
        }
    }

    /// Planner-driven split: each selected interest gets its allocated
    /// minutes times the speaking rate, rounded.
    ///
    /// Falls back to [`TourBudget::even`] when any selected interest was
    /// allocated no time.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn planned(
        request: &TourRequest,
        words_per_minute: u32,
        allocation: &TimeAllocation,
    ) -> Self {
        let starved: Vec<_> = request
            .interests()
            .iter()
            .filter(|i| allocation.minutes_for(*i) <= 0.0)
            .map(Interest::key)
            .collect();
        if !starved.is_empty() {
            warn!(
                starved = ?starved,
                "planner allocated no time to selected interests, using even split"
            );
            return Self::even(request, words_per_minute);
        }

        let rate = f64::from(words_per_minute);
        let sections = request
            .interests()
            .iter()
            .map(|i| {
                let words = (allocation.minutes_for(i) * rate).round();
                (i, (words.min(f64::from(u32::MAX)) as u32).max(1))
            })
            .collect();

        Self {
            strategy: BudgetStrategy::Planned,
            sections,
            ..Self::even(request, words_per_minute)
        }
    }

    /// Target for `interest`, if selected.
    #[must_use]
    pub fn words_for(&self, interest: Interest) -> Option<u32> {
        self.sections.get(&interest).copied()
    }

    /// Sum of all section targets.
    #[must_use]
    pub fn section_total(&self) -> u32 {
        self.sections.values().fold(0, |acc, w| acc.saturating_add(*w))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::tour::Interests;

    fn request(labels: &[&str], minutes: u32) -> TourRequest {
        TourRequest::from_labels("Paris", labels, minutes).unwrap()
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn paris_ten_minutes_two_interests() {
            let budget = TourBudget::even(&request(&["History", "Architecture"], 10), 150);
            assert_eq!(budget.total_words, 1500);
            assert_eq!(budget.words_per_interest, 750);
            assert_eq!(budget.words_for(Interest::Architecture), Some(750));
            assert_eq!(budget.words_for(Interest::History), Some(750));
            assert_eq!(budget.words_for(Interest::Culture), None);
        }

        #[test]
        fn one_minute_single_interest() {
            let budget = TourBudget::even(&request(&["Culinary"], 1), 150);
            assert_eq!(budget.total_words, 150);
            assert_eq!(budget.words_per_interest, 150);
            assert_eq!(budget.intro_words, 40);
            assert_eq!(budget.conclusion_words, 30);
        }

        #[test]
        fn remainder_is_dropped() {
            let budget = TourBudget::even(&request(&["History", "Culture", "Culinary"], 1), 150);
            assert_eq!(budget.words_per_interest, 50);
            let budget =
                TourBudget::even(&request(&["History", "Culture", "Culinary", "Architecture"], 1), 150);
            assert_eq!(budget.words_per_interest, 37);
            assert_eq!(budget.section_total(), 148);
        }

        #[test]
        fn zero_interests_keeps_total() {
            assert_eq!(words_per_interest(1500, 0), 1500);
        }

        #[test]
        fn intro_and_conclusion_are_clamped() {
            assert_eq!(intro_words(1500), 187);
            assert_eq!(intro_words(9000), 300);
            assert_eq!(conclusion_words(1500), 150);
            assert_eq!(conclusion_words(600), 60);
        }

        #[test]
        fn total_saturates() {
            assert_eq!(total_words(u32::MAX, 150), u32::MAX);
        }
    }

    mod window {
        use super::*;

        #[test]
        fn ten_percent_of_750() {
            let w = WordWindow::around(750, 0.10);
            assert_eq!((w.lower, w.upper), (675, 825));
            assert!(w.contains(675));
            assert!(w.contains(825));
            assert!(!w.contains(826));
        }

        #[test]
        fn ten_percent_of_150() {
            let w = WordWindow::around(150, 0.10);
            assert_eq!((w.lower, w.upper), (135, 165));
        }

        #[test]
        fn rounds_outward() {
            let w = WordWindow::around(37, 0.10);
            assert_eq!((w.lower, w.upper), (33, 41));
        }

        #[test]
        fn lower_bound_is_at_least_one() {
            let w = WordWindow::around(1, 0.5);
            assert_eq!(w.lower, 1);
            assert!(!w.contains(0));
        }
    }

    mod planned {
        use super::*;

        fn allocation(architecture: f64, history: f64) -> TimeAllocation {
            TimeAllocation {
                introduction: 1.0,
                architecture,
                history,
                culture: 0.0,
                culinary: 0.0,
                conclusion: 1.0,
            }
        }

        #[test]
        fn converts_minutes_to_words() {
            let req = request(&["History", "Architecture"], 10);
            let budget = TourBudget::planned(&req, 150, &allocation(3.0, 5.0));
            assert_eq!(budget.strategy, BudgetStrategy::Planned);
            assert_eq!(budget.words_for(Interest::Architecture), Some(450));
            assert_eq!(budget.words_for(Interest::History), Some(750));
            assert_eq!(budget.total_words, 1500);
        }

        #[test]
        fn rounds_fractional_minutes() {
            let req = request(&["History"], 3);
            let budget = TourBudget::planned(&req, 150, &allocation(0.0, 1.5));
            assert_eq!(budget.words_for(Interest::History), Some(225));
        }

        #[test]
        fn falls_back_when_selected_interest_starved() {
            let req = request(&["History", "Architecture"], 10);
            let budget = TourBudget::planned(&req, 150, &allocation(0.0, 8.0));
            assert_eq!(budget.strategy, BudgetStrategy::Even);
            assert_eq!(budget.words_for(Interest::Architecture), Some(750));
        }
    }

    fn interests_strategy() -> impl Strategy<Value = Interests> {
        proptest::sample::subsequence(Interest::ALL.to_vec(), 1..=4)
            .prop_map(|v| v.into_iter().collect())
    }

    proptest! {
        #[test]
        fn even_split_never_exceeds_total(minutes in 1u32..=600, interests in interests_strategy()) {
            let req = TourRequest::new("Paris", interests.clone(), minutes).unwrap();
            let budget = TourBudget::even(&req, DEFAULT_WORDS_PER_MINUTE);
            let n = u32::try_from(interests.len()).unwrap();

            prop_assert!(budget.words_per_interest * n <= budget.total_words);
            prop_assert!(budget.total_words - budget.words_per_interest * n <= n - 1);
            prop_assert_eq!(budget.sections.len(), interests.len());
        }

        #[test]
        fn even_split_is_deterministic(minutes in 1u32..=600, interests in interests_strategy()) {
            let req = TourRequest::new("Paris", interests, minutes).unwrap();
            prop_assert_eq!(TourBudget::even(&req, 150), TourBudget::even(&req, 150));
        }

        #[test]
        fn window_contains_target(target in 1u32..=100_000, tolerance in 0.0f64..=0.5) {
            let w = WordWindow::around(target, tolerance);
            prop_assert!(w.lower >= 1);
            prop_assert!(w.lower <= target && target <= w.upper);
        }
    }
}
