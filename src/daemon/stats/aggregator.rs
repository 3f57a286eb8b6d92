use chrono::NaiveDate;

use crate::{
    daemon::classify::classifier::{ClickSide, InputAction},
    utils::time::same_calendar_day,
};

use super::entities::{DayStats, KeyCount, KeyCounter, StatsDocument, StatsSnapshot, TodayStats};

pub const HISTORY_LIMIT: usize = 30;
pub const TOP_KEY_LIMIT: usize = 15;

/// Pointer displacements at or below this many units are treated as sensor
/// jitter and discarded entirely, not rounded down.
const JITTER_THRESHOLD: f64 = 1.0;

/// How a mutation must reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Persist {
    /// Coalesce with other writes inside the debounce window.
    Debounced,
    /// Write synchronously; losing this state on abrupt exit is not
    /// acceptable (day rollover, explicit reset).
    Immediate,
}

/// In-memory statistics state. All persistence is delegated to the caller
/// through the [Persist] markers, which keeps every operation synchronously
/// testable.
pub struct StatsAggregator {
    today: TodayStats,
    history: Vec<DayStats>,
    key_stats: KeyCounter,
    total_key_stats: KeyCounter,
    last_pointer: Option<(i32, i32)>,
}

impl StatsAggregator {
    pub fn new(today: NaiveDate) -> Self {
        Self::from_document(StatsDocument {
            today: TodayStats::empty(today),
            ..StatsDocument::default()
        })
        .0
    }

    /// Restores state from a persisted document. The returned flag reports
    /// whether the cumulative table was seeded from the daily one — a
    /// one-time best-effort backfill for documents written before the
    /// cumulative table existed. The caller should persist when it is set.
    pub fn from_document(document: StatsDocument) -> (Self, bool) {
        let StatsDocument {
            today,
            history,
            key_stats,
            mut total_key_stats,
        } = document;

        let mut backfilled = false;
        if total_key_stats.is_empty() && !key_stats.is_empty() {
            total_key_stats = key_stats.clone();
            backfilled = true;
        }

        (
            Self {
                today,
                history,
                key_stats,
                total_key_stats,
                last_pointer: None,
            },
            backfilled,
        )
    }

    pub fn record(&mut self, action: InputAction) -> Option<Persist> {
        match action {
            InputAction::Keystroke { label } | InputAction::Combo { label } => {
                self.today.key_strokes += 1;
                self.key_stats.increment(&label);
                self.total_key_stats.increment(&label);
            }
            InputAction::Click {
                side: ClickSide::Left,
            } => self.today.left_clicks += 1,
            InputAction::Click {
                side: ClickSide::Right,
            } => self.today.right_clicks += 1,
            InputAction::Click {
                side: ClickSide::Other,
            } => return None,
            InputAction::PointerMove { x, y } => self.record_pointer_move(x, y),
            InputAction::Scroll { distance } => self.today.scroll_distance += distance.abs(),
        }
        Some(Persist::Debounced)
    }

    fn record_pointer_move(&mut self, x: i32, y: i32) {
        if let Some((last_x, last_y)) = self.last_pointer {
            let dx = (x - last_x) as f64;
            let dy = (y - last_y) as f64;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > JITTER_THRESHOLD {
                self.today.mouse_distance += distance;
            }
        }
        // The reference point advances even for discarded moves.
        self.last_pointer = Some((x, y));
    }

    /// Archives the outgoing day and restarts the counters when the
    /// calendar day has moved on. Idempotent within a single day. Days with
    /// no keystroke or left-click activity are not archived.
    pub fn check_day_change(&mut self, today: NaiveDate) -> Option<Persist> {
        if same_calendar_day(self.today.date, today) {
            return None;
        }

        if self.today.has_activity() {
            self.history.push(self.today.to_day_stats());
            if self.history.len() > HISTORY_LIMIT {
                let excess = self.history.len() - HISTORY_LIMIT;
                self.history.drain(..excess);
            }
        }

        self.today = TodayStats::empty(today);
        self.key_stats.clear();
        Some(Persist::Immediate)
    }

    /// User-triggered reset of today's numbers. The cumulative frequency
    /// table is deliberately left untouched.
    pub fn reset_today(&mut self, today: NaiveDate) -> Persist {
        self.today = TodayStats::empty(today);
        self.key_stats.clear();
        Persist::Immediate
    }

    pub fn today(&self) -> &TodayStats {
        &self.today
    }

    /// The last `days` entries of history plus today, today always being
    /// the most recent entry even though it isn't archived yet.
    pub fn history_data(&self, days: usize) -> Vec<DayStats> {
        let mut all: Vec<_> = self.history.clone();
        all.push(self.today.to_day_stats());
        let skip = all.len().saturating_sub(days);
        all.split_off(skip)
    }

    pub fn key_stats(&self) -> Vec<KeyCount> {
        self.key_stats.top(TOP_KEY_LIMIT)
    }

    pub fn total_key_stats(&self) -> Vec<KeyCount> {
        self.total_key_stats.top(TOP_KEY_LIMIT)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            today_stats: self.today.clone(),
            history_data: self.history_data(HISTORY_LIMIT),
            key_stats: self.key_stats(),
            total_key_stats: self.total_key_stats(),
        }
    }

    pub fn document(&self) -> StatsDocument {
        StatsDocument {
            today: self.today.clone(),
            history: self.history.clone(),
            key_stats: self.key_stats.clone(),
            total_key_stats: self.total_key_stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::daemon::classify::classifier::{ClickSide, InputAction};

    // Day arithmetic instead of a literal day-of-month, so tests spanning
    // more than one month stay on valid dates.
    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap() + Days::new(n - 1)
    }

    fn keystroke(label: &str) -> InputAction {
        InputAction::Keystroke {
            label: Arc::from(label),
        }
    }

    fn press_keys(aggregator: &mut StatsAggregator, label: &str, times: u64) {
        for _ in 0..times {
            let _ = aggregator.record(keystroke(label));
        }
    }

    #[test]
    fn keystrokes_and_combos_both_count_as_key_strokes() {
        let mut aggregator = StatsAggregator::new(day(1));
        assert_eq!(
            aggregator.record(keystroke("A")),
            Some(Persist::Debounced)
        );
        assert_eq!(
            aggregator.record(InputAction::Combo {
                label: Arc::from("Ctrl + C")
            }),
            Some(Persist::Debounced)
        );

        assert_eq!(aggregator.today().key_strokes, 2);
        let labels: Vec<_> = aggregator
            .key_stats()
            .into_iter()
            .map(|v| v.key)
            .collect();
        assert_eq!(labels, vec!["A".to_string(), "Ctrl + C".to_string()]);
    }

    #[test]
    fn clicks_count_per_side_and_other_buttons_are_ignored() {
        let mut aggregator = StatsAggregator::new(day(1));
        let _ = aggregator.record(InputAction::Click {
            side: ClickSide::Left,
        });
        let _ = aggregator.record(InputAction::Click {
            side: ClickSide::Right,
        });
        assert_eq!(
            aggregator.record(InputAction::Click {
                side: ClickSide::Other
            }),
            None
        );

        assert_eq!(aggregator.today().left_clicks, 1);
        assert_eq!(aggregator.today().right_clicks, 1);
    }

    #[test]
    fn pointer_jitter_is_discarded_but_still_moves_the_reference_point() {
        let mut aggregator = StatsAggregator::new(day(1));
        let _ = aggregator.record(InputAction::PointerMove { x: 100, y: 100 });
        assert_eq!(aggregator.today().mouse_distance, 0.0);

        // Sub-threshold move: distance stays zero.
        let _ = aggregator.record(InputAction::PointerMove { x: 100, y: 101 });
        assert_eq!(aggregator.today().mouse_distance, 0.0);

        // 3-4-5 triangle from the *discarded* sample's position.
        let _ = aggregator.record(InputAction::PointerMove { x: 103, y: 105 });
        assert_eq!(aggregator.today().mouse_distance, 5.0);
    }

    #[test]
    fn scroll_accumulates_absolute_distance() {
        let mut aggregator = StatsAggregator::new(day(1));
        let _ = aggregator.record(InputAction::Scroll { distance: 6.0 });
        let _ = aggregator.record(InputAction::Scroll { distance: -3.0 });
        assert_eq!(aggregator.today().scroll_distance, 9.0);
    }

    #[test]
    fn day_change_is_idempotent_within_a_day() {
        let mut aggregator = StatsAggregator::new(day(1));
        press_keys(&mut aggregator, "A", 2);

        assert_eq!(aggregator.check_day_change(day(1)), None);
        assert_eq!(
            aggregator.check_day_change(day(2)),
            Some(Persist::Immediate)
        );
        assert_eq!(aggregator.check_day_change(day(2)), None);
    }

    #[test]
    fn day_change_archives_and_resets() {
        let mut aggregator = StatsAggregator::new(day(1));
        press_keys(&mut aggregator, "A", 3);
        let _ = aggregator.record(InputAction::Click {
            side: ClickSide::Left,
        });

        let _ = aggregator.check_day_change(day(2));

        assert_eq!(aggregator.today().key_strokes, 0);
        assert_eq!(aggregator.today().date, day(2));
        assert!(aggregator.key_stats().is_empty());
        // The cumulative table survives rollover.
        assert_eq!(aggregator.total_key_stats()[0].count, 3);

        let history = aggregator.history_data(HISTORY_LIMIT);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, day(1));
        assert_eq!(history[0].key_strokes, 3);
        assert_eq!(history[0].clicks, 1);
        // Today trails the archive as the most recent entry.
        assert_eq!(history[1].date, day(2));
    }

    #[test]
    fn inactive_days_are_not_archived() {
        let mut aggregator = StatsAggregator::new(day(1));
        let _ = aggregator.record(InputAction::Scroll { distance: 5.0 });

        assert_eq!(
            aggregator.check_day_change(day(2)),
            Some(Persist::Immediate)
        );
        // Only today remains in the merged view.
        assert_eq!(aggregator.history_data(HISTORY_LIMIT).len(), 1);
    }

    #[test]
    fn history_is_capped_at_thirty_days() {
        let mut aggregator = StatsAggregator::new(day(1));
        for n in 1..=31 {
            press_keys(&mut aggregator, "A", 1);
            let _ = aggregator.check_day_change(day(n + 1));
        }

        let history = aggregator.history_data(usize::MAX);
        // 30 archived days plus today.
        assert_eq!(history.len(), HISTORY_LIMIT + 1);
        // The oldest entry (day 1) was evicted.
        assert_eq!(history[0].date, day(2));
        assert_eq!(history[HISTORY_LIMIT - 1].date, day(31));
    }

    #[test]
    fn reset_today_keeps_the_cumulative_table() {
        let mut aggregator = StatsAggregator::new(day(1));
        press_keys(&mut aggregator, "A", 4);

        assert_eq!(aggregator.reset_today(day(1)), Persist::Immediate);

        assert_eq!(aggregator.today().key_strokes, 0);
        assert!(aggregator.key_stats().is_empty());
        assert_eq!(aggregator.total_key_stats()[0].count, 4);
    }

    #[test]
    fn backfill_seeds_cumulative_from_daily_once() {
        let mut document = StatsDocument::default();
        document.key_stats.increment("A");
        document.key_stats.increment("A");

        let (aggregator, backfilled) = StatsAggregator::from_document(document);
        assert!(backfilled);
        assert_eq!(aggregator.total_key_stats()[0].count, 2);

        let (_, backfilled) = StatsAggregator::from_document(aggregator.document());
        assert!(!backfilled);
    }

    #[test]
    fn history_data_window_takes_the_most_recent_entries() {
        let mut aggregator = StatsAggregator::new(day(1));
        for n in 1..=5 {
            press_keys(&mut aggregator, "A", 1);
            let _ = aggregator.check_day_change(day(n + 1));
        }

        let window = aggregator.history_data(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].date, day(4));
        assert_eq!(window[2].date, day(6));
    }
}
