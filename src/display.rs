//! Derived display values for a results snapshot

use chrono::{DateTime, Local};

use crate::api::{ResultsSnapshot, VoteChoice};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChoiceRow {
    pub choice: VoteChoice,
    pub count: u64,
    /// Share of the total, rounded to one decimal
    pub percent: f64,
}

impl ChoiceRow {
    pub fn percent_text(&self) -> String {
        format!("{:.1}%", self.percent)
    }

    /// Bar fill in 0.0..=1.0
    pub fn ratio(&self) -> f64 {
        (self.percent / 100.0).clamp(0.0, 1.0)
    }
}

/// Everything the results panel shows, recomputed from scratch per snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub rows: [ChoiceRow; 2],
    pub total: u64,
    pub updated_at: String,
}

impl DisplayState {
    pub fn from_snapshot(snapshot: &ResultsSnapshot, at: DateTime<Local>) -> Self {
        let total = snapshot.total();
        let rows = VoteChoice::ALL.map(|choice| {
            let count = snapshot.count(choice);
            ChoiceRow {
                choice,
                count,
                percent: percent_of(count, total),
            }
        });

        Self {
            rows,
            total,
            updated_at: at.format("%H:%M:%S").to_string(),
        }
    }

    pub fn row(&self, choice: VoteChoice) -> &ChoiceRow {
        self.rows
            .iter()
            .find(|r| r.choice == choice)
            .unwrap_or(&self.rows[0])
    }
}

fn percent_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_three_to_one() {
        let state = DisplayState::from_snapshot(&ResultsSnapshot::new(3, 1), at());
        assert_eq!(state.total, 4);
        assert_eq!(state.row(VoteChoice::Dogs).percent_text(), "75.0%");
        assert_eq!(state.row(VoteChoice::Cats).percent_text(), "25.0%");
        assert_eq!(state.updated_at, "14:05:09");
    }

    #[test]
    fn test_empty_snapshot_has_zero_total() {
        let state = DisplayState::from_snapshot(&ResultsSnapshot::new(0, 0), at());
        assert_eq!(state.total, 0);
        for row in &state.rows {
            assert_eq!(row.percent_text(), "0.0%");
            assert_eq!(row.ratio(), 0.0);
        }
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        for dogs in 0..40u64 {
            for cats in 0..40u64 {
                if dogs + cats == 0 {
                    continue;
                }
                let state = DisplayState::from_snapshot(&ResultsSnapshot::new(dogs, cats), at());
                let sum: f64 = state.rows.iter().map(|r| r.percent).sum();
                assert!((sum - 100.0).abs() <= 0.1 + 1e-9, "{dogs}/{cats} summed to {sum}");
            }
        }
    }

    #[test]
    fn test_one_decimal_rounding() {
        let state = DisplayState::from_snapshot(&ResultsSnapshot::new(1, 2), at());
        assert_eq!(state.row(VoteChoice::Dogs).percent_text(), "33.3%");
        assert_eq!(state.row(VoteChoice::Cats).percent_text(), "66.7%");
    }

    #[test]
    fn test_counts_near_u64_max() {
        let state = DisplayState::from_snapshot(&ResultsSnapshot::new(u64::MAX - 1, 1), at());
        assert_eq!(state.total, u64::MAX);
        assert_eq!(state.row(VoteChoice::Dogs).percent_text(), "100.0%");
        assert_eq!(state.row(VoteChoice::Cats).percent_text(), "0.0%");
    }

    #[test]
    fn test_idempotent() {
        let snapshot = ResultsSnapshot::new(7, 2);
        assert_eq!(
            DisplayState::from_snapshot(&snapshot, at()),
            DisplayState::from_snapshot(&snapshot, at())
        );
    }
}
