//! Derived read-only projections over the document.
//!
//! # Responsibility
//! - Compute the active/archived lists and per-date completion views the
//!   presentation layer renders.
//! - Compute weekly completion statistics for the active set.
//!
//! All functions here are pure; they never mutate the document.

use crate::model::document::CompletionIndex;
use crate::model::habit::Habit;
use crate::service::dates;
use std::collections::HashSet;

/// One day's completed count for the week chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekStatPoint {
    pub date: String,
    pub completed: usize,
}

/// Active habits sorted by their order field.
pub fn active_habits(habits: &[Habit]) -> Vec<&Habit> {
    let mut active: Vec<&Habit> = habits.iter().filter(|habit| habit.is_active()).collect();
    active.sort_by_key(|habit| habit.order);
    active
}

/// Archived habits in document order.
pub fn archived_habits(habits: &[Habit]) -> Vec<&Habit> {
    habits.iter().filter(|habit| !habit.is_active()).collect()
}

/// Ids completed on `date`; absent dates read as the empty set.
pub fn completed_set_for_date<'a>(completions: &'a CompletionIndex, date: &str) -> HashSet<&'a str> {
    completions
        .get(date)
        .map(|ids| ids.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Completed-per-day counts across the week starting at `week_start`.
///
/// Only currently-active habit ids count, so archiving a habit
/// retroactively drops it from the chart without touching stored history.
pub fn week_stats(
    week_start: &str,
    habits: &[Habit],
    completions: &CompletionIndex,
) -> Vec<WeekStatPoint> {
    let Some(days) = dates::week_days(week_start) else {
        return Vec::new();
    };
    let active_ids: HashSet<&str> = active_habits(habits)
        .into_iter()
        .map(|habit| habit.id.as_str())
        .collect();

    days.into_iter()
        .map(|date| {
            let completed = completions
                .get(&date)
                .map(|ids| {
                    ids.iter()
                        .filter(|id| active_ids.contains(id.as_str()))
                        .count()
                })
                .unwrap_or(0);
            WeekStatPoint { date, completed }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{active_habits, archived_habits, completed_set_for_date, week_stats};
    use crate::model::document::CompletionIndex;
    use crate::model::habit::{Habit, HabitStatus};

    fn sample_habits() -> Vec<Habit> {
        let mut first = Habit::new("Read", 2);
        first.id = "a".to_string();
        let mut second = Habit::new("Stretch", 1);
        second.id = "b".to_string();
        let mut archived = Habit::new("Meditate", 0);
        archived.id = "c".to_string();
        archived.status = HabitStatus::Archived;
        vec![first, second, archived]
    }

    #[test]
    fn active_list_is_sorted_by_order() {
        let habits = sample_habits();
        let active = active_habits(&habits);
        let ids: Vec<&str> = active.iter().map(|habit| habit.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let archived = archived_habits(&habits);
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, "c");
    }

    #[test]
    fn completed_set_reads_absent_date_as_empty() {
        let completions = CompletionIndex::new();
        assert!(completed_set_for_date(&completions, "2024-01-10").is_empty());
    }

    #[test]
    fn week_stats_counts_only_active_ids() {
        let habits = sample_habits();
        let mut completions = CompletionIndex::new();
        completions.insert(
            "2024-01-08".to_string(),
            vec!["a".to_string(), "c".to_string()],
        );
        completions.insert("2024-01-09".to_string(), vec!["b".to_string()]);

        let stats = week_stats("2024-01-08", &habits, &completions);
        assert_eq!(stats.len(), 7);
        assert_eq!(stats[0].date, "2024-01-08");
        // "c" is archived, so only "a" counts.
        assert_eq!(stats[0].completed, 1);
        assert_eq!(stats[1].completed, 1);
        assert_eq!(stats[2].completed, 0);
    }

    #[test]
    fn week_stats_on_bad_anchor_is_empty() {
        let habits = sample_habits();
        let completions = CompletionIndex::new();
        assert!(week_stats("garbage", &habits, &completions).is_empty());
    }
}
