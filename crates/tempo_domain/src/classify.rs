use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemCompletion, ItemStatus};
use crate::recurrence::RecurrenceRule;

/// Display category for one item on one day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Anchored to a time of day.
    Scheduled,
    /// Habit or recurring event without a time anchor.
    Recurring,
    /// Satisfiable any time within its window.
    Flexible,
    /// Tied to a date or deadline, nothing more specific.
    DateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub completed_today: bool,
}

/// Derives the category and completion state of one item on `today`.
/// A time anchor always wins over the other markers.
pub fn classify(item: &Item, completions: &[ItemCompletion], today: NaiveDate) -> Classification {
    let category = if item.scheduled_time.is_some() {
        Category::Scheduled
    } else if item.kind.is_recurring() {
        Category::Recurring
    } else if item.flexible {
        Category::Flexible
    } else {
        Category::DateOnly
    };
    Classification {
        category,
        completed_today: completed_today(item, completions, today),
    }
}

/// One-off items complete through their status; recurring items through a
/// completion row for today, or anywhere in this week for `weekly-flexible`.
pub fn completed_today(item: &Item, completions: &[ItemCompletion], today: NaiveDate) -> bool {
    if !item.kind.is_recurring() {
        return item.status == ItemStatus::Completed;
    }
    let weekly_flexible = item
        .recurrence_rule
        .as_deref()
        .and_then(RecurrenceRule::parse)
        .is_some_and(|rule| rule == RecurrenceRule::WeeklyFlexible);
    if weekly_flexible {
        let (monday, sunday) = week_window(today);
        return completions
            .iter()
            .any(|c| c.date >= monday && c.date <= sunday);
    }
    completions.iter().any(|c| c.date == today)
}

/// Mon–Sun window containing `day`.
pub fn week_window(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}
