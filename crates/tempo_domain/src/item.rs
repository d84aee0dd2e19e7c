use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Todo,
    Event,
    RecurringEvent,
    Habit,
}

impl ItemKind {
    /// Habits and recurring events log per-date completions instead of
    /// flipping their status.
    pub fn is_recurring(self) -> bool {
        matches!(self, Self::Habit | Self::RecurringEvent)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Todo => "todo",
            Self::Event => "event",
            Self::RecurringEvent => "recurring_event",
            Self::Habit => "habit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Completed,
    Archived,
    Dismissed,
}

/// A unit of commitment: one-off to-do or event, recurring event, or habit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub recurrence_rule: Option<String>,
    pub flexible: bool,
    pub deadline_date: Option<NaiveDate>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Record that a recurring item was done on one calendar date. At most one
/// row exists per `(item_id, date)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemCompletion {
    pub id: i64,
    pub item_id: i64,
    pub date: NaiveDate,
    pub completed_at: DateTime<Utc>,
    pub notes: Option<String>,
}
