use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ItemCompletion;
use crate::recurrence::rule_matches_anchored;

/// Rolling completion rates (whole percent) and the current streak for one
/// habit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitStats {
    pub rate7: u8,
    pub rate30: u8,
    pub streak: u32,
}

/// Computes habit statistics relative to `today`. Days before the habit
/// existed are never scanned; a `weekly` rule fires on the weekday the habit
/// was created.
pub fn compute_habit_stats(
    completions: &[ItemCompletion],
    rule: Option<&str>,
    created_at: Option<DateTime<Utc>>,
    today: NaiveDate,
) -> HabitStats {
    let start = created_at.map_or(today, |ts| ts.date_naive());
    let anchor = start.weekday();
    let completed: HashSet<NaiveDate> = completions.iter().map(|c| c.date).collect();

    let rate_over = |days: i64| -> u8 {
        let mut eligible = 0u32;
        let mut done = 0u32;
        for offset in 0..days {
            let day = today - Duration::days(offset);
            if day < start {
                break;
            }
            if rule_matches_anchored(rule, day, anchor) {
                eligible += 1;
                if completed.contains(&day) {
                    done += 1;
                }
            }
        }
        if eligible == 0 {
            return 0;
        }
        ((f64::from(done) / f64::from(eligible)) * 100.0).round() as u8
    };

    let mut streak = 0u32;
    for offset in 0i64.. {
        let day = today - Duration::days(offset);
        if day < start {
            break;
        }
        if !rule_matches_anchored(rule, day, anchor) {
            continue;
        }
        if completed.contains(&day) {
            streak += 1;
        } else {
            break;
        }
    }

    HabitStats {
        rate7: rate_over(7),
        rate30: rate_over(30),
        streak,
    }
}
