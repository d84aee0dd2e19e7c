use chrono::NaiveDate;

use crate::item::{Item, ItemKind, ItemStatus};

/// Title fragments that mark a quick errand-style task; those get nudged
/// after a shorter wait than open-ended ones.
const URGENT_KEYWORDS: [&str; 14] = [
    "groceries", "buy", "pick up", "pickup", "grab", "errand", "pharmacy", "mail", "return",
    "drop off", "dropoff", "call", "book", "send",
];

const MAX_SUGGESTIONS: usize = 5;
const URGENT_THRESHOLD_DAYS: i64 = 2;
const DEFAULT_THRESHOLD_DAYS: i64 = 7;

/// A backlog todo has no date or deadline and has not been finished or
/// dismissed.
pub fn is_backlog(item: &Item) -> bool {
    item.kind == ItemKind::Todo
        && item.scheduled_date.is_none()
        && item.deadline_date.is_none()
        && item.status != ItemStatus::Completed
        && item.status != ItemStatus::Dismissed
}

/// Whole calendar days since the item was created, midnight to midnight.
pub fn days_pending(item: &Item, today: NaiveDate) -> i64 {
    (today - item.created_at.date_naive()).num_days()
}

fn is_urgent(title: &str) -> bool {
    let lower = title.to_lowercase();
    URGENT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Picks the stalest qualifying backlog todos, at most five, most stale
/// first.
pub fn rank_backlog(todos: &[Item], today: NaiveDate) -> Vec<Item> {
    let mut suggestions: Vec<&Item> = todos
        .iter()
        .filter(|item| is_backlog(item))
        .filter(|item| {
            let threshold = if is_urgent(&item.title) {
                URGENT_THRESHOLD_DAYS
            } else {
                DEFAULT_THRESHOLD_DAYS
            };
            days_pending(item, today) >= threshold
        })
        .collect();
    suggestions.sort_by_key(|item| std::cmp::Reverse(days_pending(item, today)));
    suggestions
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn todo(id: i64, title: &str, created: NaiveDate) -> Item {
        Item {
            id,
            user_id: "u1".into(),
            title: title.into(),
            kind: ItemKind::Todo,
            scheduled_date: None,
            scheduled_time: None,
            recurrence_rule: None,
            flexible: false,
            deadline_date: None,
            status: ItemStatus::Active,
            created_at: Utc.from_utc_datetime(&created.and_hms_opt(12, 0, 0).unwrap()),
            completed_at: None,
        }
    }

    #[test]
    fn urgent_titles_qualify_after_two_days() {
        let today = date(2024, 6, 10);
        let milk = todo(1, "Buy milk", date(2024, 6, 8));
        let novel = todo(2, "Outline novel", date(2024, 6, 8));
        let picks = rank_backlog(&[milk, novel], today);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].title, "Buy milk");
    }

    #[test]
    fn plain_titles_qualify_after_seven_days() {
        let today = date(2024, 6, 10);
        let fresh = todo(1, "Outline novel", date(2024, 6, 5));
        let stale = todo(2, "Clean garage", date(2024, 6, 3));
        let picks = rank_backlog(&[fresh, stale], today);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].title, "Clean garage");
    }

    #[test]
    fn stalest_first_capped_at_five() {
        let today = date(2024, 7, 1);
        let todos: Vec<Item> = (1..=8)
            .map(|i| todo(i, &format!("Chore {i}"), date(2024, 6, 1 + i as u32)))
            .collect();
        let picks = rank_backlog(&todos, today);
        assert_eq!(picks.len(), 5);
        let pending: Vec<i64> = picks.iter().map(|p| days_pending(p, today)).collect();
        assert!(pending.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(picks[0].title, "Chore 1");
    }

    #[test]
    fn dated_dismissed_and_completed_todos_are_not_backlog() {
        let today = date(2024, 7, 1);
        let mut scheduled = todo(1, "Call plumber", date(2024, 6, 1));
        scheduled.scheduled_date = Some(date(2024, 7, 2));
        let mut deadlined = todo(2, "Call dentist", date(2024, 6, 1));
        deadlined.deadline_date = Some(date(2024, 7, 9));
        let mut dismissed = todo(3, "Call bank", date(2024, 6, 1));
        dismissed.status = ItemStatus::Dismissed;
        let mut done = todo(4, "Call mom", date(2024, 6, 1));
        done.status = ItemStatus::Completed;

        let picks = rank_backlog(&[scheduled, deadlined, dismissed, done], today);
        assert!(picks.is_empty());
    }

    #[test]
    fn returned_items_always_meet_their_threshold() {
        let today = date(2024, 6, 10);
        let urgent_young = todo(1, "Grab parcel", date(2024, 6, 9));
        let picks = rank_backlog(&[urgent_young], today);
        assert!(picks.is_empty(), "one day pending is under both thresholds");
    }
}
