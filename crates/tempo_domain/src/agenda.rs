use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::{classify, Category};
use crate::item::{Item, ItemCompletion, ItemStatus};
use crate::recurrence::rule_matches;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgendaEntry {
    pub item: Item,
    pub completed_today: bool,
}

/// The composed "today" view, partitioned into display sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgendaView {
    pub scheduled: Vec<AgendaEntry>,
    pub recurring: Vec<AgendaEntry>,
    pub date_only: Vec<AgendaEntry>,
    pub flexible: Vec<AgendaEntry>,
}

impl AgendaView {
    pub fn len(&self) -> usize {
        self.scheduled.len() + self.recurring.len() + self.date_only.len() + self.flexible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the agenda for `today` from a snapshot of a user's items and their
/// completions. Pure: identical inputs always produce the identical view.
pub fn compose_agenda(
    items: &[Item],
    completions_by_item: &HashMap<i64, Vec<ItemCompletion>>,
    today: NaiveDate,
) -> AgendaView {
    let mut view = AgendaView::default();

    for item in items {
        if !eligible_today(item, today) {
            continue;
        }
        let completions = completions_by_item
            .get(&item.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let classification = classify(item, completions, today);
        let entry = AgendaEntry {
            item: item.clone(),
            completed_today: classification.completed_today,
        };
        match classification.category {
            Category::Scheduled => view.scheduled.push(entry),
            Category::Recurring => view.recurring.push(entry),
            Category::Flexible => view.flexible.push(entry),
            Category::DateOnly => view.date_only.push(entry),
        }
    }

    view.scheduled
        .sort_by(|a, b| a.item.scheduled_time.cmp(&b.item.scheduled_time));
    for group in [
        &mut view.recurring,
        &mut view.date_only,
        &mut view.flexible,
    ] {
        group.sort_by(|a, b| b.item.created_at.cmp(&a.item.created_at));
    }

    view
}

/// One-off items belong to their scheduled date until completed; recurring
/// items belong to every active day their rule fires on.
fn eligible_today(item: &Item, today: NaiveDate) -> bool {
    if item.kind.is_recurring() {
        item.status == ItemStatus::Active && rule_matches(item.recurrence_rule.as_deref(), today)
    } else {
        item.scheduled_date == Some(today) && item.status != ItemStatus::Completed
    }
}
