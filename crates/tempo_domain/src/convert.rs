use thiserror::Error;

use crate::item::{Item, ItemKind, ItemStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("item is already a {0}")]
    SameType(ItemKind),
    #[error("cannot convert {from} to {to}")]
    UnsupportedTransition { from: ItemKind, to: ItemKind },
}

/// Directed conversion table; pairs not listed are rejected.
pub fn allowed_targets(kind: ItemKind) -> &'static [ItemKind] {
    match kind {
        ItemKind::Todo => &[ItemKind::Habit, ItemKind::Event, ItemKind::RecurringEvent],
        ItemKind::Event => &[ItemKind::Habit, ItemKind::RecurringEvent],
        ItemKind::RecurringEvent => &[ItemKind::Habit, ItemKind::Todo],
        ItemKind::Habit => &[ItemKind::Todo, ItemKind::RecurringEvent],
    }
}

/// Re-types an item, reconciling its fields to the target type's invariants.
/// Completion history is left untouched.
pub fn convert_item(item: &Item, target: ItemKind) -> Result<Item, ConvertError> {
    if item.kind == target {
        return Err(ConvertError::SameType(target));
    }
    if !allowed_targets(item.kind).contains(&target) {
        return Err(ConvertError::UnsupportedTransition {
            from: item.kind,
            to: target,
        });
    }

    let mut converted = item.clone();
    converted.kind = target;
    converted.status = ItemStatus::Active;
    converted.completed_at = None;
    match target {
        ItemKind::Habit => ensure_rule(&mut converted, "daily"),
        ItemKind::RecurringEvent => ensure_rule(&mut converted, "sunday"),
        ItemKind::Todo => {
            converted.recurrence_rule = None;
            converted.scheduled_date = None;
            converted.scheduled_time = None;
        }
        ItemKind::Event => {
            converted.recurrence_rule = None;
        }
    }
    Ok(converted)
}

fn ensure_rule(item: &mut Item, default: &str) {
    let blank = item
        .recurrence_rule
        .as_deref()
        .map_or(true, |rule| rule.trim().is_empty());
    if blank {
        item.recurrence_rule = Some(default.to_string());
    }
}
