pub mod agenda;
pub mod backlog;
pub mod classify;
pub mod convert;
pub mod item;
pub mod recurrence;
pub mod stats;

pub use crate::agenda::{compose_agenda, AgendaEntry, AgendaView};
pub use crate::classify::{classify, Category, Classification};
pub use crate::convert::{convert_item, ConvertError};
pub use crate::item::{Item, ItemCompletion, ItemKind, ItemStatus};
pub use crate::recurrence::{rule_matches, RecurrenceRule};
pub use crate::stats::{compute_habit_stats, HabitStats};
