use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use walkdir::WalkDir;

use tempo_domain::{
    agenda::{compose_agenda, AgendaView},
    backlog::{is_backlog, rank_backlog},
    convert,
    item::{Item, ItemCompletion, ItemKind, ItemStatus},
    stats::{compute_habit_stats, HabitStats},
};

/// New-item payload accepted at the storage boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub recurrence_rule: Option<String>,
    pub flexible: bool,
    pub deadline_date: Option<NaiveDate>,
}

/// Partial update; inner `Option`s distinguish "clear" from "leave alone".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub scheduled_date: Option<Option<NaiveDate>>,
    pub scheduled_time: Option<Option<NaiveTime>>,
    pub recurrence_rule: Option<Option<String>>,
    pub flexible: Option<bool>,
    pub deadline_date: Option<Option<NaiveDate>>,
    pub status: Option<ItemStatus>,
}

/// An item joined with its completion log, the shape recurring-item reads
/// return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedItem {
    pub item: Item,
    pub completions: Vec<ItemCompletion>,
}

/// Everything the dashboard needs for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayView {
    pub agenda: AgendaView,
    pub suggestions: Vec<Item>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserRecords {
    items: Vec<Item>,
    completions: Vec<ItemCompletion>,
}

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<String, UserRecords>,
    next_item_id: i64,
    next_completion_id: i64,
}

/// In-memory item/completion store with optional JSON-file persistence, one
/// snapshot file per user under the data root. Every mutation is a single
/// read-modify-write under the write lock.
pub struct TrackerStore {
    data_root: Option<PathBuf>,
    state: RwLock<StoreState>,
    watcher: Option<RecommendedWatcher>,
}

pub struct TrackerStoreBuilder {
    data_root: Option<PathBuf>,
}

impl TrackerStoreBuilder {
    pub fn new() -> Self {
        Self { data_root: None }
    }

    pub fn with_data_root(mut self, path: impl AsRef<Path>) -> Self {
        self.data_root = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<TrackerStore> {
        let mut state = StoreState {
            next_item_id: 1,
            next_completion_id: 1,
            ..StoreState::default()
        };
        if let Some(root) = &self.data_root {
            fs::create_dir_all(root)
                .with_context(|| format!("creating data root {}", root.display()))?;
            load_snapshots(root, &mut state)?;
        }
        Ok(TrackerStore {
            data_root: self.data_root,
            state: RwLock::new(state),
            watcher: None,
        })
    }
}

impl Default for TrackerStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerStore {
    pub fn builder() -> TrackerStoreBuilder {
        TrackerStoreBuilder::new()
    }

    #[instrument(skip(self, draft))]
    pub fn create_item(&self, user_id: &str, draft: ItemDraft) -> Result<Item> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(anyhow!("item title must not be empty"));
        }

        let mut guard = self.state.write();
        let state = &mut *guard;
        let id = state.next_item_id;
        state.next_item_id += 1;

        // Habits always carry a rule; "daily" is the creation default.
        let recurrence_rule = match draft.kind {
            ItemKind::Habit => draft
                .recurrence_rule
                .filter(|rule| !rule.trim().is_empty())
                .or_else(|| Some("daily".to_string())),
            _ => draft.recurrence_rule,
        };

        let item = Item {
            id,
            user_id: user_id.to_string(),
            title,
            kind: draft.kind,
            scheduled_date: draft.scheduled_date,
            scheduled_time: draft.scheduled_time,
            recurrence_rule,
            flexible: draft.flexible,
            deadline_date: draft.deadline_date,
            status: ItemStatus::Active,
            created_at: Utc::now(),
            completed_at: None,
        };

        let records = state.users.entry(user_id.to_string()).or_default();
        records.items.push(item.clone());
        self.persist_user(user_id, records)?;
        Ok(item)
    }

    pub fn update_item(&self, user_id: &str, id: i64, patch: ItemPatch) -> Result<Item> {
        let mut guard = self.state.write();
        let records = user_records_mut(&mut guard, user_id)?;
        let item = records
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| anyhow!("item {id} not found"))?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(anyhow!("item title must not be empty"));
            }
            item.title = title;
        }
        if let Some(value) = patch.scheduled_date {
            item.scheduled_date = value;
        }
        if let Some(value) = patch.scheduled_time {
            item.scheduled_time = value;
        }
        if let Some(value) = patch.recurrence_rule {
            item.recurrence_rule = value;
        }
        if let Some(value) = patch.flexible {
            item.flexible = value;
        }
        if let Some(value) = patch.deadline_date {
            item.deadline_date = value;
        }
        if let Some(status) = patch.status {
            // Recurring items complete through their completion log, never
            // through status.
            if status == ItemStatus::Completed && item.kind.is_recurring() {
                return Err(anyhow!(
                    "{} {} completes per date, not by status",
                    item.kind,
                    item.id
                ));
            }
            item.status = status;
            item.completed_at = if status == ItemStatus::Completed {
                Some(Utc::now())
            } else {
                None
            };
        }

        let updated = item.clone();
        self.persist_user(user_id, records)?;
        Ok(updated)
    }

    /// Removes an item and, with it, its completion log.
    pub fn delete_item(&self, user_id: &str, id: i64) -> Result<()> {
        let mut guard = self.state.write();
        let records = user_records_mut(&mut guard, user_id)?;
        if !records.items.iter().any(|item| item.id == id) {
            return Err(anyhow!("item {id} not found"));
        }
        records.items.retain(|item| item.id != id);
        records.completions.retain(|c| c.item_id != id);
        self.persist_user(user_id, records)?;
        Ok(())
    }

    /// Deletes the completion row for `(item_id, date)` if present, inserts
    /// it otherwise. Returns the resulting completed state.
    pub fn toggle_completion(
        &self,
        user_id: &str,
        item_id: i64,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<bool> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let next_id = state.next_completion_id;
        let records = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| anyhow!("unknown user `{user_id}`"))?;
        if !records.items.iter().any(|item| item.id == item_id) {
            return Err(anyhow!("item {item_id} not found"));
        }

        let completed = if let Some(pos) = records
            .completions
            .iter()
            .position(|c| c.item_id == item_id && c.date == date)
        {
            records.completions.remove(pos);
            false
        } else {
            records.completions.push(ItemCompletion {
                id: next_id,
                item_id,
                date,
                completed_at: Utc::now(),
                notes,
            });
            state.next_completion_id += 1;
            true
        };
        self.persist_user(user_id, records)?;
        Ok(completed)
    }

    /// Changes an item's type through the domain conversion rules. The
    /// completion log is kept as history.
    #[instrument(skip(self))]
    pub fn convert_item(&self, user_id: &str, id: i64, target: ItemKind) -> Result<Item> {
        let mut guard = self.state.write();
        let records = user_records_mut(&mut guard, user_id)?;
        let pos = records
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| anyhow!("item {id} not found"))?;
        let converted = convert::convert_item(&records.items[pos], target)?;
        records.items[pos] = converted.clone();
        self.persist_user(user_id, records)?;
        Ok(converted)
    }

    pub fn items(&self, user_id: &str) -> Vec<Item> {
        self.with_user(user_id, |records| records.items.clone())
    }

    /// Active habits with their completion logs, newest first.
    pub fn habits(&self, user_id: &str) -> Vec<TrackedItem> {
        self.active_recurring(user_id, ItemKind::Habit)
    }

    /// Active recurring events with their completion logs, newest first.
    pub fn recurring_events(&self, user_id: &str) -> Vec<TrackedItem> {
        self.active_recurring(user_id, ItemKind::RecurringEvent)
    }

    pub fn archived_habits(&self, user_id: &str) -> Vec<Item> {
        self.with_user(user_id, |records| {
            let mut habits: Vec<Item> = records
                .items
                .iter()
                .filter(|item| {
                    item.kind == ItemKind::Habit && item.status == ItemStatus::Archived
                })
                .cloned()
                .collect();
            habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            habits
        })
    }

    pub fn todos(&self, user_id: &str) -> Vec<Item> {
        self.with_user(user_id, |records| {
            let mut todos: Vec<Item> = records
                .items
                .iter()
                .filter(|item| item.kind == ItemKind::Todo)
                .cloned()
                .collect();
            todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            todos
        })
    }

    /// One-off items anchored to `date` that are still open, ordered by time.
    pub fn scheduled_items(&self, user_id: &str, date: NaiveDate) -> Vec<Item> {
        self.with_user(user_id, |records| {
            let mut scheduled: Vec<Item> = records
                .items
                .iter()
                .filter(|item| {
                    !item.kind.is_recurring()
                        && item.scheduled_date == Some(date)
                        && item.status != ItemStatus::Completed
                })
                .cloned()
                .collect();
            scheduled.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));
            scheduled
        })
    }

    /// Undated, un-deadlined open todos, newest first.
    pub fn backlog(&self, user_id: &str) -> Vec<Item> {
        self.with_user(user_id, |records| {
            let mut backlog: Vec<Item> = records
                .items
                .iter()
                .filter(|item| is_backlog(item))
                .cloned()
                .collect();
            backlog.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            backlog
        })
    }

    /// The dashboard composition: today's agenda plus stale-backlog
    /// suggestions.
    pub fn today_view(&self, user_id: &str, today: NaiveDate) -> TodayView {
        self.with_user(user_id, |records| {
            let mut by_item: HashMap<i64, Vec<ItemCompletion>> = HashMap::new();
            for completion in &records.completions {
                by_item
                    .entry(completion.item_id)
                    .or_default()
                    .push(completion.clone());
            }
            TodayView {
                agenda: compose_agenda(&records.items, &by_item, today),
                suggestions: rank_backlog(&records.items, today),
            }
        })
    }

    pub fn habit_stats(&self, user_id: &str, item_id: i64, today: NaiveDate) -> Result<HabitStats> {
        let state = self.state.read();
        let records = state
            .users
            .get(user_id)
            .ok_or_else(|| anyhow!("unknown user `{user_id}`"))?;
        let item = records
            .items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| anyhow!("item {item_id} not found"))?;
        let completions: Vec<ItemCompletion> = records
            .completions
            .iter()
            .filter(|c| c.item_id == item_id)
            .cloned()
            .collect();
        Ok(compute_habit_stats(
            &completions,
            item.recurrence_rule.as_deref(),
            Some(item.created_at),
            today,
        ))
    }

    /// Watches the data root for outside edits, logging change events.
    pub fn watch(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let Some(root) = self.data_root.clone() else {
            return Ok(());
        };
        let mut watcher = notify::recommended_watcher(|res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                tracing::debug!(?event, "data root change detected");
            }
        })?;
        watcher.watch(&root, RecursiveMode::NonRecursive)?;
        self.watcher = Some(watcher);
        Ok(())
    }

    fn active_recurring(&self, user_id: &str, kind: ItemKind) -> Vec<TrackedItem> {
        self.with_user(user_id, |records| {
            let mut tracked: Vec<TrackedItem> = records
                .items
                .iter()
                .filter(|item| item.kind == kind && item.status == ItemStatus::Active)
                .map(|item| TrackedItem {
                    item: item.clone(),
                    completions: records
                        .completions
                        .iter()
                        .filter(|c| c.item_id == item.id)
                        .cloned()
                        .collect(),
                })
                .collect();
            tracked.sort_by(|a, b| b.item.created_at.cmp(&a.item.created_at));
            tracked
        })
    }

    fn with_user<R>(&self, user_id: &str, read: impl FnOnce(&UserRecords) -> R) -> R {
        let state = self.state.read();
        match state.users.get(user_id) {
            Some(records) => read(records),
            None => read(&UserRecords::default()),
        }
    }

    fn persist_user(&self, user_id: &str, records: &UserRecords) -> Result<()> {
        let Some(root) = &self.data_root else {
            return Ok(());
        };
        let path = snapshot_path(root, user_id);
        let payload = serde_json::to_string_pretty(records)?;
        fs::write(&path, payload).with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(user = user_id, path = %path.display(), "persisted tracker snapshot");
        Ok(())
    }
}

fn user_records_mut<'a>(
    state: &'a mut StoreState,
    user_id: &str,
) -> Result<&'a mut UserRecords> {
    state
        .users
        .get_mut(user_id)
        .ok_or_else(|| anyhow!("unknown user `{user_id}`"))
}

fn snapshot_path(root: &Path, user_id: &str) -> PathBuf {
    root.join(format!("{user_id}.json"))
}

fn load_snapshots(root: &Path, state: &mut StoreState) -> Result<()> {
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        let is_snapshot = entry.file_type().is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
        if !is_snapshot {
            continue;
        }
        let user_id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("snapshot file {} has no usable name", path.display()))?
            .to_string();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let records: UserRecords = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;

        for item in &records.items {
            state.next_item_id = state.next_item_id.max(item.id + 1);
        }
        for completion in &records.completions {
            state.next_completion_id = state.next_completion_id.max(completion.id + 1);
        }
        tracing::debug!(user = %user_id, items = records.items.len(), "loaded tracker snapshot");
        state.users.insert(user_id, records);
    }
    Ok(())
}
