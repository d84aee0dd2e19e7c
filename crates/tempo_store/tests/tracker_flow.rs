use std::fs;

use chrono::{NaiveDate, NaiveTime};
use tempfile::tempdir;

use tempo_domain::item::ItemKind;
use tempo_store::{ItemDraft, TrackerStore};

fn seeded_snapshot() -> String {
    serde_json::json!({
        "items": [
            {
                "id": 1,
                "user_id": "demo",
                "title": "Return library books",
                "type": "todo",
                "scheduled_date": null,
                "scheduled_time": null,
                "recurrence_rule": null,
                "flexible": false,
                "deadline_date": null,
                "status": "active",
                "created_at": "2024-05-01T09:00:00Z",
                "completed_at": null
            },
            {
                "id": 2,
                "user_id": "demo",
                "title": "Morning pages",
                "type": "habit",
                "scheduled_date": null,
                "scheduled_time": null,
                "recurrence_rule": "daily",
                "flexible": false,
                "deadline_date": null,
                "status": "active",
                "created_at": "2024-06-01T06:00:00Z",
                "completed_at": null
            }
        ],
        "completions": [
            {
                "id": 1,
                "item_id": 2,
                "date": "2024-06-09",
                "completed_at": "2024-06-09T07:30:00Z",
                "notes": null
            }
        ]
    })
    .to_string()
}

#[test]
fn snapshot_load_mutate_and_reload_round_trip() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("data");
    fs::create_dir_all(&root).expect("create data root");
    fs::write(root.join("demo.json"), seeded_snapshot()).expect("write fixture");

    let store = TrackerStore::builder()
        .with_data_root(&root)
        .build()
        .expect("build store");
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date");

    // The month-old todo is suggested; the habit sits on today's agenda,
    // not yet done.
    let view = store.today_view("demo", today);
    assert_eq!(view.suggestions.len(), 1);
    assert_eq!(view.suggestions[0].title, "Return library books");
    assert_eq!(view.agenda.recurring.len(), 1);
    assert!(!view.agenda.recurring[0].completed_today);

    // Completing today extends the streak started in the seeded log.
    store
        .toggle_completion("demo", 2, today, None)
        .expect("toggle habit");
    let stats = store.habit_stats("demo", 2, today).expect("stats");
    assert_eq!(stats.streak, 2);
    let view = store.today_view("demo", today);
    assert!(view.agenda.recurring[0].completed_today);

    // New items get ids above the seeded ones.
    let dinner = store
        .create_item(
            "demo",
            ItemDraft {
                title: "Team dinner".into(),
                kind: ItemKind::Event,
                scheduled_date: Some(today),
                scheduled_time: NaiveTime::from_hms_opt(19, 0, 0),
                ..ItemDraft::default()
            },
        )
        .expect("create event");
    assert!(dinner.id > 2);

    // Converting the stale todo into a habit picks up the default rule.
    let converted = store
        .convert_item("demo", 1, ItemKind::Habit)
        .expect("convert todo");
    assert_eq!(converted.kind, ItemKind::Habit);
    assert_eq!(converted.recurrence_rule.as_deref(), Some("daily"));

    // Everything above survives a fresh load from the data root.
    drop(store);
    let reloaded = TrackerStore::builder()
        .with_data_root(&root)
        .build()
        .expect("rebuild store");

    assert_eq!(reloaded.items("demo").len(), 3);
    let habits = reloaded.habits("demo");
    assert_eq!(habits.len(), 2);
    let pages = habits
        .iter()
        .find(|h| h.item.title == "Morning pages")
        .expect("seeded habit present");
    assert_eq!(pages.completions.len(), 2);

    let view = reloaded.today_view("demo", today);
    assert_eq!(view.agenda.scheduled.len(), 1);
    assert_eq!(view.agenda.scheduled[0].item.title, "Team dinner");
    assert_eq!(view.agenda.recurring.len(), 2);
    assert!(
        view.suggestions.is_empty(),
        "converted todo left the backlog"
    );
}
