use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use consigliere_core::deck::{DeckFilter, Priority, SequentialIds, TaskDeck, TaskPatch, UuidIds};
use consigliere_core::mode::{Mode, mode_flag};
use consigliere_core::store::{BOOKS_KEY, KeyValueStore, NOTES_KEY, SessionStore, TASKS_KEY};
use consigliere_core::ticker::ManualTicker;
use consigliere_core::timer::{TickOutcome, Timer, TimerDurations, TimerState};
use consigliere_core::widgets::books::{Books, EntryKind};
use consigliere_core::widgets::incinerator::{Incinerator, Press};
use consigliere_core::widgets::notes::Notepad;
use parking_lot::Mutex;
use tempfile::tempdir;

#[test]
fn deck_round_trips_through_session_store() {
    let temp = tempdir().expect("tempdir");
    let store = SessionStore::open(temp.path()).expect("open store");

    let mut deck = TaskDeck::mount_with_ids(&store, SequentialIds::default());
    let first = deck
        .create("Meet the Tattaglias", "", None, Priority::Low)
        .expect("create")
        .expect("id");
    let second = deck
        .create("Acquire the asset", "quietly", Some("2026-11-01"), Priority::High)
        .expect("create")
        .expect("id");
    let third = deck
        .create("Burn the letters", "", None, Priority::Medium)
        .expect("create")
        .expect("id");
    deck.update(
        &first,
        TaskPatch {
            description: Some("bring Luca".to_string()),
            ..TaskPatch::default()
        },
    )
    .expect("update");
    assert_eq!(deck.toggle_complete(&second).expect("toggle"), Some(true));
    assert!(deck.delete(&third).expect("delete"));

    let remounted = TaskDeck::mount_with_ids(&store, SequentialIds::starting_at(4));
    assert_eq!(remounted.tasks(), deck.tasks());
    let ids: Vec<&str> = remounted.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    assert!(remounted.get(&second).is_some_and(|t| t.completed));
    assert_eq!(
        remounted.get(&first).map(|t| t.description.as_str()),
        Some("bring Luca")
    );

    let raw = store.load_raw(TASKS_KEY).expect("load").expect("stored");
    assert!(raw.contains("\"dueDate\":\"2026-11-01\""));
}

#[test]
fn ending_the_session_drops_every_dataset() {
    let temp = tempdir().expect("tempdir");
    let store = SessionStore::open(temp.path()).expect("open store");

    TaskDeck::mount(&store)
        .create("Meet the Tattaglias", "", None, Priority::Low)
        .expect("create");
    Notepad::mount(&store)
        .write("Luca sleeps with the fishes")
        .expect("write");
    Books::mount(&store, UuidIds)
        .add(EntryKind::Collection, "1500", "Protection", today())
        .expect("add");

    store.clear().expect("clear");

    assert!(TaskDeck::mount(&store).tasks().is_empty());
    assert_eq!(Notepad::mount(&store).text(), "");
    assert!(Books::mount(&store, UuidIds).entries().is_empty());
    for key in [TASKS_KEY, NOTES_KEY, BOOKS_KEY] {
        assert_eq!(store.load_raw(key).expect("load"), None);
    }

    TaskDeck::mount(&store)
        .create("Fresh start", "", None, Priority::High)
        .expect("create after clear");
    assert_eq!(TaskDeck::mount(&store).len(), 1);
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("date")
}

#[test]
fn completing_moves_a_card_to_the_archive() {
    let temp = tempdir().expect("tempdir");
    let store = SessionStore::open(temp.path()).expect("open store");
    let mut deck = TaskDeck::mount(&store);

    deck.create("Old business", "", None, Priority::Medium)
        .expect("create");
    let id = deck
        .create("Acquire the asset", "", None, Priority::High)
        .expect("create")
        .expect("id");

    assert_eq!(deck.filter(DeckFilter::Active)[0].id, id);
    assert_eq!(deck.toggle_complete(&id).expect("toggle"), Some(true));

    let active = deck.filter(DeckFilter::Active);
    let archive = deck.filter(DeckFilter::Archive);
    assert!(active.iter().all(|t| t.id != id));
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].id, id);
    assert_eq!(active.len() + archive.len(), deck.len());
}

#[test]
fn malformed_storage_mounts_empty() {
    let temp = tempdir().expect("tempdir");
    let store = SessionStore::open(temp.path()).expect("open store");
    fs::write(store.session_dir.join("mafia-operations.data"), "{not json")
        .expect("write garbage");

    let mut deck = TaskDeck::mount(&store);
    assert!(deck.is_empty());

    deck.create("Start over", "", None, Priority::Low)
        .expect("create");
    assert_eq!(TaskDeck::mount(&store).len(), 1);
}

#[test]
fn incinerator_wipes_deck_and_notes_on_confirm() {
    let temp = tempdir().expect("tempdir");
    let store = SessionStore::open(temp.path()).expect("open store");

    TaskDeck::mount(&store)
        .create("Burn after reading", "", None, Priority::High)
        .expect("create");
    Notepad::mount(&store).write("the ledger").expect("write");

    let mut burner = Incinerator::new(Duration::from_secs(3));
    let now = Instant::now();
    assert_eq!(burner.press(&store, now).expect("arm"), Press::Armed);
    assert_eq!(
        burner
            .press(&store, now + Duration::from_millis(500))
            .expect("burn"),
        Press::Burned
    );

    assert!(TaskDeck::mount(&store).is_empty());
    assert_eq!(Notepad::mount(&store).text(), "");
    assert_eq!(store.load_raw(NOTES_KEY).expect("load"), None);
}

#[test]
fn focus_session_runs_out_then_relax_begins() {
    let (switch, view) = mode_flag(Mode::Focus);
    let heard = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&heard);
    view.subscribe(move |mode| sink.lock().push(mode));

    let durations = TimerDurations {
        focus_secs: 3,
        relax_secs: 2,
    };
    let mut timer = Timer::new(switch, durations, ManualTicker::new());

    assert!(timer.start());
    assert_eq!(timer.tick(), TickOutcome::Counted { remaining_seconds: 2 });
    assert_eq!(timer.tick(), TickOutcome::Counted { remaining_seconds: 1 });
    assert_eq!(timer.tick(), TickOutcome::Expired);
    assert_eq!(timer.state(), TimerState::UnlockedIdle);
    assert_eq!(timer.remaining_seconds(), 0);
    assert!(!timer.start());
    assert_eq!(timer.scheduler().live_handles(), 0);

    assert_eq!(timer.confirm_switch(), Some(Mode::Relax));
    assert_eq!(view.get(), Mode::Relax);
    assert_eq!(*heard.lock(), vec![Mode::Relax]);
    assert_eq!(timer.state(), TimerState::LockedIdle);
    assert_eq!(timer.remaining_seconds(), 2);
}
