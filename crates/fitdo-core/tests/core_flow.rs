use std::fs;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fitdo_core::cli::Invocation;
use fitdo_core::commands::dispatch_at;
use fitdo_core::config::Config;
use fitdo_core::datastore::{DataStore, FileStorage, STATS_KEY, TODOS_KEY};
use fitdo_core::progress::UserStats;
use fitdo_core::render::Renderer;
use tempfile::tempdir;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn invoke(store: &mut DataStore<FileStorage>, args: &[&str], now: DateTime<Utc>) {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![("rc.timezone".to_string(), "UTC".to_string())]);
    let (command, rest) = args.split_first().expect("command");
    let inv = Invocation {
        command: (*command).to_string(),
        command_args: rest.iter().map(|s| (*s).to_string()).collect(),
    };
    dispatch_at(store, &cfg, &Renderer::plain(), inv, now).expect("dispatch");
}

#[test]
fn datastore_roundtrip_on_disk() {
    let temp = tempdir().expect("tempdir");
    let mut store = DataStore::open(temp.path()).expect("open datastore");

    let (todos, _) = store
        .load_todos()
        .expect("load todos")
        .add("Write training log", 1_760_000_000_000);
    store.save_todos(&todos).expect("save todos");

    let stats = UserStats {
        streak: 2,
        last_completed_date: NaiveDate::from_ymd_opt(2026, 10, 17),
        badges: vec![],
    };
    store.save_stats(&stats).expect("save stats");

    let reopened = DataStore::open(temp.path()).expect("reopen datastore");
    let state = reopened.load_state().expect("load state");
    assert_eq!(state.todos, todos);
    assert_eq!(state.stats, stats);

    let raw_stats =
        fs::read_to_string(temp.path().join(format!("{STATS_KEY}.json"))).expect("stats file");
    assert_eq!(
        raw_stats,
        r#"{"streak":2,"lastCompletedDate":"2026-10-17","badges":[]}"#
    );
    assert!(temp.path().join(format!("{TODOS_KEY}.json")).exists());
}

#[test]
fn corrupted_file_surfaces_error() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join(format!("{TODOS_KEY}.json")), "[{\"id\":").expect("write junk");

    let store = DataStore::open(temp.path()).expect("open datastore");
    assert!(store.load_todos().is_err());

    fs::write(temp.path().join(format!("{STATS_KEY}.json")), "").expect("truncate stats");
    assert!(store.load_stats().is_err());
}

#[test]
fn streak_builds_across_days() {
    let temp = tempdir().expect("tempdir");
    let mut store = DataStore::open(temp.path()).expect("open datastore");

    invoke(&mut store, &["add", "  "], at(16, 8));
    assert!(store.load_todos().expect("load todos").is_empty());

    invoke(&mut store, &["add", "Morning", "run"], at(16, 8));
    invoke(&mut store, &["add", "Stretch"], at(16, 8));
    let todos = store.load_todos().expect("load todos");
    assert_eq!(todos.len(), 2);
    assert_eq!(todos.items()[0].text, "Morning run");
    assert_ne!(todos.items()[0].id, todos.items()[1].id);

    // day one: both done
    invoke(&mut store, &["toggle", "1", "2"], at(16, 20));
    let stats = store.load_stats().expect("load stats");
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.last_completed_date, NaiveDate::from_ymd_opt(2026, 10, 16));

    // same day again: no double count
    invoke(&mut store, &["toggle", "2"], at(16, 21));
    invoke(&mut store, &["toggle", "2"], at(16, 22));
    assert_eq!(store.load_stats().expect("load stats").streak, 1);

    // next day: reset checkmarks, then finish everything
    invoke(&mut store, &["toggle", "1", "2"], at(17, 7));
    invoke(&mut store, &["toggle", "1", "2"], at(17, 19));
    assert_eq!(store.load_stats().expect("load stats").streak, 2);

    // skip the 18th; the 19th starts over
    invoke(&mut store, &["toggle", "1", "2"], at(19, 7));
    invoke(&mut store, &["toggle", "1", "2"], at(19, 19));
    let stats = store.load_stats().expect("load stats");
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.last_completed_date, NaiveDate::from_ymd_opt(2026, 10, 19));

    invoke(&mut store, &["delete", "1"], at(19, 20));
    let todos = store.load_todos().expect("load todos");
    assert_eq!(todos.len(), 1);
    assert_eq!(todos.items()[0].text, "Stretch");

    invoke(&mut store, &["delete", "42"], at(19, 20));
    assert_eq!(store.load_todos().expect("load todos").len(), 1);
}

#[test]
fn seventh_day_earns_first_badge() {
    let temp = tempdir().expect("tempdir");
    let mut store = DataStore::open(temp.path()).expect("open datastore");
    store
        .save_stats(&UserStats {
            streak: 6,
            last_completed_date: NaiveDate::from_ymd_opt(2026, 10, 17),
            badges: vec![],
        })
        .expect("seed stats");

    invoke(&mut store, &["add", "Deadlifts"], at(18, 6));
    invoke(&mut store, &["toggle", "1"], at(18, 18));

    let stats = store.load_stats().expect("load stats");
    assert_eq!(stats.streak, 7);
    assert_eq!(stats.badges, vec!["🥉 1 Week".to_string()]);

    invoke(&mut store, &["list"], at(18, 19));
    invoke(&mut store, &["stats"], at(18, 19));
}
