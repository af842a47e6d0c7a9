//! Property-based tests for the durable audit log.
//!
//! These tests use proptest to generate append sequences and arbitrary
//! device images and verify that the log invariants hold for all of them.

use chrono::{NaiveDate, NaiveDateTime};
use doorlock_core::{Timestamp, User, constants::LOG_FOOTPRINT};
use doorlock_hardware::mock::MemoryStorage;
use doorlock_storage::{AuditLog, LogRecord};
use proptest::prelude::*;

/// Strategy for generating user labels as the controller writes them.
fn user_label() -> impl Strategy<Value = &'static str> {
    prop::sample::select(User::ALL.map(|u| u.label()).to_vec())
}

/// Strategy for generating device timestamps between 2000 and 2099.
fn device_timestamp() -> impl Strategy<Value = Timestamp> {
    (2000i32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, mo, d, h, mi, s)| {
            let dt: NaiveDateTime = NaiveDate::from_ymd_opt(y, mo, d)
                .and_then(|date| date.and_hms_opt(h, mi, s))
                .expect("components are in range");
            Timestamp::from_datetime(dt)
        },
    )
}

fn entries(max: usize) -> impl Strategy<Value = Vec<(&'static str, Timestamp)>> {
    prop::collection::vec((user_label(), device_timestamp()), 0..max)
}

fn fresh_log() -> AuditLog<MemoryStorage> {
    AuditLog::load(MemoryStorage::new(LOG_FOOTPRINT)).expect("device is large enough")
}

proptest! {
    /// Property: after any number of appends, the log lists exactly the last
    /// (up to) ten of them, most recent first.
    #[test]
    fn prop_keeps_last_ten_newest_first(appended in entries(40)) {
        let mut log = fresh_log();
        for (label, at) in &appended {
            log.append(label, *at).unwrap();
        }

        let expected: Vec<LogRecord> = appended
            .iter()
            .rev()
            .take(10)
            .map(|(label, at)| LogRecord::new(label, *at))
            .collect();
        let listed: Vec<LogRecord> = log.list_recent().cloned().collect();

        prop_assert_eq!(listed, expected);
        prop_assert_eq!(log.cursor(), appended.len() % 10);
    }

    /// Property: reloading from the same bytes reproduces every slot and
    /// the cursor.
    #[test]
    fn prop_restart_round_trip(appended in entries(25)) {
        let mut log = fresh_log();
        for (label, at) in &appended {
            log.append(label, *at).unwrap();
        }
        let before: Vec<Option<LogRecord>> = (0..10).map(|i| log.slot(i).cloned()).collect();
        let cursor = log.cursor();

        let reloaded = AuditLog::load(log.into_inner()).unwrap();
        let after: Vec<Option<LogRecord>> = (0..10).map(|i| reloaded.slot(i).cloned()).collect();

        prop_assert_eq!(after, before);
        prop_assert_eq!(reloaded.cursor(), cursor);
    }

    /// Property: clearing then reloading always yields the empty log.
    #[test]
    fn prop_clear_then_load_is_empty(appended in entries(15)) {
        let mut log = fresh_log();
        for (label, at) in &appended {
            log.append(label, *at).unwrap();
        }
        log.clear_all().unwrap();

        let reloaded = AuditLog::load(log.into_inner()).unwrap();
        prop_assert!(reloaded.is_empty());
        prop_assert_eq!(reloaded.cursor(), 0);
    }

    /// Property: any device content loads without panicking, yields a cursor
    /// in range, and accepts appends afterwards.
    #[test]
    fn prop_arbitrary_bytes_load(image in prop::collection::vec(any::<u8>(), LOG_FOOTPRINT)) {
        let mut log = AuditLog::load(MemoryStorage::from_bytes(image)).unwrap();
        prop_assert!(log.cursor() < 10);
        prop_assert!(log.list_recent().count() <= 10);

        let at = Timestamp::parse("2024/01/01 00:00:00").unwrap();
        log.append("Admin", at).unwrap();
        prop_assert_eq!(
            log.list_recent().next().map(LogRecord::label),
            Some("Admin")
        );
    }
}
