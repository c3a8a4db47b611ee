mod common;

use common::{amt, mat, Rig, RESET_DELAY_MS};
use hs_core::{EventId, HsError, MsgActState, ResetCounters, Severity};
use hs_engine::app_mon::{AppMonitor, SlotState};

// AMT action codes
const RESET: u16 = 1;
const RESTART: u16 = 2;
const EVENT_ONLY: u16 = 3;
const MSG_ACT_0: u16 = 4;

fn armed(rig: &mut Rig, table: &[hs_core::AppMonEntry]) -> AppMonitor {
    let mut monitor = AppMonitor::new(true);
    monitor.refresh(table);
    // A fresh monitor has no baseline: its first read is a check-in.
    monitor.scan(table, &mut rig.cx());
    monitor
}

#[test]
fn test_countdown_expires_and_fires_once() {
    let mut rig = Rig::new();
    rig.apps.add("SCH", 100);
    let table = [amt("SCH", 3, EVENT_ONLY)];
    let mut monitor = armed(&mut rig, &table);

    assert_eq!(monitor.countdown(0), 3);
    assert!(monitor.is_slot_enabled(0));

    let mut seen = Vec::new();
    for _ in 0..3 {
        monitor.scan(&table, &mut rig.cx());
        seen.push(monitor.countdown(0));
    }
    assert_eq!(seen, vec![2, 1, 0]);
    assert_eq!(monitor.state(0), SlotState::Expired);
    assert!(!monitor.is_slot_enabled(0));
    assert_eq!(rig.sink.count(EventId::AppMonFail), 1);

    // Expired is terminal: nothing more happens until a refresh.
    for _ in 0..5 {
        monitor.scan(&table, &mut rig.cx());
    }
    assert_eq!(monitor.countdown(0), 0);
    assert_eq!(rig.sink.count(EventId::AppMonFail), 1);

    monitor.refresh(&table);
    assert_eq!(monitor.countdown(0), 3);
    assert!(monitor.is_slot_enabled(0));
}

#[test]
fn test_refresh_keeps_the_counter_baseline() {
    let mut rig = Rig::new();
    rig.apps.add("SCH", 100);
    let table = [amt("SCH", 3, EVENT_ONLY)];
    let mut monitor = armed(&mut rig, &table);

    // Counter stays at 100 through the refresh and every scan after it.
    monitor.refresh(&table);
    let mut seen = Vec::new();
    for _ in 0..3 {
        monitor.scan(&table, &mut rig.cx());
        seen.push(monitor.countdown(0));
    }

    assert_eq!(seen, vec![2, 1, 0]);
    assert_eq!(rig.sink.count(EventId::AppMonFail), 1);
}

#[test]
fn test_reload_forgets_baseline_of_replaced_app() {
    let mut rig = Rig::new();
    rig.apps.add("OLD", 4);
    rig.apps.add("NEW", 4);
    rig.apps.add("KEEP", 9);
    let old = [amt("OLD", 3, EVENT_ONLY), amt("KEEP", 3, EVENT_ONLY)];
    let mut monitor = armed(&mut rig, &old);

    let new = [amt("NEW", 3, EVENT_ONLY), amt("KEEP", 3, EVENT_ONLY)];
    monitor.reload(&old, &new);
    monitor.scan(&new, &mut rig.cx());

    // NEW has no baseline yet, so its first read is a check-in.
    assert_eq!(monitor.countdown(0), 3);
    assert_eq!(monitor.countdown(1), 2);
}

#[test]
fn test_countdown_is_monotonic() {
    let mut rig = Rig::new();
    rig.apps.add("TO", 7);
    let table = [amt("TO", 5, EVENT_ONLY)];
    let mut monitor = armed(&mut rig, &table);

    for n in 1..=8u16 {
        monitor.scan(&table, &mut rig.cx());
        assert_eq!(monitor.countdown(0), 5u16.saturating_sub(n));
    }
}

#[test]
fn test_check_in_refreshes_countdown() {
    let mut rig = Rig::new();
    rig.apps.add("CI", 0);
    let table = [amt("CI", 4, EVENT_ONLY)];
    let mut monitor = armed(&mut rig, &table);

    monitor.scan(&table, &mut rig.cx());
    monitor.scan(&table, &mut rig.cx());
    assert_eq!(monitor.countdown(0), 2);

    rig.apps.bump("CI");
    monitor.scan(&table, &mut rig.cx());
    assert_eq!(monitor.countdown(0), 4);
    assert!(rig.sink.0.borrow().is_empty());
}

#[test]
fn test_missing_app_reported_loudly_once() {
    let mut rig = Rig::new();
    let table = [amt("GHOST", 4, EVENT_ONLY)];
    let mut monitor = AppMonitor::new(true);
    monitor.refresh(&table);

    for _ in 0..4 {
        monitor.scan(&table, &mut rig.cx());
    }
    let misses = rig.sink.with_id(EventId::AppMonResolveFail);
    let severities: Vec<_> = misses.iter().map(|n| n.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Error, Severity::Debug, Severity::Debug, Severity::Debug]
    );
    assert!(misses[0].text.contains("GHOST"));
    assert_eq!(rig.sink.count(EventId::AppMonFail), 1);

    // Expired slots are not looked up any more.
    monitor.scan(&table, &mut rig.cx());
    assert_eq!(rig.sink.count(EventId::AppMonResolveFail), 4);
}

#[test]
fn test_counter_read_failure_is_not_a_check_in() {
    let mut rig = Rig::new();
    rig.apps.add("SC", 1);
    let table = [amt("SC", 3, EVENT_ONLY)];
    let mut monitor = armed(&mut rig, &table);

    rig.apps.0.borrow_mut().counter_fails = true;
    rig.apps.bump("SC");
    monitor.scan(&table, &mut rig.cx());
    assert_eq!(monitor.countdown(0), 2);
    assert_eq!(rig.sink.count(EventId::AppMonResolveFail), 0);
}

#[test]
fn test_restart_action() {
    let mut rig = Rig::new();
    rig.apps.add("CI", 9);
    let table = [amt("CI", 2, RESTART)];
    let mut monitor = armed(&mut rig, &table);

    monitor.scan(&table, &mut rig.cx());
    monitor.scan(&table, &mut rig.cx());

    assert_eq!(rig.apps.0.borrow().restarted, vec!["CI".to_string()]);
    assert_eq!(rig.sink.count(EventId::AppMonFail), 1);
    assert_eq!(rig.sink.count(EventId::AppMonRestartFail), 0);
}

#[test]
fn test_restart_failure_cites_status() {
    let mut rig = Rig::new();
    rig.apps.add("CI", 9);
    rig.apps.0.borrow_mut().restart_error = Some(HsError::OsStatus(-5));
    let table = [amt("CI", 1, RESTART)];
    let mut monitor = armed(&mut rig, &table);

    monitor.scan(&table, &mut rig.cx());

    let failures = rig.sink.with_id(EventId::AppMonRestartFail);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].text.contains("OsStatus(-5)"));
}

#[test]
fn test_restart_of_unresolved_app_fails() {
    let mut rig = Rig::new();
    let table = [amt("GONE", 1, RESTART)];
    let mut monitor = AppMonitor::new(true);
    monitor.refresh(&table);

    monitor.scan(&table, &mut rig.cx());

    assert_eq!(
        rig.sink.ids(),
        vec![EventId::AppMonResolveFail, EventId::AppMonFail, EventId::AppMonRestartFail]
    );
    assert!(rig.apps.0.borrow().restarted.is_empty());
}

#[test]
fn test_processor_reset_action() {
    let mut rig = Rig::new();
    let table = [amt("SCH", 1, RESET)];
    let mut monitor = AppMonitor::new(true);
    monitor.refresh(&table);

    monitor.scan(&table, &mut rig.cx());

    assert_eq!(rig.processor.resets(), 1);
    let processor = rig.processor.0.borrow();
    assert_eq!(processor.delays, vec![RESET_DELAY_MS]);
    assert!(processor.watchdog_disabled);
    assert_eq!(rig.storage.stored(), Some(ResetCounters::new(1, 3)));
    assert_eq!(rig.governor.resets_performed(), 1);
}

#[test]
fn test_processor_reset_limit() {
    let mut rig = Rig::with_storage(common::MockStorage::holding(ResetCounters::new(3, 3)));
    let table = [amt("SCH", 1, RESET)];
    let mut monitor = AppMonitor::new(true);
    monitor.refresh(&table);

    monitor.scan(&table, &mut rig.cx());

    assert_eq!(rig.processor.resets(), 0);
    assert_eq!(rig.sink.count(EventId::AppMonFail), 1);
    assert_eq!(rig.sink.count(EventId::ResetLimit), 1);
    assert_eq!(rig.storage.writes(), 0);
}

#[test]
fn test_message_action() {
    let mut rig = Rig::new();
    rig.msg_table = vec![mat(MsgActState::Enabled, 10, &[0x18, 0x99, 0xC0, 0x00])];
    rig.apps.add("LC", 1);
    let table = [amt("LC", 1, MSG_ACT_0)];
    let mut monitor = armed(&mut rig, &table);

    monitor.scan(&table, &mut rig.cx());

    assert_eq!(rig.bus.0.borrow().sent, vec![vec![0x18, 0x99, 0xC0, 0x00]]);
    assert_eq!(rig.msg_actions.executed(), 1);
    let notes = rig.sink.with_id(EventId::AppMonMsgAction);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].text.contains("LC"));
}

#[test]
fn test_invalid_action_expires_silently() {
    let mut rig = Rig::new();
    rig.apps.add("BAD", 1);
    let table = [amt("BAD", 1, 400)];
    let mut monitor = armed(&mut rig, &table);

    monitor.scan(&table, &mut rig.cx());

    assert_eq!(monitor.state(0), SlotState::Expired);
    assert!(!monitor.is_slot_enabled(0));
    assert!(rig.sink.0.borrow().is_empty());
    assert_eq!(rig.bus.sent(), 0);
}

#[test]
fn test_inert_slots_never_move() {
    let mut rig = Rig::new();
    let table = [amt("ZERO", 0, EVENT_ONLY), amt("NOACT", 5, 0)];
    let mut monitor = AppMonitor::new(true);
    monitor.refresh(&table);

    for _ in 0..3 {
        monitor.scan(&table, &mut rig.cx());
    }
    assert_eq!(monitor.countdown(0), 0);
    assert_eq!(monitor.countdown(1), 0);
    assert_eq!(monitor.enable_bits()[0], 0);
    assert!(rig.sink.0.borrow().is_empty());
}

#[test]
fn test_one_bad_slot_does_not_stop_the_sweep() {
    let mut rig = Rig::new();
    rig.apps.add("B", 1);
    let table = [amt("A", 1, RESTART), amt("B", 2, EVENT_ONLY)];
    let mut monitor = AppMonitor::new(true);
    monitor.refresh(&table);

    monitor.scan(&table, &mut rig.cx());

    assert_eq!(monitor.state(0), SlotState::Expired);
    assert_eq!(monitor.countdown(1), 2);
}
