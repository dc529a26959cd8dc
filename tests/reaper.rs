mod common;

use common::{WriteStep, session};
use duplex::{ReaperBuilder, SweepReport, Transport};

use std::time::Duration;

const KEEP_ALIVE_MS: u64 = 10_000;

fn reaper() -> duplex::Reaper {
    ReaperBuilder::new()
        .keep_alive(Duration::from_millis(KEEP_ALIVE_MS))
        .build()
}

#[test]
fn test_builder_defaults_to_sixty_seconds() {
    let reaper = ReaperBuilder::default().build();

    assert_eq!(reaper.keep_alive_ms(), 60_000);
}

#[test]
#[should_panic(expected = "keep_alive must be > 0")]
fn test_builder_rejects_zero_keep_alive() {
    let _ = ReaperBuilder::new().keep_alive(Duration::ZERO);
}

#[test]
fn test_sweep_keeps_fresh_sessions() {
    let (_selector, fresh) = session();
    let now = fresh.last_access_time();

    let report = reaper().sweep([&fresh], now);

    assert_eq!(
        report,
        SweepReport {
            active: 1,
            idle: 0,
            stale: 0
        }
    );
    assert!(fresh.transport().is_open());
}

#[test]
fn test_sweep_closes_idle_and_spares_draining() {
    let (_s1, idle) = session();
    let (_s2, draining) = session();
    draining.transport().script_writes([WriteStep::Accept(0)]);
    draining.write(b"pending").expect("write failed");

    let base = idle.last_access_time().max(draining.last_access_time());
    let report = reaper().sweep([&idle, &draining], base + 2 * KEEP_ALIVE_MS);

    assert_eq!(
        report,
        SweepReport {
            active: 1,
            idle: 1,
            stale: 0
        }
    );
    assert!(!idle.transport().is_open());
    assert!(draining.transport().is_open());
}

#[test]
fn test_sweep_closes_stale_sessions() {
    let (_selector, stuck) = session();
    stuck.transport().script_writes([WriteStep::Accept(0)]);
    stuck.write(b"pending").expect("write failed");

    let now = stuck.last_access_time() + 8 * KEEP_ALIVE_MS;
    let report = reaper().sweep([&stuck], now);

    assert_eq!(report.stale, 1);
    assert!(!stuck.transport().is_open());
    assert_eq!(stuck.queue_stats().bytes, 0);
}

#[test]
fn test_sweep_ignores_closed_sessions() {
    let (_selector, closed) = session();
    closed.close();

    let now = closed.last_access_time() + 2 * KEEP_ALIVE_MS;
    let report = reaper().sweep([&closed], now);

    assert_eq!(report, SweepReport::default());
}
