use std::time::Duration;

use loadsplit_system_scheduler::{Clock, ManualClock, Scheduler, SimulationSpeed};

fn speed(log: f64) -> SimulationSpeed {
    SimulationSpeed::from_log(log).expect("valid speed")
}

#[test]
fn executes_whole_owed_ticks_and_carries_remainder() {
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::new(speed(0.0), clock.now());
    let mut ticks = 0;

    clock.advance(Duration::from_millis(1_000));
    let report = scheduler.frame(&clock, || ticks += 1);
    assert_eq!(report.ticks_executed, 2);
    assert!(!report.budget_exceeded);
    assert!((scheduler.debt() - 0.5).abs() < 1e-9);

    clock.advance(Duration::from_millis(400));
    let report = scheduler.frame(&clock, || ticks += 1);
    assert_eq!(report.ticks_executed, 1);
    assert_eq!(ticks, 3);
    assert!(report.should_render());
}

#[test]
fn frame_without_owed_ticks_skips_rendering() {
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::new(speed(0.0), clock.now());
    clock.advance(Duration::from_millis(100));
    let report = scheduler.frame(&clock, || panic!("no tick is owed"));
    assert_eq!(report.ticks_executed, 0);
    assert!(!report.should_render());
}

#[test]
fn paused_scheduler_never_replays_missed_ticks() {
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::new(speed(1.0), clock.now());

    scheduler.set_running(false, clock.now());
    clock.advance(Duration::from_secs(10));
    let report = scheduler.frame(&clock, || panic!("paused scheduler ticked"));
    assert_eq!(report.ticks_executed, 0);

    clock.advance(Duration::from_secs(10));
    scheduler.set_running(true, clock.now());
    assert_eq!(scheduler.debt(), 0.0);

    let report = scheduler.frame(&clock, || panic!("resume replayed paused time"));
    assert_eq!(report.ticks_executed, 0);

    let mut ticks = 0;
    clock.advance(Duration::from_millis(100));
    let report = scheduler.frame(&clock, || ticks += 1);
    assert_eq!(report.ticks_executed, 2);
    assert_eq!(ticks, 2);
}

#[test]
fn custom_budget_is_respected() {
    let clock = ManualClock::new();
    let mut scheduler =
        Scheduler::new(speed(3.0), clock.now()).with_budget(Duration::from_millis(5));

    clock.advance(Duration::from_millis(100));
    let report = scheduler.frame(&clock, || clock.advance(Duration::from_millis(1)));
    assert_eq!(report.ticks_executed, 5);
    assert!(report.budget_exceeded);
}
