//! Dispatch order and timing of the [`Scheduler`] against a simulated clock.
//!
//! To run this test, you need to activate the `critical-section/std` feature.

use coop_sched::fugit::ExtU32;
use coop_sched::{Clock, PostError, Scheduler};
use parking_lot::Mutex;

static NOW: Mutex<u32> = Mutex::new(0);
static LOG: Mutex<Vec<(&'static str, u32)>> = Mutex::new(Vec::new());

// Every test shares the clock and the log
static SERIAL: Mutex<()> = Mutex::new(());

pub struct SimClock;

impl SimClock {
    fn set(now: u32) {
        *NOW.lock() = now;
    }

    fn advance(ticks: u32) {
        let mut now = NOW.lock();
        *now = now.wrapping_add(ticks);
    }
}

impl Clock for SimClock {
    type Ticks = u32;

    const TICK_HZ: u32 = 1_000;

    fn now() -> u32 {
        *NOW.lock()
    }

    fn wait_for_event() {
        Self::advance(1);
    }
}

fn reset() {
    SimClock::set(0);
    LOG.lock().clear();
}

fn record(name: &'static str) {
    let now = SimClock::now();
    LOG.lock().push((name, now));
}

fn log() -> Vec<(&'static str, u32)> {
    LOG.lock().clone()
}

fn times_of(name: &str) -> Vec<u32> {
    log()
        .into_iter()
        .filter(|(n, _)| *n == name)
        .map(|(_, t)| t)
        .collect()
}

fn a() {
    record("a");
}

fn b() {
    record("b");
}

fn c() {
    record("c");
}

#[test]
fn one_shot_runs_once_no_earlier_than_its_delay() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    sched.post_callback(a).delay(300.millis()).unwrap();

    for _ in 0..1_000 {
        sched.dispatch();
        SimClock::advance(1);
    }

    // One tick of reading uncertainty on top of the delay
    assert_eq!(times_of("a"), [301]);
    assert_eq!(sched.pending(), 0);
}

#[test]
fn one_shot_dispatched_late_still_runs_once() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    sched.post_callback(a).delay(300.millis()).unwrap();

    SimClock::set(250);
    assert_eq!(sched.dispatch(), 0);
    SimClock::set(999);
    assert_eq!(sched.dispatch(), 1);
    assert_eq!(sched.dispatch(), 0);

    assert_eq!(times_of("a"), [999]);
}

#[test]
fn periodic_executions_are_at_least_one_period_apart() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    sched.post_callback(a).period(100.millis()).unwrap();

    // Irregular dispatch points, as a busy cooperative loop would produce
    for step in [37, 41, 90, 13, 150, 7, 64, 99, 3, 250, 1, 1, 1, 120].iter().cycle().take(200) {
        SimClock::advance(*step);
        sched.dispatch();
    }

    let times = times_of("a");
    assert!(times.len() > 10);
    assert!(times[0] >= 100);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= 100, "{pair:?}");
    }
}

#[test]
fn periodic_on_time_runs_every_period_and_one_tick() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    sched.post_callback(a).period(500.millis()).unwrap();

    for _ in 0..=2_004 {
        sched.dispatch();
        SimClock::advance(1);
    }

    assert_eq!(times_of("a"), [501, 1002, 1503, 2004]);
    assert_eq!(sched.next_due(), Some(2505));
}

#[test]
fn earliest_due_first_then_registration_order() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    sched.post_callback(b).delay(10.millis()).unwrap();
    sched.post_callback(c).delay(10.millis()).unwrap();
    sched.post_callback(a).delay(5.millis()).unwrap();

    SimClock::set(20);
    assert_eq!(sched.dispatch(), 3);

    assert_eq!(log(), [("a", 20), ("b", 20), ("c", 20)]);
}

#[test]
fn cancelled_callbacks_never_run() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    let periodic = sched.post_callback(a).period(10.millis()).unwrap();
    let once = sched.post_callback(b).delay(10.millis()).unwrap();

    SimClock::set(11);
    assert_eq!(sched.dispatch(), 2);

    // The one-shot already ran, the periodic one is still armed
    assert!(!sched.cancel(once));
    assert!(sched.cancel(periodic));
    assert!(!sched.cancel(periodic));

    SimClock::set(100);
    assert_eq!(sched.dispatch(), 0);
    assert_eq!(log(), [("a", 11), ("b", 11)]);
}

#[test]
fn full_and_zero_period_are_rejected() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 2> = Scheduler::new();
    assert_eq!(
        sched.post_callback(a).period(0.millis()),
        Err(PostError::ZeroPeriod)
    );

    sched.post_callback(a).post().unwrap();
    sched.post_callback(b).delay(1.millis()).unwrap();
    assert_eq!(sched.post_callback(c).post(), Err(PostError::Full));
    assert_eq!(sched.pending(), 2);

    // A slot frees up once the one-shot ran
    sched.dispatch();
    assert!(sched.post_callback(c).post().is_ok());
}

#[test]
fn delays_survive_tick_wraparound() {
    let _serial = SERIAL.lock();
    reset();

    SimClock::set(u32::MAX - 49);

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    sched.post_callback(a).delay(100.millis()).unwrap();

    SimClock::advance(100);
    assert_eq!(sched.dispatch(), 0);
    SimClock::advance(1);
    assert_eq!(sched.dispatch(), 1);

    assert_eq!(times_of("a"), [51]);
}

#[test]
fn durations_beyond_half_the_tick_range_are_rejected() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    assert_eq!(
        sched.post_callback(a).delay(3_000_000_000.millis()),
        Err(PostError::TooLong)
    );
    assert_eq!(
        sched.post_callback(a).period(3_000_000_000.millis()),
        Err(PostError::TooLong)
    );
    assert_eq!(
        sched.post_callback(a).delay((i32::MAX as u32).millis()),
        Err(PostError::TooLong)
    );
    assert_eq!(sched.pending(), 0);

    // The longest accepted delay is still in the future
    let longest = i32::MAX as u32 - 1;
    sched.post_callback(a).delay(longest.millis()).unwrap();
    sched.post_callback(b).period(longest.millis()).unwrap();
    assert_eq!(sched.dispatch(), 0);

    SimClock::set(longest);
    assert_eq!(sched.dispatch(), 0);
    SimClock::advance(1);
    assert_eq!(sched.dispatch(), 2);

    // Re-armed a full period ahead, not run again right away
    assert_eq!(sched.dispatch(), 0);
    assert_eq!(log(), [("a", longest + 1), ("b", longest + 1)]);
}

#[test]
fn cleared_callbacks_never_run() {
    let _serial = SERIAL.lock();
    reset();

    let sched: Scheduler<SimClock, 4> = Scheduler::new();
    sched.post_callback(a).period(10.millis()).unwrap();
    sched.post_callback(b).post().unwrap();

    sched.clear();
    assert_eq!(sched.pending(), 0);
    assert_eq!(sched.next_due(), None);

    SimClock::set(100);
    assert_eq!(sched.dispatch(), 0);
    assert!(log().is_empty());
}

static NESTED: Scheduler<SimClock, 4> = Scheduler::new();

fn reposts_itself() {
    record("nested");
    if times_of("nested").len() < 3 {
        NESTED.post_callback(reposts_itself).delay(7.millis()).unwrap();
    } else {
        NESTED.stop();
    }
}

#[test]
fn callbacks_may_post_and_stop_the_loop() {
    let _serial = SERIAL.lock();
    reset();

    NESTED.post_callback(reposts_itself).post().unwrap();
    NESTED.post_callback(a).period(2.millis()).unwrap();

    // `run` only returns because the third `reposts_itself` called `stop`
    NESTED.run();

    assert_eq!(times_of("nested"), [0, 8, 16]);
    assert_eq!(times_of("a"), [3, 6, 9, 12, 15]);
}

// A clock of 1 ms ticks, read from a free running microsecond counter. A reading lags real time
// by up to one tick.
static MICROS: Mutex<u32> = Mutex::new(0);

struct CoarseClock;

impl Clock for CoarseClock {
    type Ticks = u32;

    const TICK_HZ: u32 = 1_000;

    fn now() -> u32 {
        *MICROS.lock() / 1_000
    }
}

static RAN_AT_MICROS: Mutex<Vec<u32>> = Mutex::new(Vec::new());

fn stamp() {
    let now = *MICROS.lock();
    RAN_AT_MICROS.lock().push(now);
}

#[test]
fn delay_holds_in_real_time_between_ticks() {
    let _serial = SERIAL.lock();
    *MICROS.lock() = 999;
    RAN_AT_MICROS.lock().clear();

    let sched: Scheduler<CoarseClock, 4> = Scheduler::new();
    sched.post_callback(stamp).delay(1.millis()).unwrap();

    // One tick later by the clock, but only 1 us later in real time
    *MICROS.lock() = 1_000;
    assert_eq!(sched.dispatch(), 0);
    *MICROS.lock() = 1_998;
    assert_eq!(sched.dispatch(), 0);
    *MICROS.lock() = 2_000;
    assert_eq!(sched.dispatch(), 1);

    assert_eq!(*RAN_AT_MICROS.lock(), [2_000]);
}

#[test]
fn period_holds_in_real_time_between_ticks() {
    let _serial = SERIAL.lock();
    *MICROS.lock() = 0;
    RAN_AT_MICROS.lock().clear();

    let sched: Scheduler<CoarseClock, 4> = Scheduler::new();
    sched.post_callback(stamp).period(2.millis()).unwrap();

    // Dispatch points falling anywhere within a tick
    for step in [999, 1, 998, 3, 1_001, 500, 499, 997, 7].iter().cycle().take(300) {
        *MICROS.lock() += *step;
        sched.dispatch();
    }

    let runs = RAN_AT_MICROS.lock().clone();
    assert!(runs.len() > 10);
    assert!(runs[0] >= 2_000);
    for pair in runs.windows(2) {
        assert!(pair[1] - pair[0] >= 2_000, "{pair:?}");
    }
}
