//! A simulated board: a millisecond clock that only moves when the scheduler idles or a program
//! busy waits, an LED that remembers when it toggled, and faults that unwind.
//!
//! To run these tests, you need to activate the `critical-section/std` feature.

#![allow(dead_code)]

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use coop_sched::{Clock, Scheduler};
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use fault_scenarios::{Platform, PlatformScheduler, SCHEDULER_CAPACITY};
use fault_trap::{Fault, ForceFault};
use parking_lot::{Mutex, MutexGuard};

static NOW: Mutex<u32> = Mutex::new(0);
static TOGGLES: Mutex<Vec<u32>> = Mutex::new(Vec::new());
static CONSOLE: Mutex<String> = Mutex::new(String::new());
static LED: Mutex<Option<SimLed>> = Mutex::new(None);
static BUTTON: Mutex<Option<fn()>> = Mutex::new(None);
static EDGE_AT: Mutex<Option<u32>> = Mutex::new(None);
static WAITS: Mutex<u32> = Mutex::new(0);
static WAIT_BUDGET: Mutex<Option<u32>> = Mutex::new(None);

static SCHEDULER: Scheduler<SimClock, SCHEDULER_CAPACITY> = Scheduler::new();

// Tests of one binary share the board
static SERIAL: Mutex<()> = Mutex::new(());

/// Payload of the panic that stands in for a hardware fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimFault {
    pub fault: Fault,
    pub at: u32,
}

/// Payload of the panic raised once the busy wait budget is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetExhausted {
    pub waits: u32,
    pub at: u32,
}

pub struct SimClock;

impl SimClock {
    pub fn advance(ms: u32) {
        let mut now = NOW.lock();
        *now = now.wrapping_add(ms);
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

        // The edge "interrupt" fires between two dispatch passes
        let edge_due = *EDGE_AT.lock() == Some(Self::now());
        if edge_due {
            let handler = *BUTTON.lock();
            if let Some(handler) = handler {
                handler();
            }
        }
    }
}

pub struct SimLed {
    high: bool,
}

impl ErrorType for SimLed {
    type Error = Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for SimLed {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }

    fn toggle(&mut self) -> Result<(), Infallible> {
        TOGGLES.lock().push(SimClock::now());
        self.high = !self.high;
        Ok(())
    }
}

pub struct SimTrap;

impl ForceFault for SimTrap {
    fn force(fault: Fault) -> ! {
        panic::panic_any(SimFault {
            fault,
            at: SimClock::now(),
        })
    }
}

pub struct SimBoard;

impl SimBoard {
    /// Take the board for the rest of the test, powered up afresh: time zero, nothing pending,
    /// LED1 off and no button handler.
    pub fn take() -> MutexGuard<'static, ()> {
        let serial = SERIAL.lock();

        SCHEDULER.clear();
        *NOW.lock() = 0;
        TOGGLES.lock().clear();
        CONSOLE.lock().clear();
        *LED.lock() = None;
        *BUTTON.lock() = None;
        *EDGE_AT.lock() = None;
        *WAITS.lock() = 0;
        *WAIT_BUDGET.lock() = None;

        serial
    }

    /// Deliver a falling edge on SW once the clock reaches `at`.
    pub fn press_button_at(at: u32) {
        *EDGE_AT.lock() = Some(at);
    }

    /// Unwind out of the `budget`-th busy wait.
    pub fn limit_waits(budget: u32) {
        *WAIT_BUDGET.lock() = Some(budget);
    }
}

impl Platform for SimBoard {
    type Clock = SimClock;
    type Led = SimLed;
    type Trap = SimTrap;

    fn scheduler() -> &'static PlatformScheduler<Self> {
        &SCHEDULER
    }

    fn with_led<R>(f: impl FnOnce(&mut SimLed) -> R) -> R {
        let mut led = LED.lock();
        f(led.get_or_insert(SimLed { high: false }))
    }

    fn on_button_fall(handler: fn()) {
        *BUTTON.lock() = Some(handler);
    }

    fn wait_ms(ms: u32) {
        SimClock::advance(ms);

        let waits = {
            let mut waits = WAITS.lock();
            *waits += 1;
            *waits
        };

        if Some(waits) == *WAIT_BUDGET.lock() {
            panic::panic_any(BudgetExhausted {
                waits,
                at: SimClock::now(),
            });
        }
    }

    fn report(args: fmt::Arguments<'_>) {
        use std::fmt::Write;

        let _ = CONSOLE.lock().write_fmt(args);
    }
}

/// Run the scheduler until it unwinds with a `T` payload.
pub fn run_until<T: Any + Copy>() -> T {
    let payload = match panic::catch_unwind(AssertUnwindSafe(|| SimBoard::scheduler().run())) {
        Ok(()) => panic!("the scheduler returned"),
        Err(payload) => payload,
    };

    match payload.downcast_ref::<T>() {
        Some(value) => *value,
        None => panic::resume_unwind(payload),
    }
}

pub fn now() -> u32 {
    SimClock::now()
}

pub fn toggle_times() -> Vec<u32> {
    TOGGLES.lock().clone()
}

pub fn console() -> String {
    CONSOLE.lock().clone()
}
