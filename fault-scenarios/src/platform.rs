use core::convert::Infallible;
use core::fmt;

use coop_sched::{Clock, Scheduler};
use embedded_hal::digital::StatefulOutputPin;
use fault_trap::ForceFault;

/// Pending callbacks a platform's scheduler must hold.
pub const SCHEDULER_CAPACITY: usize = 8;

/// The scheduler type of a [`Platform`].
pub type PlatformScheduler<P> = Scheduler<<P as Platform>::Clock, SCHEDULER_CAPACITY>;

/// Everything a program needs from the board it runs on.
///
/// All methods are associated functions: callbacks are plain `fn()` and reach the board through
/// process-wide state.
pub trait Platform: 'static {
    /// Clock driving the scheduler.
    type Clock: Clock;

    /// Output pin wired to LED1.
    type Led: StatefulOutputPin<Error = Infallible>;

    /// Invalid store primitive.
    type Trap: ForceFault;

    /// The process-wide scheduler.
    fn scheduler() -> &'static PlatformScheduler<Self>;

    /// Run `f` with LED1, creating the pin on first use.
    fn with_led<R>(f: impl FnOnce(&mut Self::Led) -> R) -> R;

    /// Register `handler` for high-to-low transitions of the SW input.
    ///
    /// The handler runs in interrupt context, asynchronously to the dispatch loop.
    fn on_button_fall(handler: fn());

    /// Block for at least `ms` milliseconds.
    fn wait_ms(ms: u32);

    /// Write to the console.
    fn report(args: fmt::Arguments<'_>);
}

pub(crate) fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
