use crate::Ticks;

/// A backend definition for the clock driving a [`Scheduler`](crate::Scheduler).
pub trait Clock: 'static {
    /// The type for ticks.
    type Ticks: Ticks;

    /// Tick rate of the clock.
    const TICK_HZ: u32;

    /// Get the current time.
    fn now() -> Self::Ticks;

    /// Optional. Called by [`Scheduler::run`](crate::Scheduler::run) when a dispatch pass found
    /// nothing due, e.g. to sleep until the next interrupt.
    ///
    /// The clock must keep advancing while this waits, otherwise the scheduler never wakes up.
    fn wait_for_event() {}

    /// Converts a millisecond count to ticks of this clock, rounding up.
    ///
    /// `None` if the duration is too long to be told apart from an instant in the past.
    #[inline]
    fn millis_to_ticks(ms: u32) -> Option<Self::Ticks> {
        Self::Ticks::from_millis(ms, Self::TICK_HZ)
    }
}
