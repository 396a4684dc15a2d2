//! A fixed capacity, run-to-completion callback scheduler.

use crate::{Clock, Ticks};

use core::cell::RefCell;
use core::cmp::Ordering as CmpOrdering;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use critical_section::Mutex;
use fugit::MillisDurationU32;
use heapless::Vec;

/// Identifies a registered callback, see [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct CallbackHandle(u32);

/// Errors that registering a callback can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PostError {
    /// Every slot of the scheduler holds a pending callback.
    Full,
    /// A periodic callback was registered with a period of zero.
    ZeroPeriod,
    /// The delay or period spans half the range of the clock's ticks or more.
    TooLong,
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostError::Full => write!(f, "scheduler is full"),
            PostError::ZeroPeriod => write!(f, "period must be at least one millisecond"),
            PostError::TooLong => write!(f, "duration exceeds half the range of the clock"),
        }
    }
}

#[derive(Clone, Copy)]
struct Entry<T> {
    id: u32,
    callback: fn(),
    due: T,
    period: Option<T>,
}

impl<T: Ticks> Entry<T> {
    /// Earliest due first, registration order between equals.
    fn precedes(&self, other: &Self) -> bool {
        match self.due.compare(other.due) {
            CmpOrdering::Less => true,
            CmpOrdering::Greater => false,
            CmpOrdering::Equal => self.id.compare(other.id) == CmpOrdering::Less,
        }
    }
}

struct Pending<T, const N: usize> {
    entries: Vec<Entry<T>, N>,
    next_id: u32,
}

impl<T: Ticks, const N: usize> Pending<T, N> {
    fn earliest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            match best {
                Some(b) if !entry.precedes(&self.entries[b]) => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

/// A cooperative scheduler for `fn()` callbacks.
///
/// Callbacks are dispatched one at a time, each running to completion before the next due
/// callback is considered. Nothing is ever preempted by the scheduler; a callback that never
/// returns starves everything else.
///
/// Registration and cancellation take a short global critical section, so both are allowed
/// from interrupt handlers. Callbacks themselves always run outside of the critical section.
///
/// # Example
///
/// ```
/// use coop_sched::{Clock, Scheduler};
/// use fugit::ExtU32;
///
/// struct Ms;
///
/// impl Clock for Ms {
///     type Ticks = u32;
///     const TICK_HZ: u32 = 1_000;
///
///     fn now() -> u32 {
///         // This is normally read from a hardware timer
///         0
///     }
/// }
///
/// static SCHEDULER: Scheduler<Ms, 4> = Scheduler::new();
///
/// fn blinky() {}
///
/// SCHEDULER.post_callback(blinky).period(500.millis()).unwrap();
/// assert_eq!(SCHEDULER.pending(), 1);
/// ```
pub struct Scheduler<C: Clock, const N: usize> {
    pending: Mutex<RefCell<Pending<C::Ticks, N>>>,
    stop: AtomicBool,
}

impl<C: Clock, const N: usize> Default for Scheduler<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, const N: usize> Scheduler<C, N> {
    /// Make a new, empty scheduler.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(Pending {
                entries: Vec::new(),
                next_id: 0,
            })),
            stop: AtomicBool::new(false),
        }
    }

    /// Start registering `callback`.
    ///
    /// Nothing is scheduled until one of [`CallbackAdder::delay`], [`CallbackAdder::period`] or
    /// [`CallbackAdder::post`] is called on the returned builder.
    pub fn post_callback(&self, callback: fn()) -> CallbackAdder<'_, C, N> {
        CallbackAdder {
            scheduler: self,
            callback,
        }
    }

    /// Remove a pending callback.
    ///
    /// Returns `false` if the callback is not pending anymore, i.e. a one-shot that already ran
    /// or a callback that was already cancelled.
    pub fn cancel(&self, handle: CallbackHandle) -> bool {
        critical_section::with(|cs| {
            let mut pending = self.pending.borrow_ref_mut(cs);
            match pending.entries.iter().position(|e| e.id == handle.0) {
                Some(i) => {
                    pending.entries.swap_remove(i);
                    true
                }
                None => false,
            }
        })
    }

    /// Remove every pending callback.
    pub fn clear(&self) {
        critical_section::with(|cs| self.pending.borrow_ref_mut(cs).entries.clear());
    }

    /// Number of callbacks waiting to run.
    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.pending.borrow_ref(cs).entries.len())
    }

    /// The instant the next callback becomes due, if any is pending.
    pub fn next_due(&self) -> Option<C::Ticks> {
        critical_section::with(|cs| {
            let pending = self.pending.borrow_ref(cs);
            pending.earliest().map(|i| pending.entries[i].due)
        })
    }

    /// Run every callback that is due, each to completion.
    ///
    /// Returns the number of callbacks that ran.
    pub fn dispatch(&self) -> usize {
        let mut ran = 0;

        while let Some(callback) = self.take_due(C::now()) {
            callback();
            ran += 1;
        }

        ran
    }

    /// Dispatch callbacks until [`Scheduler::stop`] is called.
    ///
    /// [`Clock::wait_for_event`] is called whenever a pass found nothing to run.
    pub fn run(&self) {
        loop {
            if self.stop.load(Ordering::Acquire) {
                self.stop.store(false, Ordering::Release);
                return;
            }

            if self.dispatch() == 0 {
                C::wait_for_event();
            }
        }
    }

    /// Make [`Scheduler::run`] return once the current pass is done.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    fn insert(
        &self,
        callback: fn(),
        delay: C::Ticks,
        period: Option<C::Ticks>,
    ) -> Result<CallbackHandle, PostError> {
        critical_section::with(|cs| {
            let mut pending = self.pending.borrow_ref_mut(cs);
            let id = pending.next_id;
            let entry = Entry {
                id,
                callback,
                due: at_least(C::now(), delay),
                period,
            };

            pending
                .entries
                .push(entry)
                .map_err(|_| PostError::Full)?;
            pending.next_id = id.wrapping_add(1);

            Ok(CallbackHandle(id))
        })
    }

    /// Pop the earliest callback if it is due at `now`, re-arming it if periodic.
    fn take_due(&self, now: C::Ticks) -> Option<fn()> {
        critical_section::with(|cs| {
            let mut pending = self.pending.borrow_ref_mut(cs);
            let i = pending.earliest()?;
            let entry = pending.entries[i];

            if !now.is_at_least(entry.due) {
                return None;
            }

            match entry.period {
                // Re-armed from the start of this dispatch, a late callback never catches up
                Some(period) => pending.entries[i].due = at_least(now, period),
                None => {
                    pending.entries.swap_remove(i);
                }
            }

            Some(entry.callback)
        })
    }
}

/// The first instant that is at least `delay` after `now`.
///
/// Wait for one tick longer, because by definition a clock reading has an uncertainty of one
/// tick, so waiting for 'at least' needs to compensate for that.
fn at_least<T: Ticks>(now: T, delay: T) -> T {
    let due = now.wrapping_add(delay);
    if due != now {
        due.wrapping_add(T::ONE_TICK)
    } else {
        due
    }
}

/// Builder returned by [`Scheduler::post_callback`].
#[must_use = "the callback is not scheduled until `delay`, `period` or `post` is called"]
pub struct CallbackAdder<'s, C: Clock, const N: usize> {
    scheduler: &'s Scheduler<C, N>,
    callback: fn(),
}

impl<C: Clock, const N: usize> CallbackAdder<'_, C, N> {
    /// Run the callback once, no earlier than `delay` from now.
    ///
    /// Fails with [`PostError::TooLong`] if `delay` spans half the tick range of the clock.
    pub fn delay(self, delay: MillisDurationU32) -> Result<CallbackHandle, PostError> {
        let delay = ticks::<C>(delay)?;
        self.scheduler.insert(self.callback, delay, None)
    }

    /// Run the callback every `period`, starting `period` from now.
    ///
    /// Consecutive runs are at least `period` apart.
    pub fn period(self, period: MillisDurationU32) -> Result<CallbackHandle, PostError> {
        if period.to_millis() == 0 {
            return Err(PostError::ZeroPeriod);
        }

        let period = ticks::<C>(period)?;
        self.scheduler.insert(self.callback, period, Some(period))
    }

    /// Run the callback once, as soon as the dispatch loop gets to it.
    pub fn post(self) -> Result<CallbackHandle, PostError> {
        let now = ticks::<C>(MillisDurationU32::from_ticks(0))?;
        self.scheduler.insert(self.callback, now, None)
    }
}

fn ticks<C: Clock>(duration: MillisDurationU32) -> Result<C::Ticks, PostError> {
    C::millis_to_ticks(duration.to_millis()).ok_or(PostError::TooLong)
}
