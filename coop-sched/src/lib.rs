//! A cooperative callback scheduler.
//!
//! Callbacks are registered with either a one-shot delay or a repeat period and are dispatched
//! one at a time from a single loop, each to completion. There is no preemption: interrupt
//! handlers may register callbacks, but only the dispatch loop ever runs them.

#![no_std]
#![deny(missing_docs)]

mod clock;
pub mod scheduler;
mod ticks;

pub use clock::Clock;
pub use scheduler::{CallbackAdder, CallbackHandle, PostError, Scheduler};
pub use ticks::Ticks;

/// Re-export so users name durations without depending on `fugit` directly.
pub use fugit;
