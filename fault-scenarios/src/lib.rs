//! Three programs that end in a fault, each registering its work with the cooperative
//! scheduler from a single `app_start`.
//!
//! - [`crashing_app`]: a one-shot callback writes through a null pointer.
//! - [`never_ending_loop`]: a one-shot callback never returns and starves the scheduler.
//! - [`write_to_address_zero`]: an edge interrupt handler writes through address zero.

#![no_std]
#![deny(missing_docs)]

pub mod crashing_app;
pub mod never_ending_loop;
mod platform;
pub mod write_to_address_zero;

pub use platform::{Platform, PlatformScheduler, SCHEDULER_CAPACITY};
