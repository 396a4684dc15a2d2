//! A one-shot callback that looks like it waits 20 times 5 ms, but never returns.
//!
//! The counter is a `u8` compared against `-1` after being widened to a signed integer, so the
//! comparison holds for every counter value and the post-decrement wraps from 0 to 255. While
//! the loop spins, nothing else registered with the scheduler gets to run.

use coop_sched::fugit::ExtU32;
use coop_sched::PostError;

use crate::platform::Platform;

/// Delay before the loop starts.
pub const START_DELAY_MS: u32 = 500;

/// Apparent number of turns.
pub const TURNS: u8 = 20;

/// Busy wait per turn.
pub const WAIT_MS: u32 = 5;

/// Register the loop.
pub fn app_start<P: Platform>() -> Result<(), PostError> {
    P::scheduler()
        .post_callback(loop_function::<P>)
        .delay(START_DELAY_MS.millis())?;

    Ok(())
}

/// Busy wait [`WAIT_MS`] per turn, while [`keep_turning`] says so.
pub fn loop_function<P: Platform>() {
    let mut turns = TURNS;

    while keep_turning(&mut turns) {
        P::wait_ms(WAIT_MS);
    }
}

/// Post-decrement `turns` and compare its previous value, widened to `i32`, with `-1`.
///
/// Always `true`.
pub fn keep_turning(turns: &mut u8) -> bool {
    let previous = *turns;
    *turns = previous.wrapping_sub(1);

    i32::from(previous) > -1
}
