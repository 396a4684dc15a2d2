//! Blinks LED1, reporting each new level, until a one-shot callback writes through a null
//! pointer after 2.3 s. The blink runs four times before that, each at least 500 ms after the
//! previous one.

use coop_sched::fugit::ExtU32;
use coop_sched::PostError;
use embedded_hal::digital::StatefulOutputPin;
use fault_trap::{Fault, ForceFault};

use crate::platform::{infallible, Platform};

/// Blink period.
pub const BLINK_PERIOD_MS: u32 = 500;

/// Delay of the crash.
pub const CRASH_DELAY_MS: u32 = 2_300;

/// Value stored through the null pointer.
pub const CRASH_VALUE: u32 = 0xDEAD_BEEF;

/// Register the blink and the crash.
pub fn app_start<P: Platform>() -> Result<(), PostError> {
    let scheduler = P::scheduler();

    scheduler
        .post_callback(blinky::<P>)
        .period(BLINK_PERIOD_MS.millis())?;
    scheduler
        .post_callback(crash::<P>)
        .delay(CRASH_DELAY_MS.millis())?;

    Ok(())
}

/// Toggle LED1 and print its new level.
pub fn blinky<P: Platform>() {
    let high = P::with_led(|led| {
        infallible(led.toggle());
        infallible(led.is_set_high())
    });

    P::report(format_args!("LED = {} \r\n", u8::from(high)));
}

/// Write [`CRASH_VALUE`] through a null pointer.
pub fn crash<P: Platform>() {
    P::Trap::force(Fault::null_write_u32(CRASH_VALUE))
}
