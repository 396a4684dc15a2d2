//! Blinks LED1 until SW is pressed; the falling edge interrupt writes through address zero.

use coop_sched::fugit::ExtU32;
use coop_sched::PostError;
use embedded_hal::digital::StatefulOutputPin;
use fault_trap::{Fault, ForceFault};

use crate::platform::{infallible, Platform};

/// Blink period.
pub const BLINK_PERIOD_MS: u32 = 500;

/// Value stored at address zero.
pub const FAULT_VALUE: u16 = 0xDEAD;

/// Register the blink and the button handler.
pub fn app_start<P: Platform>() -> Result<(), PostError> {
    P::scheduler()
        .post_callback(blinky::<P>)
        .period(BLINK_PERIOD_MS.millis())?;

    P::on_button_fall(btn_interrupt::<P>);

    Ok(())
}

/// Toggle LED1.
pub fn blinky<P: Platform>() {
    P::with_led(|led| infallible(led.toggle()));
}

/// Write [`FAULT_VALUE`] to address zero.
pub fn btn_interrupt<P: Platform>() {
    P::Trap::force(Fault::null_write_u16(FAULT_VALUE))
}
