//! LED1 blinks every 500 ms until SW is pressed; the edge interrupt writes to address zero.
//!
//! Build with `--features simulate-edge` to have SW pressed from software after 1.75 s.

#![no_main]
#![no_std]
#![deny(warnings)]
#![deny(missing_docs)]

use panic_semihosting as _;

#[rtic::app(device = lm3s6965, peripherals = true)]
mod app {
    use fault_scenarios::{write_to_address_zero, Platform};
    use lm3s6965_fault_demos::{mpu, Lm3s6965, Mono, BUTTON, SYSCLK_HZ};

    #[shared]
    struct Shared {}

    #[local]
    struct Local {}

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        mpu::protect_flash(&mut cx.core.MPU);
        Mono::start(cx.core.SYST, SYSCLK_HZ);

        write_to_address_zero::app_start::<Lm3s6965>().unwrap();

        #[cfg(feature = "simulate-edge")]
        {
            use coop_sched::fugit::ExtU32;
            use lm3s6965_fault_demos::{press_button, SIMULATED_PRESS_MS};

            Lm3s6965::scheduler()
                .post_callback(press_button)
                .delay(SIMULATED_PRESS_MS.millis())
                .unwrap();
        }

        (Shared {}, Local {})
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            Lm3s6965::scheduler().run();
        }
    }

    #[task(binds = GPIOE)]
    fn sw_edge(_: sw_edge::Context) {
        BUTTON.on_interrupt();
    }
}

lm3s6965_fault_demos::hard_fault_handler!();
