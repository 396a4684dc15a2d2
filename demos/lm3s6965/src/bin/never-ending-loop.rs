//! A callback posted for 500 ms that never returns, starving the scheduler for good.

#![no_main]
#![no_std]
#![deny(warnings)]
#![deny(missing_docs)]

use panic_semihosting as _;

#[rtic::app(device = lm3s6965, peripherals = true)]
mod app {
    use fault_scenarios::{never_ending_loop, Platform};
    use lm3s6965_fault_demos::{mpu, Lm3s6965, Mono, SYSCLK_HZ};

    #[shared]
    struct Shared {}

    #[local]
    struct Local {}

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        mpu::protect_flash(&mut cx.core.MPU);
        Mono::start(cx.core.SYST, SYSCLK_HZ);

        never_ending_loop::app_start::<Lm3s6965>().unwrap();

        (Shared {}, Local {})
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            Lm3s6965::scheduler().run();
        }
    }
}

lm3s6965_fault_demos::hard_fault_handler!();
