//! The LM3S6965 evaluation board, as emulated by QEMU's `lm3s6965evb` machine.

#![no_std]

pub mod crash;
pub mod gpio;
pub mod mpu;
mod trap;

use core::cell::RefCell;
use core::fmt;

use coop_sched::{Clock, Scheduler};
use cortex_m_semihosting::hprint;
use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use fault_scenarios::{Platform, PlatformScheduler, SCHEDULER_CAPACITY};
use lm3s6965::Interrupt;
use rtic_monotonics::systick::prelude::*;

use crate::gpio::{InterruptIn, Output, LED1, SW};

pub use trap::StoreTrap;

/// Core clock of the emulated part.
pub const SYSCLK_HZ: u32 = 12_000_000;

/// When the `simulate-edge` build presses SW.
pub const SIMULATED_PRESS_MS: u32 = 1_750;

systick_monotonic!(Mono, 1_000);

/// Millisecond clock of the scheduler, backed by [`Mono`].
pub struct MonoClock;

impl Clock for MonoClock {
    type Ticks = u32;

    const TICK_HZ: u32 = 1_000;

    fn now() -> u32 {
        Mono::now().ticks()
    }

    fn wait_for_event() {
        // SysTick fires every tick, this never sleeps for long
        cortex_m::asm::wfi();
    }
}

static SCHEDULER: Scheduler<MonoClock, SCHEDULER_CAPACITY> = Scheduler::new();
static LED: Mutex<RefCell<Option<Output>>> = Mutex::new(RefCell::new(None));

/// SW, falling edges raise the GPIO port E interrupt.
pub static BUTTON: InterruptIn = InterruptIn::new(SW, Interrupt::GPIOE);

/// The board.
pub struct Lm3s6965;

impl Platform for Lm3s6965 {
    type Clock = MonoClock;
    type Led = Output;
    type Trap = StoreTrap;

    fn scheduler() -> &'static PlatformScheduler<Self> {
        &SCHEDULER
    }

    fn with_led<R>(f: impl FnOnce(&mut Output) -> R) -> R {
        critical_section::with(|cs| {
            let mut led = LED.borrow_ref_mut(cs);
            // SAFETY: `LED` is the only owner of LED1.
            f(led.get_or_insert_with(|| unsafe { Output::new(LED1) }))
        })
    }

    fn on_button_fall(handler: fn()) {
        BUTTON.fall(handler);
    }

    fn wait_ms(ms: u32) {
        Mono.delay_ms(ms);
    }

    fn report(args: fmt::Arguments<'_>) {
        hprint!("{}", args);
    }
}

/// Press SW from software, see [`InterruptIn::inject_fall`].
pub fn press_button() {
    BUTTON.inject_fall();
}
