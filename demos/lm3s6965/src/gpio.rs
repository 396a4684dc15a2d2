//! Register-level GPIO for the LM3S6965.
//!
//! The PAC for this part has no peripheral registers, so pins are driven through raw volatile
//! accesses. Every port has its own base address; the DATA register is masked by address bits
//! [9:2], which lets a single pin be written without a read-modify-write.

use core::cell::Cell;
use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use cortex_m::peripheral::NVIC;
use critical_section::Mutex;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use lm3s6965::Interrupt;

const RCGC2: usize = 0x400F_E108; // run mode clock gating, one bit per GPIO port

const DATA_ALL: usize = 0x3FC;
const DIR: usize = 0x400;
const IS: usize = 0x404; // 0 = edge sensitive
const IBE: usize = 0x408; // 0 = single edge, selected by IEV
const IEV: usize = 0x40C; // 0 = falling edge
const IM: usize = 0x410;
const MIS: usize = 0x418;
const ICR: usize = 0x41C;
const PUR: usize = 0x510;
const DEN: usize = 0x51C;

/// A GPIO port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// Port A
    A,
    /// Port B
    B,
    /// Port C
    C,
    /// Port D
    D,
    /// Port E
    E,
    /// Port F
    F,
    /// Port G
    G,
}

impl Port {
    const fn base(self) -> usize {
        match self {
            Port::A => 0x4000_4000,
            Port::B => 0x4000_5000,
            Port::C => 0x4000_6000,
            Port::D => 0x4000_7000,
            Port::E => 0x4002_4000,
            Port::F => 0x4002_5000,
            Port::G => 0x4002_6000,
        }
    }

    const fn clock_gate(self) -> u32 {
        1 << (self as u32)
    }
}

/// A single pin of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    port: Port,
    bit: u8,
}

impl Pin {
    /// Pin `bit` (0..=7) of `port`.
    pub const fn new(port: Port, bit: u8) -> Self {
        assert!(bit < 8);
        Self { port, bit }
    }

    const fn mask(self) -> u32 {
        1 << self.bit
    }

    fn reg(self, offset: usize) -> *mut u32 {
        (self.port.base() + offset) as *mut u32
    }

    fn read(self, offset: usize) -> u32 {
        // SAFETY: `offset` is one of the register offsets above, all readable.
        unsafe { self.reg(offset).read_volatile() }
    }

    /// Set or clear this pin's bit in a shared port register.
    fn modify(self, offset: usize, set: bool) {
        let reg = self.reg(offset);
        critical_section::with(|_| {
            // SAFETY: register of this pin's port, the critical section makes the
            // read-modify-write atomic with respect to other pins of the port.
            unsafe {
                let value = reg.read_volatile();
                let value = if set {
                    value | self.mask()
                } else {
                    value & !self.mask()
                };
                reg.write_volatile(value);
            }
        });
    }

    fn enable_port_clock(self) {
        let rcgc2 = RCGC2 as *mut u32;
        critical_section::with(|_| {
            // SAFETY: system control register, read-modify-write under the critical section.
            unsafe {
                rcgc2.write_volatile(rcgc2.read_volatile() | self.port.clock_gate());
                // The port needs a few cycles after gating before it can be accessed
                rcgc2.read_volatile();
            }
        });
    }

    fn write_level(self, high: bool) {
        let value = if high { self.mask() } else { 0 };
        // SAFETY: masked DATA address of this pin only, other pins are untouched.
        unsafe { self.reg((self.mask() as usize) << 2).write_volatile(value) }
    }

    fn level(self) -> bool {
        self.read(DATA_ALL) & self.mask() != 0
    }
}

/// LED1, the user LED of the evaluation board.
pub const LED1: Pin = Pin::new(Port::F, 0);

/// SW, the "up" navigation switch of the evaluation board. Active low.
pub const SW: Pin = Pin::new(Port::E, 0);

/// A push-pull output.
pub struct Output {
    pin: Pin,
}

impl Output {
    /// Configure `pin` as an output, driven low.
    ///
    /// # Safety
    ///
    /// No other driver may be controlling the same pin.
    pub unsafe fn new(pin: Pin) -> Self {
        pin.enable_port_clock();
        pin.write_level(false);
        pin.modify(DIR, true);
        pin.modify(DEN, true);

        Self { pin }
    }
}

impl ErrorType for Output {
    type Error = Infallible;
}

impl OutputPin for Output {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.write_level(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.write_level(true);
        Ok(())
    }
}

impl StatefulOutputPin for Output {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.level())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pin.level())
    }
}

/// An input with a pull-up that runs a handler on falling edges.
///
/// Meant to live in a `static`: [`InterruptIn::on_interrupt`] is called from the port's
/// interrupt handler.
pub struct InterruptIn {
    pin: Pin,
    interrupt: Interrupt,
    handler: Mutex<Cell<Option<fn()>>>,
    injected: AtomicBool,
}

impl InterruptIn {
    /// `pin`, whose port raises `interrupt`. Nothing is configured until [`InterruptIn::fall`].
    pub const fn new(pin: Pin, interrupt: Interrupt) -> Self {
        Self {
            pin,
            interrupt,
            handler: Mutex::new(Cell::new(None)),
            injected: AtomicBool::new(false),
        }
    }

    /// Run `handler` on every high-to-low transition, replacing any previous handler.
    pub fn fall(&self, handler: fn()) {
        critical_section::with(|cs| self.handler.borrow(cs).set(Some(handler)));

        let pin = self.pin;
        pin.enable_port_clock();
        pin.modify(DIR, false);
        pin.modify(PUR, true);
        pin.modify(DEN, true);
        pin.modify(IM, false);
        pin.modify(IS, false);
        pin.modify(IBE, false);
        pin.modify(IEV, false);
        // SAFETY: write-one-to-clear, only this pin's bit.
        unsafe { pin.reg(ICR).write_volatile(pin.mask()) };
        pin.modify(IM, true);
    }

    /// Latch a falling edge from software and pend the port's interrupt.
    pub fn inject_fall(&self) {
        self.injected.store(true, Ordering::Release);
        NVIC::pend(self.interrupt);
    }

    /// Call this in the interrupt handler of the pin's port.
    ///
    /// Acknowledges a latched edge of this pin and runs the registered handler.
    pub fn on_interrupt(&self) {
        let pin = self.pin;
        let hardware = pin.read(MIS) & pin.mask() != 0;
        if hardware {
            // SAFETY: write-one-to-clear, only this pin's bit.
            unsafe { pin.reg(ICR).write_volatile(pin.mask()) };
        }

        let injected = self.injected.swap(false, Ordering::AcqRel);

        if hardware || injected {
            let handler = critical_section::with(|cs| self.handler.borrow(cs).get());
            if let Some(handler) = handler {
                handler();
            }
        }
    }
}
