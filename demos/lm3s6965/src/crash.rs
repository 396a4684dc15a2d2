//! HardFault reporting.
//!
//! [`hard_fault_handler!`] installs a `HardFault` trampoline that saves r4 to r11 before any
//! compiled code runs, then enters [`report_and_exit`].

use cortex_m::peripheral::SCB;
use cortex_m::register::{control, msp, primask, psp};
use cortex_m_rt::ExceptionFrame;
use cortex_m_semihosting::{debug, hprintln};
use fault_trap::{CalleeSavedRegisters, CoreRegisters, CrashReport, FaultStatus, StackedRegisters};

/// Install the `HardFault` handler. Use once, in the binary.
///
/// Replaces `#[exception] fn HardFault`: by the time a Rust handler runs, its prologue may
/// already have overwritten the callee-saved registers of the faulting code.
#[macro_export]
macro_rules! hard_fault_handler {
    () => {
        ::core::arch::global_asm!(
            ".section .HardFault.user, \"ax\"",
            ".global HardFault",
            ".type HardFault,%function",
            ".thumb_func",
            "HardFault:",
            // r4 lands lowest, matching `CalleeSavedRegisters`
            "    push {{r4-r11}}",
            "    mov r1, sp",
            // EXC_RETURN bit 2 tells which stack holds the frame
            "    mov r0, lr",
            "    movs r2, #4",
            "    tst r0, r2",
            "    bne 0f",
            "    mrs r0, MSP",
            "    adds r0, #32",
            "    b {report}",
            "0:",
            "    mrs r0, PSP",
            "    b {report}",
            ".size HardFault, . - HardFault",
            report = sym $crate::crash::report_and_exit,
        );
    };
}

/// Snapshot the faulting context.
pub fn capture(frame: &ExceptionFrame, callee: &CalleeSavedRegisters) -> CrashReport {
    // SAFETY: read-only accesses to the fault status registers.
    let scb = unsafe { &*SCB::PTR };

    let frame_address = frame as *const ExceptionFrame as u32;
    let frame = StackedRegisters {
        r0: frame.r0(),
        r1: frame.r1(),
        r2: frame.r2(),
        r3: frame.r3(),
        r12: frame.r12(),
        lr: frame.lr(),
        pc: frame.pc(),
        xpsr: frame.xpsr(),
    };

    CrashReport {
        frame,
        callee: *callee,
        core: CoreRegisters {
            msp: msp::read(),
            psp: psp::read(),
            sp: frame.stack_pointer_before(frame_address),
            control: control::read().bits(),
            primask: u32::from(primask::read().is_active()),
        },
        status: FaultStatus {
            cfsr: scb.cfsr.read(),
            hfsr: scb.hfsr.read(),
            mmfar: scb.mmfar.read(),
            bfar: scb.bfar.read(),
        },
    }
}

/// Print the crash report over semihosting and end the QEMU process with a failure status.
///
/// Entered from the trampoline of [`hard_fault_handler!`], with the stacked frame and the
/// registers it saved.
pub extern "C" fn report_and_exit(frame: &ExceptionFrame, callee: &CalleeSavedRegisters) -> ! {
    let report = capture(frame, callee);

    hprintln!("HardFault");
    hprintln!("{}", report);

    debug::exit(debug::EXIT_FAILURE);

    loop {}
}
