use core::arch::asm;

use cortex_m::asm as cm_asm;
use fault_trap::{Fault, ForceFault, Store};

/// Performs the store with a plain `str`/`strh`, relying on [`crate::mpu::protect_flash`] to
/// turn it into a fault.
pub struct StoreTrap;

impl ForceFault for StoreTrap {
    fn force(fault: Fault) -> ! {
        // SAFETY: the store faults, the HardFault handler never returns here.
        unsafe {
            match fault.store {
                Store::U16(value) => asm!(
                    "strh {value}, [{address}]",
                    address = in(reg) fault.address,
                    value = in(reg) u32::from(value),
                    options(nostack, preserves_flags),
                ),
                Store::U32(value) => asm!(
                    "str {value}, [{address}]",
                    address = in(reg) fault.address,
                    value = in(reg) value,
                    options(nostack, preserves_flags),
                ),
            }
        }

        // Surface an imprecise bus fault before going on
        cm_asm::dsb();
        cm_asm::isb();

        // The memory system ignored the store, escalate to HardFault anyway
        cm_asm::udf()
    }
}
