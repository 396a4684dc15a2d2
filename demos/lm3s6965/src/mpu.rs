//! Makes the flash at address 0 read-only, so stores to it raise a MemManage fault.
//!
//! Without a MemManage handler enabled in SHCSR the fault escalates to HardFault.

use cortex_m::asm;
use cortex_m::peripheral::MPU;

const CTRL_ENABLE: u32 = 1 << 0;
const CTRL_PRIVDEFENA: u32 = 1 << 2; // default memory map for everything outside the regions

const RASR_ENABLE: u32 = 1 << 0;
const RASR_C: u32 = 1 << 17; // normal memory, write-through
const RASR_AP_READ_ONLY: u32 = 0b110 << 24; // privileged and unprivileged

/// Size of the on-chip flash, as a power of two (256 KiB).
pub const FLASH_SIZE_LOG2: u32 = 18;

/// Map region 0 over the flash, read-only and executable, and enable the MPU.
pub fn protect_flash(mpu: &mut MPU) {
    let size = (FLASH_SIZE_LOG2 - 1) << 1;

    // SAFETY: the region only removes write access to flash, nothing in the program writes it.
    unsafe {
        mpu.rnr.write(0);
        mpu.rbar.write(0x0000_0000);
        mpu.rasr
            .write(RASR_AP_READ_ONLY | RASR_C | size | RASR_ENABLE);
        mpu.ctrl.write(CTRL_PRIVDEFENA | CTRL_ENABLE);
    }

    asm::dsb();
    asm::isb();
}
