//! Post-mortem state of an ARMv7-M core, as captured by a fatal fault handler.

use core::fmt;

/// Registers stacked by the core on exception entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct StackedRegisters {
    /// r0
    pub r0: u32,
    /// r1
    pub r1: u32,
    /// r2
    pub r2: u32,
    /// r3
    pub r3: u32,
    /// r12
    pub r12: u32,
    /// Link register.
    pub lr: u32,
    /// Address of the faulting instruction.
    pub pc: u32,
    /// Program status register.
    pub xpsr: u32,
}

const FRAME_SIZE: u32 = 0x20;
const XPSR_STACK_ALIGN: u32 = 1 << 9;

impl StackedRegisters {
    /// Stack pointer of the interrupted code, given the address the frame was stacked at.
    ///
    /// Undoes the 4 byte padding the core inserts to align the frame to 8 bytes, recorded in
    /// bit 9 of the stacked xPSR. Assumes a basic frame without floating point state.
    pub const fn stack_pointer_before(&self, frame_address: u32) -> u32 {
        let padding = if self.xpsr & XPSR_STACK_ALIGN != 0 {
            4
        } else {
            0
        };

        frame_address + FRAME_SIZE + padding
    }
}

/// Registers the core does not stack, saved on entry to the fault handler before any code
/// could change them.
///
/// Laid out in push order, so a handler can read them in place from its stack.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct CalleeSavedRegisters {
    /// r4
    pub r4: u32,
    /// r5
    pub r5: u32,
    /// r6
    pub r6: u32,
    /// r7, the frame pointer in Thumb code.
    pub r7: u32,
    /// r8
    pub r8: u32,
    /// r9
    pub r9: u32,
    /// r10
    pub r10: u32,
    /// r11
    pub r11: u32,
}

/// Special registers read inside the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct CoreRegisters {
    /// Main stack pointer.
    pub msp: u32,
    /// Process stack pointer.
    pub psp: u32,
    /// Stack pointer of the faulting code, just above the stacked frame.
    pub sp: u32,
    /// CONTROL register.
    pub control: u32,
    /// PRIMASK register.
    pub primask: u32,
}

/// System control block fault status and address registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct FaultStatus {
    /// Configurable fault status (MMFSR, BFSR and UFSR).
    pub cfsr: u32,
    /// HardFault status.
    pub hfsr: u32,
    /// MemManage fault address.
    pub mmfar: u32,
    /// BusFault address.
    pub bfar: u32,
}

#[derive(Clone, Copy)]
enum Register {
    Cfsr,
    Hfsr,
}

/// A single status bit set in [`FaultStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum FaultCause {
    /// MemManage: instruction fetch from a no-execute or protected region.
    InstructionAccessViolation,
    /// MemManage: load or store to a protected region.
    DataAccessViolation,
    /// MemManage: fault on exception return unstacking.
    MemManageUnstacking,
    /// MemManage: fault on exception entry stacking.
    MemManageStacking,
    /// MemManage: fault during lazy floating-point state preservation.
    MemManageLazyFp,
    /// BusFault: instruction prefetch.
    InstructionBusError,
    /// BusFault: precise data bus error.
    PreciseDataBusError,
    /// BusFault: imprecise data bus error.
    ImpreciseDataBusError,
    /// BusFault: fault on exception return unstacking.
    BusFaultUnstacking,
    /// BusFault: fault on exception entry stacking.
    BusFaultStacking,
    /// BusFault: fault during lazy floating-point state preservation.
    BusFaultLazyFp,
    /// UsageFault: undefined instruction.
    UndefinedInstruction,
    /// UsageFault: invalid EPSR state, e.g. a branch to an even address.
    InvalidState,
    /// UsageFault: invalid EXC_RETURN.
    InvalidPc,
    /// UsageFault: coprocessor access.
    NoCoprocessor,
    /// UsageFault: unaligned access with unaligned trapping enabled.
    Unaligned,
    /// UsageFault: integer division by zero with trapping enabled.
    DivideByZero,
    /// HardFault: bus fault on a vector table read.
    VectorTableRead,
    /// HardFault: a configurable fault escalated.
    Forced,
    /// HardFault: a debug event.
    DebugEvent,
}

static CAUSES: [(FaultCause, Register, u32); 20] = [
    (FaultCause::InstructionAccessViolation, Register::Cfsr, 0),
    (FaultCause::DataAccessViolation, Register::Cfsr, 1),
    (FaultCause::MemManageUnstacking, Register::Cfsr, 3),
    (FaultCause::MemManageStacking, Register::Cfsr, 4),
    (FaultCause::MemManageLazyFp, Register::Cfsr, 5),
    (FaultCause::InstructionBusError, Register::Cfsr, 8),
    (FaultCause::PreciseDataBusError, Register::Cfsr, 9),
    (FaultCause::ImpreciseDataBusError, Register::Cfsr, 10),
    (FaultCause::BusFaultUnstacking, Register::Cfsr, 11),
    (FaultCause::BusFaultStacking, Register::Cfsr, 12),
    (FaultCause::BusFaultLazyFp, Register::Cfsr, 13),
    (FaultCause::UndefinedInstruction, Register::Cfsr, 16),
    (FaultCause::InvalidState, Register::Cfsr, 17),
    (FaultCause::InvalidPc, Register::Cfsr, 18),
    (FaultCause::NoCoprocessor, Register::Cfsr, 19),
    (FaultCause::Unaligned, Register::Cfsr, 24),
    (FaultCause::DivideByZero, Register::Cfsr, 25),
    (FaultCause::VectorTableRead, Register::Hfsr, 1),
    (FaultCause::Forced, Register::Hfsr, 30),
    (FaultCause::DebugEvent, Register::Hfsr, 31),
];

const MMARVALID: u32 = 1 << 7;
const BFARVALID: u32 = 1 << 15;

impl FaultCause {
    /// Name of the status bit, as in the architecture reference manual.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            FaultCause::InstructionAccessViolation => "IACCVIOL",
            FaultCause::DataAccessViolation => "DACCVIOL",
            FaultCause::MemManageUnstacking => "MUNSTKERR",
            FaultCause::MemManageStacking => "MSTKERR",
            FaultCause::MemManageLazyFp => "MLSPERR",
            FaultCause::InstructionBusError => "IBUSERR",
            FaultCause::PreciseDataBusError => "PRECISERR",
            FaultCause::ImpreciseDataBusError => "IMPRECISERR",
            FaultCause::BusFaultUnstacking => "UNSTKERR",
            FaultCause::BusFaultStacking => "STKERR",
            FaultCause::BusFaultLazyFp => "LSPERR",
            FaultCause::UndefinedInstruction => "UNDEFINSTR",
            FaultCause::InvalidState => "INVSTATE",
            FaultCause::InvalidPc => "INVPC",
            FaultCause::NoCoprocessor => "NOCP",
            FaultCause::Unaligned => "UNALIGNED",
            FaultCause::DivideByZero => "DIVBYZERO",
            FaultCause::VectorTableRead => "VECTTBL",
            FaultCause::Forced => "FORCED",
            FaultCause::DebugEvent => "DEBUGEVT",
        }
    }
}

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FaultStatus {
    /// Every cause flagged in CFSR and HFSR, CFSR first.
    pub fn causes(&self) -> impl Iterator<Item = FaultCause> + '_ {
        CAUSES.iter().filter_map(move |&(cause, register, bit)| {
            let value = match register {
                Register::Cfsr => self.cfsr,
                Register::Hfsr => self.hfsr,
            };
            (value & (1 << bit) != 0).then_some(cause)
        })
    }

    /// The address that was accessed, if the core latched one.
    pub fn fault_address(&self) -> Option<u32> {
        if self.cfsr & MMARVALID != 0 {
            Some(self.mmfar)
        } else if self.cfsr & BFARVALID != 0 {
            Some(self.bfar)
        } else {
            None
        }
    }
}

/// Everything a fatal fault handler captures before the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct CrashReport {
    /// Stacked exception frame.
    pub frame: StackedRegisters,
    /// r4 to r11.
    pub callee: CalleeSavedRegisters,
    /// Core registers at handler entry.
    pub core: CoreRegisters,
    /// Fault status registers.
    pub status: FaultStatus,
}

impl fmt::Display for CrashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let StackedRegisters {
            r0,
            r1,
            r2,
            r3,
            r12,
            lr,
            pc,
            xpsr,
        } = self.frame;
        writeln!(
            f,
            "r0={r0:#010x} r1={r1:#010x} r2={r2:#010x} r3={r3:#010x} \
             r12={r12:#010x} lr={lr:#010x} pc={pc:#010x} xpsr={xpsr:#010x}"
        )?;

        let CalleeSavedRegisters {
            r4,
            r5,
            r6,
            r7,
            r8,
            r9,
            r10,
            r11,
        } = self.callee;
        writeln!(
            f,
            "r4={r4:#010x} r5={r5:#010x} r6={r6:#010x} r7={r7:#010x} \
             r8={r8:#010x} r9={r9:#010x} r10={r10:#010x} r11={r11:#010x}"
        )?;

        let CoreRegisters {
            msp,
            psp,
            sp,
            control,
            primask,
        } = self.core;
        writeln!(
            f,
            "msp={msp:#010x} psp={psp:#010x} sp={sp:#010x} \
             control={control:#010x} primask={primask:#010x}"
        )?;

        let FaultStatus {
            cfsr,
            hfsr,
            mmfar,
            bfar,
        } = self.status;
        write!(
            f,
            "cfsr={cfsr:#010x} hfsr={hfsr:#010x} mmfar={mmfar:#010x} bfar={bfar:#010x}"
        )?;

        for cause in self.status.causes() {
            write!(f, "\ncause: {cause}")?;
        }

        if let Some(address) = self.status.fault_address() {
            write!(f, "\nfault address: {address:#010x}")?;
        }

        Ok(())
    }
}
