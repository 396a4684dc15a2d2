//! Deliberate memory faults and what is left of a program after one.
//!
//! [`ForceFault`] is the platform primitive programs call to perform an invalid store. The
//! platform's fatal fault handler then captures a [`CrashReport`] and terminates.

#![no_std]
#![deny(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate std;

use core::fmt;

pub mod report;

pub use report::{
    CalleeSavedRegisters, CoreRegisters, CrashReport, FaultCause, FaultStatus, StackedRegisters,
};

/// Value of an invalid store, with its access width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Store {
    /// 16-bit store.
    U16(u16),
    /// 32-bit store.
    U32(u32),
}

/// A store the memory system is expected to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Fault {
    /// Target address of the store.
    pub address: usize,
    /// What is written.
    pub store: Store,
}

impl Fault {
    /// A 32-bit write through a null pointer.
    pub const fn null_write_u32(value: u32) -> Self {
        Self {
            address: 0,
            store: Store::U32(value),
        }
    }

    /// A 16-bit write through a null pointer.
    pub const fn null_write_u16(value: u16) -> Self {
        Self {
            address: 0,
            store: Store::U16(value),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store {
            Store::U16(v) => write!(f, "16-bit write of {v:#06x} to {:#010x}", self.address),
            Store::U32(v) => write!(f, "32-bit write of {v:#010x} to {:#010x}", self.address),
        }
    }
}

/// A platform primitive performing an invalid store.
pub trait ForceFault {
    /// Perform `fault`. Never returns: control ends up in the platform's fatal fault handler.
    fn force(fault: Fault) -> !;
}
