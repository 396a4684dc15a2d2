use crate::command::BuildMode;
use clap::{Args, Parser, Subcommand};
use core::fmt;

/// A firmware binary of `demos/lm3s6965`.
#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Program {
    CrashingApp,
    NeverEndingLoop,
    WriteToAddressZero,
}

/// How a program is expected to end under QEMU.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ending {
    /// The HardFault handler exits QEMU with a failure status.
    Fault,
    /// Still running when the timeout expires.
    Hang,
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ending::Fault => write!(f, "a fault"),
            Ending::Hang => write!(f, "a hang"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Program {
    pub const ALL: [Program; 3] = [
        Program::CrashingApp,
        Program::NeverEndingLoop,
        Program::WriteToAddressZero,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Program::CrashingApp => "crashing-app",
            Program::NeverEndingLoop => "never-ending-loop",
            Program::WriteToAddressZero => "write-to-address-zero",
        }
    }

    pub fn features(&self) -> Option<&'static str> {
        match self {
            // Nobody presses SW in a headless QEMU
            Program::WriteToAddressZero => Some("simulate-edge"),
            Program::CrashingApp | Program::NeverEndingLoop => None,
        }
    }

    pub fn ending(&self) -> Ending {
        match self {
            Program::CrashingApp | Program::WriteToAddressZero => Ending::Fault,
            Program::NeverEndingLoop => Ending::Hang,
        }
    }
}

#[derive(clap::ValueEnum, Copy, Clone, Debug)]
pub enum Package {
    CoopSched,
    FaultScenarios,
    FaultTrap,
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Package {
    pub fn name(&self) -> &str {
        match self {
            Package::CoopSched => "coop-sched",
            Package::FaultScenarios => "fault-scenarios",
            Package::FaultTrap => "fault-trap",
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Fault demos xtask powered testing toolbox
pub struct Cli {
    /// Enable more verbose output, repeat up to `-vvv` for even more
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand selecting operation
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run programs in QEMU and compare against expected output
    ///
    /// Program output is matched against `ci/expected/`, with the register dump lines of
    /// crash reports left out
    Qemu(QemuArgs),

    /// Run the host tests
    Test(PackageOpt),
}

#[derive(Args, Debug)]
/// Restrict to package, or run on whole workspace
pub struct PackageOpt {
    /// For which package/workspace member to operate
    ///
    /// If omitted, work on all
    pub package: Option<Package>,
}

#[derive(Args, Debug)]
pub struct QemuArgs {
    /// Program to run
    ///
    /// If omitted, run all of them
    #[arg(value_enum, short, long)]
    pub program: Option<Program>,

    /// Seconds a program may run before QEMU is stopped
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,

    /// Build the firmware with the dev profile instead of release
    #[arg(long)]
    pub debug: bool,

    /// If expected output is missing or mismatching, recreate the file
    ///
    /// This overwrites only missing or mismatching
    #[arg(long)]
    pub overwrite_expected: bool,
}

impl QemuArgs {
    pub fn build_mode(&self) -> BuildMode {
        if self.debug {
            BuildMode::Debug
        } else {
            BuildMode::Release
        }
    }

    pub fn programs(&self) -> Vec<Program> {
        match self.program {
            Some(program) => vec![program],
            None => Program::ALL.to_vec(),
        }
    }
}
