use crate::argument_parsing::{Package, Program};
use core::fmt;
use std::path::PathBuf;

pub const FIRMWARE_DIR: &str = "demos/lm3s6965";
const FIRMWARE_TARGET: &str = "thumbv7m-none-eabi";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuildMode {
    Release,
    Debug,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match self {
            BuildMode::Release => "release",
            BuildMode::Debug => "debug",
        };

        write!(f, "{cmd}")
    }
}

#[derive(Debug)]
pub enum Command {
    FirmwareBuild { program: Program, mode: BuildMode },
    Qemu { program: Program, mode: BuildMode },
    Test { package: Option<Package> },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn feat(program: &Program) -> String {
            match program.features() {
                Some(features) => format!(" (features \"{features}\")"),
                None => String::new(),
            }
        }

        match self {
            Command::FirmwareBuild { program, mode } => {
                write!(f, "Build {program} in {mode} mode{}", feat(program))
            }
            Command::Qemu { program, mode } => {
                write!(f, "Run {program} in QEMU in {mode} mode{}", feat(program))
            }
            Command::Test { package } => match package {
                Some(package) => write!(f, "Run tests of package {package}"),
                None => write!(f, "Run tests of all packages"),
            },
        }
    }
}

impl Command {
    pub fn as_cmd_string(&self) -> String {
        let cd = match self.chdir() {
            Some(dir) => format!("cd {} && ", dir.display()),
            None => String::new(),
        };

        format!("{cd}{} {}", self.executable(), self.args().join(" "))
    }

    pub fn executable(&self) -> &str {
        match self {
            Command::FirmwareBuild { .. } | Command::Test { .. } => "cargo",
            Command::Qemu { .. } => "qemu-system-arm",
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();

        match self {
            Command::FirmwareBuild { program, mode } => {
                args.extend(["build".into(), "--bin".into(), program.name().into()]);
                if *mode == BuildMode::Release {
                    args.push("--release".into());
                }
                if let Some(features) = program.features() {
                    args.extend(["--features".into(), features.into()]);
                }
            }
            Command::Qemu { program, mode } => {
                args.extend(
                    [
                        "-cpu",
                        "cortex-m3",
                        "-machine",
                        "lm3s6965evb",
                        "-nographic",
                        "-semihosting-config",
                        "enable=on,target=native",
                        "-kernel",
                    ]
                    .map(String::from),
                );
                args.push(elf_path(*program, *mode).display().to_string());
            }
            Command::Test { package } => {
                args.push("test".into());
                if let Some(package) = package {
                    args.extend(["--package".into(), package.name().into()]);
                }
            }
        }

        args
    }

    pub fn chdir(&self) -> Option<PathBuf> {
        match self {
            Command::FirmwareBuild { .. } => Some(PathBuf::from(FIRMWARE_DIR)),
            Command::Qemu { .. } | Command::Test { .. } => None,
        }
    }
}

/// Where `cargo build` leaves the firmware image, relative to the repository root.
pub fn elf_path(program: Program, mode: BuildMode) -> PathBuf {
    [
        FIRMWARE_DIR,
        "target",
        FIRMWARE_TARGET,
        &mode.to_string(),
        program.name(),
    ]
    .iter()
    .collect()
}
