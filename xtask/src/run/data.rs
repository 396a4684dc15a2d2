use core::fmt;
use std::process::ExitStatus;

use diffy::{create_patch, PatchFormatter};

use crate::{argument_parsing::Ending, command::Command};

/// How a process stopped.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Exited(ExitStatus),
    /// Killed once its timeout expired.
    TimedOut,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Exited(status) => write!(f, "{status}"),
            Outcome::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub outcome: Outcome,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, Outcome::Exited(status) if status.success())
    }
}

#[derive(Debug)]
pub enum FinalRunResult {
    Success(Command, RunResult),
    Failed(Command, RunResult),
    CommandError(Command, anyhow::Error),
}

#[derive(Debug)]
pub enum TestRunError {
    FileCmpError { expected: String, got: String },
    FileError { file: String },
    UnexpectedEnding { expected: Ending, got: RunResult },
}

impl fmt::Display for TestRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestRunError::FileCmpError { expected, got } => {
                let patch = create_patch(expected, got);
                writeln!(f, "Differing output in files.\n")?;
                let pf = PatchFormatter::new().with_color();
                writeln!(f, "{}", pf.fmt_patch(&patch))?;
                write!(
                    f,
                    "See flag --overwrite-expected to create/update expected output."
                )
            }
            TestRunError::FileError { file } => {
                write!(f, "File error on: {file}\nSee flag --overwrite-expected to create/update expected output.")
            }
            TestRunError::UnexpectedEnding { expected, got } => {
                write!(
                    f,
                    "Expected {expected}, the program {}: {} {}",
                    got.outcome, got.stdout, got.stderr
                )
            }
        }
    }
}

impl std::error::Error for TestRunError {}
