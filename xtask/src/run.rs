mod data;
mod results;

pub use data::{FinalRunResult, Outcome, RunResult, TestRunError};
pub use results::handle_results;

use std::{
    fs::File,
    io::{Read, Write},
    path::PathBuf,
    process::{Child, ChildStderr, ChildStdout, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    argument_parsing::{PackageOpt, Program, QemuArgs},
    command::Command,
};

use results::{comparable_output, run_successful};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Build every selected program, run it in QEMU and check how it ended.
///
/// Supports updating the expected output via the overwrite argument
pub fn qemu_run(args: &QemuArgs) -> Vec<FinalRunResult> {
    let timeout = Duration::from_secs(args.timeout);

    args.programs()
        .into_iter()
        .map(|program| {
            let mode = args.build_mode();

            let build = Command::FirmwareBuild { program, mode };
            match run_command(&build, None) {
                Ok(result) if result.success() => {}
                Ok(result) => return FinalRunResult::Failed(build, result),
                Err(e) => return FinalRunResult::CommandError(build, e),
            }

            let command = Command::Qemu { program, mode };
            match check_program(program, &command, timeout, args.overwrite_expected) {
                Ok(result) => FinalRunResult::Success(command, result),
                Err(e) => FinalRunResult::CommandError(command, e),
            }
        })
        .collect()
}

fn check_program(
    program: Program,
    command: &Command,
    timeout: Duration,
    overwrite: bool,
) -> anyhow::Result<RunResult> {
    let run_file = format!("{}.run", program.name());
    let expected_output_file = ["ci", "expected", &run_file]
        .iter()
        .collect::<PathBuf>()
        .into_os_string()
        .into_string()
        .map_err(|e| anyhow::anyhow!("Can't convert path from `OsString` to `String`: {e:?}"))?;

    let result = run_command(command, Some(timeout))?;

    if overwrite {
        let mut file_handle = File::create(&expected_output_file).map_err(|_| {
            TestRunError::FileError {
                file: expected_output_file.clone(),
            }
        })?;
        log::info!("Flag --overwrite-expected enabled");
        log::info!("Creating/updating file: {expected_output_file}");
        file_handle.write_all(comparable_output(&result.stdout).as_bytes())?;
    }

    run_successful(program, &result, &expected_output_file)?;

    Ok(result)
}

/// Run the host tests of one or all packages.
pub fn test(package: &PackageOpt) -> Vec<FinalRunResult> {
    let command = Command::Test {
        package: package.package,
    };

    let result = match run_command(&command, None) {
        Ok(result) if result.success() => FinalRunResult::Success(command, result),
        Ok(result) => FinalRunResult::Failed(command, result),
        Err(e) => FinalRunResult::CommandError(command, e),
    };

    vec![result]
}

/// Run `command` to completion, or until `timeout` expires and it is killed.
pub fn run_command(command: &Command, timeout: Option<Duration>) -> anyhow::Result<RunResult> {
    log::info!("👟 {command}");
    log::debug!("{}", command.as_cmd_string());

    let mut process = std::process::Command::new(command.executable());

    process
        .args(command.args())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = command.chdir() {
        process.current_dir(dir.canonicalize()?);
    }

    let mut child = process.spawn()?;

    // Drain the pipes while waiting, a chatty child must not block on a full pipe
    let stdout = collect(child.stdout.take());
    let stderr = collect(child.stderr.take());

    let outcome = wait(&mut child, timeout)?;

    let stdout = join(stdout);
    let stderr = join(stderr);

    match outcome {
        Outcome::Exited(status) if status.success() => log::info!("✅ Success."),
        Outcome::Exited(_) => log::warn!("Command exited with {outcome}."),
        Outcome::TimedOut => log::warn!("Command still running, killed after its timeout."),
    }

    Ok(RunResult {
        outcome,
        stdout,
        stderr,
    })
}

fn wait(child: &mut Child, timeout: Option<Duration>) -> anyhow::Result<Outcome> {
    let Some(timeout) = timeout else {
        return Ok(Outcome::Exited(child.wait()?));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Outcome::Exited(status));
        }

        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(Outcome::TimedOut);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

trait Pipe: Read + Send + 'static {}

impl Pipe for ChildStdout {}
impl Pipe for ChildStderr {}

fn collect<P: Pipe>(pipe: Option<P>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            // A read error keeps whatever arrived before it
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();

    String::from_utf8(bytes).unwrap_or("Not displayable".into())
}
