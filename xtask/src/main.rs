mod argument_parsing;
mod command;
mod run;

use anyhow::bail;
use clap::Parser;
use env_logger::Env;
use std::path::Path;

use crate::{
    argument_parsing::{Cli, Commands},
    run::{handle_results, qemu_run, test},
};

fn main() -> anyhow::Result<()> {
    // if there's an `xtask` folder, we're *probably* at the root of this repo (we can't just
    // check the name of `env::current_dir()` because people might clone it into a different name)
    let probably_running_from_repo_root = Path::new("./xtask").exists();
    if !probably_running_from_repo_root {
        bail!("xtasks can only be executed from the root of the repository");
    }

    let cli = Cli::parse();

    let env_logger_default_level = match cli.verbose {
        0 => Env::default().default_filter_or("info"),
        1 => Env::default().default_filter_or("debug"),
        _ => Env::default().default_filter_or("trace"),
    };
    env_logger::Builder::from_env(env_logger_default_level)
        .format_module_path(false)
        .format_timestamp(None)
        .init();

    log::trace!("Default logging level: {0}", cli.verbose);

    let results = match &cli.command {
        Commands::Qemu(args) => {
            log::info!("Running programs in QEMU, timeout {}s", args.timeout);
            qemu_run(args)
        }
        Commands::Test(package) => {
            log::info!("Running tests");
            test(package)
        }
    };

    if handle_results(cli.verbose, results).is_err() {
        bail!("Some commands failed");
    }

    Ok(())
}
