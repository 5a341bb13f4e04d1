use anyhow::Result;
use clap::ArgMatches;

use crate::commands::{check, exec, settings::LockSettings};

/// Route a parsed command line to its command. Returns the process exit code.
pub fn dispatch(matches: &ArgMatches) -> Result<i32> {
    match matches.subcommand() {
        Some(("exec", sub_m)) => handle_exec(sub_m),
        Some(("check", sub_m)) => handle_check(sub_m),
        _ => anyhow::bail!("Unknown command. Run 'lockset --help' for usage."),
    }
}

fn handle_exec(matches: &ArgMatches) -> Result<i32> {
    let settings = LockSettings::from_matches(matches)?;
    let command: Vec<String> = matches
        .get_many::<String>("command")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    exec::run(&settings, &command)
}

fn handle_check(matches: &ArgMatches) -> Result<i32> {
    let settings = LockSettings::from_matches(matches)?;
    check::run(&settings)
}
