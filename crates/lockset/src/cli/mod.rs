pub mod handlers;

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("lockset")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hold advisory locks on a group of files")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Log lock events to stderr"),
        )
        .subcommand(cmd_exec())
        .subcommand(cmd_check())
}

fn cmd_exec() -> Command {
    lock_args(Command::new("exec"))
        .about("Acquire all locks, run a command, then release them")
        .arg(
            Arg::new("command")
                .value_name("COMMAND")
                .last(true)
                .num_args(1..)
                .required(true)
                .help("Command to run while the locks are held"),
        )
}

fn cmd_check() -> Command {
    lock_args(Command::new("check"))
        .about("Check whether all files can be locked right now")
}

/// Options shared by every subcommand that builds a lock group.
fn lock_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("exclusive")
                .short('x')
                .long("exclusive")
                .action(ArgAction::SetTrue)
                .conflicts_with("shared")
                .help("Take exclusive locks"),
        )
        .arg(
            Arg::new("shared")
                .short('s')
                .long("shared")
                .action(ArgAction::SetTrue)
                .help("Take shared locks (default)"),
        )
        .arg(
            Arg::new("blocking")
                .short('w')
                .long("blocking")
                .action(ArgAction::SetTrue)
                .conflicts_with("non-blocking")
                .help("Wait until every lock is available"),
        )
        .arg(
            Arg::new("non-blocking")
                .short('n')
                .long("non-blocking")
                .action(ArgAction::SetTrue)
                .help("Fail immediately on contention (default)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Config file (defaults to ./lockset.toml if present)"),
        )
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .num_args(1..)
                .value_parser(value_parser!(PathBuf))
                .help("Files to lock, in order"),
        )
}
