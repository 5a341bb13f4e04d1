use std::process;

use lockset::cli::{build_cli, handlers};

/// Exit code for usage, configuration and I/O errors.
const ERROR_EXIT_CODE: i32 = 2;

fn main() {
    let matches = build_cli().get_matches();

    // Initialize tracing subscriber for logging
    let level = if matches.get_count("verbose") > 0 {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match handlers::dispatch(&matches) {
        Ok(code) => code,
        Err(err) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {err:#}");
            }
            ERROR_EXIT_CODE
        }
    };

    #[allow(clippy::exit)]
    process::exit(code);
}
