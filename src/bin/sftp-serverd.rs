//! `sftp-serverd`: the standalone forking TCP daemon entrypoint. Refuses to
//! start without `--listen`, since unlike `sftp-server` it has no sensible
//! stdio fallback.

use std::process::ExitCode;

use clap::Parser;
use daemon::{Cli, DaemonError, RuntimeOptions};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::Verbosity::from_flag_count(cli.debug));
    run(&cli)
}

fn run(cli: &Cli) -> ExitCode {
    match run_fallible(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sftp-serverd: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_fallible(cli: &Cli) -> Result<(), DaemonError> {
    if cli.listen.is_none() {
        return Err(DaemonError::ListenRequired);
    }

    let options = RuntimeOptions::from_cli(cli)?;
    daemon::privilege::apply(&options)?;

    #[cfg(unix)]
    platform::ignore_sigpipe()?;

    daemon::accept::run(&options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_to_start_without_listen() {
        let cli = Cli::parse_from(["sftp-serverd"]);
        assert_eq!(run(&cli), ExitCode::FAILURE);
    }
}
