//! `sftp-server`: the subsystem entrypoint sshd invokes as
//! `Subsystem sftp /usr/libexec/sftp-server`. Also accepts `--listen` to run
//! the standalone daemon loop in-process, for manual testing.

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
            eprintln!("sftp-server: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_fallible(cli: &Cli) -> Result<(), DaemonError> {
    let options = RuntimeOptions::from_cli(cli)?;
    daemon::privilege::apply(&options)?;

    #[cfg(unix)]
    platform::ignore_sigpipe()?;

    // draft-ietf-secsh-filexfer-13 §7.6: the server should not apply a
    // umask to the mode bits a client requests.
    #[cfg(unix)]
    unsafe_umask_zero();

    if options.standalone() {
        daemon::accept::run(&options)
    } else {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        daemon::server::serve(stdin.lock(), stdout.lock(), &options)
    }
}

#[cfg(unix)]
fn unsafe_umask_zero() {
    // SAFETY: `umask` has no preconditions; it only affects subsequently
    // created files in this process.
    unsafe {
        libc::umask(0);
    }
}
