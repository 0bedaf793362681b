use std::process::ExitCode;

use clap::Parser;

use ytaudio_lib::{commands, logging, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit 1 like every other failure; --help/--version exit 0
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if commands::run(&cli).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
