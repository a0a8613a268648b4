use std::process::ExitCode;

use thor_cli::args::{self, Invocation};

const EXIT_FAILURE: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    thor_cli::init_tracing();

    let config = match args::parse(std::env::args_os()) {
        Invocation::Run(config) => config,
        Invocation::Exit { code, output, to_stderr } => {
            if to_stderr { eprint!("{}", output) } else { print!("{}", output) }
            return ExitCode::from(code);
        }
    };

    match thor_cli::run(config).await {
        Ok(summary) => {
            tracing::info!(target: "cli", requests = summary.total_requests(), "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("thor: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
