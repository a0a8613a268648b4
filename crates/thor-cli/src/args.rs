use std::ffi::OsString;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use thor_common::config::{LoadConfig, TransportErrorPolicy};

pub const EXIT_USAGE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "thor", version, about = "Hammer a URL with timed sequential GETs from a pool of workers")]
pub struct Cli {
    /// Display verbose output (full response bodies)
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of processes to utilize
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub processes: u32,

    /// Number of requests per process
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub requests: u32,

    /// Maximum concurrent workers [default: number of CPU cores]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Per-request timeout in seconds (no timeout when omitted)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Abort a process on the first connection-level failure instead of recording it
    #[arg(long)]
    pub abort_on_error: bool,

    /// Target URL
    pub url: String,
}

impl Cli {
    pub fn into_config(self) -> LoadConfig {
        LoadConfig {
            url: self.url,
            processes: self.processes,
            requests: self.requests,
            verbose: self.verbose,
            workers: self.workers,
            timeout: self.timeout.map(Duration::from_secs),
            on_transport_error: if self.abort_on_error {
                TransportErrorPolicy::Abort
            } else {
                TransportErrorPolicy::Record
            },
        }
    }
}

/// What `main` should do with argv.
#[derive(Debug)]
pub enum Invocation {
    Run(LoadConfig),
    Exit { code: u8, output: String, to_stderr: bool },
}

pub fn parse<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    // -h wins over anything else on the line, malformed values included
    if help_requested(&args) {
        let help = Cli::command().render_help().to_string();
        return Invocation::Exit { code: 0, output: help, to_stderr: false };
    }
    match Cli::try_parse_from(&args) {
        Ok(cli) => Invocation::Run(cli.into_config()),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Invocation::Exit { code: 0, output: e.to_string(), to_stderr: false }
        }
        Err(e) => Invocation::Exit { code: EXIT_USAGE, output: e.to_string(), to_stderr: true },
    }
}

fn help_requested(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|a| a.as_os_str() != "--")
        .any(|a| a.as_os_str() == "-h" || a.as_os_str() == "--help")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config(args: &[&str]) -> LoadConfig {
        match parse(args.iter().copied()) {
            Invocation::Run(cfg) => cfg,
            other => panic!("expected a run, got {:?}", other),
        }
    }

    fn exit_code(args: &[&str]) -> u8 {
        match parse(args.iter().copied()) {
            Invocation::Exit { code, .. } => code,
            Invocation::Run(cfg) => panic!("expected an exit, got {:?}", cfg),
        }
    }

    #[test]
    fn defaults() {
        let cfg = run_config(&["thor", "http://localhost:9898"]);
        assert_eq!(cfg.url, "http://localhost:9898");
        assert_eq!(cfg.processes, 1);
        assert_eq!(cfg.requests, 1);
        assert!(!cfg.verbose);
        assert_eq!(cfg.workers, None);
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.on_transport_error, TransportErrorPolicy::Record);
    }

    #[test]
    fn all_flags() {
        let cfg = run_config(&[
            "thor", "-v", "-p", "4", "-r", "10", "-w", "2", "-t", "5", "--abort-on-error", "http://h/x",
        ]);
        assert!(cfg.verbose);
        assert_eq!(cfg.processes, 4);
        assert_eq!(cfg.requests, 10);
        assert_eq!(cfg.workers, Some(2));
        assert_eq!(cfg.timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.on_transport_error, TransportErrorPolicy::Abort);
    }

    #[test]
    fn usage_errors_exit_one() {
        assert_eq!(exit_code(&["thor"]), EXIT_USAGE);
        assert_eq!(exit_code(&["thor", "-p", "abc", "http://h/"]), EXIT_USAGE);
        assert_eq!(exit_code(&["thor", "-p", "0", "http://h/"]), EXIT_USAGE);
        assert_eq!(exit_code(&["thor", "-r", "-3", "http://h/"]), EXIT_USAGE);
        assert_eq!(exit_code(&["thor", "http://a/", "http://b/"]), EXIT_USAGE);
        assert_eq!(exit_code(&["thor", "-x", "http://h/"]), EXIT_USAGE);
        assert_eq!(exit_code(&["thor", "http://h/", "-p"]), EXIT_USAGE);
    }

    #[test]
    fn help_wins() {
        assert_eq!(exit_code(&["thor", "-h"]), 0);
        assert_eq!(exit_code(&["thor", "-p", "abc", "-h", "http://h/"]), 0);
        match parse(["thor", "--help"]) {
            Invocation::Exit { output, to_stderr, .. } => {
                assert!(output.contains("Usage"));
                assert!(!to_stderr);
            }
            other => panic!("expected help, got {:?}", other),
        }
    }
}
