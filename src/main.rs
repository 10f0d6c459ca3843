use std::{path::PathBuf, process};

use clap::{error::ErrorKind, Parser};
use log::error;

use crate::config::Config;

mod ast;
mod config;
mod driver;
mod error;
#[cfg(test)]
mod hack;
mod parser;
mod translator;

/// Translates Hack VM code into Hack assembly.
///
/// Given a `.vm` file, writes the `.asm` file next to it. Given a directory,
/// translates every `.vm` file in it into `<dir>/<dir>.asm`.
#[derive(clap::Parser, Debug)]
#[command(version)]
struct Cli {
    /// A .vm file or a directory of .vm files
    path: PathBuf,

    /// Do not emit the SP setup and the call to Sys.init
    #[arg(long)]
    no_bootstrap: bool,

    /// Precede each command's code with the VM command as a comment
    #[arg(long)]
    annotate: bool,

    /// Raise the log level (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            eprint!("{}", err);
            process::exit(1);
        }
    });
    init_logging(cli.verbose);

    let result = Config::new(&cli.path).and_then(|mut config| {
        config.bootstrap = !cli.no_bootstrap;
        config.annotate = cli.annotate;
        driver::run(&config)
    });

    if let Err(e) = result {
        error!("{:?}", e);
        eprintln!("vm-translator: {}", e);
        process::exit(1);
    }
}
