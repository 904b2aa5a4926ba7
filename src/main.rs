use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use readhelper::cli::{self, Cli};
use readhelper::panic_handler;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let log_path = cli::log_file(&cli::log_dir(&cli)?);
    let log_file =
        File::create(&log_path).with_context(|| format!("Could not create log file {log_path:?}"))?;
    WriteLogger::init(
        level,
        ConfigBuilder::new()
            .add_filter_ignore_str("reqwest")
            .add_filter_ignore_str("rustls")
            .build(),
        log_file,
    )?;

    panic_handler::initialize_panic_handler();
    info!("Starting readhelper {}", env!("CARGO_PKG_VERSION"));

    let result = cli::run(cli);
    if let Err(e) = &result {
        error!("Application error: {e:?}");
    }

    info!("Shutting down readhelper");
    result
}
