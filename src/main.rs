use anyhow::Result;
use clap::Parser;
use log::info;

use my_scripts::cli;

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();
    info!("Starting my-scripts v{}", env!("CARGO_PKG_VERSION"));

    let code = cli::run(args)?;
    std::process::exit(code)
}
