use clap::Parser;
use snapsort::cli::{Cli, run_cli};
use std::process;

fn main() {
    let cli = Cli::parse();
    process::exit(run_cli(&cli));
}
