use clap::Parser;
use trendsweep::cli::{init_logging, run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    run(cli)
}
