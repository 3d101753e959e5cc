//! Yunque CLI — plan-driven build/test orchestration.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "yunque",
    version,
    about = "Plan-driven build/test orchestration — action-graph resolution and sandboxed build trees"
)]
struct Cli {
    #[command(subcommand)]
    command: yunque::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = yunque::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
