use clap::Parser;

mod cli;
mod serve;

use cli::commands::CliArgs;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    cli::run(args)
}
