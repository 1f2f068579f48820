mod cli;
mod pipeline;

use clap::Parser;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    pipeline::telemetry::init_tracing();
    let args = cli::GateArgs::parse();
    let config = pipeline::GateConfig::try_from(args)?;
    pipeline::run(config)
}
