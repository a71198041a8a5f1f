use candle_core::Device;
use clap::Parser;
use irl_core::rng;
use irl_exercises::{cli::Cli, runners};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    rng::set_seed(cli.seed);
    let device = if cli.cuda {
        Device::cuda_if_available(0)?
    } else {
        Device::Cpu
    };
    info!(seed = cli.seed, ?device, "running {:?}", cli.exercise);

    let report = runners::run(&cli, &device)?;
    println!("{report}");
    Ok(())
}
