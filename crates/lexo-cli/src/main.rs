//! `lexo` binary entry point.

use clap::Parser;
use lexo_app::{DriverEvent, Runtime};
use lexo_cli::{Cli, CliError, Mode, PlayArgs, TerminalDriver, practice};
use lexo_client::{ClientConfig, ClientEvent};
use lexo_core::SystemEnv;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(&cli.log_filter)?;

    match cli.command {
        Mode::Play(args) => play(args).await,
        Mode::Practice(args) => practice::run(&args).await.map(|_| ()),
    }
}

/// Log to stderr so game output on stdout stays readable.
fn init_logging(filter: &str) -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logger(e.to_string()))
}

async fn play(args: PlayArgs) -> Result<(), CliError> {
    info!(url = %args.url, name = %args.name, "starting");
    let mut driver = TerminalDriver::new();
    driver.say(lexo_cli::commands::HELP)?;

    let mut runtime = Runtime::new(
        driver,
        SystemEnv,
        args.identity(),
        args.url.clone(),
        ClientConfig::default(),
        args.connection_config(),
    );
    if args.resume {
        runtime.handle_driver_event(DriverEvent::Input(ClientEvent::Join { resume: true })).await?;
    }
    runtime.run().await?;
    Ok(())
}
