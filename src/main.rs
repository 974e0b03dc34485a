use clap::Parser;
use tracing_subscriber::EnvFilter;

use buildquote::cli::{Cli, run_command};
use buildquote::config::{Config, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("buildquote=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    run_command(cli.command, config).await
}
