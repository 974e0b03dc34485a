//! Command-line interface.
//!
//! - `serve`: run the authoritative quote API
//! - `estimate`: price a project (authoritative first, local fallback)
//! - `rates`: show the rate table a session would use

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::config::{ClientConfig, Config, ServerConfig};
use crate::estimation::{
    AreaUnit, CalculateRequest, ElectricalTier, MaterialQuality, PlumbingTier, RateSource,
    format_inr, render_breakdown,
};
use crate::service::{
    CalculationPath, DualPathEstimator, QuoteServer, QuoteState, estimate_offline,
};

#[derive(Parser, Debug)]
#[command(name = "buildquote", version, about = "Construction cost estimation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the authoritative quote API
    Serve {
        /// Address to bind
        #[arg(long, env = "BUILDQUOTE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "BUILDQUOTE_PORT")]
        port: Option<u16>,

        /// JSON rate table to serve (built-in rates when omitted)
        #[arg(long, env = "BUILDQUOTE_RATES_FILE")]
        rates_file: Option<PathBuf>,
    },

    /// Estimate the cost of a project
    Estimate(EstimateArgs),

    /// Show the rate table in effect for a session
    Rates {
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// Base URL of the quote API
    #[arg(long, env = "BUILDQUOTE_API_URL")]
    pub api_url: Option<String>,

    /// Timeout for the authoritative path, in seconds
    #[arg(long, env = "BUILDQUOTE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct EstimateArgs {
    /// Read the request from a JSON file instead of flags
    #[arg(long, conflicts_with = "area")]
    pub request: Option<PathBuf>,

    /// Built-up area
    #[arg(long, required_unless_present = "request")]
    pub area: Option<Decimal>,

    #[arg(long, default_value = "sqft")]
    pub unit: AreaUnit,

    #[arg(long, default_value = "standard")]
    pub quality: MaterialQuality,

    #[arg(long, default_value = "standard")]
    pub electrical: ElectricalTier,

    #[arg(long, default_value = "standard")]
    pub plumbing: PlumbingTier,

    /// False-ceiling area in sqft (enables false ceiling)
    #[arg(long)]
    pub false_ceiling_area: Option<Decimal>,

    #[arg(long)]
    pub labor_rate: Option<Decimal>,

    #[arg(long)]
    pub supervision_percent: Option<Decimal>,

    /// Flat transport charge
    #[arg(long)]
    pub transport: Option<Decimal>,

    #[arg(long)]
    pub contingency_percent: Option<Decimal>,

    #[arg(long)]
    pub gst_percent: Option<Decimal>,

    /// Calculate locally with the built-in rates, without contacting the service
    #[arg(long)]
    pub offline: bool,

    /// Print the breakdown as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

impl EstimateArgs {
    fn to_request(&self) -> anyhow::Result<CalculateRequest> {
        if let Some(path) = &self.request {
            let raw = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&raw)?);
        }

        Ok(CalculateRequest {
            area: self.area,
            unit: self.unit,
            material_quality: Some(self.quality),
            electrical: Some(self.electrical),
            plumbing: Some(self.plumbing),
            false_ceiling: self.false_ceiling_area.is_some(),
            false_ceiling_area: self.false_ceiling_area,
            labor_rate: self.labor_rate,
            supervision_percent: self.supervision_percent,
            transport_charges: self.transport,
            contingency_percent: self.contingency_percent,
            gst_percent: self.gst_percent,
        })
    }
}

fn client_config(base: &ClientConfig, remote: &RemoteArgs) -> ClientConfig {
    ClientConfig {
        base_url: remote
            .api_url
            .clone()
            .unwrap_or_else(|| base.base_url.clone()),
        timeout: remote
            .timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(base.timeout),
    }
}

/// Run a CLI command.
pub async fn run_command(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Serve {
            host,
            port,
            rates_file,
        } => {
            let server = ServerConfig {
                host: host.unwrap_or(config.server.host),
                port: port.unwrap_or(config.server.port),
                rates_file: rates_file.or(config.server.rates_file),
            };
            serve(server).await
        }
        Command::Estimate(args) => estimate(args, &config.client).await,
        Command::Rates { remote } => show_rates(client_config(&config.client, &remote)).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let table = config.load_rate_table()?;
    if !table.is_complete() {
        tracing::info!("Rate table is partial; missing fields use built-in rates");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let mut server = QuoteServer::new(addr, QuoteState::new(table));
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    server.shutdown().await;
    Ok(())
}

async fn estimate(args: EstimateArgs, base: &ClientConfig) -> anyhow::Result<()> {
    let request = args.to_request()?;

    let estimate = if args.offline {
        estimate_offline(&request)?
    } else {
        DualPathEstimator::over_http(client_config(base, &args.remote))
            .estimate(&request)
            .await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate.breakdown)?);
        return Ok(());
    }

    match &estimate.path {
        CalculationPath::Authoritative => println!("Calculated by the quote service"),
        CalculationPath::LocalFallback {
            reason,
            rate_source,
        } => {
            println!("Calculated locally ({})", reason);
            if let RateSource::Fallback { .. } = rate_source {
                println!("Using fallback rates");
            }
        }
    }
    println!();
    print!("{}", render_breakdown(&estimate.breakdown));
    println!();
    println!("Estimated total: {}", format_inr(estimate.breakdown.total));

    Ok(())
}

async fn show_rates(config: ClientConfig) -> anyhow::Result<()> {
    let estimator = DualPathEstimator::over_http(config);
    let snapshot = estimator.rate_snapshot().await;

    if let RateSource::Fallback { reason } = &snapshot.source {
        eprintln!("Using fallback rates: {}", reason);
    }
    println!("{}", serde_json::to_string_pretty(&snapshot.table)?);
    Ok(())
}
