use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::time::MissedTickBehavior;

use rigtrack::cloudlog::{CloudlogSink, Observation};
use rigtrack::ident::identify;
use rigtrack::rig::{RigClient, RigError, DEFAULT_READ_TIMEOUT};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "rig2log")]
#[command(about = "Post observed rig frequencies and modes to CloudLog")]
struct Cli {
    /// API key
    #[arg(short, long)]
    apikey: String,
    /// API URL
    #[arg(short = 'u', long, default_value = "http://localhost:9005/api/radio")]
    apiurl: String,
    /// Radio name
    #[arg(short, long, default_value = "Radio")]
    name: String,
    /// rigctld host
    #[arg(short, long, default_value = "localhost")]
    righost: String,
    /// rigctld port
    #[arg(short = 'p', long, default_value_t = 4532)]
    rigport: u16,
    /// Increase verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let addr = format!("{}:{}", cli.righost, cli.rigport);
    let mut rig = match RigClient::connect(&addr, DEFAULT_READ_TIMEOUT).await {
        Ok(rig) => rig,
        Err(e) => {
            log::error!("cannot reach rigctld at {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("connected to rig at {}", addr);

    let sink = CloudlogSink::new(&cli.apiurl);

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = report_once(&mut rig, &sink, &cli).await {
                    log::warn!("skipping cycle: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Err(e) = rig.close().await {
        log::warn!("rig close failed: {}", e);
    }
    log::info!("exiting");
    ExitCode::SUCCESS
}

/// One poll cycle: read both VFOs, classify, post.
async fn report_once(rig: &mut RigClient, sink: &CloudlogSink, cli: &Cli) -> Result<(), RigError> {
    let vfoa = parse_hz(&first_value(rig.query_multi("f").await?)?)?;
    let mode_a = first_value(rig.query_multi("m").await?)?;
    let vfob = parse_hz(&first_value(rig.query_multi("i").await?)?)?;
    let mode_b = first_value(rig.query_multi("x").await?)?;
    let split = first_value(rig.query_multi("s").await?)?;

    // VFO A receives (downlink), VFO B transmits (uplink).
    let sat_name = identify(vfob, vfoa);
    let observation = Observation::new(
        &cli.apikey,
        &cli.name,
        vfob,
        mode_b.clone(),
        vfoa,
        mode_a.clone(),
        sat_name,
    );

    if let Err(e) = sink.post(&observation).await {
        log::warn!("observation not recorded upstream: {}", e);
    }

    log::info!(
        "sat: {}, dn: {} {} up: {} {}, split: {}",
        sat_name.unwrap_or(""),
        vfoa,
        mode_a,
        vfob,
        mode_b,
        split
    );
    Ok(())
}

fn first_value(values: Vec<String>) -> Result<String, RigError> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| RigError::MalformedResponse("response carried no data lines".to_string()))
}

fn parse_hz(value: &str) -> Result<i64, RigError> {
    value
        .parse()
        .map_err(|_| RigError::MalformedResponse(format!("unparseable frequency {:?}", value)))
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
