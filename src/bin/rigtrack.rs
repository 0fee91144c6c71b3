use std::process::ExitCode;

use clap::Parser;
use tokio::sync::oneshot;

use rigtrack::predict::{resolve_satellite, satellite_label, GroundStation};
use rigtrack::track::{Tracker, TrackingSession};

#[derive(Parser)]
#[command(name = "rigtrack")]
#[command(about = "Doppler-steer a radio (and rotator) onto a satellite")]
struct Cli {
    /// Your Maidenhead locator
    #[arg(short, long)]
    locator: String,
    /// Your elevation above sea level in meters
    #[arg(short, long, default_value_t = 0)]
    elevation: i32,
    /// Base frequency to track, in Hz
    #[arg(short, long, default_value_t = 435_310_000)]
    freq: i64,
    /// TX tuning step in Hz
    #[arg(short, long, default_value_t = 50)]
    tunestep: i64,
    /// NORAD catalog id to track
    #[arg(short, long, default_value_t = 53_106)]
    norad: u32,
    /// rigctld host
    #[arg(short, long, default_value = "localhost")]
    righost: String,
    /// rigctld port
    #[arg(short = 'p', long, default_value_t = 4532)]
    rigport: u16,
    /// rotctld host; empty disables the rotator
    #[arg(long, default_value = "")]
    rothost: String,
    /// rotctld port
    #[arg(long, default_value_t = 4533)]
    rotport: u16,
    /// Horizon elevation in degrees; below it the rotator parks at the next
    /// rise point
    #[arg(long, default_value_t = 0.0)]
    horizon: f64,
    /// Minimum az/el movement in degrees before the rotator is commanded
    #[arg(long, default_value_t = 1.0)]
    threshold: f64,
    /// Disable absorption of manual retuning into the tuning offset
    #[arg(long)]
    no_tuning: bool,
    /// Increase verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let station = match GroundStation::from_locator(&cli.locator, cli.elevation as f64) {
        Ok(station) => station,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "locator {}, lat {:.4}, lon {:.4}",
        cli.locator,
        station.latitude_deg,
        station.longitude_deg
    );

    let elements = match resolve_satellite(cli.norad).await {
        Ok(elements) => elements,
        Err(e) => {
            log::error!("failed to resolve satellite {}: {}", cli.norad, e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("sat: {}", satellite_label(&elements));
    log::info!("base frequency {:.3} MHz", cli.freq as f64 / 1_000_000.0);

    let session = TrackingSession {
        base_frequency_hz: cli.freq,
        tune_step_hz: cli.tunestep,
        horizon_deg: cli.horizon,
        pointing_threshold_deg: cli.threshold,
        tuning_enabled: !cli.no_tuning,
    };

    let radio_addr = format!("{}:{}", cli.righost, cli.rigport);
    let rotator_addr = if cli.rothost.is_empty() {
        None
    } else {
        Some(format!("{}:{}", cli.rothost, cli.rotport))
    };

    let tracker = match Tracker::connect(
        &radio_addr,
        rotator_addr.as_deref(),
        session,
        station,
        elements,
    )
    .await
    {
        Ok(tracker) => tracker,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, shutting down");
            let _ = stop_tx.send(());
        }
    });

    match tracker.run(stop_rx).await {
        Ok(()) => {
            log::info!("exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
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
