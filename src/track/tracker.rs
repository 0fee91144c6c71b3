use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sgp4::{Constants, Elements};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::predict::{next_crossing, track_state, GroundStation, PredictError};
use crate::rig::{RigClient, RigError, DEFAULT_READ_TIMEOUT};

use super::correction::{CorrectionState, TrackingSession};
use super::error::TrackError;
use super::pointing::PointingState;

/// Radio setup: split VFOs, USB on both, fixed 2300 Hz passband. Independent
/// uplink/downlink control requires all three.
const INIT_COMMANDS: [&str; 3] = ["S 1 VFOB", "M USB 2300", "X USB 2300"];
/// Restores single-VFO operation on the way out.
const RESTORE_COMMAND: &str = "S 0 VFOA";

/// How far ahead to look for the next rise when parking the rotator.
const RISE_SEARCH_WINDOW_HOURS: i64 = 12;

const TICK: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Initializing,
    Tracking,
    ShuttingDown,
    Closed,
}

/// The tracking loop: one satellite, one radio, optionally one rotator.
pub struct Tracker {
    session: TrackingSession,
    station: GroundStation,
    elements: Elements,
    constants: Constants,
    radio: RigClient,
    rotator: Option<RigClient>,
    correction: CorrectionState,
    pointing: PointingState,
    state: SessionState,
}

impl Tracker {
    /// Open the device connections. "No rotator" is simply `None`; every
    /// other code path is shared.
    pub async fn connect(
        radio_addr: &str,
        rotator_addr: Option<&str>,
        session: TrackingSession,
        station: GroundStation,
        elements: Elements,
    ) -> Result<Self, TrackError> {
        let constants = Constants::from_elements(&elements).map_err(PredictError::from)?;

        let radio = RigClient::connect(radio_addr, DEFAULT_READ_TIMEOUT)
            .await
            .map_err(TrackError::RadioConnect)?;
        log::info!("connected to radio at {}", radio_addr);

        let rotator = match rotator_addr {
            Some(addr) => {
                let client = RigClient::connect(addr, DEFAULT_READ_TIMEOUT)
                    .await
                    .map_err(TrackError::RotatorConnect)?;
                log::info!("connected to rotator at {}", addr);
                Some(client)
            }
            None => {
                log::info!("no rotator configured, pointing targets will be logged only");
                None
            }
        };

        Ok(Self {
            session,
            station,
            elements,
            constants,
            radio,
            rotator,
            correction: CorrectionState::new(),
            pointing: PointingState::new(),
            state: SessionState::Connecting,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Put the radio into split-VFO single-sideband mode. Failure here is
    /// fatal; the session never starts tracking on a misconfigured radio.
    async fn initialize(&mut self) -> Result<(), TrackError> {
        self.state = SessionState::Initializing;
        for command in INIT_COMMANDS {
            self.radio
                .query(command)
                .await
                .map_err(TrackError::Initialize)?;
        }
        Ok(())
    }

    /// Run until `stop_rx` fires. The stop signal is observed only between
    /// iterations, never mid-request, and always ends with the radio
    /// restored to unsplit mode and both connections closed.
    pub async fn run(mut self, mut stop_rx: oneshot::Receiver<()>) -> Result<(), TrackError> {
        self.initialize().await?;
        self.state = SessionState::Tracking;

        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(Utc::now()).await,
                _ = &mut stop_rx => break,
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// One tracking iteration. Transient failures are logged and forfeit the
    /// affected branch; the loop always proceeds to the next second.
    async fn tick(&mut self, now: DateTime<Utc>) {
        let geometry = match track_state(&self.station, &self.elements, &self.constants, now) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("propagation failed, skipping tick: {}", e);
                return;
            }
        };

        // The radio and the rotator are independent resources: a failure on
        // one branch must not suppress the other within the same tick.
        self.tune_radio(geometry.range_rate_km_s).await;
        self.point_rotator(geometry.azimuth_deg, geometry.elevation_deg, now)
            .await;
    }

    async fn tune_radio(&mut self, range_rate_km_s: f64) {
        match self.radio.query_multi("s").await {
            Ok(values) => {
                let split = values.first().map(String::as_str);
                if split != Some("1") {
                    log::warn!(
                        "radio is not in split mode (split = {:?}), skipping retune",
                        split.unwrap_or("<none>")
                    );
                    return;
                }
            }
            Err(e) => {
                log_query_failure("s", &e);
                return;
            }
        }

        // Drift absorption degrades gracefully: no readback, no update.
        let observed_rx_hz = if self.session.tuning_enabled {
            match self.radio.query("f").await {
                Ok(value) => match value.parse::<i64>() {
                    Ok(hz) => Some(hz),
                    Err(_) => {
                        log::warn!("unparseable receive frequency {:?}", value);
                        None
                    }
                },
                Err(e) => {
                    log_query_failure("f", &e);
                    None
                }
            }
        } else {
            None
        };

        let correction = self
            .correction
            .correct(&self.session, range_rate_km_s, observed_rx_hz);
        log::info!(
            "speed {:.2} km/s, doppler {}, uplink {}, downlink {}, tuning {}",
            range_rate_km_s,
            correction.doppler_hz,
            correction.uplink_hz,
            correction.downlink_hz,
            self.correction.tuning_offset_hz()
        );

        // Downlink follows every tick; uplink only past the tune step.
        let downlink_cmd = format!("F {}", correction.downlink_hz);
        if let Err(e) = self.radio.query(&downlink_cmd).await {
            log_query_failure(&downlink_cmd, &e);
            return;
        }

        if self
            .correction
            .uplink_due(correction.uplink_hz, self.session.tune_step_hz)
        {
            let uplink_cmd = format!("I {}", correction.uplink_hz);
            match self.radio.query(&uplink_cmd).await {
                Ok(_) => self.correction.record_uplink(correction.uplink_hz),
                Err(e) => log_query_failure(&uplink_cmd, &e),
            }
        }
    }

    async fn point_rotator(&mut self, azimuth_deg: f64, elevation_deg: f64, now: DateTime<Utc>) {
        let target = if elevation_deg < self.session.horizon_deg {
            // Below the horizon: park at the next rise point instead of
            // chasing an unusable negative-elevation target.
            match self.rise_target(now) {
                Some(target) => target,
                None => return,
            }
        } else {
            (azimuth_deg, elevation_deg)
        };

        let Some((az, el)) =
            self.pointing
                .plan_move(self.session.pointing_threshold_deg, target.0, target.1)
        else {
            return;
        };

        match &mut self.rotator {
            Some(rotator) => {
                let command = format!("P {:.2} {:.2}", az, el);
                if let Err(e) = rotator.query(&command).await {
                    log_query_failure(&command, &e);
                }
            }
            None => {
                log::info!("pointing target az {:.2} el {:.2} (no rotator)", az, el);
            }
        }
    }

    /// Predicted az/el at the next crossing of the session horizon.
    fn rise_target(&self, now: DateTime<Utc>) -> Option<(f64, f64)> {
        let window = ChronoDuration::hours(RISE_SEARCH_WINDOW_HOURS);
        let rise = match next_crossing(
            &self.station,
            &self.elements,
            &self.constants,
            now,
            window,
            self.session.horizon_deg,
        ) {
            Ok(Some(rise)) => rise,
            Ok(None) => {
                log::debug!("no rise above {:.1} deg within {}h", self.session.horizon_deg, RISE_SEARCH_WINDOW_HOURS);
                return None;
            }
            Err(e) => {
                log::warn!("rise prediction failed: {}", e);
                return None;
            }
        };

        match track_state(&self.station, &self.elements, &self.constants, rise) {
            Ok(state) => Some((state.azimuth_deg, state.elevation_deg)),
            Err(e) => {
                log::warn!("rise geometry failed: {}", e);
                None
            }
        }
    }

    /// Leave the radio usable: exactly one unsplit command, then close both
    /// connections.
    async fn shutdown(&mut self) {
        self.state = SessionState::ShuttingDown;

        if let Err(e) = self.radio.query(RESTORE_COMMAND).await {
            log::warn!("failed to restore unsplit mode: {}", e);
        }
        if let Err(e) = self.radio.close().await {
            log::warn!("radio close failed: {}", e);
        }
        if let Some(rotator) = self.rotator.as_mut() {
            if let Err(e) = rotator.close().await {
                log::warn!("rotator close failed: {}", e);
            }
        }

        self.state = SessionState::Closed;
        log::info!("session closed");
    }
}

fn log_query_failure(command: &str, error: &RigError) {
    log::warn!("query {:?} failed: {}", command, error);
}
