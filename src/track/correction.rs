/// Speed of light in km/s, at the precision the Doppler arithmetic uses.
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.0;

/// Immutable per-session tracking configuration.
#[derive(Debug, Clone, Copy)]
pub struct TrackingSession {
    pub base_frequency_hz: i64,
    pub tune_step_hz: i64,
    pub horizon_deg: f64,
    pub pointing_threshold_deg: f64,
    pub tuning_enabled: bool,
}

/// Per-tick output of the correction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub uplink_hz: i64,
    pub downlink_hz: i64,
    pub doppler_hz: i64,
}

/// State threaded through the tracking loop, mutated once per tick.
///
/// `tuning_offset_hz` accumulates only the delta between the radio's
/// self-reported receive frequency and the last commanded downlink; it is
/// never reset during a session.
#[derive(Debug, Default, Clone, Copy)]
pub struct CorrectionState {
    prior_downlink_hz: Option<i64>,
    prior_uplink_hz: Option<i64>,
    tuning_offset_hz: i64,
}

impl CorrectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tuning_offset_hz(&self) -> i64 {
        self.tuning_offset_hz
    }

    /// Compute this tick's Doppler-shifted uplink/downlink pair.
    ///
    /// When tuning is enabled, any difference between the observed receive
    /// frequency and the previously commanded downlink is first absorbed into
    /// the tuning offset, so a manual retune by the operator persists and
    /// applies symmetrically to future uplink commands.
    pub fn correct(
        &mut self,
        session: &TrackingSession,
        range_rate_km_s: f64,
        observed_rx_hz: Option<i64>,
    ) -> Correction {
        if session.tuning_enabled {
            if let (Some(prior), Some(observed)) = (self.prior_downlink_hz, observed_rx_hz) {
                self.tuning_offset_hz += observed - prior;
            }
        }

        let doppler_hz = (range_rate_km_s / SPEED_OF_LIGHT_KM_S
            * session.base_frequency_hz as f64)
            .round() as i64;
        let downlink_hz = session.base_frequency_hz - doppler_hz + self.tuning_offset_hz;
        let uplink_hz = session.base_frequency_hz + doppler_hz + self.tuning_offset_hz;

        // The drift baseline tracks the commanded downlink even when tuning
        // is disabled.
        self.prior_downlink_hz = Some(downlink_hz);

        Correction {
            uplink_hz,
            downlink_hz,
            doppler_hz,
        }
    }

    /// Whether the uplink moved far enough from the last commanded value to
    /// be worth retuning. Uplink retuning is coarser than downlink to avoid
    /// PTT-side glitches.
    pub fn uplink_due(&self, uplink_hz: i64, tune_step_hz: i64) -> bool {
        match self.prior_uplink_hz {
            Some(prior) => (uplink_hz - prior).abs() > tune_step_hz,
            None => true,
        }
    }

    /// Record an uplink frequency that was actually commanded.
    pub fn record_uplink(&mut self, uplink_hz: i64) {
        self.prior_uplink_hz = Some(uplink_hz);
    }
}
