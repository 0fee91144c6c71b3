/// Last position actually commanded to the rotator.
///
/// Movement hysteresis is measured against this, not against the last
/// computed target, so sub-threshold jitter never floods the rotator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointingState {
    last_azimuth_deg: Option<f64>,
    last_elevation_deg: Option<f64>,
}

impl PointingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether to move. Returns the command target when either axis
    /// drifted past `threshold_deg` since the last commanded position (or
    /// when nothing was commanded yet) and remembers it as commanded.
    pub fn plan_move(
        &mut self,
        threshold_deg: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
    ) -> Option<(f64, f64)> {
        let due = match (self.last_azimuth_deg, self.last_elevation_deg) {
            (Some(last_az), Some(last_el)) => {
                (azimuth_deg - last_az).abs() > threshold_deg
                    || (elevation_deg - last_el).abs() > threshold_deg
            }
            _ => true,
        };

        if due {
            self.last_azimuth_deg = Some(azimuth_deg);
            self.last_elevation_deg = Some(elevation_deg);
            Some((azimuth_deg, elevation_deg))
        } else {
            None
        }
    }
}
