use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use super::error::PredictError;
use super::ground_station::GroundStation;
use super::propagation::track_state;

const COARSE_STEP_SECONDS: i64 = 60;
const FINE_STEP_SECONDS: i64 = 1;

/// Find the next time the satellite rises through `threshold_deg`, searching
/// from `from` up to `from + window`. Returns `None` when no upward crossing
/// falls inside the window.
pub fn next_crossing(
    station: &GroundStation,
    elements: &Elements,
    constants: &Constants,
    from: DateTime<Utc>,
    window: Duration,
    threshold_deg: f64,
) -> Result<Option<DateTime<Utc>>, PredictError> {
    let coarse = Duration::seconds(COARSE_STEP_SECONDS);
    let end = from + window;

    let mut prev_above = track_state(station, elements, constants, from)?.elevation_deg
        >= threshold_deg;
    let mut cursor = from + coarse;

    while cursor <= end {
        let above =
            track_state(station, elements, constants, cursor)?.elevation_deg >= threshold_deg;
        if above && !prev_above {
            let refined = refine_crossing(
                station,
                elements,
                constants,
                cursor - coarse,
                cursor,
                threshold_deg,
            )?;
            return Ok(Some(refined));
        }
        prev_above = above;
        cursor += coarse;
    }

    Ok(None)
}

/// Binary search for the exact rise time between a below-threshold and an
/// above-threshold sample.
fn refine_crossing(
    station: &GroundStation,
    elements: &Elements,
    constants: &Constants,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    threshold_deg: f64,
) -> Result<DateTime<Utc>, PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above =
            track_state(station, elements, constants, mid)?.elevation_deg >= threshold_deg;
        if above {
            high = mid;
        } else {
            low = mid;
        }
    }

    Ok(high)
}
