use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use super::error::PredictError;
use super::ground_station::{GroundStation, EARTH_ROTATION_RAD_S};

/// Satellite geometry relative to a ground station at one instant.
#[derive(Debug, Clone, Copy)]
pub struct TrackState {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    /// Positive when the satellite is receding from the observer.
    pub range_rate_km_s: f64,
}

/// Propagate the satellite to `timestamp` and compute look angles, range and
/// range-rate as seen from `station`.
pub fn track_state(
    station: &GroundStation,
    elements: &Elements,
    constants: &Constants,
    timestamp: DateTime<Utc>,
) -> Result<TrackState, PredictError> {
    let minutes = elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let prediction = constants
        .propagate(minutes)
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let gmst =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));

    let sat_pos = teme_to_ecef_position(prediction.position, gmst);
    let sat_vel = teme_to_ecef_velocity(prediction.position, prediction.velocity, gmst);
    let sta_pos = station.position_ecef_km();
    let sta_vel = station.velocity_ecef_km_s();

    let dr = sub(sat_pos, sta_pos);
    let range_km = norm(dr);

    let (east, north, up) = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
    let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation_deg = if range_km > 0.0 {
        (up / range_km).asin().to_degrees()
    } else {
        0.0
    };

    // Range-rate is the relative velocity projected on the line of sight.
    let range_rate_km_s = if range_km > 0.0 {
        dot(sub(sat_vel, sta_vel), dr) / range_km
    } else {
        0.0
    };

    Ok(TrackState {
        azimuth_deg,
        elevation_deg,
        range_km,
        range_rate_km_s,
    })
}

fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    // Subtract the frame rotation of the ECEF frame itself.
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const ISS_TLE: (&str, &str) = (
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
    );

    fn iss() -> (Elements, Constants) {
        let elements = Elements::from_tle(
            Some("ISS (ZARYA)".to_string()),
            ISS_TLE.0.as_bytes(),
            ISS_TLE.1.as_bytes(),
        )
        .unwrap();
        let constants = Constants::from_elements(&elements).unwrap();
        (elements, constants)
    }

    #[test]
    fn geometry_stays_in_physical_bounds() {
        let (elements, constants) = iss();
        let station = GroundStation::from_locator("JN58td", 520.0).unwrap();
        let epoch: DateTime<Utc> = DateTime::from_naive_utc_and_offset(elements.datetime, Utc);

        for minute in 0..90 {
            let state =
                track_state(&station, &elements, &constants, epoch + Duration::minutes(minute))
                    .unwrap();
            assert!((0.0..360.0).contains(&state.azimuth_deg));
            assert!((-90.0..=90.0).contains(&state.elevation_deg));
            // LEO slant range from the ground: above the orbit altitude,
            // below the horizon-limited maximum.
            assert!(state.range_km > 300.0 && state.range_km < 20_000.0);
            assert!(state.range_rate_km_s.abs() < 8.0);
        }
    }

    #[test]
    fn range_rate_changes_sign_across_a_pass() {
        let (elements, constants) = iss();
        let station = GroundStation::from_locator("JN58td", 0.0).unwrap();
        let epoch: DateTime<Utc> = DateTime::from_naive_utc_and_offset(elements.datetime, Utc);

        let mut approaching = false;
        let mut receding = false;
        for minute in 0..180 {
            let state =
                track_state(&station, &elements, &constants, epoch + Duration::minutes(minute))
                    .unwrap();
            if state.range_rate_km_s < -1.0 {
                approaching = true;
            }
            if state.range_rate_km_s > 1.0 {
                receding = true;
            }
        }
        assert!(approaching && receding);
    }
}
