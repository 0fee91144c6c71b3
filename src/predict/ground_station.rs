use super::error::PredictError;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

/// Observer location on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl GroundStation {
    /// Build a station from a Maidenhead grid locator (2 to 8 characters),
    /// placed at the center of the addressed cell.
    pub fn from_locator(locator: &str, altitude_m: f64) -> Result<Self, PredictError> {
        let (latitude_deg, longitude_deg) = locator_center(locator)?;
        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        let x = (n + alt_km) * cos_lat * lon.cos();
        let y = (n + alt_km) * cos_lat * lon.sin();
        let z = (n * (1.0 - e2) + alt_km) * sin_lat;
        [x, y, z]
    }

    pub fn velocity_ecef_km_s(&self) -> [f64; 3] {
        let pos = self.position_ecef_km();
        [
            -EARTH_ROTATION_RAD_S * pos[1],
            EARTH_ROTATION_RAD_S * pos[0],
            0.0,
        ]
    }
}

/// Decode a Maidenhead locator to the (lat, lon) of the cell center.
///
/// Pairs alternate longitude/latitude: field (A-R), square (0-9),
/// subsquare (A-X), extended square (0-9).
fn locator_center(locator: &str) -> Result<(f64, f64), PredictError> {
    let chars: Vec<char> = locator.trim().to_ascii_uppercase().chars().collect();
    if chars.len() < 2 || chars.len() > 8 || chars.len() % 2 != 0 {
        return Err(PredictError::InvalidLocator(locator.to_string()));
    }

    let mut lon = -180.0;
    let mut lat = -90.0;
    let mut lon_cell = 360.0;
    let mut lat_cell = 180.0;

    for (i, pair) in chars.chunks(2).enumerate() {
        let base = match i {
            0 => 18,
            2 => 24,
            _ => 10,
        };
        let lon_index = pair_index(pair[0], base, locator)?;
        let lat_index = pair_index(pair[1], base, locator)?;
        lon_cell /= base as f64;
        lat_cell /= base as f64;
        lon += lon_index as f64 * lon_cell;
        lat += lat_index as f64 * lat_cell;
    }

    Ok((lat + lat_cell / 2.0, lon + lon_cell / 2.0))
}

fn pair_index(c: char, base: u32, locator: &str) -> Result<u32, PredictError> {
    let index = if base == 10 {
        c.to_digit(10)
    } else {
        (c.is_ascii_uppercase()).then(|| c as u32 - 'A' as u32)
    };
    match index {
        Some(i) if i < base => Ok(i),
        _ => Err(PredictError::InvalidLocator(locator.to_string())),
    }
}
