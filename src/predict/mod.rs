mod error;
mod ground_station;
mod horizon;
mod propagation;
mod tle;

pub use error::PredictError;
pub use ground_station::{GroundStation, EARTH_ROTATION_RAD_S};
pub use horizon::next_crossing;
pub use propagation::{track_state, TrackState};
pub use tle::{resolve_satellite, satellite_label};
