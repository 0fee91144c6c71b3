mod correction;
mod error;
mod pointing;
mod tracker;

pub use correction::{Correction, CorrectionState, TrackingSession, SPEED_OF_LIGHT_KM_S};
pub use error::TrackError;
pub use pointing::PointingState;
pub use tracker::{SessionState, Tracker};
