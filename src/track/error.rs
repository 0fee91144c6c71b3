use thiserror::Error;

use crate::predict::PredictError;
use crate::rig::RigError;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("radio connection failed: {0}")]
    RadioConnect(RigError),
    #[error("rotator connection failed: {0}")]
    RotatorConnect(RigError),
    #[error("radio initialization failed: {0}")]
    Initialize(RigError),
    #[error("predict error: {0}")]
    Predict(#[from] PredictError),
}
