use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid grid locator: {0}")]
    InvalidLocator(String),
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("satellite {0} not found in element set")]
    SatelliteNotFound(u32),
    #[error("element fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("element cache error: {0}")]
    Cache(#[from] std::io::Error),
}
