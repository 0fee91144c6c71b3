use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// One snapshot of the radio, in the shape the CloudLog radio API expects.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub key: String,
    pub radio: String,
    /// Transmit (uplink) frequency in Hz.
    pub frequency: i64,
    pub mode: String,
    /// Receive (downlink) frequency in Hz.
    pub frequency_rx: i64,
    pub mode_rx: String,
    pub prop_mode: &'static str,
    pub sat_name: String,
}

impl Observation {
    pub fn new(
        key: &str,
        radio: &str,
        frequency: i64,
        mode: String,
        frequency_rx: i64,
        mode_rx: String,
        sat_name: Option<&str>,
    ) -> Self {
        Self {
            key: key.to_string(),
            radio: radio.to_string(),
            frequency,
            mode,
            frequency_rx,
            mode_rx,
            prop_mode: "SAT",
            sat_name: sat_name.unwrap_or("").to_string(),
        }
    }
}

/// Fire-and-forget logging sink. Failures are reported to the caller, who
/// logs and moves on; nothing here is ever fatal to the polling loop.
pub struct CloudlogSink {
    client: reqwest::Client,
    api_url: String,
}

impl CloudlogSink {
    pub fn new(api_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
        }
    }

    pub async fn post(&self, observation: &Observation) -> Result<(), SinkError> {
        self.client
            .post(&self.api_url)
            .json(observation)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
