mod client;
mod error;

pub use client::{RigClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
pub use error::RigError;
