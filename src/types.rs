use serde::{Serialize, Serializer};
use std::{fmt::Display, time::Duration};

/// A single probe result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// 1-based position of the request within the run
    pub index: usize,
    #[serde(serialize_with = "serialize_status")]
    pub status: http::StatusCode,
    /// Round-trip time, including reading the response body
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Length of the response body in bytes
    pub content_length: usize,
}

impl Sample {
    pub fn new(
        index: usize,
        status: http::StatusCode,
        elapsed: Duration,
        content_length: usize,
    ) -> Self {
        Sample {
            index,
            status,
            elapsed,
            content_length,
        }
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Request {}: Status Code - {}, Response Time - {:.4} seconds",
            self.index,
            self.status.as_u16(),
            self.elapsed.as_secs_f64()
        )
    }
}

fn serialize_status<S>(status: &http::StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

fn serialize_secs<S>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Fatal errors that abandon a probe run
#[derive(Debug)]
pub enum ProbeError {
    /// The target is not an absolute URL with a scheme and a host
    InvalidUrl(String),
    /// The run configuration cannot be used (e.g. zero requests)
    InvalidConfig(String),
    /// Transport-level failure: connection, DNS, TLS, timeout or body read
    Request(reqwest::Error),
}

impl Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::InvalidUrl(reason) => write!(f, "Invalid URL provided: {}", reason),
            ProbeError::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
            ProbeError::Request(e) => write!(f, "Request failed: {}", e),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        ProbeError::Request(e)
    }
}
