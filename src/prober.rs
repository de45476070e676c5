use crate::{
    client::Client,
    target::Target,
    types::{ProbeError, Sample},
};
use std::time::{Duration, SystemTime};
use tokio::time::sleep;

/// Number of requests sent when none is configured
pub const NUM_REQUESTS: usize = 10;
/// Seconds between two requests when none is configured
pub const DELAY: f64 = 0.1;

/// Settings for a single probe run
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub num_requests: usize,
    pub delay: Duration,
}

impl ProbeConfig {
    /// Check the raw settings before any request goes out.
    pub fn new(num_requests: usize, delay_secs: f64) -> Result<Self, ProbeError> {
        if num_requests == 0 {
            return Err(ProbeError::InvalidConfig(
                "number of requests must be at least 1".to_string(),
            ));
        }
        if !delay_secs.is_finite() || delay_secs < 0.0 {
            return Err(ProbeError::InvalidConfig(format!(
                "delay must be a non-negative number of seconds, got {}",
                delay_secs
            )));
        }
        let delay = Duration::try_from_secs_f64(delay_secs).map_err(|e| {
            ProbeError::InvalidConfig(format!("delay of {} seconds: {}", delay_secs, e))
        })?;
        Ok(ProbeConfig {
            num_requests,
            delay,
        })
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            num_requests: NUM_REQUESTS,
            delay: Duration::from_secs_f64(DELAY),
        }
    }
}

/// Sends a serial burst of GET requests to one target
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    config: ProbeConfig,
}

impl Prober {
    pub fn new(client: Client, config: ProbeConfig) -> Self {
        Prober { client, config }
    }

    /// Collect one sample per configured request.
    ///
    /// Requests never overlap. The first transport failure abandons the run
    /// and no samples are returned.
    pub async fn collect(&self, target: &Target) -> Result<Vec<Sample>, ProbeError> {
        // Grows per sample; a huge count must not allocate up front
        let mut samples = Vec::new();
        for index in 1..=self.config.num_requests {
            if index > 1 {
                sleep(self.config.delay).await;
            }

            let start = SystemTime::now();
            let fetched = self.client.get(target.url()).await?;
            // Wall clock may step backwards; count that as zero
            let elapsed = SystemTime::now()
                .duration_since(start)
                .unwrap_or_default();

            let sample = Sample::new(index, fetched.status, elapsed, fetched.content_length);
            debug!("{}", sample);
            samples.push(sample);
        }
        Ok(samples)
    }
}
