//! `rate_limit_checker` probes a single URL with a serial burst of requests
//! and guesses whether the server applies rate limiting.
//!
//! The heuristics are deliberately simple: a mix of status codes (especially
//! 429 or 503), steadily increasing response times and varying response body
//! sizes are all reported as signs of throttling.
//!
//! ```no_run
//! use rate_limit_checker::{analyze, ClientBuilder, ProbeConfig, Prober, Target};
//! use std::error::Error;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!   let client = ClientBuilder::default().build()?;
//!   let target = Target::parse("https://example.com/login")?;
//!   let prober = Prober::new(client, ProbeConfig::new(10, 0.1)?);
//!   let findings = analyze(&prober.collect(&target).await?);
//!   println!("likely rate limited: {}", findings.rate_limited);
//!   Ok(())
//! }
//! ```

#[macro_use]
extern crate log;

mod client;
mod prober;
mod target;
mod types;

pub mod analysis;

pub use analysis::{analyze, Findings};
pub use client::{Client, ClientBuilder, Fetched, USER_AGENT};
pub use prober::{ProbeConfig, Prober, DELAY, NUM_REQUESTS};
pub use target::Target;
pub use types::*;
