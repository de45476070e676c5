//! Heuristics that guess at rate limiting from a set of samples.
//!
//! None of these checks is authoritative. They look for the usual symptoms
//! of throttling: error statuses mixed into otherwise normal responses,
//! slowing responses and changing response bodies.

use crate::types::Sample;
use serde::Serialize;
use std::collections::BTreeSet;

/// Status codes servers typically answer with while throttling
pub const RATE_LIMIT_STATUS_CODES: [u16; 2] = [429, 503];

/// Summary of a completed probe run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Findings {
    pub total: usize,
    /// Distinct status codes observed
    pub status_codes: BTreeSet<u16>,
    /// More than one status code was seen
    pub status_varies: bool,
    /// Status codes vary and at least one of them is 429 or 503
    pub rate_limited: bool,
    /// Every response took at least as long as the one before
    pub increasing_times: bool,
    /// Distinct response body lengths observed
    pub content_lengths: BTreeSet<usize>,
    /// More than one body length was seen
    pub content_varies: bool,
}

impl Findings {
    /// The single status code seen across the run, if there was only one
    pub fn consistent_status(&self) -> Option<u16> {
        match self.status_codes.len() {
            1 => self.status_codes.iter().next().copied(),
            _ => None,
        }
    }
}

/// Run all heuristics over the samples of one run.
pub fn analyze(samples: &[Sample]) -> Findings {
    let status_codes: BTreeSet<u16> = samples.iter().map(|s| s.status.as_u16()).collect();
    let status_varies = status_codes.len() > 1;
    let rate_limited = status_varies
        && samples
            .iter()
            .any(|s| RATE_LIMIT_STATUS_CODES.contains(&s.status.as_u16()));

    let content_lengths: BTreeSet<usize> = samples.iter().map(|s| s.content_length).collect();
    let content_varies = content_lengths.len() > 1;

    Findings {
        total: samples.len(),
        status_codes,
        status_varies,
        rate_limited,
        increasing_times: increasing_times(samples),
        content_lengths,
        content_varies,
    }
}

// Deliberately naive: any jitter breaks the chain, and a single sample
// counts as increasing.
fn increasing_times(samples: &[Sample]) -> bool {
    samples.windows(2).all(|w| w[0].elapsed <= w[1].elapsed)
}
