use console::{strip_ansi_codes, style};
use pad::{Alignment, PadStr};
use serde::Serialize;

use std::{
    collections::BTreeSet,
    fmt::{self, Display},
};

use rate_limit_checker::{Findings, Sample, Target};

// Maximum padding for each entry in the final report
const MAX_PADDING: usize = 24;

/// Render a set the way it shows up in the log, e.g. `{200, 429}`
fn fmt_set<T: Display>(set: &BTreeSet<T>) -> String {
    let items: Vec<_> = set.iter().map(ToString::to_string).collect();
    format!("{{{}}}", items.join(", "))
}

/// Emit one log line per heuristic outcome.
pub(crate) fn log_findings(findings: &Findings) {
    match findings.consistent_status() {
        Some(code) => {
            info!("Consistent status codes observed. Rate limiting may not be present, but further analysis recommended.");
            info!("Status Code: {}", code);
        }
        None => {
            warn!("Multiple status codes detected. This may indicate rate limiting.");
            info!("Unique Status Codes: {}", fmt_set(&findings.status_codes));
            if findings.rate_limited {
                warn!("Rate limiting likely detected based on status codes (429 or 503).");
            } else {
                info!("Further analysis may be needed to confirm rate limiting.");
            }
        }
    }

    if findings.increasing_times {
        warn!("Response times are consistently increasing. This may indicate rate limiting.");
    }

    if findings.content_varies {
        warn!("Multiple content lengths detected, possible rate limiting based on content returned.");
        info!(
            "Unique Content Lengths: {}",
            fmt_set(&findings.content_lengths)
        );
    }
}

#[derive(Serialize)]
pub(crate) struct Report<'a> {
    url: &'a str,
    findings: &'a Findings,
    samples: &'a [Sample],
}

impl<'a> Report<'a> {
    pub(crate) fn new(target: &'a Target, findings: &'a Findings, samples: &'a [Sample]) -> Self {
        Report {
            url: target.as_str(),
            findings,
            samples,
        }
    }
}

// Pads by visible width so styled values line up with plain ones
fn stat_line(title: &str, stat: &str) -> String {
    let fill = title.chars().count();
    let plain = strip_ansi_codes(stat);
    let padded = plain.pad(MAX_PADDING - fill, '.', Alignment::Right, false);
    let dots = &padded[..padded.len() - plain.len()];
    format!("{}{}{}", title, dots, stat)
}

fn write_stat(f: &mut fmt::Formatter, title: &str, stat: &str) -> fmt::Result {
    writeln!(f, "{}", stat_line(title, stat))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl<'a> Display for Report<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(MAX_PADDING + 1);
        let findings = self.findings;

        writeln!(f, "📝 Summary for {}", self.url)?;
        writeln!(f, "{}", separator)?;
        write_stat(f, "🔍 Requests", &findings.total.to_string())?;
        match findings.consistent_status() {
            Some(code) => write_stat(f, "🚦 Status code", &code.to_string())?,
            None => write_stat(f, "🚦 Status codes", &fmt_set(&findings.status_codes))?,
        }

        let rate_limited = if findings.rate_limited {
            style("likely").red().bright()
        } else if findings.status_varies {
            style("possible").yellow().bright()
        } else {
            style("no").green()
        };
        write_stat(f, "🚫 Rate limited", &rate_limited.to_string())?;
        write_stat(f, "📈 Increasing times", yes_no(findings.increasing_times))?;

        if findings.content_varies {
            write_stat(
                f,
                "📦 Content lengths",
                &fmt_set(&findings.content_lengths),
            )?;
        }
        Ok(())
    }
}
