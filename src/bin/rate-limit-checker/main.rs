#[macro_use]
extern crate log;

use anyhow::{anyhow, Context, Result};
use headers::{HeaderMap, HeaderName};
use log::LevelFilter;
use std::{fs, io::Write, time::Duration};
use structopt::StructOpt;

mod options;
mod report;

use crate::options::{Config, Format, RateLimitOptions};
use crate::report::{log_findings, Report};

use rate_limit_checker::{analyze, ClientBuilder, ProbeConfig, ProbeError, Prober, Target};

/// A C-like enum that can be cast to `i32` and used as process exit code.
enum ExitCode {
    Success = 0,
    // Invalid input, transport failures and everything else alike
    Failure = 1,
}

fn main() {
    // std::process::exit doesn't guarantee that all destructors will be ran,
    // therefore we wrap "main" code in another function to guarantee that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main();
    std::process::exit(exit_code as i32);
}

fn run_main() -> ExitCode {
    let mut opts = RateLimitOptions::from_args();

    // Load a potentially existing config file and merge it into the config from the CLI
    let config_error = match Config::load_from_file(&opts.config_file) {
        Ok(Some(c)) => {
            opts.config.merge(c);
            None
        }
        Ok(None) => None,
        Err(e) => Some(e.context(format!("Cannot load config file {}", opts.config_file))),
    };
    let cfg = &opts.config;

    init_logging(cfg.verbose);
    if cfg.verbose {
        debug!("Verbose mode enabled.");
    }
    if let Some(e) = config_error {
        log_error(&e);
        return ExitCode::Failure;
    }

    info!("Checking for rate limiting at: {}", opts.url);

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(cfg, &opts.url)));
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            log_error(&e);
            ExitCode::Failure
        }
    }
}

/// Configure the process-wide logger once; the level never changes afterwards.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // Keep the HTTP stack quiet unless something goes wrong
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("rate_limit_checker", level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn log_error(e: &anyhow::Error) {
    match e.downcast_ref::<ProbeError>() {
        Some(probe_error) => error!("{}", probe_error),
        None => error!("An unexpected error occurred: {:#}", e),
    }
}

fn fmt(report: &Report, format: &Format) -> Result<String> {
    Ok(match format {
        Format::String => report.to_string(),
        Format::Json => serde_json::to_string_pretty(report)?,
    })
}

async fn run(cfg: &Config, url: &str) -> Result<()> {
    let target = Target::parse(url)?;
    let probe_config = ProbeConfig::new(cfg.num_requests, cfg.delay)?;
    let headers = parse_headers(&cfg.headers)?;

    let client = ClientBuilder::default()
        .user_agent(cfg.user_agent.clone())
        .custom_headers(headers)
        .max_redirects(cfg.max_redirects)
        .allow_insecure(cfg.insecure)
        .timeout(parse_timeout(cfg.timeout))
        .build()?;

    let prober = Prober::new(client, probe_config);
    let samples = prober.collect(&target).await?;

    let findings = analyze(&samples);
    log_findings(&findings);

    let report = Report::new(&target, &findings, &samples);
    let formatted = fmt(&report, &cfg.format)?;
    if let Some(output) = &cfg.output {
        // Colours are for the terminal only
        fs::write(output, console::strip_ansi_codes(&formatted).as_bytes())
            .context("Cannot write report to file")?;
    } else {
        println!("{}", formatted);
    }
    Ok(())
}

fn read_header(input: &str) -> Result<(String, String)> {
    let elements: Vec<_> = input.splitn(2, '=').collect();
    if elements.len() != 2 {
        return Err(anyhow!(
            "Header value should be of the form key=value, got {}",
            input
        ));
    }
    Ok((elements[0].into(), elements[1].into()))
}

// A timeout of zero disables it
fn parse_timeout(timeout: usize) -> Option<Duration> {
    match timeout {
        0 => None,
        secs => Some(Duration::from_secs(secs as u64)),
    }
}

fn parse_headers<T: AsRef<str>>(headers: &[T]) -> Result<HeaderMap> {
    let mut out = HeaderMap::new();
    for header in headers {
        let (key, val) = read_header(header.as_ref())?;
        out.insert(HeaderName::from_bytes(key.as_bytes())?, val.parse()?);
    }
    Ok(out)
}
