use anyhow::{anyhow, Error, Result};
use lazy_static::lazy_static;
use rate_limit_checker::{DELAY, NUM_REQUESTS, USER_AGENT};
use serde::Deserialize;
use std::str::FromStr;
use std::{fs, io::ErrorKind, path::PathBuf};
use structopt::StructOpt;

const TIMEOUT: usize = 20;
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, PartialEq, Deserialize)]
pub enum Format {
    String,
    Json,
}

impl FromStr for Format {
    type Err = Error;
    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format {
            "string" => Ok(Format::String),
            "json" => Ok(Format::Json),
            _ => Err(anyhow!("Could not parse format {}", format)),
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Format::String
    }
}

// this exists because structopt requires `&str` type values for defaults
// (we can't use e.g. `TIMEOUT` or `timeout()` which gets created for serde)
lazy_static! {
    static ref NUM_REQUESTS_STR: String = NUM_REQUESTS.to_string();
    static ref DELAY_STR: String = DELAY.to_string();
    static ref TIMEOUT_STR: String = TIMEOUT.to_string();
    static ref MAX_REDIRECTS_STR: String = MAX_REDIRECTS.to_string();
}

// Macro for generating default functions to be used by serde
macro_rules! default_function {
    ( $( $name:ident : $T:ty = $e:expr; )* ) => {
        $(
            fn $name() -> $T {
                $e
            }
        )*
    };
}

// Generate the functions for serde defaults
default_function! {
    num_requests: usize = NUM_REQUESTS;
    delay: f64 = DELAY;
    user_agent: String = USER_AGENT.to_string();
    timeout: usize = TIMEOUT;
    max_redirects: usize = MAX_REDIRECTS;
}

// Macro for merging configuration values
macro_rules! fold_in {
    ( $cli:ident , $toml:ident ; $( $key:ident : $default:expr; )* ) => {
        $(
            if $cli.$key == $default && $toml.$key != $default {
                $cli.$key = $toml.$key;
            }
        )*
    };
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "rate-limit-checker",
    about = "Checks if rate limiting is implemented on sensitive endpoints."
)]
pub(crate) struct RateLimitOptions {
    /// The URL to check for rate limiting
    #[structopt(name = "url")]
    pub url: String,

    /// Configuration file to use
    #[structopt(short, long = "config", default_value = "./rate-limit-checker.toml")]
    pub config_file: String,

    #[structopt(flatten)]
    pub config: Config,
}

#[derive(Debug, Deserialize, StructOpt)]
pub struct Config {
    /// Enable verbose output (debug logging)
    #[structopt(short, long)]
    #[serde(default)]
    pub verbose: bool,

    /// The number of requests to send
    #[structopt(short, long = "num_requests", default_value = &NUM_REQUESTS_STR)]
    #[serde(default = "num_requests")]
    pub num_requests: usize,

    /// Delay between requests in seconds
    #[structopt(short, long, default_value = &DELAY_STR)]
    #[serde(default = "delay")]
    pub delay: f64,

    /// Custom user agent string
    #[structopt(short, long = "user_agent", default_value = USER_AGENT)]
    #[serde(default = "user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds, from connect to response finished (0 disables it)
    #[structopt(short, long, default_value = &TIMEOUT_STR)]
    #[serde(default = "timeout")]
    pub timeout: usize,

    /// Custom request headers, e.g. `accept=text/html`
    #[structopt(short = "H", long)]
    #[serde(default)]
    pub headers: Vec<String>,

    /// Proceed for server connections considered insecure (invalid TLS)
    #[structopt(short, long)]
    #[serde(default)]
    pub insecure: bool,

    /// Maximum number of allowed redirects
    #[structopt(short, long = "max_redirects", default_value = &MAX_REDIRECTS_STR)]
    #[serde(default = "max_redirects")]
    pub max_redirects: usize,

    /// Output file of the report
    #[structopt(short, long, parse(from_os_str))]
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Output format of the report (json, string)
    #[structopt(short, long, default_value = "string")]
    #[serde(default)]
    pub format: Format,
}

impl Config {
    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &str) -> Result<Option<Config>> {
        // Read configuration file
        let result = fs::read(path);

        // Ignore a file not found error
        let contents = match result {
            Ok(c) => c,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::NotFound => Ok(None),
                    _ => Err(Error::from(e)),
                }
            }
        };

        Ok(Some(toml::from_slice(&contents)?))
    }

    /// Merge the configuration from TOML into the CLI configuration
    pub(crate) fn merge(&mut self, toml: Config) {
        fold_in! {
            // Destination and source configs
            self, toml;

            // Keys with defaults to assign
            verbose: false;
            num_requests: NUM_REQUESTS;
            delay: DELAY;
            user_agent: USER_AGENT;
            timeout: TIMEOUT;
            headers: Vec::<String>::new();
            insecure: false;
            max_redirects: MAX_REDIRECTS;
            output: None;
            format: Format::String;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> RateLimitOptions {
        RateLimitOptions::from_iter(
            std::iter::once("rate-limit-checker").chain(args.iter().copied()),
        )
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&["https://example.com"]);
        assert_eq!(opts.url, "https://example.com");
        assert_eq!(opts.config_file, "./rate-limit-checker.toml");
        assert!(!opts.config.verbose);
        assert_eq!(opts.config.num_requests, 10);
        assert_eq!(opts.config.delay, 0.1);
        assert_eq!(opts.config.user_agent, "vscan-rate-limiting-checker/1.0");
        assert_eq!(opts.config.timeout, TIMEOUT);
        assert_eq!(opts.config.format, Format::String);
    }

    #[test]
    fn test_flags() {
        let opts = parse(&[
            "-n",
            "5",
            "--delay",
            "0.5",
            "-v",
            "--user_agent",
            "probe/2.0",
            "-H",
            "accept=text/html",
            "--format",
            "json",
            "https://example.com",
        ]);
        assert_eq!(opts.config.num_requests, 5);
        assert_eq!(opts.config.delay, 0.5);
        assert!(opts.config.verbose);
        assert_eq!(opts.config.user_agent, "probe/2.0");
        assert_eq!(opts.config.headers, vec!["accept=text/html".to_string()]);
        assert_eq!(opts.config.format, Format::Json);
    }

    #[test]
    fn test_merge_prefers_cli_values() {
        let mut cli = parse(&["-n", "3", "https://example.com"]).config;
        let toml: Config = toml::from_str(
            r#"
            num_requests = 50
            delay = 1.5
            user_agent = "from-file/1.0"
            "#,
        )
        .unwrap();

        cli.merge(toml);

        // `-n 3` differs from the default, so the file can't override it
        assert_eq!(cli.num_requests, 3);
        assert_eq!(cli.delay, 1.5);
        assert_eq!(cli.user_agent, "from-file/1.0");
        assert_eq!(cli.timeout, TIMEOUT);
    }

    #[test]
    fn test_missing_config_file() {
        let config = Config::load_from_file("./does-not-exist.toml").unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("json").unwrap(), Format::Json);
        assert!(Format::from_str("xml").is_err());
    }
}
