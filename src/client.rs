use anyhow::Result;
use derive_builder::Builder;
use headers::{HeaderMap, HeaderValue};
use reqwest::header;
use std::time::Duration;
use url::Url;

/// User agent sent when none is configured
pub const USER_AGENT: &str = "vscan-rate-limiting-checker/1.0";

const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Status and body size of a completed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fetched {
    pub status: http::StatusCode,
    pub content_length: usize,
}

#[derive(Debug, Clone)]
pub struct Client {
    reqwest_client: reqwest::Client,
}

/// A plain HTTP client that sends every probe with the same headers.
#[derive(Builder, Debug)]
#[builder(build_fn(skip))]
#[builder(setter(into))]
#[builder(name = "ClientBuilder")]
pub struct ClientBuilderInternal {
    user_agent: String,
    custom_headers: HeaderMap,
    max_redirects: usize,
    allow_insecure: bool,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn build(&mut self) -> Result<Client> {
        let mut headers = HeaderMap::new();

        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| USER_AGENT.to_string());

        headers.insert(header::USER_AGENT, HeaderValue::from_str(&user_agent)?);
        if let Some(custom) = &self.custom_headers {
            headers.extend(custom.clone());
        }

        let allow_insecure = self.allow_insecure.unwrap_or(false);
        let max_redirects = self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS);

        let builder = reqwest::ClientBuilder::new()
            .gzip(true)
            .default_headers(headers)
            .danger_accept_invalid_certs(allow_insecure)
            .redirect(reqwest::redirect::Policy::limited(max_redirects));

        let builder = match self.timeout {
            Some(Some(t)) => builder.timeout(t),
            _ => builder,
        };

        Ok(Client {
            reqwest_client: builder.build()?,
        })
    }
}

impl Client {
    /// Send a GET request and read the whole body.
    ///
    /// Any HTTP status is a successful fetch; only transport failures
    /// (connect, DNS, TLS, timeout, body read) are errors.
    pub async fn get(&self, url: &Url) -> Result<Fetched, reqwest::Error> {
        let response = self.reqwest_client.get(url.as_str()).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(Fetched {
            status,
            content_length: body.len(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http::StatusCode;
    use wiremock::matchers::{header as header_matcher, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_url(mock_server: &MockServer) -> Url {
        Url::parse(&mock_server.uri()).expect("Expected valid mock server URL")
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&mock_server)
            .await;

        let fetched = ClientBuilder::default()
            .build()
            .unwrap()
            .get(&mock_url(&mock_server))
            .await
            .unwrap();
        assert_eq!(fetched.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(fetched.content_length, "slow down".len());
    }

    #[tokio::test]
    async fn test_default_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_matcher("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let fetched = ClientBuilder::default()
            .build()
            .unwrap()
            .get(&mock_url(&mock_server))
            .await
            .unwrap();
        assert_eq!(fetched.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_custom_user_agent_and_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_matcher("user-agent", "probe/2.0"))
            .and(header_matcher("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let mut custom = HeaderMap::new();
        custom.insert("x-api-key", "secret".parse().unwrap());
        let fetched = ClientBuilder::default()
            .user_agent("probe/2.0")
            .custom_headers(custom)
            .build()
            .unwrap()
            .get(&mock_url(&mock_server))
            .await
            .unwrap();
        // wiremock answers unmatched requests with 404
        assert_eq!(fetched.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock_delay = Duration::from_millis(200);
        let client_timeout = Duration::from_millis(20);
        assert!(mock_delay > client_timeout);

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(mock_delay))
            .mount(&mock_server)
            .await;

        let err = ClientBuilder::default()
            .timeout(client_timeout)
            .build()
            .unwrap()
            .get(&mock_url(&mock_server))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_invalid_user_agent() {
        assert!(ClientBuilder::default()
            .user_agent("bad\nagent")
            .build()
            .is_err());
    }
}
