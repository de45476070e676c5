use crate::types::ProbeError;
use std::{convert::TryFrom, fmt::Display};
use url::Url;

/// The URL to probe, validated to be absolute with a scheme and a host
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target(Url);

impl Target {
    pub fn parse(s: &str) -> Result<Self, ProbeError> {
        let url = Url::parse(s).map_err(|e| ProbeError::InvalidUrl(format!("{} ({})", s, e)))?;
        // `file:///` and `mailto:` parse fine but have nothing to rate limit
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Target(url)),
            _ => Err(ProbeError::InvalidUrl(format!("{} (missing host)", s))),
        }
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for Target {
    type Error = ProbeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Target::parse(s)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_valid_targets() {
        for s in &[
            "http://example.com",
            "https://example.com/login?next=/",
            "http://127.0.0.1:8080/api",
            "https://[::1]/",
        ] {
            assert!(Target::parse(s).is_ok(), "expected {} to be valid", s);
        }
    }

    #[test]
    fn test_invalid_targets() {
        for s in &[
            "",
            "not-a-url",
            "example.com",
            "/login",
            "mailto:user@example.com",
            "file:///etc/passwd",
            "http://",
        ] {
            assert!(
                matches!(Target::parse(s), Err(ProbeError::InvalidUrl(_))),
                "expected {} to be rejected",
                s
            );
        }
    }

    #[test]
    fn test_target_display() {
        let target = Target::try_from("https://example.com/login").unwrap();
        assert_eq!(target.to_string(), "https://example.com/login");
        assert_eq!(target.url().host_str(), Some("example.com"));
    }
}
