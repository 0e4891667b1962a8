use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;
use crate::error::PmseekError;

/// Hosts every client may reach without further configuration.
const DEFAULT_ALLOWLIST: &[&str] = &[
    "eutils.ncbi.nlm.nih.gov", // PubMed E-utilities
    "localhost",               // Local mirrors
    "127.0.0.1",               // Localhost alt
];

/// Redirect hops followed before giving up, same as reqwest's default.
const MAX_REDIRECTS: usize = 10;

type Allowlist = Arc<RwLock<HashSet<String>>>;

/// An HTTP client capped to an allowlist of hosts, with a fixed per-request timeout.
///
/// The allowlist applies to redirect targets as well as to the first URL.
/// Clones share one allowlist.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: Allowlist,
}

fn host_allowed(allowlist: &Allowlist, host: &str) -> bool {
    let Ok(list) = allowlist.read() else {
        return false;
    };
    // Exact match or a subdomain of an allowed domain
    list.iter()
        .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
}

fn redirect_policy(allowlist: Allowlist) -> Policy {
    Policy::custom(move |attempt| {
        let target = attempt.url().to_string();
        let allowed = attempt
            .url()
            .host_str()
            .map(|host| host_allowed(&allowlist, host))
            .unwrap_or(false);

        if !allowed {
            tracing::warn!(%target, "Refusing redirect outside the allowlist");
            attempt.error(format!("redirect to {} is not in the allowlist", target))
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error(format!("too many redirects, last was {}", target))
        } else {
            attempt.follow()
        }
    })
}

impl SandboxClient {
    /// Creates a new SandboxClient with the default allowlist.
    pub fn new(timeout: Duration) -> Result<Self, PmseekError> {
        let allowlist: Allowlist = Arc::new(RwLock::new(
            DEFAULT_ALLOWLIST.iter().map(|d| d.to_string()).collect(),
        ));

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("pmseek/", env!("CARGO_PKG_VERSION")))
            .redirect(redirect_policy(Arc::clone(&allowlist)))
            .build()
            .map_err(|e| PmseekError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        if let Ok(mut list) = self.allowlist.write() {
            list.insert(domain.to_string());
        }
    }

    /// Allows the host of `url`. Fails if the URL has no host.
    pub fn allow_url(&mut self, url: &str) -> Result<(), PmseekError> {
        let parsed = Url::parse(url)
            .map_err(|e| PmseekError::Config(format!("Invalid endpoint URL {}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| PmseekError::Config(format!("Endpoint URL has no host: {}", url)))?;
        self.allow_domain(host);
        Ok(())
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|host| host_allowed(&self.allowlist, host)))
            .unwrap_or(false)
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, PmseekError> {
        if !self.is_allowed(url) {
            return Err(PmseekError::SecurityError(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SandboxClient {
        SandboxClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_default_allowlist() {
        let c = client();
        assert!(c.is_allowed("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi"));
        assert!(c.is_allowed("http://127.0.0.1:9999/esearch.fcgi"));
        assert!(!c.is_allowed("https://example.com/esearch.fcgi"));
        assert!(!c.is_allowed("http://127.0.0.2:9999/esearch.fcgi"));
        assert!(!c.is_allowed("not a url"));
    }

    #[test]
    fn test_allow_url_adds_host() {
        let mut c = client();
        c.allow_url("https://mirror.example.org/eutils/efetch.fcgi").unwrap();
        assert!(c.is_allowed("https://mirror.example.org/eutils/esearch.fcgi"));
        assert!(c.is_allowed("https://eu.mirror.example.org/x"));
        assert!(!c.is_allowed("https://example.org/x"));
    }

    #[test]
    fn test_allow_url_reaches_redirect_policy() {
        let mut c = client();
        let before = Arc::clone(&c.allowlist);
        c.allow_url("https://mirror.example.org/eutils/efetch.fcgi").unwrap();
        assert!(host_allowed(&before, "mirror.example.org"));
    }

    #[test]
    fn test_blocked_get_is_security_error() {
        let c = client();
        let err = c.get("https://evil.example.com/").unwrap_err();
        assert!(matches!(err, PmseekError::SecurityError(_)));
    }
}
