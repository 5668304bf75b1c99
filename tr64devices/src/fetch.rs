//! Retrieval of XML documents from the device.

use std::time::Duration;

use tr64config::Config;
use tracing::debug;
use ureq::Agent;

use crate::errors::DeviceError;

/// Media type the device uses for its login page.
const HTML_CONTENT_TYPE: &str = "text/html";

/// Something able to GET a document by URL and hand back its text.
///
/// The manager and the services only talk to the network through this
/// trait, so a recorded or canned implementation can stand in for the
/// router.
pub trait ContentFetcher {
    /// Fetches `url` and returns the raw text body.
    ///
    /// Fails with [`DeviceError::AccessDenied`] when the device answered
    /// with an HTML page instead of XML.
    fn get_content(&self, url: &str) -> Result<String, DeviceError>;
}

impl<F: ContentFetcher + ?Sized> ContentFetcher for &F {
    fn get_content(&self, url: &str) -> Result<String, DeviceError> {
        (**self).get_content(url)
    }
}

/// Blocking HTTP fetcher backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.get_http_timeout())
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(tr64config::DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

impl ContentFetcher for HttpFetcher {
    fn get_content(&self, url: &str) -> Result<String, DeviceError> {
        debug!(url = %url, "Fetching document");

        let mut response = self.agent.get(url).call()?;

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok());

        if content_type == Some(HTML_CONTENT_TYPE) {
            debug!(url = %url, "Device answered with a login page");
            return Err(DeviceError::access_denied());
        }

        let body = response.body_mut().read_to_string()?;
        debug!(url = %url, bytes = body.len(), "Document fetched");
        Ok(body)
    }
}

/// Fetches `url` with a default [`HttpFetcher`].
pub fn get_content_from(url: &str) -> Result<String, DeviceError> {
    HttpFetcher::default().get_content(url)
}
