use thiserror::Error;

pub const ACCESS_DENIED_MESSAGE: &str =
    "Unable to login into device to get configuration information.";

/// Errors raised while fetching and indexing device descriptions.
///
/// HTTP, I/O and XML failures are carried through untouched so callers can
/// tell "the device wants a login" ([`DeviceError::AccessDenied`]) apart from
/// "the data is broken".
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device answered with an HTML page instead of XML.
    #[error("{0}")]
    AccessDenied(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    #[error("No description has been added yet")]
    NoDescription,
}

impl DeviceError {
    pub fn access_denied() -> Self {
        DeviceError::AccessDenied(ACCESS_DENIED_MESSAGE.to_string())
    }

    /// True for a refused login page or an HTTP status error, i.e. the
    /// device is reachable but does not serve the requested document.
    pub fn is_unavailable_resource(&self) -> bool {
        matches!(
            self,
            DeviceError::AccessDenied(_) | DeviceError::Http(ureq::Error::StatusCode(_))
        )
    }
}
