//! Full discovery sequence for a router: add its description documents,
//! index the services, then load every SCPD.

use tr64config::Config;
use tracing::{info, warn};

use crate::errors::DeviceError;
use crate::fetch::{ContentFetcher, HttpFetcher};
use crate::manager::DeviceManager;
use crate::source::Source;

/// URL of a description document served by the router.
pub fn description_url(address: &str, port: u16, file: &str) -> String {
    let address = address.trim_end_matches('/');
    let file = file.trim_start_matches('/');
    if address.contains("://") {
        format!("{}:{}/{}", address, port, file)
    } else {
        format!("http://{}:{}/{}", address, port, file)
    }
}

/// Discovers the router described by `config` over HTTP.
pub fn discover(config: &Config) -> Result<DeviceManager<HttpFetcher>, DeviceError> {
    discover_with(
        HttpFetcher::from_config(config),
        &config.get_device_address(),
        config.get_device_port(),
        &config.get_description_files(),
    )
}

/// Adds each of `files` from `address:port`, scans, and loads the SCPDs.
///
/// A document the router does not serve (login page or HTTP error status)
/// is skipped: not every box publishes every description. Any other error
/// aborts. Fails with [`DeviceError::NoDescription`] when no document
/// could be added at all.
pub fn discover_with<F, S>(
    fetcher: F,
    address: &str,
    port: u16,
    files: &[S],
) -> Result<DeviceManager<F>, DeviceError>
where
    F: ContentFetcher,
    S: AsRef<str>,
{
    let mut manager = DeviceManager::with_fetcher(fetcher);

    for file in files {
        let url = description_url(address, port, file.as_ref());
        match manager.add_description(Source::Url(url.clone())) {
            Ok(()) => {}
            Err(err) if err.is_unavailable_resource() => {
                warn!(url = %url, error = %err, "Description not available, skipping");
            }
            Err(err) => return Err(err),
        }
    }

    if manager.descriptions().is_empty() {
        return Err(DeviceError::NoDescription);
    }

    manager.scan();
    manager.load_service_descriptions(address, port)?;

    info!(
        model = manager.modelname().unwrap_or("-"),
        services = manager.services().len(),
        "Device discovered"
    );
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_url() {
        assert_eq!(
            description_url("192.168.178.1", 49000, "tr64desc.xml"),
            "http://192.168.178.1:49000/tr64desc.xml"
        );
        assert_eq!(
            description_url("https://fritz.box", 49443, "/igddesc.xml"),
            "https://fritz.box:49443/igddesc.xml"
        );
    }
}
