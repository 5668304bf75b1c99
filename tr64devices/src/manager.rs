//! Registry of the device descriptions and of the services they advertise.

use std::sync::Arc;

use tracing::{debug, info};

use crate::description::{Description, Service, ServiceMap};
use crate::errors::DeviceError;
use crate::fetch::{ContentFetcher, HttpFetcher};
use crate::source::Source;

/// Knows every description of the device and its sub-devices, and the
/// services they make available.
///
/// Typical sequence:
///
/// ```no_run
/// use tr64devices::DeviceManager;
///
/// let mut manager = DeviceManager::new();
/// manager.add_description("http://192.168.178.1:49000/tr64desc.xml")?;
/// manager.scan();
/// manager.load_service_descriptions("192.168.178.1", 49000)?;
/// println!("{}", manager.modelname()?);
/// # Ok::<(), tr64devices::DeviceError>(())
/// ```
#[derive(Debug)]
pub struct DeviceManager<F: ContentFetcher = HttpFetcher> {
    fetcher: F,
    descriptions: Vec<Description>,
    services: ServiceMap,
}

impl DeviceManager<HttpFetcher> {
    /// Empty manager fetching over HTTP with the default timeout.
    pub fn new() -> Self {
        Self::with_fetcher(HttpFetcher::default())
    }
}

impl Default for DeviceManager<HttpFetcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ContentFetcher> DeviceManager<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            descriptions: Vec::new(),
            services: ServiceMap::new(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// `modelName` of the root device of the first description, i.e. the
    /// name of the router itself.
    ///
    /// Fails with [`DeviceError::NoDescription`] before any description
    /// has been added.
    pub fn modelname(&self) -> Result<&str, DeviceError> {
        self.descriptions
            .first()
            .ok_or(DeviceError::NoDescription)?
            .device_model_name()
            .ok_or(DeviceError::MissingElement("modelName"))
    }

    /// Parses the document behind `source` and appends it to the
    /// descriptions. The first added description is the root device.
    ///
    /// Nothing is appended when fetching, reading or parsing fails.
    pub fn add_description(&mut self, source: impl Into<Source>) -> Result<(), DeviceError> {
        let source = source.into();
        debug!(source = ?source, "Adding description");

        let root = source.into_root(&self.fetcher)?;
        let description = Description::from_root(&root)?;

        debug!(
            model = description.device_model_name().unwrap_or("-"),
            services = description.services().len(),
            "Description added"
        );
        self.descriptions.push(description);
        Ok(())
    }

    /// Merges the services of every description, in the order the
    /// descriptions were added, into the registry.
    ///
    /// On a name collision the service of the later description replaces
    /// the earlier one (last write wins); the key keeps its first position.
    /// Call this once all descriptions are added: an earlier call only sees
    /// what was added so far.
    pub fn scan(&mut self) {
        for description in &self.descriptions {
            for (name, service) in description.services() {
                self.services.insert(name.clone(), Arc::clone(service));
            }
        }
        info!(
            descriptions = self.descriptions.len(),
            services = self.services.len(),
            "Services scanned"
        );
    }

    /// Asks every registered service, in registry order, to load its SCPD
    /// from `address:port`.
    ///
    /// Stops at the first failing service and returns its error.
    pub fn load_service_descriptions(&self, address: &str, port: u16) -> Result<(), DeviceError> {
        for service in self.services.values() {
            service.load_scpd(address, port, &self.fetcher)?;
        }
        debug!(services = self.services.len(), "Service descriptions loaded");
        Ok(())
    }

    pub fn descriptions(&self) -> &[Description] {
        &self.descriptions
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    pub fn service(&self, name: &str) -> Option<&Arc<Service>> {
        self.services.get(name)
    }
}
