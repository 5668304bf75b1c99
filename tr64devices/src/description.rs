//! Object model of a device description document (`igddesc.xml`,
//! `tr64desc.xml`, ...).
//!
//! A [`Description`] wraps the root [`Device`]; devices nest through their
//! `deviceList` and each one advertises a `serviceList` of [`Service`]s.
//! Services are shared (`Arc<Service>`) between the description that
//! declared them and the manager's registry, so loading a service's SCPD
//! is visible from both sides.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;
use xmltree::Element;

use crate::errors::DeviceError;
use crate::fetch::ContentFetcher;
use crate::scpd::Scpd;
use crate::xml::{child_text, child_text_or_default, list_items};

/// Ordered mapping service name → service.
pub type ServiceMap = IndexMap<String, Arc<Service>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecVersion {
    pub major: u32,
    pub minor: u32,
}

impl SpecVersion {
    pub(crate) fn from_element(elem: &Element) -> Self {
        let number = |name: &str| {
            child_text(elem, name)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };
        Self {
            major: number("major"),
            minor: number("minor"),
        }
    }
}

/// Firmware information published in `tr64desc.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemVersion {
    pub hw: Option<String>,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub patch: Option<String>,
    pub build_number: Option<String>,
    pub display: Option<String>,
}

impl SystemVersion {
    fn from_element(elem: &Element) -> Self {
        Self {
            hw: child_text(elem, "HW"),
            major: child_text(elem, "Major"),
            minor: child_text(elem, "Minor"),
            patch: child_text(elem, "Patch"),
            build_number: child_text(elem, "Buildnumber"),
            display: child_text(elem, "Display"),
        }
    }
}

/// One advertised control service.
#[derive(Debug)]
pub struct Service {
    service_type: String,
    service_id: String,
    control_url: String,
    event_sub_url: String,
    scpd_url: String,
    scpd: RwLock<Option<Arc<Scpd>>>,
}

impl Service {
    pub(crate) fn from_element(elem: &Element) -> Result<Self, DeviceError> {
        let service_id =
            child_text(elem, "serviceId").ok_or(DeviceError::MissingElement("serviceId"))?;

        Ok(Self {
            service_type: child_text_or_default(elem, "serviceType"),
            service_id,
            control_url: child_text_or_default(elem, "controlURL"),
            event_sub_url: child_text_or_default(elem, "eventSubURL"),
            scpd_url: child_text_or_default(elem, "SCPDURL"),
            scpd: RwLock::new(None),
        })
    }

    /// Registry key: last segment of the `serviceId`
    /// (`urn:upnp-org:serviceId:WANIPConn1` → `WANIPConn1`).
    pub fn name(&self) -> &str {
        self.service_id
            .rsplit(':')
            .next()
            .unwrap_or(&self.service_id)
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    pub fn event_sub_url(&self) -> &str {
        &self.event_sub_url
    }

    pub fn scpd_url(&self) -> &str {
        &self.scpd_url
    }

    /// URL of the SCPD document on `address:port`. `http://` is assumed
    /// when `address` carries no scheme.
    pub fn scpd_location(&self, address: &str, port: u16) -> String {
        let address = address.trim_end_matches('/');
        let base = if address.contains("://") {
            format!("{}:{}", address, port)
        } else {
            format!("http://{}:{}", address, port)
        };

        if self.scpd_url.starts_with('/') {
            format!("{}{}", base, self.scpd_url)
        } else {
            format!("{}/{}", base, self.scpd_url)
        }
    }

    /// Fetches and parses this service's SCPD from `address:port`,
    /// replacing any previously loaded one.
    pub fn load_scpd<F>(&self, address: &str, port: u16, fetcher: &F) -> Result<(), DeviceError>
    where
        F: ContentFetcher + ?Sized,
    {
        let url = self.scpd_location(address, port);
        debug!(service = %self.name(), url = %url, "Loading SCPD");

        let content = fetcher.get_content(&url)?;
        let root = Element::parse(content.as_bytes())?;
        let scpd = Scpd::from_root(&root);

        debug!(
            service = %self.name(),
            actions = scpd.actions().len(),
            "SCPD loaded"
        );
        *self.scpd.write() = Some(Arc::new(scpd));
        Ok(())
    }

    /// The loaded SCPD, `None` until [`Service::load_scpd`] succeeded.
    pub fn scpd(&self) -> Option<Arc<Scpd>> {
        self.scpd.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.scpd.read().is_some()
    }

    /// Names of the actions offered by the service, empty until loaded.
    pub fn action_names(&self) -> Vec<String> {
        self.scpd()
            .map(|scpd| scpd.actions().keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// A device entry of a description, with its own services and sub-devices.
#[derive(Debug)]
pub struct Device {
    pub device_type: String,
    pub friendly_name: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_url: Option<String>,
    pub model_description: Option<String>,
    pub model_name: Option<String>,
    pub model_number: Option<String>,
    pub model_url: Option<String>,
    pub udn: Option<String>,
    pub presentation_url: Option<String>,
    services: Vec<Arc<Service>>,
    devices: Vec<Device>,
}

impl Device {
    fn from_element(elem: &Element) -> Result<Self, DeviceError> {
        let services = list_items(elem, "serviceList", "service")
            .map(|s| Service::from_element(s).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let devices = list_items(elem, "deviceList", "device")
            .map(Device::from_element)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            device_type: child_text_or_default(elem, "deviceType"),
            friendly_name: child_text(elem, "friendlyName"),
            manufacturer: child_text(elem, "manufacturer"),
            manufacturer_url: child_text(elem, "manufacturerURL"),
            model_description: child_text(elem, "modelDescription"),
            model_name: child_text(elem, "modelName"),
            model_number: child_text(elem, "modelNumber"),
            model_url: child_text(elem, "modelURL"),
            udn: child_text(elem, "UDN"),
            presentation_url: child_text(elem, "presentationURL"),
            services,
            devices,
        })
    }

    /// Services declared directly by this device.
    pub fn services(&self) -> &[Arc<Service>] {
        &self.services
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// This device's services followed by those of its sub-devices,
    /// depth first. A later service overwrites an earlier one of the
    /// same name.
    fn collect_services(&self, into: &mut ServiceMap) {
        for service in &self.services {
            into.insert(service.name().to_string(), Arc::clone(service));
        }
        for device in &self.devices {
            device.collect_services(into);
        }
    }
}

/// One parsed description document.
#[derive(Debug)]
pub struct Description {
    spec_version: Option<SpecVersion>,
    system_version: Option<SystemVersion>,
    device: Device,
    services: ServiceMap,
}

impl Description {
    /// Builds the model from the document's root element.
    ///
    /// Fails with [`DeviceError::MissingElement`] when the root carries no
    /// `<device>` or a service has no `serviceId`.
    pub fn from_root(root: &Element) -> Result<Self, DeviceError> {
        let device_elem = root
            .get_child("device")
            .ok_or(DeviceError::MissingElement("device"))?;
        let device = Device::from_element(device_elem)?;

        let mut services = ServiceMap::new();
        device.collect_services(&mut services);

        Ok(Self {
            spec_version: root.get_child("specVersion").map(SpecVersion::from_element),
            system_version: root.get_child("systemVersion").map(SystemVersion::from_element),
            device,
            services,
        })
    }

    /// `modelName` of the root device.
    pub fn device_model_name(&self) -> Option<&str> {
        self.device.model_name.as_deref()
    }

    pub fn root_device(&self) -> &Device {
        &self.device
    }

    /// Every service of the document, nested devices included.
    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    pub fn spec_version(&self) -> Option<SpecVersion> {
        self.spec_version
    }

    pub fn system_version(&self) -> Option<&SystemVersion> {
        self.system_version.as_ref()
    }
}
