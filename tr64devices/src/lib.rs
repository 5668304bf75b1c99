//! Discovery of the services a TR-064 router advertises.
//!
//! The router publishes XML description documents (`igddesc.xml`,
//! `tr64desc.xml`). [`DeviceManager`] collects them, indexes every service
//! they declare by name and asks each service to load its SCPD so its
//! actions are known.

mod xml;

pub mod bootstrap;
pub mod description;
pub mod errors;
pub mod fetch;
pub mod manager;
pub mod scpd;
pub mod source;

pub use bootstrap::{description_url, discover, discover_with};
pub use description::{Description, Device, Service, ServiceMap, SpecVersion, SystemVersion};
pub use errors::DeviceError;
pub use fetch::{ContentFetcher, HttpFetcher, get_content_from};
pub use manager::DeviceManager;
pub use scpd::{Action, Argument, Direction, Scpd, StateVariable, ValueRange};
pub use source::Source;
