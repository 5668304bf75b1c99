use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use httpmock::prelude::*;
use tr64devices::{ContentFetcher, DeviceError, DeviceManager, Source};

fn data_path(file: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(file)
}

fn data(file: &str) -> String {
    fs::read_to_string(data_path(file)).unwrap()
}

/// Serves canned documents and records every URL asked for.
#[derive(Default)]
struct RecordingFetcher {
    documents: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl RecordingFetcher {
    fn with(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ContentFetcher for RecordingFetcher {
    fn get_content(&self, url: &str) -> Result<String, DeviceError> {
        self.requests.borrow_mut().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(DeviceError::access_denied)
    }
}

const SCPD: &str = "<scpd><actionList><action><name>GetInfo</name></action></actionList></scpd>";

#[test]
fn test_local_igddesc_file() {
    let mut manager = DeviceManager::new();
    manager.add_description(data_path("igddesc.xml")).unwrap();
    manager.scan();

    let mut keys: Vec<&str> = manager.services().keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["Layer3Forwarding1", "WANIPConn1"]);
    for (name, service) in manager.services() {
        assert_eq!(service.name(), name);
    }
    assert_eq!(manager.modelname().unwrap(), "FRITZ!Box 7590");
}

#[test]
fn test_path_string_is_read_from_disk() {
    let path = data_path("tr64desc.xml");
    let mut manager = DeviceManager::new();
    manager.add_description(path.to_str().unwrap()).unwrap();

    let description = &manager.descriptions()[0];
    assert_eq!(
        description.system_version().unwrap().display.as_deref(),
        Some("154.07.57")
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DeviceManager::new();

    let err = manager
        .add_description(dir.path().join("igddesc.xml"))
        .unwrap_err();

    assert!(matches!(err, DeviceError::Io(_)));
    assert!(manager.descriptions().is_empty());
}

#[test]
fn test_file_copied_to_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("igddesc.xml");
    fs::write(&path, data("igddesc.xml")).unwrap();

    let mut manager = DeviceManager::new();
    manager.add_description(path.as_path()).unwrap();
    assert_eq!(manager.descriptions().len(), 1);
}

#[test]
fn test_add_description_from_url() {
    let server = MockServer::start();
    let body = data("tr64desc.xml");
    let mock = server.mock(|when, then| {
        when.method(GET).path("/tr64desc.xml");
        then.status(200)
            .header("Content-Type", "text/xml")
            .body(&body);
    });

    let mut manager = DeviceManager::new();
    manager
        .add_description(server.url("/tr64desc.xml"))
        .unwrap();

    mock.assert();
    assert_eq!(manager.descriptions().len(), 1);
    let root = manager.descriptions()[0].root_device();
    assert_eq!(root.model_name.as_deref(), Some("FRITZ!Box 7590"));
    assert_eq!(
        root.udn.as_deref(),
        Some("uuid:739f2409-bccb-40e7-8e6c-3431C4DC9A28")
    );
}

#[test]
fn test_html_response_is_refused() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/tr64desc.xml");
        then.status(200)
            .header("Content-Type", "text/html")
            .body("<html><body>Anmeldung</body></html>");
    });

    let mut manager = DeviceManager::new();
    let err = manager
        .add_description(server.url("/tr64desc.xml"))
        .unwrap_err();

    mock.assert();
    assert!(matches!(err, DeviceError::AccessDenied(_)));
    assert!(manager.descriptions().is_empty());
    assert!(matches!(manager.modelname(), Err(DeviceError::NoDescription)));
}

#[test]
fn test_explicit_url_source_with_custom_fetcher() {
    let url = "http://fritz.box:49000/igddesc.xml";
    let fetcher = RecordingFetcher::default().with(url, &data("igddesc.xml"));

    let mut manager = DeviceManager::with_fetcher(fetcher);
    manager.add_description(Source::Url(url.to_string())).unwrap();

    assert_eq!(manager.fetcher().requests(), vec![url.to_string()]);
}

#[test]
fn test_load_service_descriptions_asks_each_service_once() {
    let fetcher = RecordingFetcher::default()
        .with("http://192.168.178.1:49000/igdl3fwdSCPD.xml", SCPD)
        .with("http://192.168.178.1:49000/igdconnSCPD.xml", SCPD);

    let mut manager = DeviceManager::with_fetcher(fetcher);
    manager.add_description(data_path("igddesc.xml")).unwrap();
    manager.scan();
    manager
        .load_service_descriptions("192.168.178.1", 49000)
        .unwrap();

    let mut requests = manager.fetcher().requests();
    requests.sort();
    assert_eq!(
        requests,
        vec![
            "http://192.168.178.1:49000/igdconnSCPD.xml".to_string(),
            "http://192.168.178.1:49000/igdl3fwdSCPD.xml".to_string(),
        ]
    );

    // the load is visible through the description as well
    let via_description = &manager.descriptions()[0].services()["WANIPConn1"];
    assert!(via_description.is_loaded());
    assert_eq!(via_description.action_names(), vec!["GetInfo"]);
}

#[test]
fn test_load_failure_aborts_iteration() {
    // only the second service's SCPD is served
    let fetcher = RecordingFetcher::default()
        .with("http://192.168.178.1:49000/igdconnSCPD.xml", SCPD);

    let mut manager = DeviceManager::with_fetcher(fetcher);
    manager.add_description(data_path("igddesc.xml")).unwrap();
    manager.scan();

    let first = manager.services().get_index(0).unwrap().1.clone();
    assert_eq!(first.name(), "Layer3Forwarding1");

    let err = manager
        .load_service_descriptions("192.168.178.1", 49000)
        .unwrap_err();

    assert!(matches!(err, DeviceError::AccessDenied(_)));
    assert_eq!(manager.fetcher().requests().len(), 1);
    assert!(!manager.service("WANIPConn1").unwrap().is_loaded());
}

#[test]
fn test_load_without_scan_requests_nothing() {
    let fetcher = RecordingFetcher::default();
    let mut manager = DeviceManager::with_fetcher(fetcher);
    manager.add_description(data_path("igddesc.xml")).unwrap();

    manager
        .load_service_descriptions("192.168.178.1", 49000)
        .unwrap();
    assert!(manager.fetcher().requests().is_empty());
}
