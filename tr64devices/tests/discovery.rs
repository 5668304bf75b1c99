use std::fs;
use std::path::Path;

use httpmock::prelude::*;
use tr64config::Config;
use tr64devices::{DeviceError, HttpFetcher, discover, discover_with};

fn data(file: &str) -> String {
    fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("data")
            .join(file),
    )
    .unwrap()
}

fn serve_xml(server: &MockServer, path: &str, file: &str) {
    let body = data(file);
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(200)
            .header("Content-Type", "text/xml")
            .body(&body);
    });
}

#[test]
fn test_discover_skips_missing_igddesc() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let server = MockServer::start();
    let igd = server.mock(|when, then| {
        when.method(GET).path("/igddesc.xml");
        then.status(404);
    });
    serve_xml(&server, "/tr64desc.xml", "tr64desc.xml");
    serve_xml(&server, "/deviceinfoSCPD.xml", "deviceinfoSCPD.xml");
    serve_xml(&server, "/wanipconnSCPD.xml", "wanipconnSCPD.xml");

    let config = Config::from_yaml_str(&format!(
        "device:\n  address: 127.0.0.1\n  port: {}\nhttp:\n  timeout_secs: 5\n",
        server.port()
    ))
    .unwrap();

    let manager = discover(&config).unwrap();

    igd.assert();
    assert_eq!(manager.descriptions().len(), 1);
    assert_eq!(manager.modelname().unwrap(), "FRITZ!Box 7590");

    let info = manager.service("DeviceInfo1").unwrap();
    let scpd = info.scpd().unwrap();
    let get_info = scpd.action("GetInfo").unwrap();
    assert_eq!(get_info.out_arguments().count(), 2);

    let wan = manager.service("WANIPConnection1").unwrap();
    assert_eq!(
        wan.action_names(),
        vec!["GetExternalIPAddress", "ForceTermination"]
    );
}

#[test]
fn test_discover_skips_login_page() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/igddesc.xml");
        then.status(200)
            .header("Content-Type", "text/html")
            .body("<html/>");
    });
    serve_xml(&server, "/tr64desc.xml", "tr64desc.xml");
    serve_xml(&server, "/deviceinfoSCPD.xml", "deviceinfoSCPD.xml");
    serve_xml(&server, "/wanipconnSCPD.xml", "wanipconnSCPD.xml");

    let manager = discover_with(
        HttpFetcher::default(),
        "127.0.0.1",
        server.port(),
        &["igddesc.xml", "tr64desc.xml"],
    )
    .unwrap();

    assert_eq!(manager.services().len(), 2);
    assert!(manager.services().values().all(|s| s.is_loaded()));
}

#[test]
fn test_discover_without_any_description() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(404);
    });

    let err = discover_with(
        HttpFetcher::default(),
        "127.0.0.1",
        server.port(),
        &["igddesc.xml", "tr64desc.xml"],
    )
    .unwrap_err();

    assert!(matches!(err, DeviceError::NoDescription));
}

#[test]
fn test_discover_propagates_malformed_xml() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/tr64desc.xml");
        then.status(200)
            .header("Content-Type", "text/xml")
            .body("<root><device></root>");
    });

    let err = discover_with(
        HttpFetcher::default(),
        "127.0.0.1",
        server.port(),
        &["tr64desc.xml"],
    )
    .unwrap_err();

    assert!(matches!(err, DeviceError::Xml(_)));
}
