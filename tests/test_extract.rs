
use fixtures::*;

use std::fs;
use std::net::IpAddr;

use netlog::{NetLogParser, Redirection, Transport, write_sources};
use pretty_assertions::assert_eq;

#[test]
fn it_extracts_dns_queries_from_the_tiny_capture() {
    ensure_env_logger_initialized();
    let netlog = NetLogParser::new().parse_path(tiny_capture()).unwrap();

    let queries = netlog.find_dns_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].host, "example.com");
    assert_eq!(queries[0].time_ms, 1000);
    assert_eq!(
        queries[0].addresses,
        vec!["93.184.216.34".parse::<IpAddr>().unwrap()]
    );
}

#[test]
fn it_extracts_the_first_url_of_the_request() {
    ensure_env_logger_initialized();
    let netlog = NetLogParser::new().parse_path(tiny_capture()).unwrap();

    let requests = netlog.find_url_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://a.test/");
    assert_eq!(requests[0].time_ms, 1010);
}

#[test]
fn it_extracts_the_redirect_chain() {
    ensure_env_logger_initialized();
    let netlog = NetLogParser::new().parse_path(tiny_capture()).unwrap();

    assert_eq!(
        netlog.find_redirections(),
        vec![Redirection {
            from: "http://a.test/".to_owned(),
            to: "http://a.test/home".to_owned(),
            status: 301,
            time_ms: 1020,
        }]
    );
}

#[test]
fn it_extracts_both_sockets() {
    ensure_env_logger_initialized();
    let netlog = NetLogParser::new().parse_path(tiny_capture()).unwrap();

    let mut connections = netlog.find_opened_sockets();
    connections.sort_by_key(|c| c.transport == Transport::Udp);

    assert_eq!(connections.len(), 2);
    assert_eq!(connections[0].transport, Transport::Tcp);
    assert_eq!(connections[0].destination, "93.184.216.34:443");
    assert_eq!(connections[0].source, "10.0.0.5:51000");
    assert_eq!(connections[1].transport, Transport::Udp);
    assert_eq!(connections[1].destination, "UNKNOWN");
    assert_eq!(connections[1].source, "UNKNOWN");
}

#[test]
fn extracted_resources_round_trip_to_disk() {
    ensure_env_logger_initialized();
    let netlog = NetLogParser::new().parse_path(tiny_capture()).unwrap();

    let sources = netlog.find_sources();
    assert_eq!(sources.len(), 1);
    // Across the redirect the final URL names the resource.
    assert_eq!(sources[0].resource_name, "http://a.test/home");

    let dir = tempfile::tempdir().unwrap();
    let report = write_sources(&sources, dir.path(), |_| true).unwrap();
    assert_eq!(report.written, 1);

    let payload = fs::read(dir.path().join("a.test").join("home")).unwrap();
    assert_eq!(payload, b"<html>hello</html>");
}
