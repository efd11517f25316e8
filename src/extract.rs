use std::fmt;
use std::net::IpAddr;

use log::debug;
use serde_json::Value;

use crate::netlog::NetLog;

const DNS_JOB_LABEL: &str = "HOST_RESOLVER_IMPL_JOB";
const URL_REQUEST_LABEL: &str = "URL_REQUEST";
const TCP_SOCKET_LABEL: &str = "SOCKET";
const UDP_SOCKET_LABEL: &str = "UDP_SOCKET";

/// Event-type code of unencrypted byte-transfer fragments.
///
/// This code comes from the capturing browser's own event enumeration, not
/// from the capture's type registry, so a different browser version may
/// assign a different number. Use [`NetLog::find_sources_with_data_type`]
/// to override it.
pub const UNENCRYPTED_DATA_TYPE: u32 = 111;

/// One DNS resolution performed during the capture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsQuery {
    pub host: String,
    pub addresses: Vec<IpAddr>,
    pub time_ms: i64,
}

/// One URL requested during the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRequest {
    pub url: String,
    pub time_ms: i64,
}

/// One HTTP redirect observed on a URL request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub from: String,
    pub to: String,
    pub status: u16,
    pub time_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => f.write_str("TCP"),
            Transport::Udp => f.write_str("UDP"),
        }
    }
}

/// One socket opened during the capture. Endpoints the capture never
/// mentioned stay `"UNKNOWN"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub transport: Transport,
    pub source: String,
    pub destination: String,
}

/// A resource fetched to render the page, with its payload still in the
/// base64 chunks the capture carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSource {
    pub resource_name: String,
    pub base64_chunks: Vec<String>,
}

impl NetLog {
    /// Collects the DNS lookups performed during the capture.
    ///
    /// The last `host` param seen on a job sets the query's host and
    /// timestamp. `address_list` entries are `"address:port"` strings;
    /// entries whose address part is not an IP literal are skipped.
    pub fn find_dns_queries(&self) -> Vec<DnsQuery> {
        let mut queries = Vec::new();

        for event in self.events().filter(|e| e.type_label == DNS_JOB_LABEL) {
            let mut query = DnsQuery::default();

            for fragment in &event.fragments {
                if let Some(host) = fragment.param_str("host") {
                    query.host = host.to_owned();
                    query.time_ms = fragment.time_ms();
                }

                if let Some(entries) = fragment.param_seq("address_list") {
                    for entry in entries.iter().filter_map(Value::as_str) {
                        // Split at the last colon so IPv6 literals keep their
                        // address part, then drop the surrounding brackets.
                        let address = entry.rsplit_once(':').map_or(entry, |(addr, _)| addr);
                        let address = address.trim_start_matches('[').trim_end_matches(']');

                        match address.parse() {
                            Ok(ip) => query.addresses.push(ip),
                            Err(_) => debug!("skipping unparsable address entry {entry:?}"),
                        }
                    }
                }
            }

            queries.push(query);
        }

        queries
    }

    /// Collects the URLs requested during the capture.
    ///
    /// Only the first `url` param of each request event is reported; later
    /// ones belong to redirects and are surfaced by [`find_redirections`]
    /// instead.
    ///
    /// [`find_redirections`]: NetLog::find_redirections
    pub fn find_url_requests(&self) -> Vec<UrlRequest> {
        let mut requests = Vec::new();

        for event in self.events().filter(|e| e.type_label == URL_REQUEST_LABEL) {
            if let Some(fragment) = event
                .fragments
                .iter()
                .find(|f| f.param_str("url").is_some())
            {
                requests.push(UrlRequest {
                    url: fragment.param_str("url").unwrap_or_default().to_owned(),
                    time_ms: fragment.time_ms(),
                });
            }
        }

        requests
    }

    /// Collects the HTTP redirects observed during the capture.
    ///
    /// The redirect origin is the first `url` param on the request event.
    /// The target and status are read from the first `headers` param whose
    /// leading line is not a request line (does not mention `method`):
    /// a header containing `302` or `301` sets the status and a `location`
    /// header yields the target as its second space-delimited token.
    /// Status detection is a substring match, so any header carrying those
    /// digits elsewhere (a content length, say) also triggers it; the format
    /// offers no structured status field to read instead.
    pub fn find_redirections(&self) -> Vec<Redirection> {
        let mut redirections = Vec::new();

        for event in self.events().filter(|e| e.type_label == URL_REQUEST_LABEL) {
            let mut from: Option<&str> = None;
            let mut to: Option<&str> = None;
            let mut status: Option<u16> = None;
            let mut time_ms = 0;

            for fragment in &event.fragments {
                if from.is_none() {
                    from = fragment.param_str("url");
                }

                if let Some(headers) = fragment.param_seq("headers") {
                    let Some(first) = headers.first() else {
                        continue;
                    };
                    if first.to_string().contains("method") {
                        continue;
                    }

                    time_ms = fragment.time_ms();
                    for header in headers.iter().filter_map(Value::as_str) {
                        if header.contains("302") {
                            status = Some(302);
                        }
                        if header.contains("301") {
                            status = Some(301);
                        }
                        if header.contains("location") {
                            if let Some(target) = header.split_whitespace().nth(1) {
                                to = Some(target);
                            }
                        }
                    }
                }
            }

            if let (Some(from), Some(to), Some(status)) = (from, to, status) {
                redirections.push(Redirection {
                    from: from.to_owned(),
                    to: to.to_owned(),
                    status,
                    time_ms,
                });
            }
        }

        redirections
    }

    /// Collects the sockets opened during the capture, one connection per
    /// socket event even when neither endpoint was recorded.
    pub fn find_opened_sockets(&self) -> Vec<Connection> {
        let mut connections = Vec::new();

        for event in self.events() {
            let transport = match event.type_label.as_str() {
                TCP_SOCKET_LABEL => Transport::Tcp,
                UDP_SOCKET_LABEL => Transport::Udp,
                _ => continue,
            };

            let mut connection = Connection {
                transport,
                source: "UNKNOWN".to_owned(),
                destination: "UNKNOWN".to_owned(),
            };

            for fragment in &event.fragments {
                if let Some(address) = fragment.param_str("address") {
                    connection.destination = address.to_owned();
                }
                if let Some(address) = fragment.param_str("source_address") {
                    connection.source = address.to_owned();
                }
            }

            connections.push(connection);
        }

        connections
    }

    /// Collects resources transferred during the capture, with
    /// [`UNENCRYPTED_DATA_TYPE`] marking the byte-carrying fragments.
    pub fn find_sources(&self) -> Vec<ResourceSource> {
        self.find_sources_with_data_type(UNENCRYPTED_DATA_TYPE)
    }

    /// Collects resources transferred during the capture.
    ///
    /// The resource name is the last `url` param on the request event, so
    /// across a redirect chain the final URL wins. `bytes` params are
    /// gathered, in encounter order, from fragments whose event-type code is
    /// `data_type`. Only resources with both a name and at least one chunk
    /// are reported.
    pub fn find_sources_with_data_type(&self, data_type: u32) -> Vec<ResourceSource> {
        let mut sources = Vec::new();

        for event in self.events().filter(|e| e.type_label == URL_REQUEST_LABEL) {
            let mut resource_name: Option<&str> = None;
            let mut chunks = Vec::new();

            for fragment in &event.fragments {
                if let Some(url) = fragment.param_str("url") {
                    resource_name = Some(url);
                }

                if fragment.event_type == data_type {
                    if let Some(bytes) = fragment.param_str("bytes") {
                        chunks.push(bytes.to_owned());
                    }
                }
            }

            match resource_name {
                Some(name) if !chunks.is_empty() => sources.push(ResourceSource {
                    resource_name: name.to_owned(),
                    base64_chunks: chunks,
                }),
                _ => {}
            }
        }

        sources
    }
}
