//! A parser and analyzer for Chromium NetLog network-activity captures.
//!
//! A capture is a large, line-oriented, quasi-JSON log of low-level
//! networking events (socket opens, DNS jobs, URL requests, byte
//! transfers). [`NetLogParser`] reconstructs it into an in-memory event
//! graph ([`NetLog`]), and the extraction methods on the graph answer a
//! fixed set of questions over it: DNS lookups performed, URLs requested,
//! HTTP redirects, opened connections, and raw resource bytes transferred.
//!
//! ```no_run
//! use netlog::NetLogParser;
//!
//! # fn main() -> netlog::Result<()> {
//! let netlog = NetLogParser::new().parse_path("capture.json")?;
//!
//! for query in netlog.find_dns_queries() {
//!     println!("{} -> {:?}", query.host, query.addresses);
//! }
//! # Ok(())
//! # }
//! ```

pub mod err;
pub mod event;
pub mod extract;
pub mod fragment;
pub mod netlog;
pub mod netlog_parser;
pub mod source_writer;
pub mod type_registry;

pub use err::{Error, Result};
pub use event::Event;
pub use extract::{
    Connection, DnsQuery, Redirection, ResourceSource, Transport, UNENCRYPTED_DATA_TYPE,
    UrlRequest,
};
pub use fragment::{EventFragment, Phase, SourceDescriptor};
pub use netlog::NetLog;
pub use netlog_parser::{DEFAULT_LINE_CAPACITY, NetLogParser, ParserSettings};
pub use source_writer::{WriteReport, write_sources};
pub use type_registry::{TypeRegistry, UNKNOWN_TYPE};
