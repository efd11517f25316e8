use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use serde_json::Value;

use crate::err::{Error, Result};
use crate::fragment::EventFragment;
use crate::netlog::NetLog;
use crate::type_registry::TypeRegistry;

/// Key whose appearance ends the header section. The header object itself
/// ended on the previous line; the event stream starts on the next one.
const EVENT_STREAM_MARKER: &str = "\"events\"";

/// Initial line-buffer capacity. Lines carrying embedded resource bytes can
/// run to hundreds of kilobytes; the buffer grows past this if needed.
pub const DEFAULT_LINE_CAPACITY: usize = 192 * 1024;

#[derive(Debug, Clone)]
pub struct ParserSettings {
    line_capacity: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            line_capacity: DEFAULT_LINE_CAPACITY,
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the initial capacity of the line buffer.
    pub fn line_capacity(mut self, capacity: usize) -> Self {
        self.line_capacity = capacity;
        self
    }
}

/// Streaming decoder for a NetLog capture.
///
/// The capture is line-oriented quasi-JSON: a header object spread over the
/// leading lines, then one event fragment per line, comma-terminated, with
/// the final line closing the enclosing array/object instead. The scan is a
/// single forward pass; each decoded fragment is attributed to its event
/// immediately.
pub struct NetLogParser {
    settings: ParserSettings,
}

impl NetLogParser {
    pub fn new() -> Self {
        NetLogParser {
            settings: ParserSettings::default(),
        }
    }

    pub fn with_configuration(settings: ParserSettings) -> Self {
        NetLogParser { settings }
    }

    /// Parses the capture at `path` into a fully-populated event graph.
    ///
    /// Any decode failure is fatal: no partial graph is ever returned.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<NetLog> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::FailedToOpenFile {
            source,
            path: path.to_path_buf(),
        })?;

        self.parse_read(BufReader::new(file))
    }

    /// Parses a capture from any buffered reader.
    pub fn parse_read<R: BufRead>(&self, mut reader: R) -> Result<NetLog> {
        let mut header_text = String::new();
        let mut line = String::with_capacity(self.settings.line_capacity);
        let mut line_number: u64 = 0;
        let mut netlog: Option<NetLog> = None;

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_number += 1;
            let trimmed = line.trim_end();

            match netlog {
                None => {
                    if trimmed.contains(EVENT_STREAM_MARKER) {
                        let registry = decode_header(&header_text)?;
                        info!(
                            "header consumed after {} lines, registry holds {} type names",
                            line_number - 1,
                            registry.len()
                        );
                        netlog = Some(NetLog::with_registry(registry));
                    } else {
                        header_text.push_str(trimmed);
                    }
                }
                Some(ref mut graph) => {
                    graph.insert_fragment(decode_fragment(trimmed, line_number)?);
                }
            }
        }

        debug!("scanned {line_number} lines");
        netlog.ok_or(Error::MissingEventStream)
    }
}

impl Default for NetLogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes the accumulated header lines into the type registry.
///
/// The collected text is a truncated JSON object (the event-stream key and
/// everything after it are cut off), so the trailing comma is stripped and
/// the object is closed explicitly before decoding.
fn decode_header(header_text: &str) -> Result<TypeRegistry> {
    let mut text = header_text
        .strip_suffix(',')
        .unwrap_or(header_text)
        .to_owned();
    text.push('}');

    let header: Value =
        serde_json::from_str(&text).map_err(|source| Error::InvalidHeader { source })?;

    TypeRegistry::from_header(&header)
}

/// Decodes one event line, tolerating the two trailing terminators the
/// format uses: a plain comma between entries, and the closing `]}` on the
/// final line. A line that fails under both interpretations is fatal.
fn decode_fragment(line: &str, line_number: u64) -> Result<EventFragment> {
    let stripped = line.strip_suffix(',').unwrap_or(line);

    match serde_json::from_str(stripped) {
        Ok(fragment) => Ok(fragment),
        Err(_) => {
            let alternate = stripped.strip_suffix("]}").unwrap_or(stripped);
            serde_json::from_str(alternate).map_err(|source| Error::FailedToDecodeFragment {
                line_number,
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = concat!(
        r#"{"constants": {"logEventTypes": {"REQUEST_ALIVE": 2}, "#,
        r#""logSourceType": {"URL_REQUEST": 7}},"#,
        "\n",
        r#""events": ["#,
        "\n",
        r#"{"phase":1,"source":{"id":1,"type":7},"time":"100","type":2},"#,
        "\n",
        r#"{"params":{"url":"http://a.test/x"},"phase":0,"source":{"id":1,"type":7},"time":"101","type":2},"#,
        "\n",
        r#"{"phase":2,"source":{"id":1,"type":7},"time":"102","type":2}]}"#,
        "\n",
    );

    #[test]
    fn it_parses_a_complete_capture() {
        let netlog = NetLogParser::new()
            .parse_read(SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(netlog.len(), 1);
        let event = netlog.event(1).unwrap();
        assert_eq!(event.type_label, "URL_REQUEST");
        assert_eq!(event.fragments.len(), 3);
        assert_eq!(event.fragments[0].time, "100");
        assert_eq!(event.fragments[2].time, "102");
    }

    #[test]
    fn the_final_line_may_close_the_event_array() {
        // The last fragment above ends in `]}` rather than a comma and must
        // still decode through the alternate-terminator retry.
        let netlog = NetLogParser::new()
            .parse_read(SAMPLE.as_bytes())
            .unwrap();

        let last = netlog.event(1).unwrap().fragments.last().unwrap();
        assert_eq!(last.time, "102");
    }

    #[test]
    fn a_line_failing_both_decode_attempts_aborts_the_parse() {
        let capture = concat!(
            r#"{"constants": {"logEventTypes": {}, "logSourceType": {}},"#,
            "\n",
            r#""events": ["#,
            "\n",
            r#"{"phase":1,"source":{"id":1,"type":7},"time":"100","type":2},"#,
            "\n",
            "this is not json,\n",
        );

        match NetLogParser::new().parse_read(capture.as_bytes()) {
            Err(Error::FailedToDecodeFragment { line_number, .. }) => assert_eq!(line_number, 4),
            other => panic!("expected FailedToDecodeFragment, got {other:?}"),
        }
    }

    #[test]
    fn a_capture_without_an_event_stream_is_rejected() {
        let capture = r#"{"constants": {"logEventTypes": {}, "logSourceType": {}}}"#;

        assert!(matches!(
            NetLogParser::new().parse_read(capture.as_bytes()),
            Err(Error::MissingEventStream)
        ));
    }

    #[test]
    fn a_malformed_header_is_rejected() {
        let capture = concat!("{\"constants\": {{{,\n", "\"events\": [\n");

        assert!(matches!(
            NetLogParser::new().parse_read(capture.as_bytes()),
            Err(Error::InvalidHeader { .. })
        ));
    }

    #[test]
    fn an_unmapped_source_type_labels_as_unknown() {
        let capture = concat!(
            r#"{"constants": {"logEventTypes": {}, "logSourceType": {"URL_REQUEST": 7}},"#,
            "\n",
            r#""events": ["#,
            "\n",
            r#"{"phase":0,"source":{"id":9,"type":1234},"time":"5","type":1}]}"#,
            "\n",
        );

        let netlog = NetLogParser::new().parse_read(capture.as_bytes()).unwrap();
        assert_eq!(netlog.event(9).unwrap().type_label, "UNKNOWN_TYPE");
    }
}
