use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile { source: io::Error, path: PathBuf },

    #[error("An I/O error has occurred while reading the capture: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    // Errors related to the header section
    #[error("The collected header lines do not form a valid JSON object: {source}")]
    InvalidHeader { source: serde_json::Error },

    #[error("The capture header is missing the `{table}` constants table")]
    MissingConstants { table: &'static str },

    #[error("The capture ended before the event stream started")]
    MissingEventStream,

    // Errors related to the event section
    #[error(
        "Line {line_number}: event fragment failed to decode under both trailing-terminator \
         interpretations: {source}"
    )]
    FailedToDecodeFragment {
        line_number: u64,
        source: serde_json::Error,
    },
}
