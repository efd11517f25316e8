use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use log::{info, warn};
use url::Url;

use crate::err::Result;
use crate::extract::ResourceSource;

/// Longest file name derived from a URL path segment, in bytes.
const MAX_FILE_NAME_LEN: usize = 128;

/// Outcome of a [`write_sources`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    pub written: usize,
    pub total: usize,
}

/// Decodes extracted resources and writes them under `out_dir`, one
/// `<host>/<name>` file per resource.
///
/// The file name is the last path segment of the resource URL, or a
/// generated `index-N` name when the URL path ends in a slash.
/// `confirm_overwrite` is consulted before replacing an existing file, so
/// an interactive caller can prompt. Per-resource failures (unparsable URL,
/// undecodable chunk, failed write) are logged and skipped; only failure to
/// create `out_dir` itself is fatal.
pub fn write_sources(
    sources: &[ResourceSource],
    out_dir: impl AsRef<Path>,
    mut confirm_overwrite: impl FnMut(&Path) -> bool,
) -> Result<WriteReport> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;

    let mut written = 0;

    for (index, source) in sources.iter().enumerate() {
        let Some(path) = resource_path(out_dir, source, index) else {
            continue;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("could not create {}: {e}", parent.display());
                continue;
            }
        }

        if path.exists() && !confirm_overwrite(&path) {
            info!("skipping existing file {}", path.display());
            continue;
        }

        match fs::write(&path, decode_chunks(source)) {
            Ok(()) => {
                info!("wrote {}", path.display());
                written += 1;
            }
            Err(e) => warn!("file {} was not written: {e}", path.display()),
        }
    }

    Ok(WriteReport {
        written,
        total: sources.len(),
    })
}

fn resource_path(out_dir: &Path, source: &ResourceSource, index: usize) -> Option<PathBuf> {
    let url = match Url::parse(&source.resource_name) {
        Ok(url) => url,
        Err(e) => {
            warn!("skipping resource with unparsable url {:?}: {e}", source.resource_name);
            return None;
        }
    };

    let name = match url.path_segments().and_then(|mut segments| segments.next_back()) {
        Some(segment) if !segment.is_empty() => truncated(segment),
        _ => format!("index-{index}"),
    };

    let host = url.host_str().unwrap_or("unknown-host");
    Some(out_dir.join(host).join(name))
}

fn truncated(name: &str) -> String {
    if name.len() <= MAX_FILE_NAME_LEN {
        return name.to_owned();
    }

    // Cut on a char boundary at or below the limit.
    let mut end = MAX_FILE_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}

/// Concatenates the decoded payload. Chunks that fail base64 decoding are
/// dropped, keeping whatever the rest of the payload holds.
fn decode_chunks(source: &ResourceSource) -> Vec<u8> {
    let mut payload = Vec::new();

    for chunk in &source.base64_chunks {
        match BASE64_STANDARD.decode(chunk) {
            Ok(bytes) => payload.extend_from_slice(&bytes),
            Err(e) => warn!(
                "skipped a chunk of {:?} while decoding: {e}",
                source.resource_name
            ),
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resource(name: &str, chunks: &[&str]) -> ResourceSource {
        ResourceSource {
            resource_name: name.to_owned(),
            base64_chunks: chunks.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    #[test]
    fn it_writes_resources_under_their_host_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![resource("http://a.test/static/app.js", &["aGVsbG8=", "IHdvcmxk"])];

        let report = write_sources(&sources, dir.path(), |_| true).unwrap();

        assert_eq!(report, WriteReport { written: 1, total: 1 });
        let payload = fs::read(dir.path().join("a.test").join("app.js")).unwrap();
        assert_eq!(payload, b"hello world");
    }

    #[test]
    fn empty_path_segments_get_a_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            resource("http://a.test/", &["aGVsbG8="]),
            resource("http://b.test/sub/", &["aGVsbG8="]),
        ];

        let report = write_sources(&sources, dir.path(), |_| true).unwrap();

        assert_eq!(report.written, 2);
        assert!(dir.path().join("a.test").join("index-0").exists());
        assert!(dir.path().join("b.test").join("index-1").exists());
    }

    #[test]
    fn undecodable_chunks_are_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![resource("http://a.test/x", &["!!not-base64!!", "aGVsbG8="])];

        let report = write_sources(&sources, dir.path(), |_| true).unwrap();

        assert_eq!(report.written, 1);
        let payload = fs::read(dir.path().join("a.test").join("x")).unwrap();
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn unparsable_resource_names_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            resource("not a url at all", &["aGVsbG8="]),
            resource("http://a.test/ok", &["aGVsbG8="]),
        ];

        let report = write_sources(&sources, dir.path(), |_| true).unwrap();

        assert_eq!(report, WriteReport { written: 1, total: 2 });
    }

    #[test]
    fn existing_files_are_kept_when_overwrite_is_declined() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![resource("http://a.test/x", &["aGVsbG8="])];

        write_sources(&sources, dir.path(), |_| true).unwrap();
        fs::write(dir.path().join("a.test").join("x"), b"original").unwrap();

        let report = write_sources(&sources, dir.path(), |_| false).unwrap();

        assert_eq!(report.written, 0);
        let payload = fs::read(dir.path().join("a.test").join("x")).unwrap();
        assert_eq!(payload, b"original");
    }

    #[test]
    fn overlong_names_are_truncated() {
        let long = "x".repeat(300);
        let url = format!("http://a.test/{long}");
        let dir = tempfile::tempdir().unwrap();

        write_sources(&[resource(&url, &["aGVsbG8="])], dir.path(), |_| true).unwrap();

        assert!(
            dir.path()
                .join("a.test")
                .join("x".repeat(MAX_FILE_NAME_LEN))
                .exists()
        );
    }
}
