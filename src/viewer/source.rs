//! Document byte source
//!
//! Resolves where the document lives, fetches its bytes, and checks the
//! response before anything is handed to the decoding engine.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use super::error::{ViewerError, ViewerResult};

/// Characters of body text quoted when the content type is wrong
pub const SNIPPET_LEN: usize = 120;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Where the document bytes are requested from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocation {
    /// Used verbatim
    Fixed(String),
    /// Prefixed with the first segment of the hosting location, so a page
    /// served from `/site/index.html` loads `/site/<path>`
    HostPrefixed(String),
}

impl SourceLocation {
    /// Resolve against the path the host page is served from
    #[must_use]
    pub fn resolve(&self, host_path: &str) -> String {
        match self {
            Self::Fixed(path) => path.clone(),
            Self::HostPrefixed(path) => {
                let relative = path.trim_start_matches("./").trim_start_matches('/');
                match host_path.split('/').find(|s| !s.is_empty()) {
                    // A lone file name at the root (`/index.html`) is not a prefix
                    Some(first) if host_path.trim_start_matches('/').contains('/') => {
                        format!("/{first}/{relative}")
                    }
                    _ => format!("/{relative}"),
                }
            }
        }
    }
}

/// Raw fetch result; status and content type are not yet checked
#[derive(Clone, Debug)]
pub struct FetchedDocument {
    pub location: String,
    pub status: u16,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FetchedDocument {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait(?Send)]
pub trait DocumentSource {
    async fn fetch(&self, location: &str) -> ViewerResult<FetchedDocument>;
}

/// Check status and content type, returning the bytes if they look like a PDF
pub fn validate(fetched: FetchedDocument) -> ViewerResult<Vec<u8>> {
    if !fetched.is_success() {
        return Err(ViewerError::SourceUnreachable {
            location: fetched.location,
            status: fetched.status,
        });
    }

    if !fetched.content_type.to_ascii_lowercase().contains("pdf") {
        return Err(ViewerError::WrongContentType {
            content_type: fetched.content_type,
            snippet: snippet(&fetched.bytes),
        });
    }

    Ok(fetched.bytes)
}

/// First characters of a body, for error messages
#[must_use]
pub fn snippet(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim().chars().take(SNIPPET_LEN).collect()
}

/// Guess a content type from the leading bytes
#[must_use]
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PDF_MAGIC) {
        "application/pdf"
    } else if std::str::from_utf8(bytes).is_ok() {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

/// Serves locations from a directory on disk, like a static file server
#[derive(Clone, Debug)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location onto the root, refusing to climb out of it
    fn path_for(&self, location: &str) -> Option<PathBuf> {
        let relative = Path::new(location.trim_start_matches('/'));
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }

    fn not_found(location: &str) -> FetchedDocument {
        FetchedDocument {
            location: location.to_string(),
            status: 404,
            content_type: "text/plain".to_string(),
            bytes: Vec::new(),
        }
    }
}

#[async_trait(?Send)]
impl DocumentSource for FileSource {
    async fn fetch(&self, location: &str) -> ViewerResult<FetchedDocument> {
        let Some(path) = self.path_for(location) else {
            return Ok(Self::not_found(location));
        };
        debug!("Fetching {location} from {path:?}");

        match std::fs::read(&path) {
            Ok(bytes) => Ok(FetchedDocument {
                location: location.to_string(),
                status: 200,
                content_type: sniff_content_type(&bytes).to_string(),
                bytes,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::not_found(location)),
            Err(e) => {
                debug!("Failed to read {path:?}: {e}");
                Ok(FetchedDocument {
                    location: location.to_string(),
                    status: 500,
                    content_type: "text/plain".to_string(),
                    bytes: e.to_string().into_bytes(),
                })
            }
        }
    }
}
