//! The `file:` scheme, with archive awareness.
//!
//! A path like `/app/resources.pack/index.html` may address an entry
//! inside a packed archive rather than a real directory tree. The handler
//! walks the path's ancestors and, when one of them is an archive the
//! configured [`ArchiveReader`] understands, delegates the entry read to
//! it. The archive format itself is an embedder capability; this crate
//! only routes to it.

use crate::base::neterror::NetError;
use crate::urlrequest::job::{JobResponse, JobStart, ProtocolHandler, URLRequestJob};
use crate::urlrequest::request::URLRequest;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Embedder capability for reading entries out of packed archives.
pub trait ArchiveReader: Send + Sync {
    /// Whether `path` names an archive this reader understands.
    fn is_archive(&self, path: &Path) -> bool;

    /// Read one entry (relative path) out of `archive`.
    fn read_entry(&self, archive: &Path, entry: &Path) -> io::Result<Vec<u8>>;
}

/// Serves local files, delegating archive entries to the configured reader.
pub struct FileProtocolHandler {
    archive_reader: Option<Arc<dyn ArchiveReader>>,
}

impl FileProtocolHandler {
    /// Plain file serving only.
    pub fn new() -> Self {
        Self {
            archive_reader: None,
        }
    }

    /// File serving with archive-as-directory support.
    pub fn with_archive_reader(archive_reader: Arc<dyn ArchiveReader>) -> Self {
        Self {
            archive_reader: Some(archive_reader),
        }
    }
}

impl Default for FileProtocolHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolHandler for FileProtocolHandler {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        let path = request
            .url()
            .to_file_path()
            .map_err(|_| NetError::InvalidUrl)?;
        Ok(Box::new(FileJob {
            path,
            archive_reader: self.archive_reader.clone(),
        }))
    }
}

struct FileJob {
    path: PathBuf,
    archive_reader: Option<Arc<dyn ArchiveReader>>,
}

impl FileJob {
    fn read_blocking(
        path: &Path,
        archive_reader: Option<&Arc<dyn ArchiveReader>>,
    ) -> io::Result<Vec<u8>> {
        if path.is_file() {
            return std::fs::read(path);
        }

        // The path may traverse an archive addressed as a directory.
        if let Some(reader) = archive_reader {
            for ancestor in path.ancestors().skip(1) {
                if reader.is_archive(ancestor) {
                    let entry = path
                        .strip_prefix(ancestor)
                        .map_err(|_| io::Error::from(io::ErrorKind::NotFound))?;
                    return reader.read_entry(ancestor, entry);
                }
            }
        }

        Err(io::Error::from(io::ErrorKind::NotFound))
    }
}

impl URLRequestJob for FileJob {
    fn start(self: Box<Self>) -> JobStart {
        Box::pin(async move {
            let path = self.path;
            let reader = self.archive_reader;
            let content_type = content_type_for_path(&path).to_string();

            let body = tokio::task::spawn_blocking(move || {
                FileJob::read_blocking(&path, reader.as_ref())
            })
            .await
            .map_err(|_| NetError::Failed)?
            .map_err(|e| {
                tracing::debug!(error = %e, "file read failed");
                NetError::FileNotFound
            })?;

            Ok(JobResponse::with_body(&content_type, body))
        })
    }
}

fn content_type_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
