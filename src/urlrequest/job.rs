//! Jobs: the unit of work a protocol handler produces for one request.

use crate::base::neterror::NetError;
use crate::urlrequest::request::URLRequest;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderValue, StatusCode};

/// The response a completed job yields.
#[derive(Debug, Clone)]
pub struct JobResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl JobResponse {
    /// An empty 200 response.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// A 200 response with a body and content type.
    pub fn with_body(content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(http::header::CONTENT_TYPE, value);
        }
        Self {
            status: StatusCode::OK,
            headers,
            body: body.into(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Future returned by [`URLRequestJob::start`].
pub type JobStart = BoxFuture<'static, Result<JobResponse, NetError>>;

/// One unit of request-serving work.
///
/// A job is created by a protocol handler (or an interceptor) and started
/// at most once; starting consumes it.
pub trait URLRequestJob: Send {
    fn start(self: Box<Self>) -> JobStart;
}

/// Produces jobs for requests in one URL scheme.
pub trait ProtocolHandler: Send + Sync {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_body_sets_content_type() {
        let response = JobResponse::with_body("text/plain", "hello");
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(&response.body[..], b"hello");
    }

    #[test]
    fn test_empty() {
        let response = JobResponse::empty();
        assert!(response.body.is_empty());
        assert!(response.content_type().is_none());
    }
}
