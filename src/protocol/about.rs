//! The `about:` scheme: static informational responses.

use crate::base::neterror::NetError;
use crate::urlrequest::job::{JobResponse, JobStart, ProtocolHandler, URLRequestJob};
use crate::urlrequest::request::URLRequest;

/// Serves `about:blank`, `about:version`, and an empty page for anything
/// else under the scheme.
#[derive(Debug, Default)]
pub struct AboutProtocolHandler;

impl AboutProtocolHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ProtocolHandler for AboutProtocolHandler {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        Ok(Box::new(AboutJob {
            page: request.url().path().to_string(),
        }))
    }
}

struct AboutJob {
    page: String,
}

impl URLRequestJob for AboutJob {
    fn start(self: Box<Self>) -> JobStart {
        Box::pin(async move {
            let response = match self.page.as_str() {
                "blank" | "" => JobResponse::with_body("text/html", ""),
                "version" => JobResponse::with_body(
                    "text/plain",
                    format!(
                        "{} {}",
                        env!("CARGO_PKG_NAME"),
                        env!("CARGO_PKG_VERSION")
                    ),
                ),
                _ => JobResponse::with_body("text/html", ""),
            };
            Ok(response)
        })
    }
}
