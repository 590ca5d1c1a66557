//! The `data:` scheme: inline payloads per RFC 2397.
//!
//! `data:[<mediatype>][;base64],<data>` with percent-decoding for plain
//! payloads and base64 decoding when the `;base64` marker is present.

use crate::base::neterror::NetError;
use crate::urlrequest::job::{JobResponse, JobStart, ProtocolHandler, URLRequestJob};
use crate::urlrequest::request::URLRequest;
use base64::{engine::general_purpose, Engine as _};
use percent_encoding::percent_decode_str;

const DEFAULT_MEDIATYPE: &str = "text/plain;charset=US-ASCII";

#[derive(Debug, Default)]
pub struct DataProtocolHandler;

impl DataProtocolHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ProtocolHandler for DataProtocolHandler {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        let (mediatype, body) = parse_data_url(request.url().as_str())?;
        Ok(Box::new(DataJob { mediatype, body }))
    }
}

struct DataJob {
    mediatype: String,
    body: Vec<u8>,
}

impl URLRequestJob for DataJob {
    fn start(self: Box<Self>) -> JobStart {
        let DataJob { mediatype, body } = *self;
        Box::pin(async move { Ok(JobResponse::with_body(&mediatype, body)) })
    }
}

/// Split and decode a data URL into (mediatype, payload).
fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), NetError> {
    let rest = url.strip_prefix("data:").ok_or(NetError::InvalidUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(NetError::InvalidUrl)?;

    let (mediatype, is_base64) = match header.strip_suffix(";base64") {
        Some(mediatype) => (mediatype, true),
        None => (header, false),
    };
    let mediatype = if mediatype.is_empty() {
        DEFAULT_MEDIATYPE.to_string()
    } else {
        mediatype.to_string()
    };

    let body = if is_base64 {
        // Payloads may arrive percent-encoded as a whole.
        let decoded = percent_decode_str(payload).collect::<Vec<u8>>();
        general_purpose::STANDARD
            .decode(decoded)
            .map_err(|_| NetError::InvalidUrl)?
    } else {
        percent_decode_str(payload).collect()
    };

    Ok((mediatype, body))
}
