//! The `ftp:` scheme.
//!
//! Constructed from the shared host resolver; the transfer protocol itself
//! is an external capability, so a started job performs resolution and then
//! hands off.

use crate::base::neterror::NetError;
use crate::dns::{Name, Resolve};
use crate::urlrequest::job::{JobStart, ProtocolHandler, URLRequestJob};
use crate::urlrequest::request::URLRequest;
use std::sync::Arc;

pub struct FtpProtocolHandler {
    resolver: Arc<dyn Resolve>,
}

impl FtpProtocolHandler {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self { resolver }
    }
}

impl ProtocolHandler for FtpProtocolHandler {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        let host = request
            .url()
            .host_str()
            .ok_or(NetError::InvalidUrl)?
            .to_string();
        Ok(Box::new(FtpJob {
            host,
            resolver: Arc::clone(&self.resolver),
        }))
    }
}

struct FtpJob {
    host: String,
    resolver: Arc<dyn Resolve>,
}

impl URLRequestJob for FtpJob {
    fn start(self: Box<Self>) -> JobStart {
        let FtpJob { host, resolver } = *self;
        Box::pin(async move {
            let _addrs = resolver.resolve(Name::new(host)).await?;
            Err(NetError::NotImplemented)
        })
    }
}
