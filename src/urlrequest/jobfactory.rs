//! The scheme dispatch table.
//!
//! Maps URL scheme to protocol handler, built once per context. A scheme
//! can be claimed exactly once; the embedder's handlers are installed
//! first and built-ins fill only unclaimed schemes.

use crate::base::neterror::NetError;
use crate::urlrequest::job::{ProtocolHandler, URLRequestJob};
use crate::urlrequest::request::URLRequest;
use std::collections::HashMap;

/// Anything that can turn a request into a job: the dispatch table itself,
/// or an interceptor layer wrapped around it.
pub trait JobFactory: Send + Sync {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError>;
    fn is_handled_protocol(&self, scheme: &str) -> bool;
}

/// Scheme -> handler dispatch table.
#[derive(Default)]
pub struct URLRequestJobFactory {
    handlers: HashMap<String, Box<dyn ProtocolHandler>>,
}

impl URLRequestJobFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `scheme`.
    ///
    /// Returns false and leaves the existing handler in place when the
    /// scheme is already claimed; first registration wins.
    pub fn set_protocol_handler(
        &mut self,
        scheme: &str,
        handler: Box<dyn ProtocolHandler>,
    ) -> bool {
        let scheme = scheme.to_lowercase();
        if self.handlers.contains_key(&scheme) {
            tracing::debug!(scheme = %scheme, "scheme already registered, keeping first handler");
            return false;
        }
        self.handlers.insert(scheme, handler);
        true
    }

    /// The handler for `scheme`, if one is registered.
    pub fn resolve(&self, scheme: &str) -> Option<&dyn ProtocolHandler> {
        self.handlers.get(&scheme.to_lowercase()).map(Box::as_ref)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl JobFactory for URLRequestJobFactory {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        match self.resolve(request.scheme()) {
            Some(handler) => handler.create_job(request),
            None => Err(NetError::UnknownUrlScheme),
        }
    }

    fn is_handled_protocol(&self, scheme: &str) -> bool {
        self.handlers.contains_key(&scheme.to_lowercase())
    }
}

impl std::fmt::Debug for URLRequestJobFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("URLRequestJobFactory")
            .field("schemes", &schemes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urlrequest::job::{JobResponse, JobStart};

    struct TagHandler(&'static str);
    struct TagJob(&'static str);

    impl ProtocolHandler for TagHandler {
        fn create_job(&self, _request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
            Ok(Box::new(TagJob(self.0)))
        }
    }

    impl URLRequestJob for TagJob {
        fn start(self: Box<Self>) -> JobStart {
            let tag = self.0;
            Box::pin(async move { Ok(JobResponse::with_body("text/plain", tag)) })
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let mut factory = URLRequestJobFactory::new();
        assert!(factory.set_protocol_handler("custom", Box::new(TagHandler("first"))));
        assert!(!factory.set_protocol_handler("custom", Box::new(TagHandler("second"))));
        assert_eq!(factory.handler_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_by_scheme() {
        let mut factory = URLRequestJobFactory::new();
        factory.set_protocol_handler("alpha", Box::new(TagHandler("a")));
        factory.set_protocol_handler("beta", Box::new(TagHandler("b")));

        let request = URLRequest::new("beta://host/").unwrap();
        let response = factory.create_job(&request).unwrap().start().await.unwrap();
        assert_eq!(&response.body[..], b"b");
    }

    #[test]
    fn test_unknown_scheme() {
        let factory = URLRequestJobFactory::new();
        let request = URLRequest::new("nothing://host/").unwrap();
        assert_eq!(
            factory.create_job(&request).err().unwrap(),
            NetError::UnknownUrlScheme
        );
        assert!(!factory.is_handled_protocol("nothing"));
    }

    #[test]
    fn test_scheme_case_insensitive() {
        let mut factory = URLRequestJobFactory::new();
        factory.set_protocol_handler("Custom", Box::new(TagHandler("x")));
        assert!(factory.is_handled_protocol("custom"));
        assert!(factory.resolve("CUSTOM").is_some());
    }
}
