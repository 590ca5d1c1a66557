//! Interceptor layering over the dispatch table.
//!
//! Interceptors wrap the table back-to-front: the LAST interceptor in the
//! registration order becomes the INNERMOST wrapper, so the first
//! registered is consulted first for every request. This is easy to get
//! backwards; `wrap_with_interceptors` is the single place the reversal
//! happens.

use crate::base::neterror::NetError;
use crate::urlrequest::job::URLRequestJob;
use crate::urlrequest::jobfactory::JobFactory;
use crate::urlrequest::request::URLRequest;

/// A layer that may claim a request before the dispatch table sees it.
pub trait URLRequestInterceptor: Send + Sync {
    /// Return a job to claim the request, or `None` to pass it on.
    fn maybe_intercept(&self, request: &URLRequest) -> Option<Box<dyn URLRequestJob>>;
}

/// One interceptor layered over an inner factory.
pub struct InterceptingJobFactory {
    inner: Box<dyn JobFactory>,
    interceptor: Box<dyn URLRequestInterceptor>,
}

impl InterceptingJobFactory {
    pub fn new(inner: Box<dyn JobFactory>, interceptor: Box<dyn URLRequestInterceptor>) -> Self {
        Self { inner, interceptor }
    }
}

impl JobFactory for InterceptingJobFactory {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        if let Some(job) = self.interceptor.maybe_intercept(request) {
            return Ok(job);
        }
        self.inner.create_job(request)
    }

    fn is_handled_protocol(&self, scheme: &str) -> bool {
        self.inner.is_handled_protocol(scheme)
    }
}

/// Wrap `base` with `interceptors`, first-registered outermost.
///
/// An empty list degenerates to the bare base factory.
pub fn wrap_with_interceptors(
    base: Box<dyn JobFactory>,
    interceptors: Vec<Box<dyn URLRequestInterceptor>>,
) -> Box<dyn JobFactory> {
    let mut top = base;
    for interceptor in interceptors.into_iter().rev() {
        top = Box::new(InterceptingJobFactory::new(top, interceptor));
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urlrequest::job::{JobResponse, JobStart, ProtocolHandler};
    use crate::urlrequest::jobfactory::URLRequestJobFactory;
    use std::sync::{Arc, Mutex};

    struct TagJob(&'static str);

    impl URLRequestJob for TagJob {
        fn start(self: Box<Self>) -> JobStart {
            let tag = self.0;
            Box::pin(async move { Ok(JobResponse::with_body("text/plain", tag)) })
        }
    }

    struct TagHandler(&'static str);

    impl ProtocolHandler for TagHandler {
        fn create_job(&self, _request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
            Ok(Box::new(TagJob(self.0)))
        }
    }

    /// Records its consultation, then optionally claims the request.
    struct RecordingInterceptor {
        tag: &'static str,
        claims: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl URLRequestInterceptor for RecordingInterceptor {
        fn maybe_intercept(&self, _request: &URLRequest) -> Option<Box<dyn URLRequestJob>> {
            self.log.lock().unwrap().push(self.tag);
            if self.claims {
                Some(Box::new(TagJob(self.tag)))
            } else {
                None
            }
        }
    }

    fn base_factory() -> Box<dyn JobFactory> {
        let mut factory = URLRequestJobFactory::new();
        factory.set_protocol_handler("test", Box::new(TagHandler("base")));
        Box::new(factory)
    }

    #[tokio::test]
    async fn test_first_registered_consulted_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let interceptors: Vec<Box<dyn URLRequestInterceptor>> = vec![
            Box::new(RecordingInterceptor {
                tag: "i1",
                claims: false,
                log: Arc::clone(&log),
            }),
            Box::new(RecordingInterceptor {
                tag: "i2",
                claims: false,
                log: Arc::clone(&log),
            }),
            Box::new(RecordingInterceptor {
                tag: "i3",
                claims: false,
                log: Arc::clone(&log),
            }),
        ];

        let top = wrap_with_interceptors(base_factory(), interceptors);
        let request = URLRequest::new("test://x/").unwrap();
        let response = top.create_job(&request).unwrap().start().await.unwrap();

        // All declined, so the base factory served the request, and the
        // consultation order matches registration order.
        assert_eq!(&response.body[..], b"base");
        assert_eq!(*log.lock().unwrap(), vec!["i1", "i2", "i3"]);
    }

    #[tokio::test]
    async fn test_claiming_interceptor_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let interceptors: Vec<Box<dyn URLRequestInterceptor>> = vec![
            Box::new(RecordingInterceptor {
                tag: "i1",
                claims: false,
                log: Arc::clone(&log),
            }),
            Box::new(RecordingInterceptor {
                tag: "i2",
                claims: true,
                log: Arc::clone(&log),
            }),
            Box::new(RecordingInterceptor {
                tag: "i3",
                claims: false,
                log: Arc::clone(&log),
            }),
        ];

        let top = wrap_with_interceptors(base_factory(), interceptors);
        let request = URLRequest::new("test://x/").unwrap();
        let response = top.create_job(&request).unwrap().start().await.unwrap();

        assert_eq!(&response.body[..], b"i2");
        assert_eq!(*log.lock().unwrap(), vec!["i1", "i2"]);
    }

    #[test]
    fn test_empty_chain_is_bare_factory() {
        let top = wrap_with_interceptors(base_factory(), Vec::new());
        assert!(top.is_handled_protocol("test"));
        assert!(!top.is_handled_protocol("other"));
    }
}
