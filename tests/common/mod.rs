//! Shared fixtures: the two-runner harness, a recording profile, and
//! tagged handlers/interceptors for observing dispatch order.

#![allow(dead_code)] // each test binary uses a subset of these fixtures

use profilenet::base::commandline::CommandLine;
use profilenet::base::neterror::NetError;
use profilenet::base::taskrunner::SingleThreadTaskRunner;
use profilenet::cookies::CookieDetails;
use profilenet::profile::Profile;
use profilenet::urlrequest::{
    JobResponse, JobStart, ProtocolHandler, RequestContextFactory, RequestContextParams,
    URLRequest, URLRequestContext, URLRequestInterceptor, URLRequestJob,
};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, Weak};

/// A control/build runner pair, one per test.
pub struct Runners {
    pub control: SingleThreadTaskRunner,
    pub build: SingleThreadTaskRunner,
}

pub fn runners() -> Runners {
    Runners {
        control: SingleThreadTaskRunner::new("control"),
        build: SingleThreadTaskRunner::new("build"),
    }
}

/// Profile that records every cookie notification it receives.
#[derive(Default)]
pub struct TestProfile {
    pub notifications: Mutex<Vec<CookieDetails>>,
}

impl TestProfile {
    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl Profile for TestProfile {
    fn notify_cookie_change(&self, details: &CookieDetails) {
        self.notifications.lock().unwrap().push(details.clone());
    }
}

pub fn downgrade(profile: &Arc<TestProfile>) -> Weak<dyn Profile> {
    let profile: Arc<dyn Profile> = Arc::clone(profile) as Arc<dyn Profile>;
    Arc::downgrade(&profile)
}

/// Construct the factory on the control context, as production code does.
pub fn new_factory(
    params: RequestContextParams,
    profile: Weak<dyn Profile>,
    command_line: CommandLine,
    runners: &Runners,
) -> Arc<RequestContextFactory> {
    let (tx, rx) = mpsc::channel();
    let control = runners.control.clone();
    let build = runners.build.clone();
    runners.control.post_task(move || {
        let factory = RequestContextFactory::new(
            params,
            profile,
            Arc::new(command_line),
            control.clone(),
            build,
        );
        tx.send(factory).unwrap();
    });
    rx.recv().expect("factory construction failed")
}

/// Run `f` against the served context on the build context and return its
/// result.
pub fn with_context<T: Send + 'static>(
    factory: &Arc<RequestContextFactory>,
    f: impl FnOnce(&URLRequestContext) -> T + Send + 'static,
) -> T {
    let (tx, rx) = mpsc::channel();
    let factory = Arc::clone(factory);
    let build = factory.build_runner().clone();
    build.post_task(move || {
        let result = f(factory.url_request_context());
        let _ = tx.send(result);
    });
    rx.recv().expect("build context task failed")
}

/// Job that answers with its tag as the body.
pub struct TagJob(pub &'static str);

impl URLRequestJob for TagJob {
    fn start(self: Box<Self>) -> JobStart {
        let tag = self.0;
        Box::pin(async move { Ok(JobResponse::with_body("text/plain", tag)) })
    }
}

/// Handler producing [`TagJob`]s.
pub struct TagHandler(pub &'static str);

impl ProtocolHandler for TagHandler {
    fn create_job(&self, _request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        Ok(Box::new(TagJob(self.0)))
    }
}

/// Interceptor that records its consultation and optionally claims.
pub struct RecordingInterceptor {
    pub tag: &'static str,
    pub claims: bool,
    pub log: Arc<Mutex<Vec<&'static str>>>,
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
