//! The owning profile's view of the network stack.

use crate::base::neterror::NetError;
use crate::cookies::CookieDetails;
use crate::urlrequest::request::URLRequest;

/// Implemented by the profile that owns a context factory.
///
/// Notifications arrive on the control context. The factory holds the
/// profile only weakly; a profile freed before a notification is delivered
/// simply misses it.
pub trait Profile: Send + Sync {
    /// A cookie changed in this profile's store.
    fn notify_cookie_change(&self, details: &CookieDetails);
}

/// Observation seam installed on the served context.
///
/// Every transaction passes through these hooks on its way to the
/// transport; the default implementation observes nothing.
pub trait NetworkDelegate: Send + Sync {
    fn on_before_request(&self, _request: &URLRequest) {}
    fn on_completed(&self, _request: &URLRequest, _result: &Result<(), NetError>) {}
}

/// The delegate used when the embedder installs none.
#[derive(Debug, Default)]
pub struct PassThroughNetworkDelegate;

impl NetworkDelegate for PassThroughNetworkDelegate {}
