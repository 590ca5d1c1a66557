//! Request dispatch: the scheme table, interceptor layering, the served
//! context, and the factory that builds it.

pub mod context;
pub mod contextfactory;
pub mod interceptor;
pub mod job;
pub mod jobfactory;
pub mod request;

pub use context::URLRequestContext;
pub use contextfactory::{RequestContextFactory, RequestContextParams};
pub use interceptor::{wrap_with_interceptors, InterceptingJobFactory, URLRequestInterceptor};
pub use job::{JobResponse, JobStart, ProtocolHandler, URLRequestJob};
pub use jobfactory::{JobFactory, URLRequestJobFactory};
pub use request::URLRequest;
