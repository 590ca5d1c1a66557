//! HTTP-layer components of the served context: authentication, the
//! network session, and the cache-wrapped transaction factory.

pub mod auth;
pub mod backend;
pub mod httpcache;
pub mod serverproperties;
pub mod session;

pub use auth::{BasicAuthHandler, HttpAuthHandler, HttpAuthHandlerFactory, HttpAuthPreferences};
pub use backend::{
    BackendFactory, CacheBackend, CacheEntry, CacheKey, DiskBackendFactory, InMemoryBackendFactory,
    NoCacheBackendFactory,
};
pub use httpcache::HttpCache;
pub use serverproperties::{HttpServerProperties, StaticHttpUserAgentSettings};
pub use session::{
    HttpNetworkSession, HttpNetworkSessionContext, HttpNetworkSessionParams, HttpTransaction,
    HttpTransactionFactory, InstrumentedTransactionFactory, TransactionStart,
};
