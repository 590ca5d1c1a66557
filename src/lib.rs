//! # profilenet
//!
//! A Chromium-inspired per-profile network context builder for Rust.
//!
//! `profilenet` assembles, exactly once per browsing profile, the object
//! graph that dispatches and serves URL requests: scheme routing,
//! interceptor layering, caching, cookie handling, proxy resolution,
//! certificate policy, and authentication.
//!
//! ## Two-phase construction
//!
//! The factory is created on the **control context**, where it snapshots
//! its configuration and the resources only that context may touch (the
//! system proxy configuration source). The served context materializes
//! lazily, exactly once, on the **build context** — the thread that owns
//! the network object graph and handles every request:
//!
//! ```rust,ignore
//! use profilenet::base::commandline::CommandLine;
//! use profilenet::base::taskrunner::SingleThreadTaskRunner;
//! use profilenet::urlrequest::{RequestContextFactory, RequestContextParams};
//! use std::sync::Arc;
//!
//! let control = SingleThreadTaskRunner::new("control");
//! let build = SingleThreadTaskRunner::new("build");
//!
//! let params = RequestContextParams::new("/profiles/default".into());
//! let factory = RequestContextFactory::new(
//!     params,
//!     profile_weak,
//!     Arc::new(CommandLine::from_current_process()),
//!     control,
//!     build.clone(),
//! );
//!
//! build.post_task(move || {
//!     let context = factory.url_request_context();
//!     let job = context.create_job(&request).unwrap();
//!     // ...
//! });
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Errors, task runners, weak liveness guards, switch lookup
//! - [`cookies`] - Cookie jar, change dispatch, and SQLite persistence
//! - [`dns`] - Host resolution and remap rules
//! - [`http`] - Auth, the network session, and the cache transaction factory
//! - [`protocol`] - Built-in scheme handlers (about, data, file, http, ftp)
//! - [`proxy`] - Proxy configuration and resolution selection
//! - [`tls`] - Transport security state, CT verification, cert policy
//! - [`urlrequest`] - Dispatch table, interceptors, served context, factory
//!
//! ## Composition guarantees
//!
//! - Embedder scheme handlers install before built-ins; one handler per
//!   scheme, first registration wins.
//! - Interceptors wrap the dispatch table in reverse registration order,
//!   so the first registered is consulted first.
//! - Cookie-change notifications are redispatched from the build context
//!   to the control context and become no-ops once the factory is torn
//!   down.
//! - Configuration defects (malformed proxy rules, remap rules, cache
//!   trouble) degrade to safe defaults; building the context never fails.

pub mod base;
pub mod cookies;
pub mod dns;
pub mod http;
pub mod profile;
pub mod protocol;
pub mod proxy;
pub mod switches;
pub mod tls;
pub mod urlrequest;
