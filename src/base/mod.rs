//! Base types shared across the context builder.
//!
//! Provides foundational pieces mirroring Chromium's `base/` and `net/base/`:
//! - [`NetError`](neterror::NetError): request-path error codes
//! - [`SingleThreadTaskRunner`](taskrunner::SingleThreadTaskRunner): the
//!   control/build execution contexts
//! - [`WeakFactory`](weak::WeakFactory): teardown-safe liveness guards for
//!   cross-context posts
//! - [`CommandLine`](commandline::CommandLine): process-wide switch lookup

pub mod commandline;
pub mod neterror;
pub mod taskrunner;
pub mod weak;
