//! Host resolution.
//!
//! One resolver instance is shared across the built graph: the FTP handler,
//! the auth handler factory, and the network session all consult it. When
//! remap rules are configured the default resolver is wrapped in a
//! [`MappedHostResolver`] before anything else sees it.

pub mod gai;
pub mod hickory;
pub mod mapped;
pub mod resolve;

pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use mapped::{HostMappingRules, MappedHostResolver};
pub use resolve::{Addrs, Name, Resolve, Resolving};
