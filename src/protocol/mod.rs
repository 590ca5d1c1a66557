//! Built-in protocol handlers.
//!
//! These fill the scheme dispatch table for every scheme the embedder did
//! not claim: `about`, `data`, `file` (archive-aware), the
//! `http`/`https`/`ws`/`wss` transport family, and `ftp`.

pub mod about;
pub mod data;
pub mod file;
pub mod ftp;
pub mod http;

pub use about::AboutProtocolHandler;
pub use data::DataProtocolHandler;
pub use file::{ArchiveReader, FileProtocolHandler};
pub use ftp::FtpProtocolHandler;
pub use http::HttpProtocolHandler;
