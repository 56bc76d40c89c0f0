//! Remote tier: the read-only static JSON files the site ships with.
//!
//! This system never writes to the remote. A fetch either yields a validated
//! `Collection` or a `RemoteError`; callers decide how to fall back.

pub mod dir;
pub mod error;
pub mod http;

pub use dir::DirRemote;
pub use error::RemoteError;
pub use http::HttpRemote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{Collection, CollectionName};

#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self, name: CollectionName) -> Result<Collection, RemoteError>;
}

/// Pick a source from a configured base: `http(s)://` URLs go over HTTP,
/// anything else is treated as a directory path.
pub fn from_base(base: &str, timeout: Option<Duration>) -> Result<Arc<dyn RemoteSource>, RemoteError> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(Arc::new(HttpRemote::with_timeout(base, timeout)?))
    } else {
        Ok(Arc::new(DirRemote::new(base)))
    }
}
