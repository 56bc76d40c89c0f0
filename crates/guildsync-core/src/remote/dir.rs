use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{RemoteError, RemoteSource};
use crate::models::{Collection, CollectionName};

/// Reads the static collection files straight from a directory, e.g. the
/// site's `data/` folder during local development.
#[derive(Debug, Clone)]
pub struct DirRemote {
    dir: PathBuf,
}

impl DirRemote {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn resource_path(&self, name: CollectionName) -> PathBuf {
        self.dir.join(name.file_name())
    }
}

#[async_trait]
impl RemoteSource for DirRemote {
    async fn fetch(&self, name: CollectionName) -> Result<Collection, RemoteError> {
        let path = self.resource_path(name);
        debug!(path = %path.display(), "Reading collection file");

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RemoteError::NotFound(path.display().to_string()));
            }
            Err(source) => return Err(RemoteError::Io { path, source }),
        };

        Ok(Collection::from_json(name, &text)?)
    }
}
