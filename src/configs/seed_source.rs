use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    io::Result as IoResult,
    path::{Path, PathBuf},
};

/// Where the default certificates come from: a JSON document embedded in
/// the configuration, or a path to one.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SeedSource {
    Inline {
        #[serde(with = "serde_bytes")]
        content: Vec<u8>,
    },
    Path {
        path: PathBuf,
    },
}

impl SeedSource {
    pub async fn read(&self) -> IoResult<Cow<'_, [u8]>> {
        match self {
            SeedSource::Inline { content } => Ok(Cow::Borrowed(content)),
            SeedSource::Path { path } => {
                debug!("Reading seed certificates from {}", path.display());
                tokio::fs::read(path).await.map(Cow::Owned)
            }
        }
    }
}

impl From<&Path> for SeedSource {
    fn from(path: &Path) -> Self {
        Self::Path {
            path: path.to_path_buf(),
        }
    }
}

impl From<&[u8]> for SeedSource {
    fn from(content: &[u8]) -> Self {
        Self::Inline {
            content: content.to_vec(),
        }
    }
}
