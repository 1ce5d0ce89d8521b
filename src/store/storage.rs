use crate::{
    error::{AppResult, ErrorReason},
    types::CertificateRecord,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

pub const DOCUMENT_VERSION: u32 = 1;
pub const DEFAULT_SLOT: &str = "certificates";

/// Durable home of the catalog. Implementations hold a single named slot.
pub trait CatalogStorage: Debug + Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> AppResult<Option<Vec<CertificateRecord>>>;

    fn save(&mut self, records: &[CertificateRecord]) -> AppResult<()>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Versioned {
        version: u32,
        certificates: Vec<CertificateRecord>,
    },
    Legacy(Vec<CertificateRecord>),
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    certificates: &'a [CertificateRecord],
}

pub fn decode_document(data: &[u8]) -> AppResult<Vec<CertificateRecord>> {
    match serde_json::from_slice(data)? {
        StoredDocument::Versioned {
            version,
            certificates,
        } => {
            if version > DOCUMENT_VERSION {
                return Err(ErrorReason::UnsupportedVersion(version).into());
            }
            Ok(certificates)
        }
        StoredDocument::Legacy(certificates) => {
            debug!("Upgrading unversioned catalog document");
            Ok(certificates)
        }
    }
}

pub fn encode_document(records: &[CertificateRecord]) -> AppResult<String> {
    let document = DocumentRef {
        version: DOCUMENT_VERSION,
        certificates: records,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// One JSON file per slot inside a directory.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P>(dir: P, key: &str) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CatalogStorage for FileStorage {
    fn load(&self) -> AppResult<Option<Vec<CertificateRecord>>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_document(&data).map(Some)
    }

    fn save(&mut self, records: &[CertificateRecord]) -> AppResult<()> {
        let document = encode_document(records)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, document)?;
        fs::rename(&temp, &self.path)?;
        trace!("Wrote {} certificates to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Process-local slot with an optional byte quota, mirroring browser storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    slot: Option<String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn with_quota(quota: usize) -> Self {
        Self {
            slot: None,
            quota: Some(quota),
        }
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Some(contents.into()),
            quota: None,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl CatalogStorage for MemoryStorage {
    fn load(&self) -> AppResult<Option<Vec<CertificateRecord>>> {
        self.slot
            .as_deref()
            .map(|slot| decode_document(slot.as_bytes()))
            .transpose()
    }

    fn save(&mut self, records: &[CertificateRecord]) -> AppResult<()> {
        let document = encode_document(records)?;
        if self.quota.is_some_and(|quota| document.len() > quota) {
            return Err(ErrorReason::QuotaExceeded.into());
        }
        self.slot = Some(document);
        Ok(())
    }
}

impl<S: CatalogStorage + ?Sized> CatalogStorage for Box<S> {
    fn load(&self) -> AppResult<Option<Vec<CertificateRecord>>> {
        (**self).load()
    }

    fn save(&mut self, records: &[CertificateRecord]) -> AppResult<()> {
        (**self).save(records)
    }
}
