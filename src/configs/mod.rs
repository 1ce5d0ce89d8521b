use crate::{
    error::AppResult,
    store::{CatalogStorage, FileStorage, MemoryStorage, DEFAULT_SLOT},
};
use config::{Config, Environment as ConfigEnv, File as ConfigFile};
use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

mod seed_source;

pub use seed_source::SeedSource;

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);
pub const DEFAULT_SKILL_PREVIEW: usize = 3;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ApplicationConfig {
    pub workers: Option<usize>,

    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_metrics_listen")]
    pub metrics_listen: SocketAddr,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Replaces the built-in default dataset.
    #[serde(default)]
    pub seed: Option<SeedSource>,

    #[serde(default = "default_notice_ttl", deserialize_with = "deserialize_duration")]
    pub notice_ttl: Duration,

    #[serde(default = "default_skill_preview")]
    pub skill_preview: usize,
}

impl ApplicationConfig {
    pub fn load_config() -> AppResult<Self> {
        let cfg = Config::builder()
            .add_source(ConfigFile::with_name("/etc/certificate-catalog/config").required(false))
            .add_source(ConfigFile::with_name("config").required(false))
            .add_source(ConfigEnv::with_prefix("CERTCAT").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            workers: Default::default(),
            listen: default_listen(),
            metrics_listen: default_metrics_listen(),
            storage: Default::default(),
            seed: Default::default(),
            notice_ttl: default_notice_ttl(),
            skill_preview: default_skill_preview(),
        }
    }
}

fn default_listen() -> SocketAddr {
    (Ipv4Addr::LOCALHOST, 8080).into()
}

fn default_metrics_listen() -> SocketAddr {
    (Ipv4Addr::LOCALHOST, 9880).into()
}

const fn default_notice_ttl() -> Duration {
    DEFAULT_NOTICE_TTL
}

const fn default_skill_preview() -> usize {
    DEFAULT_SKILL_PREVIEW
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_storage_key() -> String {
    DEFAULT_SLOT.to_owned()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Default::default(),
            dir: default_storage_dir(),
            key: default_storage_key(),
        }
    }
}

impl StorageConfig {
    pub fn build(&self) -> Box<dyn CatalogStorage> {
        match self.backend {
            StorageBackend::File => {
                let storage = FileStorage::new(&self.dir, &self.key);
                info!("Persisting certificates to {}", storage.path().display());
                Box::new(storage)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage, edits will not survive a restart");
                Box::<MemoryStorage>::default()
            }
        }
    }
}
