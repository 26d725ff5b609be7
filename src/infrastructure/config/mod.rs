//! Configuration loader using Figment for layered config management.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file (`tala-config.toml`)
//! 3. Environment variables (`TALA_*` prefix, `__` path separator,
//!    e.g. `TALA_ALLOCATION__RETRY_BUDGET=8` -> `allocation.retry_budget`)

use crate::foundation::{IssuanceError, DEFAULT_ALLOCATION_RETRY_BUDGET};
use crate::infrastructure::activity::{ActivityRecorder, FileActivityRecorder, LogActivityRecorder, MultiActivityRecorder};
use crate::infrastructure::storage::{AllocationStrategy, CertificateStore, MemoryStore, RocksStore, SequenceAllocator};
use crate::storage_err;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ENV_PREFIX: &str = "TALA_";
const CONFIG_FILE_NAME: &str = "tala-config.toml";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Rocks,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Rocks, data_dir: None }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStrategyName {
    #[default]
    Counter,
    Optimistic,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AllocationConfig {
    #[serde(default)]
    pub strategy: AllocationStrategyName,
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

fn default_retry_budget() -> u32 {
    DEFAULT_ALLOCATION_RETRY_BUDGET
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self { strategy: AllocationStrategyName::Counter, retry_budget: DEFAULT_ALLOCATION_RETRY_BUDGET }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ActivityConfig {
    /// Optional JSONL activity log file, in addition to the `activity` log target.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default = "default_log_filters")]
    pub filters: String,
}

fn default_log_filters() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_dir: None, filters: default_log_filters() }
    }
}

/// Load configuration from the default file in `data_dir` (`tala-config.toml`).
pub fn load_config(data_dir: &Path) -> Result<CoreConfig, IssuanceError> {
    load_config_from_file(&data_dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from a specific file path.
pub fn load_config_from_file(path: &Path) -> Result<CoreConfig, IssuanceError> {
    info!("loading configuration path={}", path.display());
    let mut figment = Figment::new().merge(Serialized::defaults(CoreConfig::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        debug!("configuration file missing; using defaults and env only path={}", path.display());
    }
    let figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
    let config: CoreConfig =
        figment.extract().map_err(|e| IssuanceError::ConfigError(format!("config extraction failed: {e}")))?;
    validate(&config)?;
    debug!(
        "configuration loaded backend={:?} strategy={:?} retry_budget={}",
        config.storage.backend, config.allocation.strategy, config.allocation.retry_budget
    );
    Ok(config)
}

fn validate(config: &CoreConfig) -> Result<(), IssuanceError> {
    if config.allocation.retry_budget == 0 {
        return Err(IssuanceError::ConfigError("allocation.retry_budget must be >= 1".to_string()));
    }
    if config.storage.backend == StorageBackend::Rocks && config.storage.data_dir.is_none() {
        return Err(IssuanceError::ConfigError("storage.data_dir is required for the rocks backend".to_string()));
    }
    Ok(())
}

impl CoreConfig {
    pub fn allocator(&self) -> SequenceAllocator {
        match self.allocation.strategy {
            AllocationStrategyName::Counter => SequenceAllocator::new(AllocationStrategy::DurableCounter),
            AllocationStrategyName::Optimistic => {
                SequenceAllocator::new(AllocationStrategy::OptimisticScan { retry_budget: self.allocation.retry_budget })
            }
        }
    }

    pub fn open_store(&self) -> Result<Arc<dyn CertificateStore>, IssuanceError> {
        match self.storage.backend {
            StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StorageBackend::Rocks => {
                let data_dir = self
                    .storage
                    .data_dir
                    .as_ref()
                    .ok_or_else(|| IssuanceError::ConfigError("storage.data_dir is required for the rocks backend".to_string()))?;
                Ok(Arc::new(RocksStore::open_in_dir(data_dir)?))
            }
        }
    }

    pub fn activity_recorder(&self) -> Result<Arc<dyn ActivityRecorder>, IssuanceError> {
        let mut multi = MultiActivityRecorder::new();
        multi.add_recorder(Box::new(LogActivityRecorder));
        if let Some(path) = &self.activity.log_file {
            let file = FileActivityRecorder::new(path).map_err(|err| storage_err!("open activity log", err))?;
            multi.add_recorder(Box::new(file));
        }
        Ok(Arc::new(multi))
    }
}
