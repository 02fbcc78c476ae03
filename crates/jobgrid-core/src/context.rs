//! Per-run context: everything a run needs, built once and passed down.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{ConfigCache, ConfigReader, DirConfigReader, Settings};
use crate::domain::ConfigurationError;

/// Settings, the validated configuration cache and the run id.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub settings: Settings,
    pub cache: Arc<ConfigCache>,
}

impl RunContext {
    pub fn new(settings: Settings, cache: ConfigCache) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            settings,
            cache: Arc::new(cache),
        }
    }

    /// Read configuration through `reader` and build the cache.
    pub async fn load(
        settings: Settings,
        reader: &dyn ConfigReader,
    ) -> Result<Self, ConfigurationError> {
        let snapshot = reader.read_snapshot().await?;
        let cache = ConfigCache::build(snapshot)?;
        Ok(Self::new(settings, cache))
    }

    /// Read configuration from `settings.config_root`.
    pub async fn from_settings(settings: Settings) -> Result<Self, ConfigurationError> {
        let reader = DirConfigReader::new(&settings.config_root);
        Self::load(settings, &reader).await
    }

    pub fn run_id(&self) -> String {
        self.run_id.to_string()
    }
}
