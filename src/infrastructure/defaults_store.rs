// TOML file store for saved filter defaults
use crate::application::filter_defaults::FilterDefaultsStore;
use crate::domain::filter::FilterState;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File layout. The request body never carries `allDay`, so it is kept
/// beside the filter table rather than inside it.
#[derive(Debug, Serialize, Deserialize)]
struct SavedDefaults {
    #[serde(rename = "allDay")]
    all_day: bool,
    filter: FilterState,
}

#[derive(Debug, Clone)]
pub struct TomlDefaultsStore {
    path: PathBuf,
}

impl TomlDefaultsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FilterDefaultsStore for TomlDefaultsStore {
    fn load(&self) -> anyhow::Result<Option<FilterState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let saved: SavedDefaults = toml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        let mut filter = saved.filter;
        filter.set_all_day(saved.all_day);
        Ok(Some(filter))
    }

    fn save(&self, filter: &FilterState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let saved = SavedDefaults {
            all_day: filter.all_day,
            filter: filter.clone(),
        };
        let text = toml::to_string_pretty(&saved).context("Failed to encode filter defaults")?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!("Wrote filter defaults to {}", self.path.display());
        Ok(())
    }
}
