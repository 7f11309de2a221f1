// Persistence seam for "save as defaults"
use crate::domain::filter::FilterState;

pub trait FilterDefaultsStore: Send + Sync {
    /// Saved defaults, or `None` when nothing has been saved yet.
    fn load(&self) -> anyhow::Result<Option<FilterState>>;

    fn save(&self, filter: &FilterState) -> anyhow::Result<()>;
}

/// Keeps defaults for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryDefaultsStore {
    saved: std::sync::Mutex<Option<FilterState>>,
}

impl FilterDefaultsStore for MemoryDefaultsStore {
    fn load(&self) -> anyhow::Result<Option<FilterState>> {
        let saved = self
            .saved
            .lock()
            .map_err(|_| anyhow::anyhow!("defaults lock poisoned"))?;
        Ok(saved.clone())
    }

    fn save(&self, filter: &FilterState) -> anyhow::Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| anyhow::anyhow!("defaults lock poisoned"))?;
        *saved = Some(filter.clone());
        Ok(())
    }
}
