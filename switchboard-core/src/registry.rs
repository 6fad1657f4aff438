use std::fmt;

use tracing::{debug, info, warn};

use crate::provider::Provider;

/// One row of [`ProviderRegistry::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSummary {
    pub id: String,
    pub name: String,
    pub is_current: bool,
}

/// Holds every registered provider and tracks which one is current.
///
/// Entries keep their registration order. The first provider ever registered
/// becomes current; after that only [`set_current`](Self::set_current) moves it.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<(String, Box<dyn Provider>)>,
    current_id: String,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the provider under `id`, replacing (in place) any provider already there
    pub fn register(&mut self, id: impl Into<String>, provider: Box<dyn Provider>) {
        let id = id.into();
        info!("Registering provider '{}' ({})", id, provider.name());

        match self.position(&id) {
            Some(index) => {
                debug!("Replacing existing provider '{}'", id);
                self.providers[index].1 = provider;
            }
            None => self.providers.push((id.clone(), provider)),
        }

        if self.current_id.is_empty() {
            debug!("'{}' is the first provider, making it current", id);
            self.current_id = id;
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn Provider> {
        self.position(id).map(|i| self.providers[i].1.as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Provider + 'static)> {
        let index = self.position(id)?;
        Some(self.providers[index].1.as_mut())
    }

    /// The current provider, absent only when nothing has been registered
    pub fn current(&self) -> Option<&dyn Provider> {
        self.get(&self.current_id)
    }

    pub fn current_mut(&mut self) -> Option<&mut (dyn Provider + 'static)> {
        let index = self.position(&self.current_id)?;
        Some(self.providers[index].1.as_mut())
    }

    /// The current provider's id, or an empty string when nothing is registered
    pub fn current_id(&self) -> &str {
        &self.current_id
    }

    /// Makes `id` current. Returns false, leaving state untouched, if `id` is unknown.
    pub fn set_current(&mut self, id: &str) -> bool {
        if !self.has(id) {
            warn!("Cannot switch to unknown provider '{}'", id);
            return false;
        }
        info!("Switching current provider to '{}'", id);
        self.current_id = id.to_string();
        true
    }

    /// Registered providers in registration order
    pub fn list(&self) -> Vec<ProviderSummary> {
        self.providers
            .iter()
            .map(|(id, provider)| ProviderSummary {
                id: id.clone(),
                name: provider.name().to_string(),
                is_current: *id == self.current_id,
            })
            .collect()
    }

    pub fn has(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.providers.iter().position(|(key, _)| key == id)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.providers.iter().map(|(id, _)| id.as_str()).collect();
        f.debug_struct("ProviderRegistry")
            .field("providers", &ids)
            .field("current_id", &self.current_id)
            .finish()
    }
}
