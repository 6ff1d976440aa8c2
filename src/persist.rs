// Tab list persistence and per-tab auxiliary state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::storage::KeyValueStore;
use crate::tab::{Tab, TabId};

pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTab {
    pub id: TabId,
    pub title: String,
    pub path: String,
    pub is_active: bool,
}

impl From<&Tab> for PersistedTab {
    fn from(tab: &Tab) -> Self {
        PersistedTab {
            id: tab.id.clone(),
            title: tab.title.clone(),
            path: tab.path.clone(),
            is_active: tab.is_active,
        }
    }
}

/// The stored tab list: `{"version": 1, "tabs": [...]}`. Records written
/// before versioning (a bare array of tabs) still restore. Views are never
/// written; restored tabs re-resolve them from their path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    pub version: u32,
    pub tabs: Vec<PersistedTab>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Versioned(TabRecord),
    Legacy(Vec<PersistedTab>),
}

pub struct Persistence<S> {
    storage: S,
    key: String,
    clear_on_empty: bool,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(storage: S, config: &Config) -> Self {
        Persistence {
            storage,
            key: config.storage_key.clone(),
            clear_on_empty: config.clear_on_empty,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Write the tab list. An empty list leaves the previous record in place
    /// unless `clear_on_empty` is set. Returns whether storage was touched.
    pub fn save(&mut self, tabs: &[Tab]) -> Result<bool> {
        if tabs.is_empty() {
            if self.clear_on_empty {
                self.storage.remove(&self.key)?;
                return Ok(true);
            }
            return Ok(false);
        }

        let record = TabRecord {
            version: RECORD_VERSION,
            tabs: tabs.iter().map(PersistedTab::from).collect(),
        };
        let json = serde_json::to_string(&record)?;
        self.storage.set(&self.key, &json)?;
        log::debug!("saved {} tabs under '{}'", record.tabs.len(), self.key);
        Ok(true)
    }

    /// Read the raw record. `Ok(None)` when the slot is empty.
    pub fn load_record(&self) -> Result<Option<Vec<PersistedTab>>> {
        let Some(data) = self.storage.get(&self.key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredRecord>(&data)? {
            StoredRecord::Versioned(record) if record.version > RECORD_VERSION => {
                log::warn!(
                    "tab record version {} is newer than supported {}, ignoring it",
                    record.version,
                    RECORD_VERSION
                );
                Ok(None)
            }
            StoredRecord::Versioned(record) => Ok(Some(record.tabs)),
            StoredRecord::Legacy(tabs) => Ok(Some(tabs)),
        }
    }

    /// Rebuild tabs from storage. Active flags follow `location`, not the
    /// stored flags. Ids that cannot name a state slot are replaced.
    /// Unreadable state is logged and yields no tabs.
    pub fn restore(&self, location: &str, resolver: &Resolver) -> Vec<Tab> {
        let persisted = match self.load_record() {
            Ok(Some(tabs)) => tabs,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("could not restore tabs from '{}': {}", self.key, e);
                return Vec::new();
            }
        };

        let tabs: Vec<Tab> = persisted
            .into_iter()
            .map(|p| {
                let view = resolver.resolve(&p.path).view;
                let id = if p.id.is_key_safe() {
                    p.id
                } else {
                    let fresh = TabId::generate();
                    log::warn!("replacing unusable tab id '{}' with {}", p.id, fresh);
                    fresh
                };
                Tab {
                    is_active: p.path == location,
                    id,
                    title: p.title,
                    path: p.path,
                    view,
                }
            })
            .collect();
        log::info!("restored {} tabs at '{}'", tabs.len(), location);
        tabs
    }

    fn tab_state_key(&self, id: &TabId) -> String {
        format!("{}-{}", self.key, id)
    }

    /// Auxiliary state of one tab. A malformed slot reads as absent.
    pub fn tab_state(&self, id: &TabId) -> Option<Value> {
        let key = self.tab_state_key(id);
        let data = match self.storage.get(&key) {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("could not read '{}': {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("discarding malformed state in '{}': {}", key, e);
                None
            }
        }
    }

    pub fn save_tab_state(&mut self, id: &TabId, state: &Value) -> Result<()> {
        let key = self.tab_state_key(id);
        self.storage.set(&key, &serde_json::to_string(state)?)
    }

    /// Shallow-merge `partial` into the stored object and write the result.
    pub fn update_tab_state(&mut self, id: &TabId, partial: Map<String, Value>) -> Result<Value> {
        let merged = match self.tab_state(id) {
            Some(Value::Object(mut current)) => {
                current.extend(partial);
                Value::Object(current)
            }
            _ => Value::Object(partial),
        };
        self.save_tab_state(id, &merged)?;
        Ok(merged)
    }

    pub fn reset_tab_state(&mut self, id: &TabId) -> Result<()> {
        let key = self.tab_state_key(id);
        self.storage.remove(&key)
    }

    /// Drop auxiliary slots whose tab is gone. Returns how many were removed.
    pub fn prune_tab_states(&mut self, tabs: &[Tab]) -> Result<usize> {
        let prefix = format!("{}-", self.key);
        let stale: Vec<String> = self
            .storage
            .keys()?
            .into_iter()
            .filter(|key| {
                key.strip_prefix(&prefix)
                    .is_some_and(|id| !tabs.iter().any(|t| t.id.as_str() == id))
            })
            .collect();

        for key in &stale {
            self.storage.remove(key)?;
            log::debug!("removed stale tab state '{}'", key);
        }
        Ok(stale.len())
    }
}
