// Tab records and the ordered tab list

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::resolver::View;

/// Opaque tab identifier. New ids are random so tabs opened in the same
/// instant never collide; restored ids are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TabId(String);

// Older records may carry numeric ids.
impl<'de> Deserialize<'de> for TabId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => TabId(s),
            Raw::Number(n) => TabId(n.to_string()),
        })
    }
}

impl TabId {
    pub fn generate() -> Self {
        TabId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be embedded in a storage key: non-empty ASCII
    /// alphanumerics, `_` and `-`.
    pub fn is_key_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    }
}

impl From<&str> for TabId {
    fn from(s: &str) -> Self {
        TabId(s.to_string())
    }
}

impl From<String> for TabId {
    fn from(s: String) -> Self {
        TabId(s)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub path: String,
    pub is_active: bool,
    /// Resolved once when the tab is created; later route changes do not
    /// touch it.
    pub view: View,
}

/// Ordered list of open tabs.
///
/// Every mutation leaves at most one tab active. Mutations return whether
/// they changed anything so callers only commit real changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabStore {
    tabs: Vec<Tab>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from restored records. Later duplicates of a path are
    /// dropped so paths stay unique.
    pub fn from_tabs(tabs: Vec<Tab>) -> Self {
        let mut store = TabStore::new();
        for tab in tabs {
            if store.find_by_path(&tab.path).is_some() {
                log::warn!("dropping duplicate tab {} for path '{}'", tab.id, tab.path);
                continue;
            }
            store.tabs.push(tab);
        }
        store
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.is_active)
    }

    pub fn find(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| &t.id == id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.path == path)
    }

    pub fn last(&self) -> Option<&Tab> {
        self.tabs.last()
    }

    /// Open a tab for `path`, or activate the existing one. An existing tab
    /// keeps its title and view even if different ones are passed in.
    pub fn open(&mut self, path: &str, title: &str, view: View) -> &Tab {
        if let Some(idx) = self.tabs.iter().position(|t| t.path == path) {
            self.set_active(idx);
            return &self.tabs[idx];
        }

        for tab in &mut self.tabs {
            tab.is_active = false;
        }
        let tab = Tab {
            id: TabId::generate(),
            title: title.to_string(),
            path: path.to_string(),
            is_active: true,
            view,
        };
        log::debug!("opened tab {} for '{}'", tab.id, tab.path);
        self.tabs.push(tab);
        let last = self.tabs.len() - 1;
        &self.tabs[last]
    }

    /// Remove a tab. If it was active, the tab now last in the list takes
    /// over, not the previously active one. Returns the removed tab.
    pub fn close(&mut self, id: &TabId) -> Option<Tab> {
        let idx = self.tabs.iter().position(|t| &t.id == id)?;
        let removed = self.tabs.remove(idx);

        if removed.is_active {
            if let Some(last) = self.tabs.last_mut() {
                last.is_active = true;
            }
        }
        log::debug!("closed tab {} ('{}')", removed.id, removed.path);
        Some(removed)
    }

    /// Make exactly `id` active. Unknown ids are ignored.
    pub fn activate(&mut self, id: &TabId) -> bool {
        match self.tabs.iter().position(|t| &t.id == id) {
            Some(idx) => self.set_active(idx),
            None => false,
        }
    }

    /// Activate the tab whose path equals `path`; with no match every tab
    /// becomes inactive.
    pub fn activate_path(&mut self, path: &str) -> bool {
        let mut changed = false;
        for tab in &mut self.tabs {
            let active = tab.path == path;
            if tab.is_active != active {
                tab.is_active = active;
                changed = true;
            }
        }
        changed
    }

    fn set_active(&mut self, idx: usize) -> bool {
        let mut changed = false;
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            let active = i == idx;
            if tab.is_active != active {
                tab.is_active = active;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: &str, path: &str, active: bool) -> Tab {
        Tab {
            id: TabId::from(id),
            title: path.to_string(),
            path: path.to_string(),
            is_active: active,
            view: View::Home,
        }
    }

    fn active_ids(store: &TabStore) -> Vec<&str> {
        store
            .tabs()
            .iter()
            .filter(|t| t.is_active)
            .map(|t| t.id.as_str())
            .collect()
    }

    #[test]
    fn test_open_appends_and_activates() {
        let mut store = TabStore::new();
        store.open("/", "Home", View::Home);
        let id = store.open("/about", "About", View::About).id.clone();

        assert_eq!(store.len(), 2);
        assert_eq!(store.active().map(|t| &t.id), Some(&id));
        assert!(!store.tabs()[0].is_active);
    }

    #[test]
    fn test_open_existing_path_keeps_metadata() {
        let mut store = TabStore::new();
        let first = store.open("/form", "Form", View::FormTest).id.clone();
        store.open("/", "Home", View::Home);

        let again = store.open("/form", "Other title", View::About);
        assert_eq!(again.id, first);
        assert_eq!(again.title, "Form");
        assert_eq!(again.view, View::FormTest);
        assert_eq!(store.len(), 2);
        assert_eq!(active_ids(&store), vec![first.as_str()]);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let mut store = TabStore::new();
        for i in 0..100 {
            store.open(&format!("/p{}", i), "p", View::Home);
        }
        let mut ids: Vec<_> = store.tabs().iter().map(|t| t.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_close_active_activates_last() {
        let mut store = TabStore::from_tabs(vec![
            tab("a", "/", false),
            tab("b", "/form", true),
            tab("c", "/about", false),
        ]);
        let removed = store.close(&TabId::from("b"));
        assert_eq!(removed.map(|t| t.path), Some("/form".to_string()));
        assert_eq!(active_ids(&store), vec!["c"]);
    }

    #[test]
    fn test_close_inactive_keeps_flags() {
        let mut store = TabStore::from_tabs(vec![
            tab("a", "/", true),
            tab("b", "/form", false),
        ]);
        store.close(&TabId::from("b"));
        assert_eq!(active_ids(&store), vec!["a"]);
    }

    #[test]
    fn test_close_last_tab_empties() {
        let mut store = TabStore::from_tabs(vec![tab("a", "/", true)]);
        assert!(store.close(&TabId::from("a")).is_some());
        assert!(store.is_empty());
        assert!(store.active().is_none());
    }

    #[test]
    fn test_close_unknown_is_noop() {
        let mut store = TabStore::from_tabs(vec![tab("a", "/", true)]);
        let before = store.clone();
        assert!(store.close(&TabId::from("zzz")).is_none());
        assert_eq!(store, before);
    }

    #[test]
    fn test_activate() {
        let mut store = TabStore::from_tabs(vec![
            tab("a", "/", true),
            tab("b", "/form", false),
        ]);
        assert!(store.activate(&TabId::from("b")));
        assert_eq!(active_ids(&store), vec!["b"]);
        assert!(!store.activate(&TabId::from("b")));
        assert!(!store.activate(&TabId::from("missing")));
        assert_eq!(active_ids(&store), vec!["b"]);
    }

    #[test]
    fn test_activate_path_without_match_clears() {
        let mut store = TabStore::from_tabs(vec![
            tab("a", "/", true),
            tab("b", "/form", false),
        ]);
        assert!(store.activate_path("/form"));
        assert_eq!(active_ids(&store), vec!["b"]);
        assert!(store.activate_path("/elsewhere"));
        assert!(active_ids(&store).is_empty());
    }

    #[test]
    fn test_tab_id_accepts_numbers() {
        let ids: Vec<TabId> = serde_json::from_str(r#"["abc", 17]"#).unwrap();
        assert_eq!(ids, vec![TabId::from("abc"), TabId::from("17")]);
        assert_eq!(serde_json::to_string(&ids[1]).unwrap(), r#""17""#);
    }

    #[test]
    fn test_key_safe_ids() {
        assert!(TabId::generate().is_key_safe());
        assert!(TabId::from("17").is_key_safe());
        assert!(!TabId::from("a/b").is_key_safe());
        assert!(!TabId::from("..").is_key_safe());
        assert!(!TabId::from("").is_key_safe());
    }

    #[test]
    fn test_from_tabs_drops_duplicate_paths() {
        let store = TabStore::from_tabs(vec![
            tab("a", "/", false),
            tab("b", "/", true),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.tabs()[0].id.as_str(), "a");
    }
}
