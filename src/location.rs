// Browser-style location history and the tab/location synchronizer

use serde::{Deserialize, Serialize};

use crate::tab::TabStore;

/// Navigation history with a cursor, like a browser's back/forward stack.
/// Never empty, and the cursor always points at an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHistory")]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

#[derive(Deserialize)]
struct RawHistory {
    entries: Vec<String>,
    cursor: usize,
}

// An out-of-range cursor is clamped to the newest entry.
impl TryFrom<RawHistory> for History {
    type Error = String;

    fn try_from(raw: RawHistory) -> Result<Self, Self::Error> {
        let Some(last) = raw.entries.len().checked_sub(1) else {
            return Err("history has no entries".to_string());
        };
        Ok(History {
            cursor: raw.cursor.min(last),
            entries: raw.entries,
        })
    }
}

impl History {
    pub fn new(start: &str) -> Self {
        History {
            entries: vec![start.to_string()],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    /// Push a new location, dropping any forward entries. Pushing the
    /// current location is a no-op.
    pub fn push(&mut self, path: &str) -> bool {
        if self.current() == path {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(path.to_string());
        self.cursor = self.entries.len() - 1;
        true
    }

    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the reconciliation pass asks the host to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// Nothing to fix.
    None,
    /// The last tab was activated; the location must follow it.
    Navigate(String),
}

/// Re-derive the active flag from `location`. Never creates tabs.
pub fn sync_to_location(store: &mut TabStore, location: &str) -> bool {
    store.activate_path(location)
}

/// One reconciliation step after a committed mutation: a non-empty list
/// with no active tab activates its last tab; an empty list heads home
/// unless already there.
pub fn reconcile(store: &mut TabStore, location: &str, home: &str) -> Correction {
    if store.is_empty() {
        if location != home {
            return Correction::Navigate(home.to_string());
        }
        return Correction::None;
    }
    if store.active().is_some() {
        return Correction::None;
    }

    let Some(last) = store.last().map(|t| t.id.clone()) else {
        return Correction::None;
    };
    store.activate(&last);
    match store.find(&last) {
        Some(tab) => Correction::Navigate(tab.path.clone()),
        None => Correction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::View;

    #[test]
    fn test_history_push_back_forward() {
        let mut history = History::new("/");
        assert!(history.push("/form"));
        assert!(history.push("/about"));
        assert_eq!(history.current(), "/about");

        assert!(history.back());
        assert_eq!(history.current(), "/form");
        assert!(history.forward());
        assert_eq!(history.current(), "/about");
        assert!(!history.forward());
    }

    #[test]
    fn test_history_push_truncates_forward() {
        let mut history = History::new("/");
        history.push("/form");
        history.push("/about");
        history.back();
        history.back();
        history.push("/search-form");
        assert_eq!(history.len(), 2);
        assert!(!history.can_go_forward());
        assert!(history.can_go_back());
    }

    #[test]
    fn test_history_push_same_is_noop() {
        let mut history = History::new("/");
        assert!(!history.push("/"));
        assert_eq!(history.len(), 1);
        assert!(!history.back());
    }

    #[test]
    fn test_history_deserialize_clamps_cursor() {
        let mut history: History =
            serde_json::from_str(r#"{"entries":["/","/form"],"cursor":9}"#).unwrap();
        assert_eq!(history.current(), "/form");
        assert!(!history.can_go_forward());
        assert!(history.back());
        assert_eq!(history.current(), "/");

        assert!(serde_json::from_str::<History>(r#"{"entries":[],"cursor":0}"#).is_err());
    }

    #[test]
    fn test_sync_on_empty_store_creates_nothing() {
        let mut store = TabStore::new();
        assert!(!sync_to_location(&mut store, "/form"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reconcile_activates_last() {
        let mut store = TabStore::new();
        store.open("/", "Home", View::Home);
        store.open("/form", "Form", View::FormTest);
        sync_to_location(&mut store, "/unknown");
        assert!(store.active().is_none());

        let correction = reconcile(&mut store, "/unknown", "/");
        assert_eq!(correction, Correction::Navigate("/form".to_string()));
        assert_eq!(store.active().map(|t| t.path.as_str()), Some("/form"));
    }

    #[test]
    fn test_reconcile_empty_goes_home_once() {
        let mut store = TabStore::new();
        assert_eq!(
            reconcile(&mut store, "/form", "/"),
            Correction::Navigate("/".to_string())
        );
        assert_eq!(reconcile(&mut store, "/", "/"), Correction::None);
    }
}
