// Navigation facade: the operations UI handlers call

use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::Result;
use crate::location::{self, Correction, History};
use crate::persist::Persistence;
use crate::resolver::{Resolver, View};
use crate::storage::KeyValueStore;
use crate::tab::{Tab, TabId, TabStore};

pub type Subscriber = Box<dyn FnMut(&[Tab])>;

/// Owns the tab store and keeps it, the location and storage in step.
///
/// Every committed mutation runs the same pipeline, in order: save the tab
/// list, drop auxiliary state of closed tabs, notify subscribers, then
/// reconcile until no tab needs activating and the location is settled.
pub struct Navigator<S: KeyValueStore> {
    config: Config,
    store: TabStore,
    history: History,
    resolver: Resolver,
    persistence: Persistence<S>,
    subscribers: Vec<Subscriber>,
}

impl<S: KeyValueStore> Navigator<S> {
    /// Start at the home path with the built-in routes.
    pub fn new(config: Config, storage: S) -> Self {
        let history = History::new(&config.home_path);
        Self::restore(config, storage, history, Resolver::default())
    }

    /// Restore the saved tab list against the current location.
    pub fn restore(config: Config, storage: S, history: History, mut resolver: Resolver) -> Self {
        resolver.set_home(&config.home_path);
        let persistence = Persistence::new(storage, &config);
        let tabs = persistence.restore(history.current(), &resolver);

        let mut navigator = Navigator {
            config,
            store: TabStore::from_tabs(tabs),
            history,
            resolver,
            persistence,
            subscribers: Vec::new(),
        };
        if !navigator.store.is_empty() {
            navigator.reconcile();
        }
        navigator
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tabs(&self) -> &[Tab] {
        self.store.tabs()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.store.active()
    }

    pub fn find(&self, id: &TabId) -> Option<&Tab> {
        self.store.find(id)
    }

    pub fn location(&self) -> &str {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    pub fn storage(&self) -> &S {
        self.persistence.storage()
    }

    pub fn storage_mut(&mut self) -> &mut S {
        self.persistence.storage_mut()
    }

    pub fn into_storage(self) -> S {
        self.persistence.into_storage()
    }

    /// Register an observer called after each commit, before reconciliation.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&[Tab]) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Activate the tab for `path`, creating it if needed, then navigate
    /// there. An existing tab keeps its title and view.
    pub fn open_or_activate(&mut self, path: &str, title: &str, view: View) -> TabId {
        let id = match self.store.find_by_path(path).map(|t| t.id.clone()) {
            Some(id) => {
                if self.store.activate(&id) {
                    self.commit();
                }
                id
            }
            None => {
                let id = self.store.open(path, title, view).id.clone();
                self.commit();
                id
            }
        };
        self.navigate(path);
        id
    }

    /// Open `path` with the view and title the resolver gives it.
    pub fn open_path(&mut self, path: &str) -> TabId {
        let route = self.resolver.resolve(path);
        let (title, view) = (route.title.clone(), route.view);
        self.open_or_activate(path, &title, view)
    }

    /// Close a tab. Unknown ids are ignored. Closing the active tab moves
    /// the location to the tab that took over, or home when none is left.
    pub fn close_tab(&mut self, id: &TabId) -> bool {
        let Some(removed) = self.store.close(id) else {
            return false;
        };
        self.commit();

        if removed.is_active {
            if let Some(path) = self.store.active().map(|t| t.path.clone()) {
                self.navigate(&path);
            }
        }
        true
    }

    /// Activate a tab and navigate to its path. Unknown ids are ignored.
    pub fn switch_tab(&mut self, id: &TabId) -> bool {
        let Some(path) = self.store.find(id).map(|t| t.path.clone()) else {
            return false;
        };
        if self.store.activate(id) {
            self.commit();
        }
        self.navigate(&path);
        true
    }

    /// Move to `path`. Tabs follow the location; no tab is created.
    pub fn navigate(&mut self, path: &str) {
        self.history.push(path);
        self.location_changed();
    }

    pub fn back(&mut self) -> bool {
        if !self.history.back() {
            return false;
        }
        self.location_changed();
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.history.forward() {
            return false;
        }
        self.location_changed();
        true
    }

    pub fn tab_state(&self, id: &TabId) -> Option<Value> {
        self.persistence.tab_state(id)
    }

    /// Replace a tab's auxiliary state. Returns false for unknown tabs.
    pub fn set_tab_state(&mut self, id: &TabId, state: &Value) -> Result<bool> {
        if self.store.find(id).is_none() {
            return Ok(false);
        }
        self.persistence.save_tab_state(id, state)?;
        Ok(true)
    }

    /// Merge keys into a tab's auxiliary state. `None` for unknown tabs.
    pub fn update_tab_state(
        &mut self,
        id: &TabId,
        partial: Map<String, Value>,
    ) -> Result<Option<Value>> {
        if self.store.find(id).is_none() {
            return Ok(None);
        }
        self.persistence.update_tab_state(id, partial).map(Some)
    }

    pub fn reset_tab_state(&mut self, id: &TabId) -> Result<()> {
        self.persistence.reset_tab_state(id)
    }

    fn location_changed(&mut self) {
        let location = self.history.current().to_string();
        if location::sync_to_location(&mut self.store, &location) {
            log::debug!("location '{}' changed the active tab", location);
            self.commit();
        }
    }

    fn commit(&mut self) {
        self.settle();
        self.reconcile();
    }

    fn settle(&mut self) {
        let tabs = self.store.tabs();
        if let Err(e) = self.persistence.save(tabs) {
            log::warn!("failed to save tabs: {}", e);
        }
        if let Err(e) = self.persistence.prune_tab_states(tabs) {
            log::warn!("failed to prune tab state: {}", e);
        }
        for subscriber in &mut self.subscribers {
            subscriber(tabs);
        }
    }

    // Each correction navigates to an existing tab's path (which keeps that
    // tab active) or to home with no tabs, so the loop ends after one pass.
    fn reconcile(&mut self) {
        loop {
            let correction =
                location::reconcile(&mut self.store, self.history.current(), &self.config.home_path);
            let Correction::Navigate(path) = correction else {
                break;
            };

            if !self.store.is_empty() {
                self.settle();
            }
            log::debug!("reconcile: navigating to '{}'", path);
            self.history.push(&path);
            if location::sync_to_location(&mut self.store, &path) {
                self.settle();
            }
        }
    }
}
