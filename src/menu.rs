// Menu feed: the list of navigable routes shown in the header

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::resolver::Resolver;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl MenuItem {
    fn new(path: &str, title: &str, component: &str, icon: &str) -> Self {
        MenuItem {
            path: path.to_string(),
            title: title.to_string(),
            component_name: Some(component.to_string()),
            icon: Some(icon.to_string()),
        }
    }
}

pub trait MenuSource {
    fn fetch(&self) -> Result<Vec<MenuItem>>;
}

/// The demo feed, returned after a simulated network delay.
#[derive(Debug, Clone, Default)]
pub struct BuiltinMenu {
    pub delay: Duration,
}

impl BuiltinMenu {
    pub fn new(delay: Duration) -> Self {
        BuiltinMenu { delay }
    }

    pub fn items() -> Vec<MenuItem> {
        vec![
            MenuItem::new("/", "Home", "Home", "🏠"),
            MenuItem::new("/form", "Form Example", "FormTest", "📝"),
            MenuItem::new(
                "/not-used-hot-form",
                "Form Example (without Hot Form)",
                "NotUsedHotForm",
                "🔥",
            ),
            MenuItem::new("/search-form", "Search Form Example", "SearchFormTest", "🔍"),
            MenuItem::new("/about", "About", "About", "ℹ️"),
            MenuItem::new("/new-page", "New Page", "Home", "🆕"),
        ]
    }
}

impl MenuSource for BuiltinMenu {
    fn fetch(&self) -> Result<Vec<MenuItem>> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        Ok(Self::items())
    }
}

/// Menu read from a JSON file holding an array of items.
#[derive(Debug, Clone)]
pub struct FileMenu {
    pub path: PathBuf,
}

impl MenuSource for FileMenu {
    fn fetch(&self) -> Result<Vec<MenuItem>> {
        let data = fs::read_to_string(&self.path).map_err(|e| {
            Error::MenuFetch(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            Error::MenuFetch(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }
}

/// Header state: loaded items plus the error shown when a fetch fails.
/// Failures are not retried; call `refresh` again.
#[derive(Debug, Clone, Default)]
pub struct MenuState {
    pub items: Vec<MenuItem>,
    pub loading: bool,
    pub error: Option<String>,
}

impl MenuState {
    /// Fetch the feed and merge it into `resolver`. On failure the previous
    /// items are kept and `error` is set.
    pub fn refresh(&mut self, source: &dyn MenuSource, resolver: &mut Resolver) -> bool {
        self.loading = true;
        self.error = None;

        let ok = match source.fetch() {
            Ok(items) => {
                let merged = resolver.merge_menu(&items);
                log::debug!("menu loaded: {} items, {} routes merged", items.len(), merged);
                self.items = items;
                true
            }
            Err(e) => {
                log::warn!("{}", e);
                self.error = Some(e.to_string());
                false
            }
        };

        self.loading = false;
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::View;
    use tempfile::tempdir;

    struct FailingMenu;

    impl MenuSource for FailingMenu {
        fn fetch(&self) -> Result<Vec<MenuItem>> {
            Err(Error::MenuFetch("offline".to_string()))
        }
    }

    #[test]
    fn test_builtin_refresh_merges_routes() {
        let mut resolver = Resolver::default();
        let mut menu = MenuState::default();

        assert!(menu.refresh(&BuiltinMenu::default(), &mut resolver));
        assert_eq!(menu.items.len(), 6);
        assert!(!menu.loading);
        assert!(menu.error.is_none());

        let route = resolver.resolve("/new-page");
        assert_eq!(route.view, View::Home);
        assert_eq!(route.title, "New Page");
    }

    #[test]
    fn test_failed_refresh_keeps_items() {
        let mut resolver = Resolver::default();
        let mut menu = MenuState::default();
        menu.refresh(&BuiltinMenu::default(), &mut resolver);

        assert!(!menu.refresh(&FailingMenu, &mut resolver));
        assert_eq!(menu.items.len(), 6);
        assert_eq!(menu.error.as_deref(), Some("menu fetch failed: offline"));
        assert!(!menu.loading);
    }

    #[test]
    fn test_file_menu() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("menu.json");
        std::fs::write(
            &path,
            r#"[{"path": "/c", "title": "Page C", "componentName": "About", "icon": "C"},
                {"path": "/d", "title": "Page D"}]"#,
        )
        .unwrap();

        let items = FileMenu { path }.fetch().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].component_name.as_deref(), Some("About"));
        assert_eq!(items[1].icon, None);
    }

    #[test]
    fn test_file_menu_missing_is_fetch_error() {
        let temp = tempdir().unwrap();
        let source = FileMenu {
            path: temp.path().join("absent.json"),
        };
        assert!(matches!(source.fetch(), Err(Error::MenuFetch(_))));
    }
}
