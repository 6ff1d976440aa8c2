// Route-to-view mapping

use std::collections::BTreeMap;
use std::fmt;

use crate::menu::MenuItem;

/// The views a tab can render. Tabs hold one of these as a lookup key
/// rather than a rendered object, so a view is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    FormTest,
    NotUsedHotForm,
    SearchFormTest,
    About,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Home,
        View::FormTest,
        View::NotUsedHotForm,
        View::SearchFormTest,
        View::About,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::FormTest => "FormTest",
            Self::NotUsedHotForm => "NotUsedHotForm",
            Self::SearchFormTest => "SearchFormTest",
            Self::About => "About",
        }
    }

    pub fn from_name(name: &str) -> Option<View> {
        View::ALL.into_iter().find(|v| v.name() == name)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub view: View,
    pub title: String,
}

impl Route {
    pub fn new(view: View, title: impl Into<String>) -> Self {
        Route {
            view,
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    routes: BTreeMap<String, Route>,
    home_path: String,
    home: Route,
}

impl Default for Resolver {
    fn default() -> Self {
        let mut resolver = Resolver {
            routes: BTreeMap::new(),
            home_path: "/".to_string(),
            home: Route::new(View::Home, "Home"),
        };
        resolver.register("/", View::Home, "Home");
        resolver.register("/form", View::FormTest, "Form Example");
        resolver.register(
            "/not-used-hot-form",
            View::NotUsedHotForm,
            "Form Example (without Hot Form)",
        );
        resolver.register("/search-form", View::SearchFormTest, "Search Form Example");
        resolver.register("/about", View::About, "About");
        resolver
    }
}

impl Resolver {
    /// A resolver with no routes; every path resolves to the home route.
    pub fn empty() -> Self {
        Resolver {
            routes: BTreeMap::new(),
            home_path: "/".to_string(),
            home: Route::new(View::Home, "Home"),
        }
    }

    pub fn home_path(&self) -> &str {
        &self.home_path
    }

    /// Point the fallback at `path`. Until a route is registered there,
    /// unknown paths resolve to the Home view.
    pub fn set_home(&mut self, path: &str) {
        self.home_path = path.to_string();
    }

    /// Unknown paths resolve to the route registered at the home path.
    pub fn resolve(&self, path: &str) -> &Route {
        if let Some(route) = self.routes.get(path) {
            return route;
        }
        log::debug!("no route for '{}', using home '{}'", path, self.home_path);
        self.routes.get(&self.home_path).unwrap_or(&self.home)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn register(&mut self, path: &str, view: View, title: &str) {
        self.routes.insert(path.to_string(), Route::new(view, title));
    }

    pub fn remove(&mut self, path: &str) -> Option<Route> {
        self.routes.remove(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(|s| s.as_str())
    }

    /// Merge a menu feed. Later entries override earlier ones for the same
    /// path; entries naming no known view are skipped.
    pub fn merge_menu(&mut self, items: &[MenuItem]) -> usize {
        let mut merged = 0;
        for item in items {
            let Some(name) = item.component_name.as_deref() else {
                continue;
            };
            match View::from_name(name) {
                Some(view) => {
                    self.register(&item.path, view, &item.title);
                    merged += 1;
                }
                None => log::debug!("menu item '{}' names unknown view '{}'", item.path, name),
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(path: &str, title: &str, view: Option<&str>) -> MenuItem {
        MenuItem {
            path: path.to_string(),
            title: title.to_string(),
            component_name: view.map(|s| s.to_string()),
            icon: None,
        }
    }

    #[test]
    fn test_builtin_routes() {
        let resolver = Resolver::default();
        assert_eq!(resolver.resolve("/form").view, View::FormTest);
        assert_eq!(resolver.resolve("/about").title, "About");
        assert_eq!(resolver.paths().count(), 5);
    }

    #[test]
    fn test_unknown_path_resolves_home() {
        let resolver = Resolver::default();
        let route = resolver.resolve("/nowhere");
        assert_eq!(route.view, View::Home);
        assert_eq!(route.title, "Home");
        assert!(!resolver.contains("/nowhere"));
    }

    #[test]
    fn test_fallback_follows_home_path() {
        let mut resolver = Resolver::default();
        resolver.set_home("/about");
        assert_eq!(resolver.resolve("/nowhere").view, View::About);

        resolver.set_home("/unregistered");
        let route = resolver.resolve("/nowhere");
        assert_eq!(route.view, View::Home);
        assert_eq!(route.title, "Home");
    }

    #[test]
    fn test_register_and_remove() {
        let mut resolver = Resolver::empty();
        resolver.register("/c", View::About, "Page C");
        assert_eq!(resolver.resolve("/c").title, "Page C");
        assert_eq!(resolver.remove("/c").map(|r| r.view), Some(View::About));
        assert_eq!(resolver.resolve("/c").view, View::Home);
    }

    #[test]
    fn test_merge_menu_later_entries_win() {
        let mut resolver = Resolver::default();
        let merged = resolver.merge_menu(&[
            item("/new-page", "New Page", Some("Home")),
            item("/new-page", "Newer Page", Some("About")),
            item("/ghost", "Ghost", Some("Missing")),
            item("/bare", "Bare", None),
        ]);
        assert_eq!(merged, 2);
        let route = resolver.resolve("/new-page");
        assert_eq!(route.view, View::About);
        assert_eq!(route.title, "Newer Page");
        assert!(!resolver.contains("/ghost"));
        assert!(!resolver.contains("/bare"));
    }

    #[test]
    fn test_view_names_round_trip() {
        for view in View::ALL {
            assert_eq!(View::from_name(view.name()), Some(view));
        }
        assert_eq!(View::from_name("home"), None);
    }
}
