// Shell configuration, read from a flat key/value map

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOME_PATH: &str = "/";
pub const DEFAULT_STORAGE_KEY: &str = "tab-state";
pub const DEFAULT_BAR_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Location shown when no tab is open.
    pub home_path: String,
    /// Storage slot for the tab list; per-tab slots use `{storage_key}-{id}`.
    pub storage_key: String,
    /// Remove the slot when the last tab closes instead of leaving the
    /// previous list in place.
    pub clear_on_empty: bool,
    /// Simulated latency of the built-in menu feed.
    pub menu_delay: Duration,
    /// Column budget for the rendered tab bar.
    pub bar_width: usize,
    /// Read the menu feed from this JSON file instead of the built-in list.
    pub menu_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            home_path: DEFAULT_HOME_PATH.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            clear_on_empty: false,
            menu_delay: Duration::ZERO,
            bar_width: DEFAULT_BAR_WIDTH,
            menu_file: None,
        }
    }
}

impl Config {
    pub fn from_btreemap(config: &BTreeMap<String, String>) -> Self {
        let home_path = config
            .get("home_path")
            .map(|s| s.trim())
            .filter(|s| s.starts_with('/'))
            .unwrap_or(DEFAULT_HOME_PATH)
            .to_string();

        let storage_key = config
            .get("storage_key")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STORAGE_KEY)
            .to_string();

        let clear_on_empty = config
            .get("clear_on_empty")
            .map(|s| s == "true")
            .unwrap_or(false);

        let menu_delay = config
            .get("menu_delay_ms")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO);

        let bar_width = config
            .get("bar_width")
            .and_then(|s| s.parse().ok())
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_BAR_WIDTH);

        let menu_file = config
            .get("menu_file")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Config {
            home_path,
            storage_key,
            clear_on_empty,
            menu_delay,
            bar_width,
            menu_file,
        }
    }
}
