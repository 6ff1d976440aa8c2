// tabshell: tab-based navigation shell with persisted tab state

pub mod config;
pub mod error;
pub mod form;
pub mod line;
pub mod location;
pub mod menu;
pub mod navigator;
pub mod persist;
pub mod resolver;
pub mod storage;
pub mod tab;

pub use config::Config;
pub use error::{Error, Result};
pub use location::History;
pub use menu::{BuiltinMenu, FileMenu, MenuItem, MenuSource, MenuState};
pub use navigator::Navigator;
pub use resolver::{Resolver, Route, View};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use tab::{Tab, TabId, TabStore};
