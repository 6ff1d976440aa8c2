mod logger;

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::process;

use serde_json::{Map, Value};
use tabshell::form;
use tabshell::line::render_bar;
use tabshell::{
    BuiltinMenu, Config, FileMenu, FileStore, History, KeyValueStore, MenuSource, MenuState,
    Navigator, Resolver, TabId,
};

const LOCATION_KEY: &str = "location";
const ENV_PREFIX: &str = "TABSHELL_";
const CONFIG_KEYS: &[&str] = &[
    "home_path",
    "storage_key",
    "clear_on_empty",
    "menu_delay_ms",
    "bar_width",
    "menu_file",
];

fn print_help() {
    eprintln!("tabshell - tab-based navigation shell with persisted tabs");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  tabshell [--dir <dir>] [--set key=value]... [--plain] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  menu                             Fetch the menu and list its routes");
    eprintln!("  open <path>                      Open a tab for <path>, or switch to it");
    eprintln!("  close <tab>                      Close a tab (id or 1-based position)");
    eprintln!("  switch <tab>                     Activate a tab");
    eprintln!("  go <path>                        Change the location without opening a tab");
    eprintln!("  back | forward                   Move through location history");
    eprintln!("  list [--json]                    List open tabs");
    eprintln!("  bar                              Print the tab bar");
    eprintln!("  state <tab> [json]               Show or replace a tab's saved state");
    eprintln!("  reset-state <tab>                Remove a tab's saved state");
    eprintln!("  validate <form> [--tab <tab>] key=value...");
    eprintln!("                                   Check form values, merged over the tab's state");
    eprintln!("                                   Forms: user, product, search, contact");
    eprintln!();
    eprintln!("Settings (--set or {}<KEY> environment variables):", ENV_PREFIX);
    for key in CONFIG_KEYS {
        eprintln!("  {}", key);
    }
    eprintln!();
    eprintln!("Logging: TABSHELL_LOG=0..4");
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("tabshell: {}", msg);
    process::exit(1);
}

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Default)]
struct Options {
    dir: Option<PathBuf>,
    settings: BTreeMap<String, String>,
    plain: bool,
}

impl Options {
    /// Split leading global options from the command and its arguments.
    fn parse(args: Vec<String>) -> (Options, Vec<String>) {
        let mut opts = Options::default();
        let mut iter = args.into_iter();
        let mut rest = Vec::new();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--dir" => match iter.next() {
                    Some(dir) => opts.dir = Some(PathBuf::from(dir)),
                    None => fail("--dir needs a directory"),
                },
                "--set" => match iter.next().as_deref().and_then(|kv| kv.split_once('=')) {
                    Some((k, v)) => {
                        opts.settings.insert(k.to_string(), v.to_string());
                    }
                    None => fail("--set needs key=value"),
                },
                "--plain" => opts.plain = true,
                _ => {
                    rest.push(arg);
                    rest.extend(iter.by_ref());
                    break;
                }
            }
        }
        (opts, rest)
    }

    /// Environment first, then --set on top.
    fn config(&self) -> Config {
        let mut map = BTreeMap::new();
        for key in CONFIG_KEYS {
            if let Ok(value) = env::var(format!("{}{}", ENV_PREFIX, key.to_uppercase())) {
                map.insert(key.to_string(), value);
            }
        }
        map.extend(self.settings.clone());
        Config::from_btreemap(&map)
    }

    fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabshell")
    }
}

// ============================================================================
// Session: one run against the state directory
// ============================================================================

struct Session {
    nav: Navigator<FileStore>,
    menu: MenuState,
    plain: bool,
}

impl Session {
    fn load(opts: &Options) -> Session {
        let config = opts.config();
        let dir = opts.data_dir();
        let storage = FileStore::open(&dir).unwrap_or_else(|e| fail(e));

        let history = load_history(&storage, &config.home_path);

        let mut resolver = Resolver::default();
        let mut menu = MenuState::default();
        let source: Box<dyn MenuSource> = match &config.menu_file {
            Some(path) => Box::new(FileMenu { path: path.clone() }),
            None => Box::new(BuiltinMenu::new(config.menu_delay)),
        };
        menu.refresh(source.as_ref(), &mut resolver);

        let nav = Navigator::restore(config, storage, history, resolver);
        Session {
            nav,
            menu,
            plain: opts.plain,
        }
    }

    fn finish(mut self) {
        match serde_json::to_string(self.nav.history()) {
            Ok(json) => {
                if let Err(e) = self.nav.storage_mut().set(LOCATION_KEY, &json) {
                    fail(e);
                }
            }
            Err(e) => fail(e),
        }
    }

    /// A tab argument is an id or a 1-based position.
    fn tab_arg(&self, arg: &str) -> TabId {
        let tabs = self.nav.tabs();
        if let Some(tab) = tabs.iter().find(|t| t.id.as_str() == arg) {
            return tab.id.clone();
        }
        if let Some(tab) = arg
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| tabs.get(i))
        {
            return tab.id.clone();
        }
        TabId::from(arg)
    }

    fn print_bar(&self) {
        let bar = render_bar(self.nav.tabs(), self.nav.config().bar_width, !self.plain);
        if bar.is_empty() {
            println!("(no tabs)");
        } else {
            println!("{}", bar);
        }
        println!("location: {}", self.nav.location());
    }
}

fn load_history(storage: &FileStore, home: &str) -> History {
    match storage.get(LOCATION_KEY) {
        Ok(Some(data)) => match serde_json::from_str::<History>(&data) {
            Ok(history) => history,
            Err(e) => {
                log::warn!("ignoring malformed location history: {}", e);
                History::new(home)
            }
        },
        Ok(None) => History::new(home),
        Err(e) => {
            log::warn!("could not read location history: {}", e);
            History::new(home)
        }
    }
}

fn one_arg<'a>(args: &'a [String], usage: &str) -> &'a str {
    match args.first() {
        Some(arg) => arg.as_str(),
        None => {
            eprintln!("Usage: tabshell {}", usage);
            process::exit(1);
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn do_menu(session: &Session) {
    if let Some(err) = &session.menu.error {
        println!("menu load failed: {}", err);
        return;
    }
    for item in &session.menu.items {
        let icon = item.icon.as_deref().unwrap_or(" ");
        println!("{} {:32} {}", icon, item.title, item.path);
    }
}

fn do_open(session: &mut Session, args: &[String]) {
    let path = one_arg(args, "open <path>");
    session.nav.open_path(path);
    session.print_bar();
}

fn do_close(session: &mut Session, args: &[String]) {
    let id = session.tab_arg(one_arg(args, "close <tab>"));
    session.nav.close_tab(&id);
    session.print_bar();
}

fn do_switch(session: &mut Session, args: &[String]) {
    let id = session.tab_arg(one_arg(args, "switch <tab>"));
    session.nav.switch_tab(&id);
    session.print_bar();
}

fn do_go(session: &mut Session, args: &[String]) {
    let path = one_arg(args, "go <path>");
    session.nav.navigate(path);
    session.print_bar();
}

fn do_list(session: &Session, args: &[String]) {
    let tabs = session.nav.tabs();
    if args.iter().any(|a| a == "--json") {
        let json: Vec<Value> = tabs
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id.as_str(),
                    "title": t.title,
                    "path": t.path,
                    "isActive": t.is_active,
                    "view": t.view.name(),
                })
            })
            .collect();
        match serde_json::to_string_pretty(&json) {
            Ok(out) => println!("{}", out),
            Err(e) => fail(e),
        }
        return;
    }

    if tabs.is_empty() {
        println!("(no tabs)");
    }
    for (i, tab) in tabs.iter().enumerate() {
        let marker = if tab.is_active { "*" } else { " " };
        println!(
            "{} {}. {:32} {:20} {}",
            marker,
            i + 1,
            tab.title,
            tab.path,
            tab.id
        );
    }
}

fn do_state(session: &mut Session, args: &[String]) {
    let id = session.tab_arg(one_arg(args, "state <tab> [json]"));
    if session.nav.find(&id).is_none() {
        fail(format!("no tab '{}'", id));
    }

    if args.len() < 2 {
        match session.nav.tab_state(&id) {
            Some(state) => match serde_json::to_string_pretty(&state) {
                Ok(out) => println!("{}", out),
                Err(e) => fail(e),
            },
            None => println!("(no state)"),
        }
        return;
    }

    let raw = args[1..].join(" ");
    let state: Value = serde_json::from_str(&raw)
        .unwrap_or_else(|e| fail(format!("invalid JSON state: {}", e)));
    if let Err(e) = session.nav.set_tab_state(&id, &state) {
        fail(e);
    }
}

fn do_reset_state(session: &mut Session, args: &[String]) {
    let id = session.tab_arg(one_arg(args, "reset-state <tab>"));
    if let Err(e) = session.nav.reset_tab_state(&id) {
        fail(e);
    }
}

/// Parse `key=value` pairs; values that parse as JSON keep their type.
fn parse_values(pairs: &[String]) -> Map<String, Value> {
    let mut values = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            fail(format!("expected key=value, got '{}'", pair));
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        values.insert(key.to_string(), value);
    }
    values
}

fn do_validate(session: &Session, args: &[String]) -> bool {
    let name = one_arg(args, "validate <form> [--tab <tab>] key=value...");
    let spec = form::builtin(name).unwrap_or_else(|| fail(format!("unknown form '{}'", name)));

    let mut rest = &args[1..];
    let mut values = spec.defaults();
    if rest.first().map(|s| s.as_str()) == Some("--tab") {
        let tab = one_arg(&rest[1..], "validate <form> --tab <tab> key=value...");
        let id = session.tab_arg(tab);
        if let Some(Value::Object(saved)) = session.nav.tab_state(&id) {
            values.extend(saved);
        }
        rest = &rest[2..];
    }
    values.extend(parse_values(rest));

    let errors = spec.validate(&values);
    if errors.is_empty() {
        println!("{}: ok", spec.title);
        return true;
    }
    for field in &spec.fields {
        if let Some(msg) = errors.get(&field.name) {
            println!("{:20} {}", field.label, msg);
        }
    }
    false
}

fn main() {
    logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (opts, args) = Options::parse(args);

    if args.is_empty() {
        print_help();
        process::exit(1);
    }

    let command = args[0].as_str();
    if matches!(command, "--help" | "-h" | "help") {
        print_help();
        return;
    }

    let mut session = Session::load(&opts);
    let rest = &args[1..];
    let mut ok = true;
    match command {
        "menu" => do_menu(&session),
        "open" => do_open(&mut session, rest),
        "close" => do_close(&mut session, rest),
        "switch" => do_switch(&mut session, rest),
        "go" => do_go(&mut session, rest),
        "back" => {
            session.nav.back();
            session.print_bar();
        }
        "forward" => {
            session.nav.forward();
            session.print_bar();
        }
        "list" => do_list(&session, rest),
        "bar" => session.print_bar(),
        "state" => do_state(&mut session, rest),
        "reset-state" => do_reset_state(&mut session, rest),
        "validate" => ok = do_validate(&session, rest),
        other => {
            eprintln!("tabshell: unknown command '{}'", other);
            eprintln!("Run with --help for usage");
            process::exit(1);
        }
    }

    session.finish();
    if !ok {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn session_in(dir: &std::path::Path) -> Session {
        let (opts, _) = Options::parse(args(&["--dir", dir.to_str().unwrap(), "--plain", "bar"]));
        Session::load(&opts)
    }

    #[test]
    fn test_parse_options() {
        let (opts, rest) = Options::parse(args(&[
            "--dir", "/tmp/x", "--set", "bar_width=40", "--plain", "open", "/form", "--set",
        ]));
        assert_eq!(opts.dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(opts.settings.get("bar_width").map(|s| s.as_str()), Some("40"));
        assert!(opts.plain);
        assert_eq!(rest, args(&["open", "/form", "--set"]));
        assert_eq!(opts.config().bar_width, 40);
    }

    #[test]
    fn test_parse_values_keeps_json_types() {
        let values = parse_values(&args(&["price=12.5", "name=Lamp", "inStock=true"]));
        assert_eq!(values["price"], serde_json::json!(12.5));
        assert_eq!(values["name"], serde_json::json!("Lamp"));
        assert_eq!(values["inStock"], serde_json::json!(true));
    }

    #[test]
    fn test_session_survives_restart() {
        let temp = tempdir().unwrap();

        let mut session = session_in(temp.path());
        session.nav.open_path("/");
        session.nav.open_path("/new-page");
        session.finish();

        let session = session_in(temp.path());
        let paths: Vec<_> = session.nav.tabs().iter().map(|t| t.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/new-page"]);
        assert_eq!(session.nav.location(), "/new-page");
        assert_eq!(session.nav.active_tab().map(|t| t.title.as_str()), Some("New Page"));
    }

    #[test]
    fn test_broken_location_history_starts_home() {
        let temp = tempdir().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();
        store
            .set(LOCATION_KEY, r#"{"entries":[],"cursor":3}"#)
            .unwrap();

        let session = session_in(temp.path());
        assert_eq!(session.nav.location(), "/");
    }

    #[test]
    fn test_validate_search_and_contact_forms() {
        let temp = tempdir().unwrap();
        let session = session_in(temp.path());
        assert!(do_validate(&session, &args(&["search", "gender=male", "searchText=kim"])));
        assert!(!do_validate(&session, &args(&["search", "gender=male"])));
        assert!(do_validate(
            &session,
            &args(&["contact", "name=Kim", "email=kim@example.com", "age=42"])
        ));
        assert!(!do_validate(
            &session,
            &args(&["contact", "name=Kim", "email=kim@example.com", "age=130"])
        ));
    }

    #[test]
    fn test_tab_arg_accepts_position_and_id() {
        let temp = tempdir().unwrap();
        let mut session = session_in(temp.path());
        let home = session.nav.open_path("/");
        let form = session.nav.open_path("/form");

        assert_eq!(session.tab_arg("1"), home);
        assert_eq!(session.tab_arg("2"), form);
        assert_eq!(session.tab_arg(form.as_str()), form);
        assert_eq!(session.tab_arg("9").as_str(), "9");
    }

    #[test]
    fn test_validate_merges_tab_state() {
        let temp = tempdir().unwrap();
        let mut session = session_in(temp.path());
        let form = session.nav.open_path("/form");
        session
            .nav
            .set_tab_state(
                &form,
                &serde_json::json!({
                    "username": "kim",
                    "email": "kim@example.com",
                    "password": "Secret123",
                }),
            )
            .unwrap();

        assert!(!do_validate(&session, &args(&["user", "--tab", "1"])));
        assert!(do_validate(
            &session,
            &args(&["user", "--tab", "1", "confirmPassword=Secret123"])
        ));
    }
}
