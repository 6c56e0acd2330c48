use std::{
    fs,
    path::PathBuf,
    sync::{Mutex, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    config::{self, Config, ConfyStore, HOME_VAR, SelectedLanguages, SettingsStore, Timing},
    errors::ConfigError,
};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("chat-bridge-tests-{prefix}-{ts}"))
}

fn restore_home(old: Option<std::ffi::OsString>) {
    match old {
        Some(v) => unsafe { std::env::set_var(HOME_VAR, v) },
        None => unsafe { std::env::remove_var(HOME_VAR) },
    }
}

#[test]
fn config_save_and_load_roundtrip_via_home_var() {
    let _g = lock_env();

    let old = std::env::var_os(HOME_VAR);
    let dir = unique_temp_dir("home");
    fs::create_dir_all(&dir).unwrap();
    unsafe { std::env::set_var(HOME_VAR, &dir) };

    let cfg = Config {
        selected_languages: SelectedLanguages::new("de", "en"),
        timing: Timing {
            watch_debounce_ms: 250,
            ..Timing::default()
        },
    };

    config::save(&cfg).unwrap();
    assert_eq!(config::config_path().unwrap(), dir.join("config.toml"));
    let loaded = config::load().unwrap();
    assert_eq!(loaded, cfg);

    restore_home(old);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn config_load_writes_defaults_when_missing() {
    let dir = unique_temp_dir("defaults");
    let path = dir.join("nested").join("config.toml");

    let loaded = config::load_from(&path).unwrap();
    assert_eq!(loaded.timing, Timing::default());
    assert!(loaded.selected_languages.is_valid());
    assert!(path.exists());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn config_load_rejects_unsupported_pair() {
    let dir = unique_temp_dir("invalid");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    fs::write(
        &path,
        r#"[selectedLanguages.partner]
code = "en"
displayName = "English"

[selectedLanguages.my]
code = "en"
displayName = "English"
"#,
    )
    .unwrap();

    let err = config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Store(_)));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn config_partial_file_keeps_default_languages() {
    let dir = unique_temp_dir("partial");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    fs::write(
        &path,
        r#"[timing]
watchDebounceMs = 800
hoverDebounceMs = 50
highlightDebounceMs = 100
translateDebounceMs = 500
noticeTtlMs = 3000
"#,
    )
    .unwrap();

    let loaded = config::load_from(&path).unwrap();
    assert_eq!(loaded.timing.watch_debounce_ms, 800);
    assert_eq!(loaded.selected_languages, SelectedLanguages::default());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn confy_store_keeps_languages_next_to_timing() {
    let dir = unique_temp_dir("store");
    let path = dir.join("config.toml");
    let mut store = ConfyStore::new(path.clone());

    assert_eq!(store.load_languages().unwrap(), None);

    let langs = SelectedLanguages::new("fr", "en");
    store.store_languages(&langs).unwrap();
    assert_eq!(store.load_languages().unwrap(), Some(langs.clone()));

    let cfg = config::load_from(&path).unwrap();
    assert_eq!(cfg.selected_languages, langs);
    assert_eq!(cfg.timing, Timing::default());

    let _ = fs::remove_dir_all(dir);
}
