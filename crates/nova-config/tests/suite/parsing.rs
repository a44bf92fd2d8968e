use std::path::PathBuf;

use nova_config::{ConfigError, NovaConfig, DEFAULT_INDEX_CACHE_CAPACITY};
use tempfile::tempdir;

#[test]
fn empty_config_uses_defaults() {
    let config = NovaConfig::load_from_str("").unwrap();
    assert_eq!(config, NovaConfig::default());
    assert!(config.search.remote.enabled);
    assert_eq!(config.search.index_cache.capacity, DEFAULT_INDEX_CACHE_CAPACITY);
    assert_eq!(config.search.index_cache.persist_dir, None);
    assert!(config.search.fuzzy.edit_distance_fallback);
    assert_eq!(config.logging.level, "info");
    assert!(!config.logging.json);
}

#[test]
fn full_config_parses() {
    let config = NovaConfig::load_from_str(
        r#"
[search.remote]
enabled = false

[search.index_cache]
capacity = 8
persist_dir = "/var/cache/nova"

[search.fuzzy]
edit_distance_fallback = false

[logging]
level = "nova.router=debug"
json = true
stderr = false
"#,
    )
    .unwrap();

    assert!(!config.search.remote.enabled);
    assert_eq!(config.search.index_cache.capacity, 8);
    assert_eq!(
        config.search.index_cache.persist_dir,
        Some(PathBuf::from("/var/cache/nova"))
    );
    assert!(!config.search.fuzzy.edit_distance_fallback);
    assert_eq!(config.logging.level, "nova.router=debug");
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
}

#[test]
fn unknown_keys_are_rejected() {
    for text in [
        "[search]\nremote_enabled = true\n",
        "[search.index_cache]\nsize = 4\n",
        "[telemetry]\nenabled = true\n",
    ] {
        let err = NovaConfig::load_from_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{text:?}: {err}");
    }
}

#[test]
fn type_errors_do_not_echo_values() {
    let err = NovaConfig::load_from_str("[logging]\nlevel = 42\n").unwrap_err();
    let ConfigError::Toml(message) = err else {
        panic!("expected a toml error");
    };
    assert!(!message.contains("level = 42"), "{message}");
}

#[test]
fn relative_persist_dir_is_resolved_against_config_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nova.toml");
    std::fs::write(&path, "[search.index_cache]\npersist_dir = \".nova/index\"\n").unwrap();

    let config = NovaConfig::load_from_path(&path).unwrap();
    assert_eq!(
        config.search.index_cache.persist_dir,
        Some(dir.path().join(".nova/index"))
    );
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = NovaConfig::default();
    config.search.index_cache.capacity = 2;
    config.search.remote.enabled = false;
    let text = toml::to_string(&config).unwrap();
    assert_eq!(NovaConfig::load_from_str(&text).unwrap(), config);
}
