use std::ffi::OsString;

use nova_config::{
    discover_config_path, load_for_workspace, with_config_env_lock, NovaConfig,
    NOVA_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: impl Into<OsString>) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value.into());
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_nova_toml_in_workspace_root() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(NOVA_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nova.toml");
        std::fs::write(&config_path, "[search.remote]\nenabled = false\n").unwrap();

        let discovered = discover_config_path(dir.path())
            .expect("nova.toml should be discovered when present in workspace root");
        assert_eq!(
            discovered,
            config_path.canonicalize().unwrap_or(config_path),
            "expected config discovery to return the workspace-root nova.toml path"
        );
    });
}

#[test]
fn hidden_config_is_a_fallback() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(NOVA_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let hidden = dir.path().join(".nova.toml");
        std::fs::write(&hidden, "[search.fuzzy]\nedit_distance_fallback = false\n").unwrap();

        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(path, Some(hidden.canonicalize().unwrap_or(hidden.clone())));
        assert!(!config.search.fuzzy.edit_distance_fallback);

        // `nova.toml` takes precedence once it exists.
        std::fs::write(dir.path().join("nova.toml"), "").unwrap();
        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_ne!(path, Some(hidden.canonicalize().unwrap_or(hidden)));
        assert!(config.search.fuzzy.edit_distance_fallback);
    });
}

#[test]
fn env_override_wins_over_workspace_file() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("nova.toml"), "[search.remote]\nenabled = true\n")
            .unwrap();

        let override_path = dir.path().join("override.toml");
        std::fs::write(
            &override_path,
            "[search.remote]\nenabled = false\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let _env = EnvVarGuard::set(NOVA_CONFIG_ENV_VAR, "override.toml");

        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert!(!config.search.remote.enabled, "expected override config to be loaded");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            path.expect("load_for_workspace should return the resolved config path"),
            override_path.canonicalize().unwrap_or(override_path)
        );
    });
}

#[test]
fn env_override_accepts_absolute_path() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        let override_path = dir.path().join("override.toml");
        std::fs::write(&override_path, "[search.index_cache]\ncapacity = 3\n").unwrap();

        let _env = EnvVarGuard::set(NOVA_CONFIG_ENV_VAR, override_path.as_os_str());

        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(config.search.index_cache.capacity, 3);
        assert_eq!(
            path.expect("load_for_workspace should return the resolved config path"),
            override_path.canonicalize().unwrap_or(override_path)
        );
    });
}

#[test]
fn missing_config_returns_defaults() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(NOVA_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(path, None);
        assert_eq!(config, NovaConfig::default());
    });
}

#[test]
fn missing_override_file_is_an_io_error() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        let _env = EnvVarGuard::set(NOVA_CONFIG_ENV_VAR, "does-not-exist.toml");

        let err = load_for_workspace(dir.path()).unwrap_err();
        assert!(
            matches!(err, nova_config::ConfigError::Io { .. }),
            "unexpected error: {err}"
        );
    });
}
