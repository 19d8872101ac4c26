use npmgraph_core::config::{Config, DEFAULT_FONT, DEFAULT_REGISTRY_URL};
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.registry.url, DEFAULT_REGISTRY_URL);
    assert_eq!(config.registry.max_concurrent_fetches, 8);
    assert!(!config.registry.offline);
    assert!(config.scope.roots.is_empty());
    assert_eq!(config.graph.font, DEFAULT_FONT);
    assert!(config.graph.annotate);
}

#[test]
fn test_config_defaults_from_empty_toml() {
    // serde default functions kick in for missing tables
    let config = Config::parse_toml("").unwrap();
    assert_eq!(config.registry.timeout_secs, 30);
    assert_eq!(config.registry.cache_ttl_secs, 3600);
    assert!(config.graph.annotate);
}

#[test]
fn test_config_kebab_case_keys() {
    let config = Config::parse_toml(
        r#"
[registry]
url = "https://npm.example.com/"
max-concurrent-fetches = 2
cache-ttl-secs = 0
offline = true

[scope]
roots = ["@first-lego-league/ms-logger"]
scopes = ["@first-lego-league"]
exclude = ["@types/*"]

[graph]
title = "FLL packages"
annotate = false
"#,
    )
    .unwrap();
    assert_eq!(config.registry.url, "https://npm.example.com/");
    assert_eq!(config.registry.max_concurrent_fetches, 2);
    assert_eq!(config.registry.cache_ttl_secs, 0);
    assert!(config.registry.offline);
    assert_eq!(config.scope.roots, vec!["@first-lego-league/ms-logger"]);
    assert_eq!(config.scope.exclude, vec!["@types/*"]);
    assert_eq!(config.graph.title.as_deref(), Some("FLL packages"));
    assert!(!config.graph.annotate);
}

#[test]
fn test_config_parse_error() {
    let err = Config::parse_toml("[registry\nurl = 1").unwrap_err();
    assert!(err.to_string().contains("Config error"), "got: {err}");
}

#[test]
fn test_config_discover_walks_up() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("npmgraph.toml"),
        "[scope]\nroots = [\"express\"]\n",
    )
    .unwrap();
    let nested = tmp.path().join("packages").join("web");
    std::fs::create_dir_all(&nested).unwrap();

    let config = Config::discover(&nested).unwrap();
    assert_eq!(config.scope.roots, vec!["express"]);
}

#[test]
fn test_config_snapshot_relative_to_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("npmgraph.toml");
    std::fs::write(&path, "[registry]\nsnapshot = \"fixtures/registry.json\"\n").unwrap();

    let config = Config::from_path(&path).unwrap();
    assert_eq!(
        config.registry.snapshot,
        Some(tmp.path().join("fixtures/registry.json"))
    );
}

#[test]
fn test_auth_token_prefers_literal() {
    let mut config = Config::default();
    config.registry.token = Some("abc".into());
    config.registry.token_env = Some("NPMGRAPH_TEST_UNSET_TOKEN_VAR".into());
    assert_eq!(config.registry.auth_token().as_deref(), Some("abc"));

    config.registry.token = None;
    assert_eq!(config.registry.auth_token(), None);
}

#[test]
fn test_cache_path_expands_home() {
    let config = Config::default();
    let path = config.registry.cache_path();
    assert!(path.ends_with(".npmgraph/cache"));
    assert!(!path.starts_with("~"));
}
