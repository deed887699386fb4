use super::*;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    std::env::temp_dir().join(format!("guardian-mcp-{nanos}-{file_name}"))
}

#[test]
fn missing_config_uses_defaults() {
    let path = unique_temp_path("missing-config.toml");
    let config = GuardianConfig::load_from_path(&path).expect("default config");

    assert_eq!(config.osv.api_url, DEFAULT_OSV_API_URL);
    assert_eq!(config.osv.timeout_seconds, DEFAULT_OSV_TIMEOUT_SECONDS);
    assert_eq!(
        config.scan.max_concurrent_lookups,
        DEFAULT_MAX_CONCURRENT_LOOKUPS
    );
    assert_eq!(config.scan.options().max_concurrent_lookups, 1);
}

#[test]
fn parses_config_values() {
    let path = unique_temp_path("config.toml");
    let raw = r#"
[osv]
api_url = "http://127.0.0.1:9999/v1/query"
timeout_seconds = 5

[scan]
max_concurrent_lookups = 8
"#;
    fs::write(&path, raw).expect("write config");

    let config = GuardianConfig::load_from_path(&path).expect("parsed config");
    let _ = fs::remove_file(path);

    assert_eq!(config.osv.api_url, "http://127.0.0.1:9999/v1/query");
    assert_eq!(config.osv.timeout(), Duration::from_secs(5));
    assert_eq!(config.scan.max_concurrent_lookups, 8);
}

#[test]
fn zero_values_fall_back_to_defaults() {
    let path = unique_temp_path("zero-config.toml");
    let raw = r#"
[osv]
api_url = "  "
timeout_seconds = 0

[scan]
max_concurrent_lookups = 0
"#;
    fs::write(&path, raw).expect("write config");

    let config = GuardianConfig::load_from_path(&path).expect("parsed config");
    let _ = fs::remove_file(path);

    assert_eq!(config.osv.api_url, DEFAULT_OSV_API_URL);
    assert_eq!(config.osv.timeout_seconds, DEFAULT_OSV_TIMEOUT_SECONDS);
    assert_eq!(
        config.scan.max_concurrent_lookups,
        DEFAULT_MAX_CONCURRENT_LOOKUPS
    );
}

#[test]
fn project_config_overrides_global_config() {
    let global = unique_temp_path("global.toml");
    let project = unique_temp_path("project.toml");
    fs::write(
        &global,
        r#"
[osv]
timeout_seconds = 10

[scan]
max_concurrent_lookups = 4
"#,
    )
    .expect("write global");
    fs::write(
        &project,
        r#"
[scan]
max_concurrent_lookups = 2
"#,
    )
    .expect("write project");

    let config = GuardianConfig::load_with_paths(Some(global.clone()), Some(project.clone()))
        .expect("merged config");
    let _ = fs::remove_file(global);
    let _ = fs::remove_file(project);

    assert_eq!(config.osv.timeout_seconds, 10);
    assert_eq!(config.scan.max_concurrent_lookups, 2);
}

#[test]
fn invalid_toml_is_an_error() {
    let path = unique_temp_path("broken.toml");
    fs::write(&path, "[osv\napi_url = ").expect("write config");

    let err = GuardianConfig::load_from_path(&path).expect_err("invalid toml");
    let _ = fs::remove_file(&path);

    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
fn wrong_value_type_is_an_error() {
    let path = unique_temp_path("wrong-type.toml");
    fs::write(&path, "[scan]\nmax_concurrent_lookups = \"many\"\n").expect("write config");

    let result = GuardianConfig::load_from_path(&path);
    let _ = fs::remove_file(&path);

    assert!(result.is_err());
}
