//! Layered configuration: defaults, TOML file, environment overrides.

use std::fs;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tala_core::foundation::IssuanceError;
use tala_core::infrastructure::config::{load_config, load_config_from_file, AllocationStrategyName, StorageBackend};
use tala_core::infrastructure::storage::AllocationStrategy;
use tempfile::TempDir;

// Environment variables are process-global; serialize the tests that touch
// them.
fn lock_env() -> MutexGuard<'static, ()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env lock")
}

fn write_config(dir: &TempDir, contents: &str) {
    fs::write(dir.path().join("tala-config.toml"), contents).expect("write config");
}

#[test]
fn missing_file_yields_defaults() {
    let _env = lock_env();
    let dir = TempDir::new().expect("tempdir");

    // Default backend is rocks, which requires a data_dir.
    match load_config(dir.path()) {
        Err(IssuanceError::ConfigError(message)) => assert!(message.contains("data_dir")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn toml_file_overrides_defaults() {
    let _env = lock_env();
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[storage]
backend = "memory"

[allocation]
strategy = "optimistic"
retry_budget = 7
"#,
    );

    let config = load_config(dir.path()).expect("load config");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.allocation.strategy, AllocationStrategyName::Optimistic);
    assert_eq!(config.allocation.retry_budget, 7);
    assert_eq!(config.allocator().strategy(), AllocationStrategy::OptimisticScan { retry_budget: 7 });
}

#[test]
fn environment_overrides_toml() {
    let _env = lock_env();
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[storage]
backend = "memory"

[allocation]
retry_budget = 7
"#,
    );

    std::env::set_var("TALA_ALLOCATION__RETRY_BUDGET", "9");
    let result = load_config(dir.path());
    std::env::remove_var("TALA_ALLOCATION__RETRY_BUDGET");

    let config = result.expect("load config");
    assert_eq!(config.allocation.retry_budget, 9);
    assert_eq!(config.storage.backend, StorageBackend::Memory);
}

#[test]
fn environment_alone_can_select_backend() {
    let _env = lock_env();
    let dir = TempDir::new().expect("tempdir");

    std::env::set_var("TALA_STORAGE__BACKEND", "memory");
    let result = load_config(dir.path());
    std::env::remove_var("TALA_STORAGE__BACKEND");

    let config = result.expect("load config");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
}

#[test]
fn zero_retry_budget_in_file_is_rejected() {
    let _env = lock_env();
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[storage]
backend = "memory"

[allocation]
retry_budget = 0
"#,
    );

    match load_config(dir.path()) {
        Err(IssuanceError::ConfigError(message)) => assert!(message.contains("retry_budget")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn explicit_path_load_honors_file_name() {
    let _env = lock_env();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[storage]\nbackend = \"memory\"\n").expect("write config");

    let config = load_config_from_file(&path).expect("load config");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.allocation.retry_budget, 5);
}

#[test]
fn configured_store_and_recorder_construct() {
    let _env = lock_env();
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        &format!(
            "[storage]\nbackend = \"rocks\"\ndata_dir = \"{}\"\n\n[activity]\nlog_file = \"{}\"\n",
            dir.path().display(),
            dir.path().join("activity.jsonl").display()
        ),
    );

    let config = load_config(dir.path()).expect("load config");
    let store = config.open_store().expect("open store");
    store.health_check().expect("health check");
    config.activity_recorder().expect("build recorder");
}
