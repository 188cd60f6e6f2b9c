use sheetmerge::config::{AppConfig, ConfigManager, Theme};
use sheetmerge::DuplicateKeyPolicy;
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_user_config(manager: &ConfigManager, content: &str) {
    manager.ensure_config_dir().unwrap();
    fs::write(manager.config_path("config.toml"), content).unwrap();
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.merge.duplicate_keys, DuplicateKeyPolicy::Expand);
    assert_eq!(config.merge.collision_suffix, "_right");
    assert_eq!(config.export.file_prefix, "merged");
    assert_eq!(config.export.timestamp_format, "%Y%m%d%H%M");
    assert!(config.export.output_dir.is_none());
    assert_eq!(config.display.preview_rows, 10);
    assert!(config.display.show_history);
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert!(!config.debug.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config().unwrap();

    for section in ["[merge]", "[export]", "[display]", "[performance]", "[theme.colors]", "[debug]"] {
        assert!(template.contains(section), "missing {section}");
    }
    assert!(template.contains("version = \"0.1\""));
    // Option fields are listed with an example even though they serialize to nothing
    assert!(template.contains("output_dir"));
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager
        .write_default_config(false)
        .expect("First write should succeed");
    assert!(path.exists());

    let result = config_manager.write_default_config(false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));

    let again = config_manager
        .write_default_config(true)
        .expect("Write with force should succeed");
    assert_eq!(path, again);
}

#[test]
fn test_generated_config_loads_as_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.write_default_config(false).unwrap();

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.merge.collision_suffix, "_right");
    assert_eq!(config.display.preview_rows, 10);
}

#[test]
fn test_load_config_with_no_file() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.export.file_prefix, "merged");
}

#[test]
fn test_user_file_overrides_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_user_config(
        &config_manager,
        r#"
[merge]
duplicate_keys = "first"

[export]
file_prefix = "joined"
output_dir = "/tmp/out"

[display]
preview_rows = 25
"#,
    );

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.merge.duplicate_keys, DuplicateKeyPolicy::First);
    // untouched fields keep their defaults
    assert_eq!(config.merge.collision_suffix, "_right");
    assert_eq!(config.export.file_prefix, "joined");
    assert_eq!(config.output_dir(), std::path::PathBuf::from("/tmp/out"));
    assert_eq!(config.display.preview_rows, 25);
    assert!(config.display.show_history);

    let options = config.merge_options();
    assert_eq!(options.duplicate_keys, DuplicateKeyPolicy::First);
    assert_eq!(config.export_options().file_prefix, "joined");
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        "[performance]\nevent_poll_interval_ms = 0\n",
        "[display]\npreview_rows = 0\n",
        "[export]\ntimestamp_format = \"%Q\"\n",
        "[export]\nfile_prefix = \"a/b\"\n",
        "[theme.colors]\nerror = \"not-a-color\"\n",
        "version = \"9.0\"\n",
    ];
    for content in cases {
        let (_temp_dir, config_manager) = setup_test_config_dir();
        write_user_config(&config_manager, content);
        assert!(
            AppConfig::load_from(&config_manager).is_err(),
            "accepted: {content}"
        );
    }
}

#[test]
fn test_malformed_toml_is_an_error() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_user_config(&config_manager, "[merge\nduplicate_keys = ");
    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_theme_from_custom_colors() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_user_config(
        &config_manager,
        "[theme.colors]\nsuccess = \"#00ff00\"\nerror = \"indexed(196)\"\n",
    );
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.theme.colors.success, "#00ff00");
    let theme = Theme::from_config(&config.theme).unwrap();
    assert!(theme.get_optional("success").is_some());
    assert!(theme.get_optional("no_such_color").is_none());
}
