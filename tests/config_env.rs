use serial_test::serial;
use std::fs;
use tempfile::tempdir;

use xmv::config::{CONFIG_ENV, load_config};
use xmv::{ChunkMode, LogLevel, default_config_path, default_log_path};

fn set_env(v: &std::path::Path) {
    unsafe {
        std::env::set_var(CONFIG_ENV, v);
    }
}

fn clear_env() {
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
}

#[test]
#[serial]
fn env_override_points_at_file_and_colocates_log() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("custom.xml");
    fs::write(
        &cfg,
        "<config>\n  <log_level>info</log_level>\n  <chunk_mode>secure</chunk_mode>\n  <create_dirs>true</create_dirs>\n</config>\n",
    )
    .unwrap();
    set_env(&cfg);

    assert_eq!(default_config_path().unwrap(), cfg);
    assert_eq!(default_log_path().unwrap().parent(), cfg.parent());

    let loaded = load_config().unwrap().expect("config present");
    assert_eq!(loaded.log_level, LogLevel::Info);
    assert_eq!(loaded.chunk_mode, ChunkMode::Secure);
    assert!(loaded.policy.create_dirs);
    assert!(!loaded.policy.overwrite);

    clear_env();
}

#[test]
#[serial]
fn env_override_to_directory_appends_file_name() {
    let td = tempdir().unwrap();
    set_env(td.path());
    assert_eq!(default_config_path().unwrap(), td.path().join("config.xml"));
    clear_env();
}

#[test]
#[serial]
fn explicit_missing_config_is_an_error() {
    let td = tempdir().unwrap();
    set_env(&td.path().join("absent.xml"));
    assert!(load_config().is_err());
    clear_env();
}
