use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use hablemos::{config::GlobalConfig, AppError};

fn sample_toml() -> &'static str {
    r#"
bind_address = "0.0.0.0"
http_port = 8080
database_path = "/var/lib/hablemos/app.db"
upload_dir = "/var/lib/hablemos/books"
max_upload_bytes = 1048576
max_journal_chars = 5000

[llm]
base_url = "http://localhost:11434/v1/"
model = "llama3.1"
temperature = 0.4
max_tokens = 512
request_timeout_seconds = 30
history_limit = 12

[drills]
session_size = 8
rules_per_session = 3
weak_accuracy_threshold = 0.6
unlock_accuracy_threshold = 0.9
min_attempts = 4
weak_limit = 1
recent_limit = 1
newest_limit = 1
accept_missing_accents = true
stale_session_minutes = 30
"#
}

fn minimal_toml() -> &'static str {
    r#"
[llm]
model = "gpt-4o-mini"
"#
}

#[test]
fn parses_full_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.database_path, PathBuf::from("/var/lib/hablemos/app.db"));
    assert_eq!(config.upload_dir, PathBuf::from("/var/lib/hablemos/books"));
    assert_eq!(config.max_upload_bytes, 1_048_576);
    assert_eq!(config.max_journal_chars, 5000);

    assert_eq!(config.llm.model, "llama3.1");
    assert_eq!(config.llm.max_tokens, 512);
    assert_eq!(config.llm.request_timeout().as_secs(), 30);
    assert_eq!(config.llm.history_limit, 12);
    assert!(config.llm.api_key.is_none());

    assert_eq!(config.drills.session_size, 8);
    assert_eq!(config.drills.rules_per_session, 3);
    assert!(config.drills.accept_missing_accents);
    assert_eq!(config.drills.stale_session_minutes, 30);
}

#[test]
fn minimal_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str(minimal_toml()).expect("config parses");

    assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.http_port, 3000);
    assert_eq!(config.database_path, PathBuf::from("data/hablemos.db"));
    assert_eq!(config.upload_dir, PathBuf::from("data/books"));
    assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
    assert_eq!(config.max_journal_chars, 10_000);
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    assert_eq!(config.llm.history_limit, 20);
    assert_eq!(config.drills, hablemos::config::DrillConfig::default());
    assert_eq!(config.drills.session_size, 10);
    assert!(!config.drills.accept_missing_accents);
}

#[test]
fn socket_addr_combines_bind_address_and_port() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");
    assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
}

#[test]
fn missing_llm_section_is_rejected() {
    let result = GlobalConfig::from_toml_str("http_port = 3000\n");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn empty_model_is_rejected() {
    let result = GlobalConfig::from_toml_str("[llm]\nmodel = \"  \"\n");
    let err = result.expect_err("blank model must fail");
    assert!(err.to_string().contains("llm.model"), "{err}");
}

#[test]
fn non_http_base_url_is_rejected() {
    let toml = "[llm]\nmodel = \"m\"\nbase_url = \"ftp://example.com\"\n";
    let err = GlobalConfig::from_toml_str(toml).expect_err("ftp url must fail");
    assert!(err.to_string().contains("base_url"), "{err}");
}

#[test]
fn zero_history_limit_is_rejected() {
    let toml = "[llm]\nmodel = \"m\"\nhistory_limit = 0\n";
    assert!(matches!(
        GlobalConfig::from_toml_str(toml),
        Err(AppError::Config(_))
    ));
}

#[test]
fn zero_session_size_is_rejected() {
    let toml = "[llm]\nmodel = \"m\"\n\n[drills]\nsession_size = 0\n";
    assert!(matches!(
        GlobalConfig::from_toml_str(toml),
        Err(AppError::Config(_))
    ));
}

#[test]
fn threshold_outside_unit_interval_is_rejected() {
    let toml = "[llm]\nmodel = \"m\"\n\n[drills]\nunlock_accuracy_threshold = 1.5\n";
    let err = GlobalConfig::from_toml_str(toml).expect_err("threshold must fail");
    assert!(err.to_string().contains("unlock_accuracy_threshold"), "{err}");
}

#[test]
fn api_key_in_toml_is_ignored() {
    let toml = "[llm]\nmodel = \"m\"\napi_key = \"sk-should-not-load\"\n";
    let config = GlobalConfig::from_toml_str(toml).expect("config parses");
    assert!(config.llm.api_key.is_none());
}

#[test]
fn load_from_path_reads_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("config.toml");
    std::fs::write(&path, minimal_toml()).expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.llm.model, "gpt-4o-mini");
}

#[test]
fn load_from_missing_path_is_config_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let result = GlobalConfig::load_from_path(temp.path().join("absent.toml"));
    assert!(matches!(result, Err(AppError::Config(_))));
}
