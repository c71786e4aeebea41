use dupecmp::cli::Cli;
use dupecmp::config::{ConfigError, Settings};
use dupecmp::digest::DigestFunction;
use clap::Parser;
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Bypass Env so variables set by other tests cannot interfere.
    let figment = Figment::from(Serialized::defaults(Settings::default()));
    let settings: Settings = figment.extract().unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("DUPECMP_IO_THREADS", "12");

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Env::prefixed("DUPECMP_"));
    let settings: Settings = figment.extract().unwrap();

    assert_eq!(settings.io_threads, 12);
    assert_eq!(settings.digest, DigestFunction::Sha1);

    std::env::remove_var("DUPECMP_IO_THREADS");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
quiet = true
digest = "blake3"
ignore_empty = true
header_format = "== %i =="
"#;
    fs::write(&config_path, toml_content).unwrap();

    let settings = Settings::load(Some(&config_path)).unwrap();
    assert!(settings.quiet);
    assert!(settings.ignore_empty);
    assert!(!settings.thorough);
    assert_eq!(settings.digest, DigestFunction::Blake3);
    assert_eq!(settings.header_format.as_deref(), Some("== %i =="));
}

#[test]
fn test_cli_overrides_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "digest = \"sha384\"\nio_threads = 2\n").unwrap();

    let cli = Cli::try_parse_from(["dupecmp", "-d", "sha256", "x"]).unwrap();
    let settings = Settings::load(Some(&config_path)).unwrap().with_overrides(&cli);

    assert_eq!(settings.digest, DigestFunction::Sha256);
    assert_eq!(settings.io_threads, 2);
}

#[test]
fn test_malformed_toml_is_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "thorough = [not toml").unwrap();

    let err = Settings::load(Some(&config_path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
