// ABOUTME: Tests for configuration file loading, validation, and layered merging
// ABOUTME: Covers TOML parsing, path precedence, environment layering and CLI overrides

use clap::Parser;
use gifgrep::cli::Cli;
use gifgrep::config::{ColorChoice, Config};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Should write config file");
    path
}

#[test]
fn test_config_deserialize_complete() {
    let toml_content = r#"
        source = "giphy"
        limit = 12
        color = "never"
        animate = false
        software_animation = true
        max_preview_bytes = 1048576
    "#;

    let config: Config = toml::from_str(toml_content).expect("Should parse valid TOML");

    assert_eq!(config.source, Some("giphy".to_string()));
    assert_eq!(config.limit, Some(12));
    assert_eq!(config.color_choice(), ColorChoice::Never);
    assert_eq!(config.animate, Some(false));
    assert_eq!(config.software_animation, Some(true));
    assert_eq!(config.max_preview_bytes, Some(1_048_576));
}

#[test]
fn test_config_deserialize_rejects_unknown_source() {
    let err = toml::from_str::<Config>(r#"source = "imgur""#).unwrap_err();
    assert!(err.to_string().contains("Invalid source 'imgur'"));
}

#[test]
fn test_later_paths_override_earlier_ones() {
    let dir = TempDir::new().unwrap();
    let home = write(&dir, "home.toml", "source = \"giphy\"\nlimit = 10\n");
    let project = write(&dir, "project.toml", "limit = 3\n");

    let config = Config::load_from_paths(&[home, project]).unwrap();
    assert_eq!(config.source.as_deref(), Some("giphy"));
    assert_eq!(config.limit(), 3);
}

#[test]
fn test_missing_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let present = write(&dir, "config.toml", "animate = false\n");
    let missing = dir.path().join("nope.toml");

    let config = Config::load_from_paths(&[missing, present]).unwrap();
    assert!(!config.animate());
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let bad = write(&dir, "config.toml", "limit = 99\n");

    let err = Config::load_from_paths(&[bad]).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Invalid config file"), "{}", message);
    assert!(message.contains("Invalid limit 99"), "{}", message);
}

#[test]
fn test_malformed_toml_names_the_file() {
    let dir = TempDir::new().unwrap();
    let bad = write(&dir, "broken.toml", "limit = = 3\n");

    let err = Config::load_from_file(&bad).unwrap_err();
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
#[serial]
fn test_config_paths_follow_xdg() {
    let dir = TempDir::new().unwrap();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", dir.path());
    }

    let paths = Config::get_config_paths();
    let xdg = dir.path().join("gifgrep").join("config.toml");
    let position = paths.iter().position(|p| *p == xdg).expect("XDG path listed");
    assert!(paths[position + 1].ends_with("gifgrep.toml"));
    assert_eq!(position + 2, paths.len());

    unsafe {
        std::env::remove_var("XDG_CONFIG_HOME");
    }
}

#[test]
#[serial]
fn test_flags_beat_environment_and_files() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "config.toml", "source = \"tenor\"\ncolor = \"always\"\nlimit = 7\n");
    unsafe {
        std::env::set_var("GIFGREP_SOURCE", "giphy");
        std::env::set_var("NO_COLOR", "1");
    }

    let layered = Config::load_from_paths(&[file])
        .unwrap()
        .with_env(|name| std::env::var(name).ok());
    assert_eq!(layered.source.as_deref(), Some("giphy"));
    assert_eq!(layered.color_choice(), ColorChoice::Never);

    let cli = Cli::try_parse_from(["gifgrep", "--source", "tenor", "--color", "always"]).unwrap();
    let config = layered.merge(cli.overrides());
    config.validate().unwrap();
    assert_eq!(config.source.as_deref(), Some("tenor"));
    assert_eq!(config.color_choice(), ColorChoice::Always);
    assert_eq!(config.limit(), 7);

    unsafe {
        std::env::remove_var("GIFGREP_SOURCE");
        std::env::remove_var("NO_COLOR");
    }
}

#[test]
fn test_bad_source_flag_fails_validation() {
    let cli = Cli::try_parse_from(["gifgrep", "--source", "imgur"]).unwrap();
    let err = Config::default().merge(cli.overrides()).validate().unwrap_err();
    assert!(err.to_string().contains("Must be one of: tenor, giphy"));
}
