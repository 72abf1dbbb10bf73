//! Tests for command-line parsing.

#![cfg(feature = "cli")]

use clap::Parser;
use piggy_discord::Cli;
use std::path::Path;

#[test]
fn defaults() {
    let cli = Cli::parse_from(["piggy"]);
    assert_eq!(cli.config, Path::new("piggy.toml"));
    assert!(cli.local_model.is_none());
}

#[test]
fn config_and_local_model() {
    let cli = Cli::parse_from([
        "piggy",
        "--config",
        "/etc/piggy.toml",
        "--local-model",
        "Qwen/Qwen2.5-0.5B-Instruct",
    ]);
    assert_eq!(cli.config, Path::new("/etc/piggy.toml"));
    assert_eq!(cli.local_model.as_deref(), Some("Qwen/Qwen2.5-0.5B-Instruct"));
}

#[test]
fn short_config_flag() {
    let cli = Cli::parse_from(["piggy", "-c", "bot.toml"]);
    assert_eq!(cli.config, Path::new("bot.toml"));
}

#[tokio::test]
async fn missing_config_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let cli = Cli::parse_from(["piggy", "--config", path.to_str().unwrap()]);
    assert!(cli.run().await.is_err());
}
