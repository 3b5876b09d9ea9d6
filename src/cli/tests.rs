//! Unit tests for CLI commands

use crate::cli::{resolve_config, Cli, Commands, ServeArgs};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_serve_command_with_flags() {
    let cli = Cli::try_parse_from([
        "frontgate",
        "serve",
        "--host",
        "0.0.0.0",
        "--port",
        "9000",
        "--base-dir",
        "public",
    ])
    .unwrap();

    match cli.command {
        Commands::Serve(args) => {
            assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
            assert_eq!(args.port, Some(9000));
            assert_eq!(args.base_dir, Some(PathBuf::from("public")));
        }
        _ => panic!("Expected Serve command"),
    }
}

#[test]
fn test_routes_command_exists() {
    let cli = Cli::try_parse_from(["frontgate", "routes", "--config", "config.yaml"]).unwrap();
    match cli.command {
        Commands::Routes { config } => {
            assert_eq!(config, Some(PathBuf::from("config.yaml")));
        }
        _ => panic!("Expected Routes command"),
    }
}

#[test]
fn test_invalid_port_is_rejected() {
    assert!(Cli::try_parse_from(["frontgate", "serve", "--port", "99999"]).is_err());
}

#[test]
fn test_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "host: 10.0.0.1\nport: 8000\nbase_dir: www\n").unwrap();

    let args = ServeArgs {
        config: Some(path),
        port: Some(9001),
        ..ServeArgs::default()
    };
    let config = resolve_config(&args).unwrap();
    assert_eq!(config.host, "10.0.0.1");
    assert_eq!(config.port, 9001);
    assert_eq!(config.base_dir, PathBuf::from("www"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let args = ServeArgs {
        config: Some(PathBuf::from("/definitely/not/here.yaml")),
        ..ServeArgs::default()
    };
    assert!(resolve_config(&args).is_err());
}
