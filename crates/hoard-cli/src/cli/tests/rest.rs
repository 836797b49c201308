use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_fetch() {
    match parse(&["hoard", "fetch", "https://cdn.example/v.mp4", "out/v.mp4"]) {
        CliCommand::Fetch {
            url,
            dest,
            min_bytes,
        } => {
            assert_eq!(url, "https://cdn.example/v.mp4");
            assert_eq!(dest, Path::new("out/v.mp4"));
            assert_eq!(min_bytes, 0);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_min_bytes() {
    match parse(&["hoard", "fetch", "--min-bytes", "4096", "http://h/a.bin", "a.bin"]) {
        CliCommand::Fetch { min_bytes, .. } => assert_eq!(min_bytes, 4096),
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_fetch_requires_dest() {
    assert!(Cli::try_parse_from(["hoard", "fetch", "https://cdn.example/v.mp4"]).is_err());
}

#[test]
fn cli_parse_failures() {
    match parse(&["hoard", "failures"]) {
        CliCommand::Failures { clear } => assert!(!clear),
        _ => panic!("expected Failures"),
    }
    match parse(&["hoard", "failures", "--clear"]) {
        CliCommand::Failures { clear } => assert!(clear),
        _ => panic!("expected Failures --clear"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["hoard", "checksum", "data/4242/101/video.mp4"]) {
        CliCommand::Checksum { path } => {
            assert_eq!(path, Path::new("data/4242/101/video.mp4"))
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["hoard", "config"]), CliCommand::Config));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["hoard", "pause", "1"]).is_err());
}
