//! Tests for check, test-url and resolve.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_check() {
    assert!(matches!(parse(&["finicky", "check"]).command, CliCommand::Check));
}

#[test]
fn cli_parse_test_url_default_pid() {
    match parse(&["finicky", "test-url", "https://example.com"]).command {
        CliCommand::TestUrl { url, pid } => {
            assert_eq!(url, "https://example.com");
            assert_eq!(pid, 0);
        }
        _ => panic!("expected TestUrl"),
    }
}

#[test]
fn cli_parse_test_url_pid() {
    match parse(&["finicky", "test-url", "https://example.com", "--pid", "4242"]).command {
        CliCommand::TestUrl { pid, .. } => assert_eq!(pid, 4242),
        _ => panic!("expected TestUrl with --pid"),
    }
}

#[test]
fn cli_parse_resolve() {
    match parse(&["finicky", "resolve", "https://bit.ly/abc"]).command {
        CliCommand::Resolve { url } => assert_eq!(url, "https://bit.ly/abc"),
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_rejects_missing_url_and_unknown_commands() {
    assert!(Cli::try_parse_from(["finicky", "test-url"]).is_err());
    assert!(Cli::try_parse_from(["finicky", "resolve"]).is_err());
    assert!(Cli::try_parse_from(["finicky", "open"]).is_err());
}
