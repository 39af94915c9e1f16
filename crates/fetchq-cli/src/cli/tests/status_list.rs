//! Tests for status, list and checksum subcommands.

use super::{parse, parse_err};
use crate::cli::CliCommand;

#[test]
fn cli_parse_status() {
    match parse(&["fetchq", "status", "0123456789abcdef0123456789abcdef"]) {
        CliCommand::Status { id } => assert_eq!(id, "0123456789abcdef0123456789abcdef"),
        _ => panic!("expected Status"),
    }
    parse_err(&["fetchq", "status"]);
}

#[test]
fn cli_parse_list() {
    assert!(matches!(parse(&["fetchq", "list"]), CliCommand::List));
}

#[test]
fn cli_parse_checksum() {
    match parse(&["fetchq", "checksum", "abc", "file.iso", "--downloads", "/srv/dl"]) {
        CliCommand::Checksum {
            id,
            name,
            downloads,
        } => {
            assert_eq!(id, "abc");
            assert_eq!(name, "file.iso");
            assert_eq!(downloads.as_deref(), Some(std::path::Path::new("/srv/dl")));
        }
        _ => panic!("expected Checksum"),
    }
}
