//! Command-line parsing

use clap::Parser;
use ingest_harness::cli::Cli;
use std::path::Path;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("ingest-harness").chain(args.iter().copied()))
}

#[test]
fn test_no_arguments_parses() {
    // a missing stage is reported by the binary with the stage list
    let cli = parse(&[]).unwrap();
    assert!(cli.stage.is_none());
    assert!(!cli.verbose);
    assert!(!cli.initialize);
}

#[test]
fn test_long_flags() {
    let cli = parse(&[
        "dpn_replicate",
        "--verbose",
        "--initialize",
        "--json",
        "--timeout",
        "1800",
        "--keep-workspace",
    ])
    .unwrap();

    assert_eq!(cli.stage.as_deref(), Some("dpn_replicate"));
    assert!(cli.verbose);
    assert!(cli.initialize);
    assert!(cli.json);
    assert!(cli.keep_workspace);
    assert_eq!(cli.timeout, Some(1800));
}

#[test]
fn test_plan_and_list() {
    let cli = parse(&["--plan", "apt_fixity"]).unwrap();
    assert!(cli.plan);
    assert_eq!(cli.stage.as_deref(), Some("apt_fixity"));

    let cli = parse(&["--list"]).unwrap();
    assert!(cli.list);
}

#[test]
fn test_timeout_must_be_a_number() {
    assert!(parse(&["apt_ingest", "--timeout", "soon"]).is_err());
}

#[test]
fn test_unknown_flag_rejected() {
    let err = parse(&["apt_ingest", "--frobnicate"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}

#[test]
fn test_config_from_environment() {
    temp_env::with_var("INGEST_HARNESS_CONFIG", Some("/etc/harness.yaml"), || {
        let cli = parse(&["units"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/harness.yaml")));
    });
}

#[test]
fn test_config_flag_beats_environment() {
    temp_env::with_var("INGEST_HARNESS_CONFIG", Some("/etc/harness.yaml"), || {
        let cli = parse(&["units", "-c", "ci.yaml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("ci.yaml")));
    });
}
