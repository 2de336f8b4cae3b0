use clap::Parser;
use dupesieve::cli::Cli;
use dupesieve::error::{ExitCode, StructuredError};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Run the app against an empty config file so user settings never leak in.
fn run(args: &[&str]) -> (anyhow::Result<ExitCode>, String) {
    let config_dir = tempdir().unwrap();
    let config_path = config_dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();
    let config_arg = config_path.to_string_lossy().into_owned();

    let mut argv = vec!["dupesieve", "--quiet", "--no-color", "--config", config_arg.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let mut out = Vec::new();
    let result = dupesieve::run_app_to(cli, &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn scenario() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), [b'X'; 100]).unwrap();
    fs::write(dir.path().join("b"), [b'X'; 100]).unwrap();
    fs::write(dir.path().join("c"), [b'Y'; 100]).unwrap();
    fs::write(dir.path().join("d"), [b'Z'; 50]).unwrap();
    dir
}

fn root_arg(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

#[test]
fn test_text_report() {
    let dir = scenario();
    let root = root_arg(dir.path());
    let (result, out) = run(&["scan", &root]);

    assert_eq!(result.unwrap(), ExitCode::Success);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        &lines[..4],
        &[
            "4 files found",
            "1 possible duplicate groups after size grouping",
            "1 possible duplicate groups after quick hashing",
            "1 duplicate groups found",
        ]
    );
    let header = lines.iter().position(|l| l.starts_with("SHA512 hash: ")).unwrap();
    assert_eq!(lines[header].len(), "SHA512 hash: ".len() + 6);
    assert!(lines[header + 1].starts_with("  /") && lines[header + 1].ends_with("a"));
    assert!(lines[header + 2].starts_with("  /") && lines[header + 2].ends_with("b"));
    assert!(out.contains("1 duplicate files in 1 groups, 100 B reclaimable"));
}

#[test]
fn test_quoted_root_is_accepted() {
    let dir = scenario();
    let quoted = format!("\"{}\"", root_arg(dir.path()));
    let (result, _) = run(&["scan", &quoted]);
    assert_eq!(result.unwrap(), ExitCode::Success);
}

#[test]
fn test_root_with_apostrophe_is_scanned() {
    let parent = tempdir().unwrap();
    let root = parent.path().join("Bob's files");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a"), "same").unwrap();
    fs::write(root.join("b"), "same").unwrap();

    let (result, out) = run(&["scan", &root_arg(&root)]);
    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(out.contains("Bob's files"));

    let quoted = format!("\"{}\"", root_arg(&root));
    let (result, _) = run(&["scan", &quoted]);
    assert_eq!(result.unwrap(), ExitCode::Success);
}

#[test]
fn test_zero_hash_timeout_in_config_file_is_rejected() {
    let dir = scenario();
    let config_dir = tempdir().unwrap();
    let config_path = config_dir.path().join("config.toml");
    fs::write(&config_path, "hash_timeout_secs = 0\n").unwrap();

    let root = root_arg(dir.path());
    let cli = Cli::try_parse_from([
        "dupesieve",
        "--quiet",
        "--config",
        config_path.to_str().unwrap(),
        "scan",
        root.as_str(),
    ])
    .unwrap();
    let err = dupesieve::run_app_to(cli, Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("hash_timeout_secs"));
}

#[test]
fn test_empty_tree_exit_code_and_report() {
    let dir = tempdir().unwrap();
    let root = root_arg(dir.path());
    let (result, out) = run(&["scan", &root]);

    assert_eq!(result.unwrap(), ExitCode::NoDuplicates);
    assert!(out.contains("0 duplicate groups found"));
}

#[test]
fn test_json_report() {
    let dir = scenario();
    let root = root_arg(dir.path());
    let (result, out) = run(&["scan", &root, "--output", "json"]);

    assert_eq!(result.unwrap(), ExitCode::Success);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let group = &value["duplicates"][0];
    assert_eq!(group["digest"].as_str().unwrap().len(), 128);
    assert_eq!(group["size"], 100);
    assert_eq!(group["files"].as_array().unwrap().len(), 2);
    assert_eq!(value["summary"]["size_groups"], 1);
    assert_eq!(value["summary"]["exit_code_name"], "DS000");
}

#[test]
fn test_csv_report() {
    let dir = scenario();
    let root = root_arg(dir.path());
    let (result, out) = run(&["scan", &root, "--output", "csv", "--io-threads", "2"]);

    assert_eq!(result.unwrap(), ExitCode::Success);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "group_id,digest,size,path");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1,"));
    assert!(lines[1].contains(",100,"));
}

#[test]
fn test_missing_root_is_a_general_error() {
    let dir = tempdir().unwrap();
    let missing = root_arg(&dir.path().join("missing"));
    let (result, out) = run(&["scan", &missing]);

    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("Path not found"));
    assert!(out.is_empty());

    let structured = StructuredError::new(&err, ExitCode::for_error(&err));
    assert_eq!(structured.code, "DS001");
    assert!(structured.path.unwrap().ends_with("missing"));
}

#[test]
fn test_root_that_is_a_file_is_rejected() {
    let dir = scenario();
    let file = root_arg(&dir.path().join("a"));
    let (result, _) = run(&["scan", &file]);

    assert!(format!("{:#}", result.unwrap_err()).contains("Not a directory"));
}

#[test]
fn test_config_subcommand_prints_toml() {
    let (result, out) = run(&["config"]);

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(out.contains("io_threads = 4"));
    assert!(out.contains("output = \"text\""));
}
