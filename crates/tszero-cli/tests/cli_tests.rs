//! Integration tests for tszero-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io::Cursor;
use std::io::Read;
use std::io::Write;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn tszero_cmd() -> Command {
    cargo_bin_cmd!("tszero")
}

fn sample_tar(mtime: u64) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in [("a.txt", b"alpha".as_slice()), ("b/c.txt", b"charlie")] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn sample_zip(year: u16) -> Vec<u8> {
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::from_date_and_time(year, 2, 3, 4, 5, 6).unwrap());
    for (path, data) in [("one.txt", b"first".as_slice()), ("two.txt", b"second")] {
        writer.start_file(path, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn tar_mtimes(data: &[u8]) -> Vec<u64> {
    let mut archive = tar::Archive::new(data);
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().header().mtime().unwrap())
        .collect()
}

#[test]
fn test_version_flag() {
    tszero_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tszero"));
}

#[test]
fn test_help_flag() {
    tszero_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--buffer-size"));
}

#[test]
fn test_format_required() {
    tszero_cmd()
        .write_stdin(sample_tar(1))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--format"));
}

#[test]
fn test_tar_stdin_to_stdout() {
    let output = tszero_cmd()
        .args(["--format", "tar"])
        .write_stdin(sample_tar(1_600_000_000))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(tar_mtimes(&output), vec![0, 0]);
}

#[test]
fn test_tar_outputs_identical_across_build_times() {
    let run = |mtime| {
        tszero_cmd()
            .args(["-f", "tar", "-b", "1K"])
            .write_stdin(sample_tar(mtime))
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(1_000_000_000), run(1_700_000_000));
}

#[test]
fn test_tar_file_to_file() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let input = temp.path().join("in.tar");
    let output = temp.path().join("out.tar");
    std::fs::write(&input, sample_tar(1_234_567_890)).unwrap();

    tszero_cmd()
        .args(["-f", "tar"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(tar_mtimes(&std::fs::read(&output).unwrap()), vec![0, 0]);
}

#[test]
fn test_zip_path_to_stdout() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let input = temp.path().join("in.zip");
    std::fs::write(&input, sample_zip(2020)).unwrap();

    let output = tszero_cmd()
        .args(["--format", "zip"])
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let mut archive = zip::ZipArchive::new(Cursor::new(output)).unwrap();
    assert_eq!(archive.len(), 2);
    let mut first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "one.txt");
    assert_eq!(first.last_modified(), Some(zip::DateTime::default()));
    let mut content = String::new();
    first.read_to_string(&mut content).unwrap();
    assert_eq!(content, "first");
}

#[test]
fn test_zip_stdin_matches_zip_path() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let input = temp.path().join("in.zip");
    std::fs::write(&input, sample_zip(2010)).unwrap();

    let from_path = tszero_cmd()
        .args(["-f", "zip"])
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let from_stdin = tszero_cmd()
        .args(["-f", "zip", "-"])
        .write_stdin(sample_zip(2022))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(from_path, from_stdin);
}

#[test]
fn test_truncated_tar_fails() {
    let mut input = sample_tar(1);
    input.truncate(512 + 512 + 100);

    tszero_cmd()
        .args(["-f", "tar"])
        .write_stdin(input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Malformed tar archive 'standard input'"));
}

#[test]
fn test_not_a_zip_fails() {
    tszero_cmd()
        .args(["-f", "zip"])
        .write_stdin(b"this is plain text".to_vec())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read 'standard input' as a zip archive"))
        .stderr(predicate::str::contains("HINT"));
}

#[test]
fn test_missing_input_file_fails() {
    let temp = TempDir::new().expect("failed to create temp dir");

    tszero_cmd()
        .args(["-f", "tar"])
        .arg(temp.path().join("missing.tar"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.tar"));
}

#[test]
fn test_zero_buffer_size_rejected() {
    tszero_cmd()
        .args(["-f", "tar", "--buffer-size", "0"])
        .write_stdin(sample_tar(1))
        .assert()
        .failure()
        .stderr(predicate::str::contains("buffer size must be greater than zero"));
}

#[test]
fn test_verbose_logs_entries_to_stderr() {
    let assert = tszero_cmd()
        .args(["-f", "tar", "-v"])
        .env_remove("RUST_LOG")
        .write_stdin(sample_tar(42))
        .assert()
        .success()
        .stderr(predicate::str::contains("processing"))
        .stderr(predicate::str::contains("b/c.txt"))
        .stderr(predicate::str::contains("2 with content"));

    // stdout still carries only the archive
    assert_eq!(tar_mtimes(&assert.get_output().stdout), vec![0, 0]);
}

#[test]
fn test_truncated_tar_entry_is_named() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let input = temp.path().join("short.tar");
    let mut data = sample_tar(7);
    data.truncate(512 + 3);
    std::fs::write(&input, data).unwrap();

    tszero_cmd()
        .args(["-f", "tar"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("a.txt"))
        .stderr(predicate::str::contains("short.tar"));
}
