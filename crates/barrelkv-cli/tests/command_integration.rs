//! End-to-end tests driving the compiled `barrelkv` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cmd() -> Command {
    Command::cargo_bin("barrelkv").unwrap()
}

#[test]
fn version_prints_crate_name() {
    cmd().arg("version").assert().success().stdout(predicate::str::contains("barrelkv-cli"));
}

#[test]
fn put_then_get_round_trips() {
    let dir = tempdir().unwrap();

    cmd().args(["put", dir.path().to_str().unwrap(), "name", "bitcask"]).assert().success();

    cmd()
        .args(["get", dir.path().to_str().unwrap(), "name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bitcask"));
}

#[test]
fn get_of_missing_key_fails() {
    let dir = tempdir().unwrap();
    cmd().args(["get", dir.path().to_str().unwrap(), "missing"]).assert().failure();
}

#[test]
fn delete_removes_a_key() {
    let dir = tempdir().unwrap();
    cmd().args(["put", dir.path().to_str().unwrap(), "k", "v"]).assert().success();
    cmd().args(["delete", dir.path().to_str().unwrap(), "k"]).assert().success();
    cmd().args(["get", dir.path().to_str().unwrap(), "k"]).assert().failure();
}

#[test]
fn list_keys_reports_every_live_key_in_order() {
    let dir = tempdir().unwrap();
    cmd().args(["put", dir.path().to_str().unwrap(), "b", "2"]).assert().success();
    cmd().args(["put", dir.path().to_str().unwrap(), "a", "1"]).assert().success();

    cmd()
        .args(["list-keys", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| {
            let a_pos = out.find('a').unwrap();
            let b_pos = out.find('b').unwrap();
            a_pos < b_pos
        }));
}

#[test]
fn list_keys_on_empty_database_reports_no_keys() {
    let dir = tempdir().unwrap();
    cmd()
        .args(["list-keys", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("no keys"));
}

#[test]
fn merge_and_info_run_against_a_populated_database() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        cmd().args(["put", dir.path().to_str().unwrap(), &format!("k{i}"), "v"]).assert().success();
    }

    cmd().args(["merge", dir.path().to_str().unwrap()]).assert().success();

    cmd()
        .args(["info", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("keys"));
}
