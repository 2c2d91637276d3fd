//! Integration tests of the `h5c` binary.

use assert_cmd::Command;
use predicates::prelude::*;

use h5conv::convention::Convention;
use h5conv::core::paths::UserDirs;
use h5conv::layout::{registry as layout_registry, Layout, ValueMatcher};
use h5conv::store::{AttrInit, AttrValue, DataFile, Dtype};

fn h5c(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("h5c").unwrap();
    cmd.env("H5CONV_HOME", home);
    cmd
}

fn sample_file(dir: &std::path::Path) -> std::path::PathBuf {
    let cv = Convention::baseline();
    let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
    file.set_attr(&cv, "/", "title", AttrValue::from("Sample run"))
        .unwrap();
    file.create_dataset(
        &cv,
        "/",
        "u",
        vec![8],
        Dtype::F64,
        AttrInit::from([
            ("units".to_string(), AttrValue::from("m/s")),
            ("standard_name".to_string(), AttrValue::from("x_velocity")),
        ]),
    )
    .unwrap();
    let path = dir.join("run.json");
    file.save_as(&path).unwrap();
    path
}

#[test]
fn user_dirs_prints_paths() {
    let tmp = tempfile::tempdir().unwrap();
    h5c(tmp.path())
        .arg("user-dirs")
        .assert()
        .success()
        .stdout(predicate::str::contains("standard name tables"));
}

#[test]
fn dump_prints_structure() {
    let tmp = tempfile::tempdir().unwrap();
    let data = sample_file(tmp.path());
    h5c(tmp.path())
        .arg("dump")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("@title = Sample run"))
        .stdout(predicate::str::contains("u [8] f64"));
}

#[test]
fn layout_check_fails_on_violation() {
    let tmp = tempfile::tempdir().unwrap();
    let data = sample_file(tmp.path());

    // register a layout requiring an attribute the file lacks
    let dirs = UserDirs::at(tmp.path().to_path_buf());
    let mut layout = Layout::new();
    layout.root().require_attr("contact", ValueMatcher::Any);
    layout_registry::register(&layout, "strict", &dirs, false).unwrap();

    h5c(tmp.path())
        .args(["layout", "check", "strict"])
        .arg(&data)
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed"));

    // and one the file satisfies
    let mut ok = Layout::new();
    ok.root().require_attr("title", ValueMatcher::Any);
    layout_registry::register(&ok, "lenient", &dirs, false).unwrap();

    h5c(tmp.path())
        .args(["layout", "check", "lenient"])
        .arg(&data)
        .assert()
        .success();
}

#[test]
fn layout_list_and_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = UserDirs::at(tmp.path().to_path_buf());
    layout_registry::register(&Layout::new(), "empty", &dirs, false).unwrap();

    h5c(tmp.path())
        .args(["layout", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("empty"));

    h5c(tmp.path())
        .args(["layout", "delete", "empty"])
        .assert()
        .success();

    h5c(tmp.path())
        .args(["layout", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn standard_name_check_against_table_file() {
    let tmp = tempfile::tempdir().unwrap();
    let data = sample_file(tmp.path());

    let table_yaml = tmp.path().join("fan.yaml");
    std::fs::write(
        &table_yaml,
        "name: fan\nversion: v1\ntable:\n  x_velocity:\n    units: m/s\n    description: d\n",
    )
    .unwrap();

    h5c(tmp.path())
        .args(["standard-name", "check"])
        .arg(&table_yaml)
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("all standard names valid"));
}

#[test]
fn standard_name_check_reports_bad_units() {
    let tmp = tempfile::tempdir().unwrap();

    let cv = Convention::baseline();
    let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
    file.create_dataset(
        &cv,
        "/",
        "u",
        vec![8],
        Dtype::F64,
        AttrInit::from([
            ("units".to_string(), AttrValue::from("kg")),
            ("standard_name".to_string(), AttrValue::from("x_velocity")),
        ]),
    )
    .unwrap();
    let data = tmp.path().join("bad.json");
    file.save_as(&data).unwrap();

    let table_yaml = tmp.path().join("fan.yaml");
    std::fs::write(
        &table_yaml,
        "name: fan\nversion: v1\ntable:\n  x_velocity:\n    units: m/s\n    description: d\n",
    )
    .unwrap();

    h5c(tmp.path())
        .args(["standard-name", "check"])
        .arg(&table_yaml)
        .arg(&data)
        .assert()
        .failure()
        .stdout(predicate::str::contains("/u"));
}

#[test]
fn completion_generates_script() {
    let tmp = tempfile::tempdir().unwrap();
    h5c(tmp.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("h5c"));
}
