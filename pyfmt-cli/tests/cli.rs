use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, source).expect("write fixture");
    path
}

#[test]
fn formats_stdin_to_stdout() {
    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.write_stdin("def f( a,b ):\n\treturn a+b\n");
    cmd.assert()
        .success()
        .stdout("def f(a, b):\n    return a + b\n");
}

#[test]
fn dash_reads_stdin() {
    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.arg("-").write_stdin("x=1");
    cmd.assert().success().stdout("x = 1\n");
}

#[test]
fn files_are_printed_in_argument_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let paths: Vec<_> = (0..6)
        .map(|i| write(dir.path(), &format!("f{i}.py"), &format!("v{i}={i}\n")))
        .collect();

    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.args(&paths).arg("--jobs").arg("4");
    cmd.assert()
        .success()
        .stdout("v0 = 0\nv1 = 1\nv2 = 2\nv3 = 3\nv4 = 4\nv5 = 5\n");
}

#[test]
fn lexical_error_is_reported_with_position() {
    let dir = tempfile::tempdir().expect("temp dir");
    let good = write(dir.path(), "good.py", "a=1\n");
    let bad = write(dir.path(), "bad.py", "x = 1\ny = '''never closed\n");

    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.arg(&good).arg(&bad);
    cmd.assert()
        .failure()
        .code(1)
        .stdout("a = 1\n")
        .stderr(predicate::str::contains(format!(
            "{}:2:5: unterminated triple-quoted string literal",
            bad.display()
        )));
}

#[test]
fn in_place_rewrites_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write(dir.path(), "a.py", "if x :\n  y( 1 )\n\n\n\nz\n");

    let mut cmd = cargo_bin_cmd!("pyfmti");
    cmd.arg(&path);
    cmd.assert().success().stdout("");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "if x:\n    y(1)\n\nz\n"
    );
}

#[test]
fn in_place_leaves_file_untouched_on_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let source = "f(a,\n  b\n";
    let path = write(dir.path(), "a.py", source);

    let mut cmd = cargo_bin_cmd!("pyfmti");
    cmd.arg(&path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("'(' was never closed"));
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn in_place_without_files_prints_usage() {
    let mut cmd = cargo_bin_cmd!("pyfmti");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn check_mode_writes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let messy = write(dir.path(), "messy.py", "x=1\n");
    let clean = write(dir.path(), "clean.py", "x = 1\n");

    let mut cmd = cargo_bin_cmd!("pyfmti");
    cmd.arg("--check").arg(&messy).arg(&clean);
    cmd.assert()
        .failure()
        .stderr(
            predicate::str::contains(format!("would reformat {}", messy.display()))
                .and(predicate::str::contains("clean.py").not()),
        );
    assert_eq!(fs::read_to_string(&messy).unwrap(), "x=1\n");
}

#[test]
fn options_change_the_layout() {
    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.args(["--indent-width", "2", "--max-blank-lines", "0"])
        .write_stdin("if x:\n    y\n\n\nz\n");
    cmd.assert().success().stdout("if x:\n  y\nz\n");
}

#[test]
fn config_file_is_layered() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write(dir.path(), "custom.toml", "[formatting]\nindent_width = 3\n");

    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.arg("--config")
        .arg(&config)
        .write_stdin("if x:\n\ty\n");
    cmd.assert().success().stdout("if x:\n   y\n");
}

#[test]
fn project_file_in_working_directory_is_used() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "pyfmt.toml", "[formatting]\nindent_width = 1\n");

    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.current_dir(dir.path()).write_stdin("if x:\n    y\n");
    cmd.assert().success().stdout("if x:\n y\n");
}

#[test]
fn dump_tokens_prints_json_lines() {
    let mut cmd = cargo_bin_cmd!("pyfmt");
    cmd.arg("--dump-tokens").write_stdin("x = 1\n");
    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("\"text\":\"x\"")
                .and(predicate::str::contains("\"EndOfInput\"")),
        );
}
