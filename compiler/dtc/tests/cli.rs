//! Runs the `dtc` binary on small programs written to scratch directories

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use indoc::indoc;

/// A scratch directory that is removed when dropped
struct Scratch(PathBuf);

impl Scratch {
    /// Create an empty scratch directory called `name`
    fn new(name: &str) -> Self {
        let dir = env::temp_dir().join(format!("dtc_cli_{name}"));
        drop(fs::remove_dir_all(&dir));
        fs::create_dir_all(&dir).expect("scratch directory should be creatable");
        Self(dir)
    }

    /// Write `content` to `name` inside the directory and return its path
    fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, content).expect("scratch file should be writable");
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        drop(fs::remove_dir_all(&self.0));
    }
}

/// Run `dtc` on `entry` with extra arguments
fn dtc(entry: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dtc"))
        .arg(entry)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("dtc should run")
}

/// The program most tests check
const PROGRAM: &str = indoc! {"
    def fun1(x):
        print(x)

    def fun2(y):
        return y

    a = 'not an int'
    fun1(a)
    fun2(1)
    fun2('text')
"};

#[test]
fn holding_contracts_exit_successfully() {
    let scratch = Scratch::new("holding");
    let entry = scratch.file("main.py", PROGRAM);

    let output = dtc(&entry, &["--given", "fun2(y=[int, str]) -> int | str"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 contract(s) checked, all hold"));
}

#[test]
fn violations_exit_with_failure() {
    let scratch = Scratch::new("violated");
    let entry = scratch.file("main.py", PROGRAM);

    let output = dtc(&entry, &["-g", "fun1(x=int) -> None"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("in line 8"));
    assert!(stderr.contains("parameter `x`"));
}

#[test]
fn contract_files_are_read() {
    let scratch = Scratch::new("contract_file");
    let entry = scratch.file("main.py", PROGRAM);
    let contracts = scratch.file(
        "contracts.txt",
        indoc! {"
            # both functions
            fun2(y=[int, str]) -> [int, str]

            fun1(x=str) -> None
        "},
    );

    let output = dtc(
        &entry,
        &[
            "--contracts",
            contracts.to_str().expect("scratch path should be UTF-8"),
            "--emit",
            "contracts",
        ],
    );

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "fun2(y: {int, str}) -> {int, str}\nfun1(x: {str}) -> {None}\n\n"
    );
}

#[test]
fn missing_imports_need_the_flag() {
    let scratch = Scratch::new("imports");
    let entry = scratch.file("main.py", &format!("import os\n{PROGRAM}"));

    let failed = dtc(&entry, &[]);
    let skipped = dtc(&entry, &["--skip-missing-imports"]);

    assert!(!failed.status.success());
    assert!(String::from_utf8_lossy(&failed.stderr).contains("cannot read source file"));
    assert!(skipped.status.success());
}

#[test]
fn no_input_file_is_an_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_dtc"))
        .output()
        .expect("dtc should run");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no input file provided"));
}

#[test]
fn version_is_printed() {
    let output = Command::new(env!("CARGO_BIN_EXE_dtc"))
        .arg("--version")
        .output()
        .expect("dtc should run");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("dtc "));
}
