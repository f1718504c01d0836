//! Integration tests for building forests from files on disk

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dtc_diagnostics::DiagnosticKind;
use dtc_forest::{BuildOptions, ForestBuilder, Node};
use indoc::indoc;

/// A scratch directory that is removed when dropped
struct Scratch(PathBuf);

impl Scratch {
    /// Create a fresh scratch directory unique to `name`
    fn new(name: &str) -> Self {
        let dir = env::temp_dir().join(format!("dtc_forest_{name}"));
        drop(fs::remove_dir_all(&dir));
        fs::create_dir_all(&dir).expect("scratch directory should be creatable");
        Self(dir)
    }

    /// Write `content` to `relative` below the scratch directory
    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.0.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent directory should be creatable");
        }
        fs::write(&path, content).expect("file should be writable");
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        drop(fs::remove_dir_all(&self.0));
    }
}

/// The file names of every unit in a forest, in load order
fn unit_names(sources: &[dtc_forest::SourceFile]) -> Vec<String> {
    sources
        .iter()
        .map(|source| {
            source
                .path()
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn imported_units_are_appended_after_the_entry() {
    let scratch = Scratch::new("appended");
    let entry = scratch.write(
        "main.py",
        indoc! {"
            import helpers
            from pkg.tools import run

            x = helpers.one()
        "},
    );
    scratch.write("helpers.py", "def one():\n    return 1\n");
    scratch.write("pkg/tools.py", "def run():\n    pass\n");

    let forest = ForestBuilder::new(BuildOptions::default())
        .build(&entry)
        .expect("forest should build");

    assert_eq!(unit_names(forest.sources()), vec!["main.py", "helpers.py", "tools.py"]);
    assert_eq!(forest.body().len(), 5);
    assert!(forest.index().function("one").is_some());
    assert!(forest.index().function("run").is_some());
}

#[test]
fn spans_keep_pointing_into_their_own_unit() {
    let scratch = Scratch::new("spans");
    let entry = scratch.write("main.py", "import other\n");
    scratch.write("other.py", "\n\ndef f(a):\n    return a\n");

    let forest = ForestBuilder::new(BuildOptions::default())
        .build(&entry)
        .expect("forest should build");

    let def = forest.body()[1].span();
    assert_eq!(def.source().index(), 1);
    assert_eq!(forest.line_of(def), Some(3));
}

#[test]
fn relative_from_imports_name_sibling_files() {
    let scratch = Scratch::new("relative");
    let entry = scratch.write("main.py", "from . import sibling\n");
    scratch.write("sibling.py", "y = 2\n");

    let forest = ForestBuilder::new(BuildOptions::default())
        .build(&entry)
        .expect("forest should build");

    assert_eq!(unit_names(forest.sources()), vec!["main.py", "sibling.py"]);
}

#[test]
fn import_cycles_terminate() {
    let scratch = Scratch::new("cycle");
    let entry = scratch.write("a.py", "import b\nx = 1\n");
    scratch.write("b.py", "import a\nimport b\ny = 2\n");

    let forest = ForestBuilder::new(BuildOptions::default())
        .build(&entry)
        .expect("forest should build");

    assert_eq!(unit_names(forest.sources()), vec!["a.py", "b.py"]);
    assert_eq!(forest.body().len(), 5);
}

#[test]
fn missing_imports_fail_by_default() {
    let scratch = Scratch::new("missing");
    let entry = scratch.write("main.py", "x = 1\nimport os\n");

    let mut builder = ForestBuilder::new(BuildOptions::default());
    let diagnostic = builder.build(&entry).expect_err("build should fail");

    assert!(matches!(
        diagnostic.kind(),
        DiagnosticKind::CannotReadFile { path, .. } if path.ends_with("os.py")
    ));
    // the error points at the import in the entry unit, which is retained
    let span = diagnostic.1.span();
    let source = builder
        .source(span.source())
        .expect("entry unit should be retained");
    assert_eq!(&source.content()[span.range()], "os");
    assert_eq!(source.line_of(span.start()), 2);
}

#[test]
fn missing_imports_can_be_skipped() {
    let scratch = Scratch::new("skipped");
    let entry = scratch.write("main.py", "import os\nimport sys, local\n");
    scratch.write("local.py", "z = 3\n");

    let forest = ForestBuilder::new(BuildOptions {
        skip_missing_imports: true,
    })
    .build(&entry)
    .expect("forest should build");

    assert_eq!(unit_names(forest.sources()), vec!["main.py", "local.py"]);
}

#[test]
fn syntax_errors_in_imported_units_name_that_unit() {
    let scratch = Scratch::new("syntax");
    let entry = scratch.write("main.py", "import broken\n");
    scratch.write("broken.py", "def f(:\n    pass\n");

    let mut builder = ForestBuilder::new(BuildOptions::default());
    let diagnostic = builder.build(&entry).expect_err("build should fail");

    let source = builder
        .source(diagnostic.1.span().source())
        .expect("broken unit should be retained");
    assert!(source.path().ends_with(Path::new("broken.py")));
}

#[test]
fn enclosing_functions_cross_unit_boundaries() {
    let scratch = Scratch::new("enclosing");
    let entry = scratch.write(
        "main.py",
        indoc! {"
            import lib

            def caller(v):
                return target(v)
        "},
    );
    scratch.write(
        "lib.py",
        indoc! {"
            def target(n):
                return n

            target(1)
        "},
    );

    let forest = ForestBuilder::new(BuildOptions::default())
        .build(&entry)
        .expect("forest should build");
    let index = forest.index();

    let calls = index.calls_to("target");
    let enclosing: Vec<_> = calls
        .iter()
        .map(|call| call.enclosing.map(|def| def.name.value().clone()))
        .collect();
    assert_eq!(enclosing, vec![None, Some("caller".to_string())]);

    let inner = calls[1].id;
    assert!(index
        .ancestors(inner)
        .any(|id| matches!(index.node(id), Node::Stmt(_))));
}

#[test]
fn builders_start_over_after_a_failed_build() {
    let scratch = Scratch::new("rebuild");
    let entry = scratch.write("main.py", "import first\nimport second\nx = 1\n");
    scratch.write("first.py", "def one():\n    return 1\n");
    scratch.write("second.py", "def two(:\n");

    let mut builder = ForestBuilder::new(BuildOptions::default());
    builder
        .build(&entry)
        .expect_err("second unit does not parse");

    scratch.write("second.py", "def two():\n    return 2\n");
    let forest = builder.build(&entry).expect("fixed program should build");

    assert_eq!(
        unit_names(forest.sources()),
        ["main.py", "first.py", "second.py"]
    );
    assert_eq!(forest.body().len(), 5);
    assert!(forest.index().function("one").is_some());
    assert!(builder.sources().is_empty());
}
