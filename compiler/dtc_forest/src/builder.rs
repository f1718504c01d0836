//! Loading the entry unit and inlining its local imports
//!
//! Imports are resolved against the entry unit's directory only: `import a.b`
//! names `a/b.py`, `from m import x` names `m.py`, and `from . import x`
//! names `x.py`. Each unit is inlined at most once, keyed by its canonical
//! path, so import cycles terminate. Units are appended in the order their
//! imports are discovered.

use std::{
    collections::{HashSet, VecDeque},
    fs, io,
    path::{Path, PathBuf},
};

use dtc_diagnostics::{Diagnostic, DiagnosticKind, SpanExt};
use dtc_parser::{
    ast::stmt::{Stmt, StmtKind},
    parser::parse_program,
};
use dtc_utils::span::{SourceId, Span};
use log::debug;

use crate::{Forest, SourceFile};

/// Options controlling how a forest is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    /// Skip imports that have no sibling source file (such as standard
    /// library modules) instead of failing the build
    pub skip_missing_imports: bool,
}

/// An import found in a unit, waiting to be resolved
#[derive(Debug)]
struct PendingImport {
    /// The path of the unit it names
    path: PathBuf,
    /// The span of the import in the importing unit
    span: Span,
}

/// Builds a [`Forest`] from an entry unit on disk
///
/// When a build fails, the builder keeps every unit it managed to load so that
/// the failure can be printed against its source. A successful build moves
/// the units into the [`Forest`].
#[derive(Debug, Default)]
pub struct ForestBuilder {
    /// How to treat missing imports
    options: BuildOptions,
    /// Every unit loaded so far, indexed by [`SourceId`]
    sources: Vec<SourceFile>,
    /// Canonical paths of every unit loaded so far
    loaded: HashSet<PathBuf>,
}

impl ForestBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Every unit loaded so far
    #[must_use]
    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    /// Look up a unit loaded so far
    #[must_use]
    pub fn source(&self, id: SourceId) -> Option<&SourceFile> {
        self.sources.get(id.index())
    }

    /// Load `entry` and every unit it transitively imports
    ///
    /// # Errors
    /// Returns a [`Diagnostic`] if a unit cannot be read or does not parse.
    /// An import with no matching file is an error unless
    /// [`BuildOptions::skip_missing_imports`] is set.
    pub fn build(&mut self, entry: &Path) -> Result<Forest, Diagnostic> {
        let body = self.build_body(entry)?;
        Ok(Forest::new(std::mem::take(&mut self.sources), body))
    }

    /// Load every unit, returning the merged statement list
    fn build_body(&mut self, entry: &Path) -> Result<Vec<Stmt>, Diagnostic> {
        // a failed build leaves its units behind
        self.sources.clear();
        self.loaded.clear();

        let entry_dir = entry
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let content = fs::read_to_string(entry).map_err(|err| {
            DiagnosticKind::CannotReadFile {
                path: entry.display().to_string(),
                error: err.to_string(),
            }
            .detached_error()
        })?;
        self.mark_loaded(entry, Span::detached())?;
        let mut body = self.parse_unit(entry.to_path_buf(), content)?;

        let mut scanned = 0;
        let mut queue: VecDeque<PendingImport> = VecDeque::new();
        loop {
            // scan every statement appended since the last pass
            for stmt in &body[scanned..] {
                collect_imports(stmt, &entry_dir, &mut queue);
            }
            scanned = body.len();

            let Some(import) = queue.pop_front() else {
                break;
            };
            if let Some(stmts) = self.load_import(&import)? {
                body.extend(stmts);
            }
        }

        Ok(body)
    }

    /// Record `path` as loaded, returning `false` if it already was
    fn mark_loaded(&mut self, path: &Path, span: Span) -> Result<bool, Diagnostic> {
        let canonical = path.canonicalize().map_err(|err| {
            span.error(DiagnosticKind::CannotReadFile {
                path: path.display().to_string(),
                error: err.to_string(),
            })
        })?;
        Ok(self.loaded.insert(canonical))
    }

    /// Register `content` as a new unit and parse it
    fn parse_unit(&mut self, path: PathBuf, content: String) -> Result<Vec<Stmt>, Diagnostic> {
        let id = SourceId::new(self.sources.len());
        debug!("loaded {} as unit {id}", path.display());

        let source = SourceFile::new(id, path, content);
        let program = parse_program(source.content(), id);
        self.sources.push(source);

        Ok(program?.0)
    }

    /// Load the unit an import names, unless it is missing and may be skipped
    /// or has been loaded already
    fn load_import(&mut self, import: &PendingImport) -> Result<Option<Vec<Stmt>>, Diagnostic> {
        let content = match fs::read_to_string(&import.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound && self.options.skip_missing_imports => {
                debug!("skipping import of missing {}", import.path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(import.span.error(DiagnosticKind::CannotReadFile {
                    path: import.path.display().to_string(),
                    error: err.to_string(),
                }));
            }
        };

        if !self.mark_loaded(&import.path, import.span)? {
            debug!("{} is already part of the forest", import.path.display());
            return Ok(None);
        }

        self.parse_unit(import.path.clone(), content).map(Some)
    }
}

/// Turn a dotted module name into a path below `dir`
fn module_path(dir: &Path, module: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    for part in module.split('.') {
        path.push(part);
    }
    path.set_extension("py");
    path
}

/// Queue every import found anywhere inside `stmt`
fn collect_imports(stmt: &Stmt, dir: &Path, queue: &mut VecDeque<PendingImport>) {
    match stmt.kind() {
        StmtKind::Import(names) => {
            for alias in names {
                queue.push_back(PendingImport {
                    path: module_path(dir, alias.name.value()),
                    span: alias.name.span(),
                });
            }
        }
        StmtKind::ImportFrom {
            module: Some(module),
            ..
        } => queue.push_back(PendingImport {
            path: module_path(dir, module.value()),
            span: module.span(),
        }),
        StmtKind::ImportFrom {
            module: None,
            names,
            ..
        } => {
            for alias in names.iter().filter(|alias| alias.name.value() != "*") {
                queue.push_back(PendingImport {
                    path: module_path(dir, alias.name.value()),
                    span: alias.name.span(),
                });
            }
        }
        StmtKind::FunctionDef(def) => collect_all(&def.body, dir, queue),
        StmtKind::ClassDef(class) => collect_all(&class.body, dir, queue),
        StmtKind::For { body, orelse, .. }
        | StmtKind::While { body, orelse, .. }
        | StmtKind::If { body, orelse, .. } => {
            collect_all(body, dir, queue);
            collect_all(orelse, dir, queue);
        }
        StmtKind::With { body, .. } => collect_all(body, dir, queue),
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            collect_all(body, dir, queue);
            for handler in handlers {
                collect_all(&handler.value().body, dir, queue);
            }
            collect_all(orelse, dir, queue);
            collect_all(finalbody, dir, queue);
        }
        _ => {}
    }
}

/// Queue every import found inside `stmts`
fn collect_all(stmts: &[Stmt], dir: &Path, queue: &mut VecDeque<PendingImport>) {
    for stmt in stmts {
        collect_imports(stmt, dir, queue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_modules_become_nested_paths() {
        assert_eq!(
            module_path(Path::new("proj"), "pkg.helpers"),
            Path::new("proj").join("pkg").join("helpers.py")
        );
        assert_eq!(
            module_path(Path::new("proj"), "util"),
            Path::new("proj").join("util.py")
        );
    }

    #[test]
    fn imports_inside_blocks_are_collected() {
        let program = parse_program(
            "def f():\n    import a\ntry:\n    from b import c\nexcept ImportError:\n    from . import d, e\n",
            SourceId::new(0),
        )
        .expect("test case should have parsed correctly");

        let mut queue = VecDeque::new();
        collect_all(&program.0, Path::new("root"), &mut queue);

        let paths: Vec<_> = queue.into_iter().map(|import| import.path).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("root").join("a.py"),
                Path::new("root").join("b.py"),
                Path::new("root").join("d.py"),
                Path::new("root").join("e.py"),
            ]
        );
    }

    #[test]
    fn missing_entry_is_a_detached_error() {
        let mut builder = ForestBuilder::new(BuildOptions::default());
        let diagnostic = builder
            .build(Path::new("/definitely/not/here/main.py"))
            .expect_err("building should fail");

        assert!(matches!(
            diagnostic.kind(),
            DiagnosticKind::CannotReadFile { .. }
        ));
        assert!(diagnostic.1.span().source().is_detached());
        assert!(builder.sources().is_empty());
    }
}
