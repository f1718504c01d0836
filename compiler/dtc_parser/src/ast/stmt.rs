//! Statement representation for the Python AST
//!
//! The main thing within this module you will need is the [`Stmt`] struct and
//! its [`StmtKind`]. Some other structs exist to supplement it.


use derive_more::Display;
use dtc_utils::{
    code_fmt::{indent_lines, join_display},
    span::{Span, Spanned},
};

use super::{
    expr::{BinOp, Expr, Keyword},
    params::Parameters,
};

/// A Python statement
#[derive(PartialEq, Debug, Clone, Display)]
#[display("{_0}")]
pub struct Stmt(pub Spanned<StmtKind>);

impl Stmt {
    /// Obtain the [`StmtKind`] of this statement
    #[must_use]
    pub const fn kind(&self) -> &StmtKind {
        self.0.value()
    }

    /// Obtain the [`Span`] of this statement
    #[must_use]
    pub const fn span(&self) -> Span {
        self.0.span()
    }
}

/// A `def` statement
#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDef {
    /// The function's name
    pub name: Spanned<String>,
    /// The declared parameters
    pub params: Parameters,
    /// The return annotation, if present
    pub returns: Option<Expr>,
    /// The statements of the body
    pub body: Vec<Stmt>,
    /// Decorators, outermost first
    pub decorators: Vec<Expr>,
    /// Whether this is an `async def`
    pub is_async: bool,
}

/// A `class` statement
#[derive(PartialEq, Debug, Clone)]
pub struct ClassDef {
    /// The class's name
    pub name: Spanned<String>,
    /// Base class expressions
    pub bases: Vec<Expr>,
    /// Keyword arguments such as `metaclass=...`
    pub keywords: Vec<Keyword>,
    /// The statements of the body
    pub body: Vec<Stmt>,
    /// Decorators, outermost first
    pub decorators: Vec<Expr>,
}

/// An imported name, e.g. `os.path as p`
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Alias {
    /// The (possibly dotted) imported name, or `*`
    pub name: Spanned<String>,
    /// The local name it is bound to, if renamed
    pub asname: Option<Spanned<String>>,
}
impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.asname {
            Some(asname) => write!(f, "{} as {asname}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One context manager of a `with` statement
#[derive(PartialEq, Debug, Clone)]
pub struct WithItem {
    /// The context manager expression
    pub context: Expr,
    /// The `as` target, if present
    pub vars: Option<Expr>,
}
impl Display for WithItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.vars {
            Some(vars) => write!(f, "{} as {vars}", self.context),
            None => write!(f, "{}", self.context),
        }
    }
}

/// An `except` clause
#[derive(PartialEq, Debug, Clone)]
pub struct ExceptHandler {
    /// The exception type expression, absent for a bare `except:`
    pub ty: Option<Expr>,
    /// The name bound with `as`
    pub name: Option<Spanned<String>>,
    /// The statements of the clause
    pub body: Vec<Stmt>,
}

/// The enum representing all the different kinds of statements in Python
#[derive(PartialEq, Debug, Clone)]
pub enum StmtKind {
    /// `def name(params) -> returns: body`
    FunctionDef(FunctionDef),
    /// `class Name(bases): body`
    ClassDef(ClassDef),
    /// `return` or `return value`
    Return(Option<Expr>),
    /// `del a, b`
    Delete(Vec<Expr>),
    /// `a = b = value`
    Assign {
        /// Every target, left to right
        targets: Vec<Expr>,
        /// The assigned value
        value: Expr,
    },
    /// `target += value`
    AugAssign {
        /// The updated target
        target: Expr,
        /// The operator
        op: BinOp,
        /// The right hand side
        value: Expr,
    },
    /// `target: annotation = value`
    AnnAssign {
        /// The annotated target
        target: Expr,
        /// The annotation
        annotation: Expr,
        /// The assigned value, if any
        value: Option<Expr>,
    },
    /// `for target in iter: body else: orelse`
    For {
        /// The loop target
        target: Expr,
        /// The iterable
        iter: Expr,
        /// The loop body
        body: Vec<Stmt>,
        /// The `else` clause
        orelse: Vec<Stmt>,
        /// Whether this is an `async for`
        is_async: bool,
    },
    /// `while test: body else: orelse`
    While {
        /// The loop condition
        test: Expr,
        /// The loop body
        body: Vec<Stmt>,
        /// The `else` clause
        orelse: Vec<Stmt>,
    },
    /// `if test: body else: orelse`. An `elif` is an [`StmtKind::If`] alone
    /// in `orelse`.
    If {
        /// The condition
        test: Expr,
        /// The statements run when the condition holds
        body: Vec<Stmt>,
        /// The `elif`/`else` statements
        orelse: Vec<Stmt>,
    },
    /// `with a as b, c: body`
    With {
        /// The context managers
        items: Vec<WithItem>,
        /// The body
        body: Vec<Stmt>,
        /// Whether this is an `async with`
        is_async: bool,
    },
    /// `raise`, `raise exc` or `raise exc from cause`
    Raise {
        /// The raised exception
        exc: Option<Expr>,
        /// The chained cause
        cause: Option<Expr>,
    },
    /// `try: body except: handlers else: orelse finally: finalbody`
    Try {
        /// The guarded statements
        body: Vec<Stmt>,
        /// The `except` clauses
        handlers: Vec<Spanned<ExceptHandler>>,
        /// The `else` clause
        orelse: Vec<Stmt>,
        /// The `finally` clause
        finalbody: Vec<Stmt>,
    },
    /// `assert test, msg`
    Assert {
        /// The asserted condition
        test: Expr,
        /// The message
        msg: Option<Expr>,
    },
    /// `import a.b as c, d`
    Import(Vec<Alias>),
    /// `from ..module import a as b`
    ImportFrom {
        /// The module path after the leading dots, if any
        module: Option<Spanned<String>>,
        /// The imported names
        names: Vec<Alias>,
        /// How many leading dots the module path had
        level: usize,
    },
    /// `global a, b`
    Global(Vec<Spanned<String>>),
    /// `nonlocal a, b`
    Nonlocal(Vec<Spanned<String>>),
    /// An expression evaluated for its effect
    Expr(Expr),
    /// `pass`
    Pass,
    /// `break`
    Break,
    /// `continue`
    Continue,
}

/// Print a block of statements under a header line
fn block(header: &str, body: &[Stmt]) -> String {
    format!(
        "{header}:\n{}",
        indent_lines(&join_display(body, "\n"), "    ")
    )
}

/// Print decorators, one per line, ahead of a definition
fn decorated(decorators: &[Expr], definition: String) -> String {
    decorators
        .iter()
        .map(|decorator| format!("@{decorator}\n"))
        .chain(std::iter::once(definition))
        .collect()
}

impl Display for StmtKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FunctionDef(def) => {
                let header = format!(
                    "{}def {}({}){}",
                    if def.is_async { "async " } else { "" },
                    def.name,
                    def.params,
                    def.returns
                        .as_ref()
                        .map_or_else(String::new, |returns| format!(" -> {returns}"))
                );
                write!(f, "{}", decorated(&def.decorators, block(&header, &def.body)))
            }
            Self::ClassDef(class) => {
                let arguments = join_display(
                    class
                        .bases
                        .iter()
                        .map(ToString::to_string)
                        .chain(class.keywords.iter().map(ToString::to_string)),
                    ", ",
                );
                let header = if arguments.is_empty() {
                    format!("class {}", class.name)
                } else {
                    format!("class {}({arguments})", class.name)
                };
                write!(f, "{}", decorated(&class.decorators, block(&header, &class.body)))
            }
            Self::Return(None) => write!(f, "return"),
            Self::Return(Some(value)) => write!(f, "return {value}"),
            Self::Delete(targets) => write!(f, "del {}", join_display(targets, ", ")),
            Self::Assign { targets, value } => {
                for target in targets {
                    write!(f, "{target} = ")?;
                }
                write!(f, "{value}")
            }
            Self::AugAssign { target, op, value } => write!(f, "{target} {op}= {value}"),
            Self::AnnAssign {
                target,
                annotation,
                value: None,
            } => write!(f, "{target}: {annotation}"),
            Self::AnnAssign {
                target,
                annotation,
                value: Some(value),
            } => write!(f, "{target}: {annotation} = {value}"),
            Self::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            } => {
                let prefix = if *is_async { "async " } else { "" };
                write!(f, "{}", block(&format!("{prefix}for {target} in {iter}"), body))?;
                if !orelse.is_empty() {
                    write!(f, "\n{}", block("else", orelse))?;
                }
                Ok(())
            }
            Self::While { test, body, orelse } => {
                write!(f, "{}", block(&format!("while {test}"), body))?;
                if !orelse.is_empty() {
                    write!(f, "\n{}", block("else", orelse))?;
                }
                Ok(())
            }
            Self::If { test, body, orelse } => {
                write!(f, "{}", block(&format!("if {test}"), body))?;
                match orelse.as_slice() {
                    [] => Ok(()),
                    [Stmt(elif)] if matches!(elif.value(), Self::If { .. }) => {
                        write!(f, "\nel{elif}")
                    }
                    _ => write!(f, "\n{}", block("else", orelse)),
                }
            }
            Self::With {
                items,
                body,
                is_async,
            } => {
                let prefix = if *is_async { "async " } else { "" };
                write!(
                    f,
                    "{}",
                    block(&format!("{prefix}with {}", join_display(items, ", ")), body)
                )
            }
            Self::Raise { exc: None, .. } => write!(f, "raise"),
            Self::Raise {
                exc: Some(exc),
                cause: None,
            } => write!(f, "raise {exc}"),
            Self::Raise {
                exc: Some(exc),
                cause: Some(cause),
            } => write!(f, "raise {exc} from {cause}"),
            Self::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                write!(f, "{}", block("try", body))?;
                for handler in handlers {
                    let handler = handler.value();
                    let header = match (&handler.ty, &handler.name) {
                        (None, _) => "except".to_string(),
                        (Some(ty), None) => format!("except {ty}"),
                        (Some(ty), Some(name)) => format!("except {ty} as {name}"),
                    };
                    write!(f, "\n{}", block(&header, &handler.body))?;
                }
                if !orelse.is_empty() {
                    write!(f, "\n{}", block("else", orelse))?;
                }
                if !finalbody.is_empty() {
                    write!(f, "\n{}", block("finally", finalbody))?;
                }
                Ok(())
            }
            Self::Assert { test, msg: None } => write!(f, "assert {test}"),
            Self::Assert {
                test,
                msg: Some(msg),
            } => write!(f, "assert {test}, {msg}"),
            Self::Import(names) => write!(f, "import {}", join_display(names, ", ")),
            Self::ImportFrom {
                module,
                names,
                level,
            } => write!(
                f,
                "from {}{} import {}",
                ".".repeat(*level),
                module.as_ref().map_or_else(String::new, ToString::to_string),
                join_display(names, ", ")
            ),
            Self::Global(names) => write!(f, "global {}", join_display(names, ", ")),
            Self::Nonlocal(names) => write!(f, "nonlocal {}", join_display(names, ", ")),
            Self::Expr(expr) => write!(f, "{expr}"),
            Self::Pass => write!(f, "pass"),
            Self::Break => write!(f, "break"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

#[cfg(test)]
mod tests {
    use dtc_utils::span::SourceId;
    use indoc::indoc;

    use crate::parser::parse_program;

    /// Parse a program and print it back
    fn reprint(input: &str) -> String {
        parse_program(input, SourceId::new(0))
            .expect("test case should have parsed correctly")
            .to_string()
    }

    #[test]
    fn compound_statements_reprint_with_indentation() {
        let input = indoc! {"
            @decorator
            def fun2(y, z=1) -> None:
                if y:
                    return
                elif z:
                    pass
                else:
                    y += 1
                for i in [1, 2]:
                    print(i)
        "};

        let expected = indoc! {"
            @decorator
            def fun2(y, z=1) -> None:
                if y:
                    return
                elif z:
                    pass
                else:
                    y += 1
                for i in [1, 2]:
                    print(i)"};

        assert_eq!(reprint(input), expected);
    }

    #[test]
    fn class_and_try_reprint() {
        let input = indoc! {"
            class B(A, metaclass=M):
                x: int = 3
            try:
                import os.path as p
            except ValueError as e:
                raise RuntimeError() from e
            finally:
                del p
        "};

        let expected = indoc! {"
            class B(A, metaclass=M):
                x: int = 3
            try:
                import os.path as p
            except ValueError as e:
                raise RuntimeError() from e
            finally:
                del p"};

        assert_eq!(reprint(input), expected);
    }

    #[test]
    fn simple_statements_reprint() {
        assert_eq!(reprint("a = b = 1\n"), "a = b = 1");
        assert_eq!(reprint("from ..pkg.mod import x as y, z\n"), "from ..pkg.mod import x as y, z");
        assert_eq!(reprint("from . import helper\n"), "from . import helper");
        assert_eq!(reprint("global a, b\n"), "global a, b");
        assert_eq!(reprint("assert x, 'msg'\n"), "assert x, 'msg'");
    }
}
