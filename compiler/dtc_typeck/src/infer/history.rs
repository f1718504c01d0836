//! Backward scans for the statement that explains a variable

use dtc_parser::ast::{
    expr::{Expr, ExprKind},
    stmt::{Stmt, StmtKind},
};
use dtc_utils::span::Span;

/// The statement a backward scan settled on
#[derive(Debug, Clone, Copy)]
pub enum Explanation<'f> {
    /// The name was last assigned this value
    Assigned(&'f Expr),
    /// The name is the target of a loop over a literal display
    LiteralLoop,
}

/// Determine if `stmt` may have run before the use at `at`
///
/// Statements of another unit always ran first: units are imported before any
/// of their names are used.
fn is_visible(stmt: &Stmt, at: Span) -> bool {
    stmt.span().source() != at.source() || stmt.span().start() <= at.start()
}

/// Determine if assigning to `target` binds `name`
fn binds(target: &Expr, name: &str) -> bool {
    match target.kind() {
        ExprKind::Name(target) => target == name,
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            items.iter().any(|item| binds(item, name))
        }
        ExprKind::Starred(inner) => binds(inner, name),
        _ => false,
    }
}

/// What `stmt` says about `name` when used at `at`, if anything
fn explain<'f>(stmt: &'f Stmt, name: &str, at: Span) -> Option<Explanation<'f>> {
    // the right-hand side runs before the name is bound
    if stmt.span().contains(at) && !matches!(stmt.kind(), StmtKind::For { .. }) {
        return None;
    }

    match stmt.kind() {
        StmtKind::Assign { targets, value }
            if targets.iter().any(|target| target.as_name() == Some(name)) =>
        {
            Some(Explanation::Assigned(value))
        }
        StmtKind::AnnAssign {
            target,
            value: Some(value),
            ..
        } if target.as_name() == Some(name) => Some(Explanation::Assigned(value)),
        StmtKind::For { target, iter, .. }
            if binds(target, name)
                && matches!(
                    iter.kind(),
                    ExprKind::List(_) | ExprKind::Tuple(_) | ExprKind::Set(_)
                ) =>
        {
            Some(Explanation::LiteralLoop)
        }
        _ => None,
    }
}

/// Scan `body` backwards from `at` for the last statement explaining `name`
///
/// Only the statements of `body` itself are considered, not those nested in
/// blocks.
pub fn scan<'f>(body: &'f [Stmt], name: &str, at: Span) -> Option<Explanation<'f>> {
    body.iter()
        .rev()
        .filter(|stmt| is_visible(stmt, at))
        .find_map(|stmt| explain(stmt, name, at))
}
