//! The parent table of a forest
//!
//! Syntax nodes never point at their parents. Instead, [`ForestIndex`] walks
//! the forest once, breadth first, and records the parent of every statement
//! and expression it meets. The walk visits children in the order their
//! fields appear in the node, so "first in walk order" means the same thing
//! everywhere in the checker.
//!
//! Statements that have no node of their own (such as the parameters of a
//! `def`, an `except` clause or a comprehension clause) contribute their
//! expressions and statements directly to the enclosing node.

use std::collections::VecDeque;

use dtc_parser::ast::{
    expr::{DictItem, Expr, ExprKind, Keyword},
    stmt::{ClassDef, FunctionDef, Stmt, StmtKind},
};
use dtc_utils::span::Span;

/// Identifies a node by its position in walk order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A statement or expression of the forest
#[derive(Debug, Clone, Copy)]
pub enum Node<'f> {
    /// A statement
    Stmt(&'f Stmt),
    /// An expression
    Expr(&'f Expr),
}

impl<'f> Node<'f> {
    /// The span of the node
    #[must_use]
    pub const fn span(self) -> Span {
        match self {
            Self::Stmt(stmt) => stmt.span(),
            Self::Expr(expr) => expr.span(),
        }
    }

    /// The direct children of the node, in field order
    #[must_use]
    pub fn children(self) -> Vec<Self> {
        let mut out = Vec::new();
        match self {
            Self::Stmt(stmt) => stmt_children(stmt, &mut out),
            Self::Expr(expr) => expr_children(expr, &mut out),
        }
        out
    }
}

/// Push expressions onto a child list
fn push_exprs<'f>(out: &mut Vec<Node<'f>>, exprs: impl IntoIterator<Item = &'f Expr>) {
    out.extend(exprs.into_iter().map(Node::Expr));
}

/// Push statements onto a child list
fn push_stmts<'f>(out: &mut Vec<Node<'f>>, stmts: &'f [Stmt]) {
    out.extend(stmts.iter().map(Node::Stmt));
}

/// Push the values of keyword arguments onto a child list
fn push_keywords<'f>(out: &mut Vec<Node<'f>>, keywords: &'f [Keyword]) {
    push_exprs(out, keywords.iter().map(|keyword| &keyword.value));
}

/// Collect the children of a statement
fn stmt_children<'f>(stmt: &'f Stmt, out: &mut Vec<Node<'f>>) {
    match stmt.kind() {
        StmtKind::FunctionDef(def) => {
            for param in def.params.iter() {
                push_exprs(out, &param.annotation);
            }
            push_exprs(out, def.params.iter().filter_map(|param| param.default.as_ref()));
            push_stmts(out, &def.body);
            push_exprs(out, &def.decorators);
            push_exprs(out, &def.returns);
        }
        StmtKind::ClassDef(class) => {
            push_exprs(out, &class.bases);
            push_keywords(out, &class.keywords);
            push_stmts(out, &class.body);
            push_exprs(out, &class.decorators);
        }
        StmtKind::Return(value) => push_exprs(out, value),
        StmtKind::Delete(targets) => push_exprs(out, targets),
        StmtKind::Assign { targets, value } => {
            push_exprs(out, targets);
            out.push(Node::Expr(value));
        }
        StmtKind::AugAssign { target, value, .. } => push_exprs(out, [target, value]),
        StmtKind::AnnAssign {
            target,
            annotation,
            value,
        } => {
            push_exprs(out, [target, annotation]);
            push_exprs(out, value);
        }
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
            ..
        } => {
            push_exprs(out, [target, iter]);
            push_stmts(out, body);
            push_stmts(out, orelse);
        }
        StmtKind::While { test, body, orelse } | StmtKind::If { test, body, orelse } => {
            out.push(Node::Expr(test));
            push_stmts(out, body);
            push_stmts(out, orelse);
        }
        StmtKind::With { items, body, .. } => {
            for item in items {
                out.push(Node::Expr(&item.context));
                push_exprs(out, &item.vars);
            }
            push_stmts(out, body);
        }
        StmtKind::Raise { exc, cause } => {
            push_exprs(out, exc);
            push_exprs(out, cause);
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            push_stmts(out, body);
            for handler in handlers {
                push_exprs(out, &handler.value().ty);
                push_stmts(out, &handler.value().body);
            }
            push_stmts(out, orelse);
            push_stmts(out, finalbody);
        }
        StmtKind::Assert { test, msg } => {
            out.push(Node::Expr(test));
            push_exprs(out, msg);
        }
        StmtKind::Expr(value) => out.push(Node::Expr(value)),
        StmtKind::Import(_)
        | StmtKind::ImportFrom { .. }
        | StmtKind::Global(_)
        | StmtKind::Nonlocal(_)
        | StmtKind::Pass
        | StmtKind::Break
        | StmtKind::Continue => {}
    }
}

/// Collect the children of an expression
fn expr_children<'f>(expr: &'f Expr, out: &mut Vec<Node<'f>>) {
    match expr.kind() {
        ExprKind::Constant(_) | ExprKind::Name(_) => {}
        ExprKind::List(items) | ExprKind::Tuple(items) | ExprKind::Set(items) => {
            push_exprs(out, items);
        }
        ExprKind::Dict(items) => {
            push_exprs(
                out,
                items.iter().filter_map(|item| match item {
                    DictItem::Pair(key, _) => Some(key),
                    DictItem::Unpack(_) => None,
                }),
            );
            push_exprs(
                out,
                items.iter().map(|item| match item {
                    DictItem::Pair(_, value) | DictItem::Unpack(value) => value,
                }),
            );
        }
        ExprKind::ListComp(elt, generators)
        | ExprKind::SetComp(elt, generators)
        | ExprKind::GeneratorExp(elt, generators) => {
            out.push(Node::Expr(elt));
            for generator in generators {
                push_exprs(out, [&generator.target, &generator.iter]);
                push_exprs(out, &generator.ifs);
            }
        }
        ExprKind::DictComp(key, value, generators) => {
            push_exprs(out, [&**key, &**value]);
            for generator in generators {
                push_exprs(out, [&generator.target, &generator.iter]);
                push_exprs(out, &generator.ifs);
            }
        }
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            out.push(Node::Expr(func));
            push_exprs(out, args);
            push_keywords(out, keywords);
        }
        ExprKind::Attribute(value, _)
        | ExprKind::UnaryOp(_, value)
        | ExprKind::Starred(value)
        | ExprKind::YieldFrom(value)
        | ExprKind::Await(value) => out.push(Node::Expr(value)),
        ExprKind::Subscript(value, index) => push_exprs(out, [&**value, &**index]),
        ExprKind::Slice { lower, upper, step } => {
            push_exprs(out, lower.as_deref());
            push_exprs(out, upper.as_deref());
            push_exprs(out, step.as_deref());
        }
        ExprKind::BinOp(lhs, _, rhs) => push_exprs(out, [&**lhs, &**rhs]),
        ExprKind::BoolOp(_, values) => push_exprs(out, values),
        ExprKind::Compare(left, comparisons) => {
            out.push(Node::Expr(left));
            push_exprs(out, comparisons.iter().map(|(_, right)| right));
        }
        ExprKind::IfExp { test, body, orelse } => {
            push_exprs(out, [&**test, &**body, &**orelse]);
        }
        ExprKind::Lambda(params, body) => {
            push_exprs(out, params.iter().filter_map(|param| param.default.as_ref()));
            out.push(Node::Expr(body));
        }
        ExprKind::Yield(value) => push_exprs(out, value.as_deref()),
        ExprKind::NamedExpr(target, value) => push_exprs(out, [&**target, &**value]),
    }
}

/// A call of a function by its plain name
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'f> {
    /// The call expression's node
    pub id: NodeId,
    /// The call expression
    pub call: &'f Expr,
    /// The positional arguments
    pub args: &'f [Expr],
    /// The keyword arguments
    pub keywords: &'f [Keyword],
    /// The function the call appears in, or [`None`] at module scope
    pub enclosing: Option<&'f FunctionDef>,
}

/// Read-only parent table over a forest, built by a breadth-first walk
#[derive(Debug, Clone)]
pub struct ForestIndex<'f> {
    /// Every node, in walk order
    nodes: Vec<Node<'f>>,
    /// The parent of every node. Top-level statements have none.
    parents: Vec<Option<NodeId>>,
}

impl<'f> ForestIndex<'f> {
    /// Walk `body` and record the parent of every node
    #[must_use]
    pub fn new(body: &'f [Stmt]) -> Self {
        let mut nodes = Vec::new();
        let mut parents = Vec::new();

        let mut queue: VecDeque<(Node<'f>, Option<NodeId>)> =
            body.iter().map(|stmt| (Node::Stmt(stmt), None)).collect();
        while let Some((node, parent)) = queue.pop_front() {
            let id = NodeId(nodes.len());
            nodes.push(node);
            parents.push(parent);
            queue.extend(node.children().into_iter().map(|child| (child, Some(id))));
        }

        Self { nodes, parents }
    }

    /// Every node with its id, in walk order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Node<'f>)> + '_ {
        self.nodes
            .iter()
            .copied()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// The node with id `id`
    ///
    /// # Panics
    /// Panics if `id` was not produced by this index.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Node<'f> {
        self.nodes[id.0]
    }

    /// The parent of `id`, or [`None`] for a top-level statement
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.0).copied().flatten()
    }

    /// Every ancestor of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&ancestor| self.parent(ancestor))
    }

    /// The nearest function definition containing `id`
    #[must_use]
    pub fn enclosing_function(&self, id: NodeId) -> Option<&'f FunctionDef> {
        self.ancestors(id).find_map(|ancestor| match self.node(ancestor) {
            Node::Stmt(stmt) => match stmt.kind() {
                StmtKind::FunctionDef(def) => Some(def),
                _ => None,
            },
            Node::Expr(_) => None,
        })
    }

    /// The function the definition `def` is nested in, or [`None`] if it is
    /// defined at module scope or is not part of this forest
    #[must_use]
    pub fn scope_of(&self, def: &FunctionDef) -> Option<&'f FunctionDef> {
        let (id, _) = self.nodes().find(|(_, node)| match node {
            Node::Stmt(stmt) => {
                matches!(stmt.kind(), StmtKind::FunctionDef(candidate) if std::ptr::eq(candidate, def))
            }
            Node::Expr(_) => false,
        })?;
        self.enclosing_function(id)
    }

    /// The first function definition called `name`, in walk order
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&'f FunctionDef> {
        self.nodes.iter().find_map(|node| match node {
            Node::Stmt(stmt) => match stmt.kind() {
                StmtKind::FunctionDef(def) if def.name.value() == name => Some(def),
                _ => None,
            },
            Node::Expr(_) => None,
        })
    }

    /// The first class definition called `name`, in walk order
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&'f ClassDef> {
        self.nodes.iter().find_map(|node| match node {
            Node::Stmt(stmt) => match stmt.kind() {
                StmtKind::ClassDef(class) if class.name.value() == name => Some(class),
                _ => None,
            },
            Node::Expr(_) => None,
        })
    }

    /// Every call of `name` by its plain name, in walk order
    ///
    /// Calls through an attribute (`obj.name(...)`) are not included.
    #[must_use]
    pub fn calls_to(&self, name: &str) -> Vec<CallSite<'f>> {
        self.nodes()
            .filter_map(|(id, node)| {
                let Node::Expr(expr) = node else {
                    return None;
                };
                let ExprKind::Call {
                    func,
                    args,
                    keywords,
                } = expr.kind()
                else {
                    return None;
                };

                (func.as_name() == Some(name)).then(|| CallSite {
                    id,
                    call: expr,
                    args,
                    keywords,
                    enclosing: self.enclosing_function(id),
                })
            })
            .collect()
    }
}
