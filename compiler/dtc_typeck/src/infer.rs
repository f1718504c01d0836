//! Static inference of the types an expression may hold
//!
//! [`InferenceEngine`] answers two questions: which types an expression may
//! evaluate to at its position in the program, and which types a function may
//! return. Both are answered by walking the forest, never by running it.
//!
//! Names are resolved by a backward scan of the enclosing function, then from
//! the arguments every caller passes, then by a backward scan of the module.
//! Answers flow through function boundaries, so a query can lead back to
//! itself; see [`InferenceEngine`] for how that terminates.

mod history;
mod params;

use std::fmt::Display;

use dtc_diagnostics::{Diagnostic, DiagnosticKind, SpanExt};
use dtc_forest::{Forest, ForestIndex};
use dtc_parser::ast::{
    expr::{Constant, Expr, ExprKind, UnaryOp},
    params::ParameterKind,
    stmt::{FunctionDef, Stmt, StmtKind},
};
use dtc_utils::span::Span;
use log::trace;

pub(crate) use self::params::explicit_arguments;
use self::{
    history::Explanation,
    params::{bind, Binding},
};
use crate::ty::{TypeName, TypeSet};

/// A question whose answer depends on other parts of the program
#[derive(Debug, Clone, PartialEq, Eq)]
enum Query {
    /// The return types of a function
    Returns(String),
    /// The types a parameter receives from every caller
    Param {
        /// The function declaring the parameter
        function: String,
        /// The parameter
        param: String,
    },
    /// The types of a variable at one use
    Name {
        /// The variable
        name: String,
        /// Where it is used
        at: Span,
    },
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Returns(function) => write!(f, "{function}"),
            Self::Param { function, param } => write!(f, "{function}({param})"),
            Self::Name { name, .. } => write!(f, "{name}"),
        }
    }
}

/// Infers type sets over one forest
///
/// The engine keeps a stack of the queries in progress. A query that is asked
/// again while it is still in progress contributes nothing, so the answer to a
/// cyclic question is the union of its non-cyclic paths. If an outermost
/// query comes out empty, every path was cyclic and the query fails with
/// [`DiagnosticKind::InferenceCycle`].
#[derive(Debug)]
pub struct InferenceEngine<'f> {
    /// The parent table of the forest
    index: ForestIndex<'f>,
    /// The top-level statements of the forest
    module: &'f [Stmt],
    /// Queries in progress, outermost first
    in_progress: Vec<Query>,
    /// The most recent cycle that was cut short
    last_cycle: Option<Vec<String>>,
}

impl<'f> InferenceEngine<'f> {
    /// Create an engine over `forest`
    #[must_use]
    pub fn new(forest: &'f Forest) -> Self {
        Self {
            index: forest.index(),
            module: forest.body(),
            in_progress: Vec::new(),
            last_cycle: None,
        }
    }

    /// The parent table this engine walks
    #[must_use]
    pub const fn index(&self) -> &ForestIndex<'f> {
        &self.index
    }

    /// Infer the types `expr` may hold, where `scope` is the function the
    /// expression appears in or [`None`] at module scope
    ///
    /// # Errors
    /// Fails if some part of the expression cannot be inferred.
    pub fn infer(
        &mut self,
        expr: &'f Expr,
        scope: Option<&'f FunctionDef>,
    ) -> Result<TypeSet, Diagnostic> {
        trace!("inferring `{expr}`");
        match expr.kind() {
            ExprKind::Constant(constant) => Ok(TypeSet::single(constant.into())),
            ExprKind::List(_) | ExprKind::ListComp(..) => Ok(TypeSet::single(TypeName::List)),
            ExprKind::Tuple(_) => Ok(TypeSet::single(TypeName::Tuple)),
            ExprKind::Set(_) | ExprKind::SetComp(..) => Ok(TypeSet::single(TypeName::Set)),
            ExprKind::Dict(_) | ExprKind::DictComp(..) => Ok(TypeSet::single(TypeName::Dict)),
            ExprKind::UnaryOp(UnaryOp::UAdd | UnaryOp::USub, operand)
                if matches!(
                    operand.kind(),
                    ExprKind::Constant(Constant::Int(_) | Constant::Float(_) | Constant::Complex(_))
                ) =>
            {
                self.infer(operand, scope)
            }
            ExprKind::Name(name) => self.infer_name(name, expr.span(), scope),
            ExprKind::Call { func, .. } => match func.as_name() {
                Some(callee) => self.return_types(callee, expr.span()),
                None => Err(expr
                    .span()
                    .error(DiagnosticKind::UnsupportedCall(func.to_string()))),
            },
            _ => Err(expr
                .span()
                .error(DiagnosticKind::UnsupportedExpression(expr.to_string()))),
        }
    }

    /// Infer the types calling `name` may produce
    ///
    /// A function definition is preferred over a class of the same name; a
    /// class produces its own name and a built-in constructor its own type.
    /// `span` is where the call was made, for diagnostics.
    ///
    /// # Errors
    /// Fails if no such callable exists or one of its returns cannot be
    /// inferred.
    pub fn return_types(&mut self, name: &str, span: Span) -> Result<TypeSet, Diagnostic> {
        if let Some(def) = self.index.function(name) {
            return self.query(Query::Returns(name.to_string()), span, |engine| {
                engine.function_returns(def)
            });
        }
        if let Some(class) = self.index.class(name) {
            return Ok(TypeSet::single(TypeName::Named(class.name.value().clone())));
        }
        if let Some(ty) = TypeName::constructor(name) {
            return Ok(TypeSet::single(ty));
        }

        Err(span.error(DiagnosticKind::FunctionNotFound(name.to_string())))
    }

    /// The union of every top-level `return` of `def`
    fn function_returns(&mut self, def: &'f FunctionDef) -> Result<TypeSet, Diagnostic> {
        let returns: Vec<_> = def
            .body
            .iter()
            .filter_map(|stmt| match stmt.kind() {
                StmtKind::Return(value) => Some((stmt.span(), value.as_ref())),
                _ => None,
            })
            .collect();

        let Some((last_return, _)) = returns.last().copied() else {
            return Ok(TypeSet::single(TypeName::NoneType));
        };

        let mut set = TypeSet::new();
        for (_, value) in returns {
            match value {
                Some(value) => set.union_with(self.infer(value, Some(def))?),
                None => set.insert(TypeName::NoneType),
            }
        }

        // falling off the end returns None
        if def
            .body
            .last()
            .is_some_and(|stmt| stmt.span().start() > last_return.start())
        {
            set.insert(TypeName::NoneType);
        }

        Ok(set)
    }

    /// Infer a variable used at `at`
    ///
    /// Assignments in other units are always visible, so two units can explain
    /// their names through each other; the lookup is a query to cut that short.
    fn infer_name(
        &mut self,
        name: &str,
        at: Span,
        scope: Option<&'f FunctionDef>,
    ) -> Result<TypeSet, Diagnostic> {
        let query = Query::Name {
            name: name.to_string(),
            at,
        };
        self.query(query, at, |engine| engine.lookup_name(name, at, scope))
    }

    /// Resolve a variable used at `at` from its assignments, its callers or the
    /// module scope
    fn lookup_name(
        &mut self,
        name: &str,
        at: Span,
        scope: Option<&'f FunctionDef>,
    ) -> Result<TypeSet, Diagnostic> {
        let body = scope.map_or(self.module, |def| def.body.as_slice());
        if let Some(explanation) = history::scan(body, name, at) {
            return self.explained(explanation, scope);
        }

        if let Some(def) = scope {
            if def.params.find(name).is_some() {
                let query = Query::Param {
                    function: def.name.value().clone(),
                    param: name.to_string(),
                };
                return self.query(query, at, |engine| engine.infer_param(def, name, at));
            }

            // fall back to the module scope
            if let Some(explanation) = history::scan(self.module, name, at) {
                return self.explained(explanation, None);
            }
        }

        Err(at.error(DiagnosticKind::VariableNotInferred(name.to_string())))
    }

    /// Infer the types an explanation gives a name
    fn explained(
        &mut self,
        explanation: Explanation<'f>,
        scope: Option<&'f FunctionDef>,
    ) -> Result<TypeSet, Diagnostic> {
        match explanation {
            Explanation::Assigned(value) => self.infer(value, scope),
            Explanation::LiteralLoop => Ok(TypeSet::single(TypeName::Any)),
        }
    }

    /// Infer a parameter of `def` from every call site of `def`
    fn infer_param(
        &mut self,
        def: &'f FunctionDef,
        name: &str,
        at: Span,
    ) -> Result<TypeSet, Diagnostic> {
        let Some(param) = def.params.find(name) else {
            return Err(at.error(DiagnosticKind::VariableNotInferred(name.to_string())));
        };
        match param.kind {
            ParameterKind::VarPositional => return Ok(TypeSet::single(TypeName::Tuple)),
            ParameterKind::VarKeyword => return Ok(TypeSet::single(TypeName::Dict)),
            _ => {}
        }

        let calls = self.index.calls_to(def.name.value());
        if calls.is_empty() {
            return Err(at.error(DiagnosticKind::ParameterHasNoCallers {
                function: def.name.value().clone(),
                param: name.to_string(),
            }));
        }

        let mut set = TypeSet::new();
        for call in calls {
            let types = match bind(def, param, &call) {
                Binding::Argument(arg) => self.infer(arg, call.enclosing)?,
                // defaults are evaluated where the function is defined
                Binding::Default(default) => {
                    let defined_in = self.index.scope_of(def);
                    self.infer(default, defined_in)?
                }
                Binding::VarPositional => TypeSet::single(TypeName::Tuple),
                Binding::VarKeyword => TypeSet::single(TypeName::Dict),
                Binding::Unbound => {
                    return Err(call.call.span().error(DiagnosticKind::ParameterNotBound {
                        function: def.name.value().clone(),
                        param: name.to_string(),
                    }));
                }
            };
            set.union_with(types);
        }

        Ok(set)
    }

    /// Run `compute` as `query`, cutting cycles short
    fn query(
        &mut self,
        query: Query,
        span: Span,
        compute: impl FnOnce(&mut Self) -> Result<TypeSet, Diagnostic>,
    ) -> Result<TypeSet, Diagnostic> {
        if let Some(start) = self.in_progress.iter().position(|active| *active == query) {
            let cycle: Vec<String> = self.in_progress[start..]
                .iter()
                .chain([&query])
                .map(ToString::to_string)
                .collect();
            trace!("cycle cut short: {}", cycle.join(" -> "));
            self.last_cycle = Some(cycle);
            return Ok(TypeSet::new());
        }

        self.in_progress.push(query);
        let result = compute(self);
        self.in_progress.pop();
        let set = result?;

        if set.is_empty() && self.in_progress.is_empty() {
            return Err(span.error(DiagnosticKind::InferenceCycle(
                self.last_cycle.take().unwrap_or_default(),
            )));
        }
        Ok(set)
    }
}
