//! Pairing call-site arguments with declared parameters

use dtc_forest::CallSite;
use dtc_parser::ast::{
    expr::{Expr, ExprKind},
    params::{Parameter, ParameterKind},
    stmt::FunctionDef,
};

/// What a call site binds a parameter to
#[derive(Debug, Clone, Copy)]
pub enum Binding<'f> {
    /// An argument written at the call site
    Argument(&'f Expr),
    /// The parameter's default value
    Default(&'f Expr),
    /// `*args`, always a tuple
    VarPositional,
    /// `**kwargs`, always a dict
    VarKeyword,
    /// Nothing: the call would fail at runtime
    Unbound,
}

/// Find the argument `call` passes for `param` of `def`
///
/// Positional parameters take the argument at their position, unless a
/// `*` unpacking comes first. Any parameter except positional-only ones may
/// be passed by keyword.
pub fn bind<'f>(def: &FunctionDef, param: &'f Parameter, call: &CallSite<'f>) -> Binding<'f> {
    match param.kind {
        ParameterKind::VarPositional => return Binding::VarPositional,
        ParameterKind::VarKeyword => return Binding::VarKeyword,
        ParameterKind::PositionalOnly | ParameterKind::Positional => {
            if let Some(arg) = positional_argument(def, param, call.args) {
                return Binding::Argument(arg);
            }
        }
        ParameterKind::KeywordOnly => {}
    }

    if param.kind != ParameterKind::PositionalOnly {
        if let Some(keyword) = call.keywords.iter().find(|keyword| {
            keyword
                .name
                .as_ref()
                .is_some_and(|name| name.value() == param.name.value())
        }) {
            return Binding::Argument(&keyword.value);
        }
    }

    param
        .default
        .as_ref()
        .map_or(Binding::Unbound, Binding::Default)
}

/// The argument at `param`'s position, if one was written there
fn positional_argument<'f>(def: &FunctionDef, param: &Parameter, args: &'f [Expr]) -> Option<&'f Expr> {
    let position = def
        .params
        .positional()
        .position(|candidate| candidate.name.value() == param.name.value())?;

    args.iter()
        .take(position + 1)
        .take_while(|arg| !matches!(arg.kind(), ExprKind::Starred(_)))
        .nth(position)
}

/// The arguments written explicitly for each positional parameter of `def`
///
/// Parameters the call leaves to their defaults are skipped.
pub fn explicit_arguments<'f>(
    def: &'f FunctionDef,
    call: &CallSite<'f>,
) -> Vec<(&'f Parameter, &'f Expr)> {
    def.params
        .positional()
        .filter_map(|param| match bind(def, param, call) {
            Binding::Argument(arg) => Some((param, arg)),
            _ => None,
        })
        .collect()
}
