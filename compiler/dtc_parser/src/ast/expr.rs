//! Expression representation for the Python AST
//!
//! The main thing within this module you will need is the [`Expr`] struct.
//! Expressions print back as Python, with compound operands parenthesized so
//! the printed form never depends on precedence.


use derive_more::Display;
use dtc_utils::{code_fmt::join_display, span::Spanned};

use super::params::Parameters;

/// Binary operators
#[derive(PartialEq, Eq, Debug, Clone, Copy, Display)]
pub enum BinOp {
    /// `+`
    #[display("+")]
    Add,
    /// `-`
    #[display("-")]
    Sub,
    /// `*`
    #[display("*")]
    Mult,
    /// `@`
    #[display("@")]
    MatMult,
    /// `/`
    #[display("/")]
    Div,
    /// `//`
    #[display("//")]
    FloorDiv,
    /// `%`
    #[display("%")]
    Mod,
    /// `**`
    #[display("**")]
    Pow,
    /// `<<`
    #[display("<<")]
    LShift,
    /// `>>`
    #[display(">>")]
    RShift,
    /// `|`
    #[display("|")]
    BitOr,
    /// `^`
    #[display("^")]
    BitXor,
    /// `&`
    #[display("&")]
    BitAnd,
}
impl BinOp {
    /// Resolve the operator spelled `text` (as found in an augmented
    /// assignment token, e.g. `//` for `//=`)
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        Some(match text {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mult,
            "@" => Self::MatMult,
            "/" => Self::Div,
            "//" => Self::FloorDiv,
            "%" => Self::Mod,
            "**" => Self::Pow,
            "<<" => Self::LShift,
            ">>" => Self::RShift,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "&" => Self::BitAnd,
            _ => return None,
        })
    }
}

/// Unary operators
#[derive(PartialEq, Eq, Debug, Clone, Copy, Display)]
pub enum UnaryOp {
    /// `~`
    #[display("~")]
    Invert,
    /// `not `
    #[display("not ")]
    Not,
    /// `+`
    #[display("+")]
    UAdd,
    /// `-`
    #[display("-")]
    USub,
}

/// Short-circuiting boolean operators
#[derive(PartialEq, Eq, Debug, Clone, Copy, Display)]
pub enum BoolOp {
    /// `and`
    #[display("and")]
    And,
    /// `or`
    #[display("or")]
    Or,
}

/// Comparison operators, which may be chained (`a < b < c`)
#[derive(PartialEq, Eq, Debug, Clone, Copy, Display)]
pub enum CmpOp {
    /// `==`
    #[display("==")]
    Eq,
    /// `!=`
    #[display("!=")]
    NotEq,
    /// `<`
    #[display("<")]
    Lt,
    /// `<=`
    #[display("<=")]
    LtE,
    /// `>`
    #[display(">")]
    Gt,
    /// `>=`
    #[display(">=")]
    GtE,
    /// `is`
    #[display("is")]
    Is,
    /// `is not`
    #[display("is not")]
    IsNot,
    /// `in`
    #[display("in")]
    In,
    /// `not in`
    #[display("not in")]
    NotIn,
}

/// A literal constant
///
/// Numbers keep their source text; only their kind matters to the checker.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Constant {
    /// An integer literal
    Int(String),
    /// A float literal
    Float(String),
    /// An imaginary literal
    Complex(String),
    /// A string literal (adjacent literals already concatenated). Formatted
    /// strings are represented by their body.
    Str(String),
    /// A bytes literal
    Bytes(String),
    /// `True` or `False`
    Bool(bool),
    /// `None`
    None,
    /// `...`
    Ellipsis,
}
impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) | Self::Float(n) | Self::Complex(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{}", python_repr(s)),
            Self::Bytes(s) => write!(f, "b{}", python_repr(s)),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::None => write!(f, "None"),
            Self::Ellipsis => write!(f, "..."),
        }
    }
}

/// Quote `value` the way Python's `repr` does for simple strings
#[must_use]
pub fn python_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// A keyword argument in a call or class definition (`name=value`), or a
/// `**mapping` unpacking when `name` is [`None`]
#[derive(PartialEq, Debug, Clone)]
pub struct Keyword {
    /// The parameter name, absent for `**` unpacking
    pub name: Option<Spanned<String>>,
    /// The argument value
    pub value: Expr,
}
impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}={}", self.value),
            None => write!(f, "**{}", self.value),
        }
    }
}

/// An entry of a dictionary display
#[derive(PartialEq, Debug, Clone, Display)]
pub enum DictItem {
    /// `key: value`
    #[display("{_0}: {_1}")]
    Pair(Expr, Expr),
    /// `**mapping`
    #[display("**{_0}")]
    Unpack(Expr),
}

/// One `for ... in ... if ...` clause of a comprehension
#[derive(PartialEq, Debug, Clone)]
pub struct Comprehension {
    /// The loop target
    pub target: Expr,
    /// The iterable
    pub iter: Expr,
    /// Every `if` filter, in order
    pub ifs: Vec<Expr>,
    /// Whether this is an `async for`
    pub is_async: bool,
}
impl Display for Comprehension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_async {
            write!(f, "async ")?;
        }
        write!(f, "for {} in {}", self.target, self.iter)?;
        for test in &self.ifs {
            write!(f, " if {test}")?;
        }
        Ok(())
    }
}

/// The enum representing the different kinds of expressions in Python
#[derive(PartialEq, Debug, Clone)]
pub enum ExprKind {
    /// A literal constant
    Constant(Constant),
    /// A plain name, e.g. `x`
    Name(String),
    /// `[a, b]`
    List(Vec<Expr>),
    /// `(a, b)` or `a, b`
    Tuple(Vec<Expr>),
    /// `{a, b}`
    Set(Vec<Expr>),
    /// `{k: v}`
    Dict(Vec<DictItem>),
    /// `[x for x in y]`
    ListComp(Box<Expr>, Vec<Comprehension>),
    /// `{x for x in y}`
    SetComp(Box<Expr>, Vec<Comprehension>),
    /// `{k: v for k in y}`
    DictComp(Box<Expr>, Box<Expr>, Vec<Comprehension>),
    /// `(x for x in y)`
    GeneratorExp(Box<Expr>, Vec<Comprehension>),
    /// `f(a, *b, c=d, **e)`
    Call {
        /// The callee
        func: Box<Expr>,
        /// Positional arguments, including `*` unpackings
        args: Vec<Expr>,
        /// Keyword arguments, including `**` unpackings
        keywords: Vec<Keyword>,
    },
    /// `value.attr`
    Attribute(Box<Expr>, Spanned<String>),
    /// `value[index]`
    Subscript(Box<Expr>, Box<Expr>),
    /// `lower:upper:step`, only found inside a subscript
    Slice {
        /// The lower bound
        lower: Option<Box<Expr>>,
        /// The upper bound
        upper: Option<Box<Expr>>,
        /// The step
        step: Option<Box<Expr>>,
    },
    /// `a + b` and friends
    BinOp(Box<Expr>, BinOp, Box<Expr>),
    /// `-a`, `not a` and friends
    UnaryOp(UnaryOp, Box<Expr>),
    /// `a and b and c`
    BoolOp(BoolOp, Vec<Expr>),
    /// `a < b <= c`
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    /// `body if test else orelse`
    IfExp {
        /// The condition
        test: Box<Expr>,
        /// The value when the condition holds
        body: Box<Expr>,
        /// The value otherwise
        orelse: Box<Expr>,
    },
    /// `lambda params: body`
    Lambda(Box<Parameters>, Box<Expr>),
    /// `*value`
    Starred(Box<Expr>),
    /// `yield` or `yield value`
    Yield(Option<Box<Expr>>),
    /// `yield from value`
    YieldFrom(Box<Expr>),
    /// `await value`
    Await(Box<Expr>),
    /// `target := value`
    NamedExpr(Box<Expr>, Box<Expr>),
}

/// A Python expression
#[derive(PartialEq, Debug, Clone, Display)]
#[display("{_0}")]
pub struct Expr(pub Spanned<ExprKind>);

impl Expr {
    /// Obtain the [`ExprKind`] of this expression
    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        self.0.value()
    }

    /// Obtain the [`Span`](dtc_utils::span::Span) of this expression
    #[must_use]
    pub const fn span(&self) -> dtc_utils::span::Span {
        self.0.span()
    }

    /// If this expression is a plain name, obtain it
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self.kind() {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Determine if this expression may appear on the left of `=`
    #[must_use]
    pub fn is_assignable(&self) -> bool {
        match self.kind() {
            ExprKind::Name(_) | ExprKind::Attribute(..) | ExprKind::Subscript(..) => true,
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                items.iter().all(Self::is_assignable)
            }
            ExprKind::Starred(inner) => inner.is_assignable(),
            _ => false,
        }
    }
}

impl Display for ExprKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(constant) => write!(f, "{constant}"),
            Self::Name(name) => write!(f, "{name}"),
            Self::List(items) => write!(f, "[{}]", join_display(items, ", ")),
            Self::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            Self::Tuple(items) => write!(f, "({})", join_display(items, ", ")),
            Self::Set(items) => write!(f, "{{{}}}", join_display(items, ", ")),
            Self::Dict(items) => write!(f, "{{{}}}", join_display(items, ", ")),
            Self::ListComp(elt, generators) => {
                write!(f, "[{elt} {}]", join_display(generators, " "))
            }
            Self::SetComp(elt, generators) => {
                write!(f, "{{{elt} {}}}", join_display(generators, " "))
            }
            Self::DictComp(key, value, generators) => {
                write!(f, "{{{key}: {value} {}}}", join_display(generators, " "))
            }
            Self::GeneratorExp(elt, generators) => {
                write!(f, "({elt} {})", join_display(generators, " "))
            }
            Self::Call {
                func,
                args,
                keywords,
            } => write!(
                f,
                "{func}({})",
                join_display(
                    args.iter()
                        .map(ToString::to_string)
                        .chain(keywords.iter().map(ToString::to_string)),
                    ", "
                )
            ),
            Self::Attribute(value, attr) => write!(f, "{value}.{attr}"),
            Self::Subscript(value, index) => match index.kind() {
                Self::Tuple(items) if items.len() > 1 => {
                    write!(f, "{value}[{}]", join_display(items, ", "))
                }
                _ => write!(f, "{value}[{index}]"),
            },
            Self::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    write!(f, "{lower}")?;
                }
                write!(f, ":")?;
                if let Some(upper) = upper {
                    write!(f, "{upper}")?;
                }
                if let Some(step) = step {
                    write!(f, ":{step}")?;
                }
                Ok(())
            }
            Self::BinOp(lhs, op, rhs) => write!(f, "({lhs} {op} {rhs})"),
            Self::UnaryOp(op, operand) => write!(f, "({op}{operand})"),
            Self::BoolOp(op, values) => {
                write!(f, "({})", join_display(values, &format!(" {op} ")))
            }
            Self::Compare(left, comparisons) => {
                write!(f, "({left}")?;
                for (op, right) in comparisons {
                    write!(f, " {op} {right}")?;
                }
                write!(f, ")")
            }
            Self::IfExp { test, body, orelse } => {
                write!(f, "({body} if {test} else {orelse})")
            }
            Self::Lambda(params, body) if params.is_empty() => write!(f, "(lambda: {body})"),
            Self::Lambda(params, body) => write!(f, "(lambda {params}: {body})"),
            Self::Starred(value) => write!(f, "*{value}"),
            Self::Yield(None) => write!(f, "(yield)"),
            Self::Yield(Some(value)) => write!(f, "(yield {value})"),
            Self::YieldFrom(value) => write!(f, "(yield from {value})"),
            Self::Await(value) => write!(f, "(await {value})"),
            Self::NamedExpr(target, value) => write!(f, "({target} := {value})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use dtc_utils::span::SourceId;

    use crate::parser::parse_expr;

    /// Parse an expression and print it back
    fn reprint(input: &str) -> String {
        parse_expr(input, SourceId::new(0))
            .expect("test case should have parsed correctly")
            .to_string()
    }

    #[test]
    fn precedence_is_made_explicit() {
        assert_eq!(reprint("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(reprint("-x ** 2"), "(-(x ** 2))");
        assert_eq!(reprint("a or b and not c"), "(a or (b and (not c)))");
        assert_eq!(reprint("int | str | None"), "((int | str) | None)");
    }

    #[test]
    fn displays_print_as_python() {
        assert_eq!(reprint("[1, 'a', None]"), "[1, 'a', None]");
        assert_eq!(reprint("(1,)"), "(1,)");
        assert_eq!(reprint("{'B', \"C\"}"), "{'B', 'C'}");
        assert_eq!(reprint("{1: 2, **d}"), "{1: 2, **d}");
        assert_eq!(reprint("f(a, *b, c=1, **d)"), "f(a, *b, c=1, **d)");
        assert_eq!(reprint("x[1:2, ::3]"), "x[1:2, ::3]");
        assert_eq!(reprint("x[a].b"), "x[a].b");
    }

    #[test]
    fn comprehensions_and_conditionals_print() {
        assert_eq!(
            reprint("[x for x in y if x]"),
            "[x for x in y if x]"
        );
        assert_eq!(reprint("a if b else c"), "(a if b else c)");
        assert_eq!(reprint("lambda x, y=1: x"), "(lambda x, y=1: x)");
        assert_eq!(reprint("a < b is not c"), "(a < b is not c)");
    }

    #[test]
    fn python_repr_picks_quotes() {
        assert_eq!(super::python_repr("it's"), "\"it's\"");
        assert_eq!(super::python_repr("a\nb"), "'a\\nb'");
    }
}
