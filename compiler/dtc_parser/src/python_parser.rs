//! Hand-written recursive descent parser for Python
//!
//! The parser first runs the whole input through the
//! [`PythonLexer`], stopping at the first lexical error, and then walks the
//! token list. Each grammar rule is one method; expression methods are named
//! after the precedence level they parse, from [`PythonParser::parse_test`]
//! (conditional expressions and `lambda`) down to
//! [`PythonParser::parse_atom`].

use std::mem::discriminant;

use dtc_utils::span::{SourceId, Span, Spannable, Spanned};

use crate::{
    ast::{
        expr::{BinOp, BoolOp, CmpOp, Comprehension, Constant, DictItem, Expr, ExprKind, Keyword, UnaryOp},
        params::{Parameter, ParameterKind, Parameters},
        stmt::{Alias, ClassDef, ExceptHandler, FunctionDef, Stmt, StmtKind, WithItem},
        Program,
    },
    lexer::{LexicalError, NumberLiteral, StringKind, Tok},
    python_lexer::PythonLexer,
};

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError<'input> {
    /// The input ended while more tokens were required
    UnexpectedEof {
        /// Where the input ended
        at: Span,
        /// Expected tokens
        expected: Vec<String>,
    },
    /// A token appeared where it is not allowed
    UnexpectedToken {
        /// The token that was found
        found: Spanned<String>,
        /// Expected tokens
        expected: Vec<String>,
    },
    /// The left side of an assignment is not something that can be bound
    InvalidAssignmentTarget(Spanned<String>),
    /// Lexical error
    LexicalError(Spanned<LexicalError<'input>>),
}

/// The parts of a `name(arguments) -> returns` line, before any validation
#[derive(Debug)]
pub(crate) struct Signature {
    /// The function name
    pub name: Spanned<String>,
    /// Positional arguments
    pub args: Vec<Expr>,
    /// Keyword arguments
    pub keywords: Vec<Keyword>,
    /// The expression after `->`
    pub returns: Expr,
}

/// Shorthand for the result of every parsing method
type ParseResult<'input, T> = Result<T, ParseError<'input>>;

/// Recursive descent parser for Python
#[derive(Debug)]
pub struct PythonParser<'input> {
    /// The tokens to parse
    tokens: Vec<Spanned<Tok<'input>>>,
    /// Current position in token stream
    pos: usize,
    /// The source unit used for span creation
    source: SourceId,
    /// Byte offset of the end of the input
    eof: usize,
}

impl<'input> PythonParser<'input> {
    /// Lex `input` and create a parser over its tokens
    ///
    /// # Errors
    /// Returns the first lexical error in the input, if any.
    pub fn new(input: &'input str, source: SourceId) -> ParseResult<'input, Self> {
        let tokens = PythonLexer::new(input, source)
            .map(|token| token.transpose().map_err(ParseError::LexicalError))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tokens,
            pos: 0,
            source,
            eof: input.len(),
        })
    }

    /// Peek at the current token without consuming it
    fn peek_kind(&self) -> Option<&Tok<'input>> {
        self.peek_kind_at(0)
    }

    /// Peek `n` tokens past the current one
    fn peek_kind_at(&self, n: usize) -> Option<&Tok<'input>> {
        self.tokens.get(self.pos + n).map(Spanned::value)
    }

    /// Check if we're at the end of input
    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consume the current token and return its span
    fn advance(&mut self) -> Span {
        let span = self
            .tokens
            .get(self.pos)
            .map_or_else(|| self.eof_span(), Spanned::span);
        if !self.is_eof() {
            self.pos += 1;
        }
        span
    }

    /// Check if the current token has the same kind as `expected`
    fn check(&self, expected: &Tok<'_>) -> bool {
        self.peek_kind()
            .is_some_and(|tok| discriminant(tok) == discriminant(expected))
    }

    /// Try to consume a specific token, return true if consumed
    fn try_consume(&mut self, expected: &Tok<'_>) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token kind, consume it if present
    fn expect(&mut self, expected: &Tok<'_>) -> ParseResult<'input, Span> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[&expected.to_string()]))
        }
    }

    /// Expect an identifier and return its text
    fn expect_identifier(&mut self) -> ParseResult<'input, Spanned<String>> {
        match self.peek_kind() {
            Some(Tok::Identifier(name)) => {
                let name = (*name).to_string();
                Ok(name.in_span(self.advance()))
            }
            _ => Err(self.unexpected(&["identifier"])),
        }
    }

    /// Build the error for the current token, given what was expected instead
    fn unexpected(&self, expected: &[&str]) -> ParseError<'input> {
        let expected = expected.iter().map(ToString::to_string).collect();
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::UnexpectedToken {
                found: token.as_ref().map(|tok| tok.to_string()),
                expected,
            },
            None => ParseError::UnexpectedEof {
                at: self.eof_span(),
                expected,
            },
        }
    }

    /// The empty span at the very end of the input
    fn eof_span(&self) -> Span {
        Span::from_positions_and_source(self.eof, self.eof, self.source)
    }

    /// Get current position for span creation
    fn current_pos(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.eof, Spanned::start)
    }

    /// Create a span from `start` to the end of the last consumed token
    ///
    /// Layout tokens are skipped so that a block statement ends where its last
    /// body statement ends.
    fn span_from(&self, start: usize) -> Span {
        let end = self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|token| !matches!(token.value(), Tok::Newline | Tok::Indent | Tok::Dedent))
            .map_or(start, Spanned::end);
        Span::from_positions_and_source(start, end.max(start), self.source)
    }

    /// Wrap an [`ExprKind`] into an [`Expr`] spanning from `start`
    fn make_expr(&self, start: usize, kind: ExprKind) -> Expr {
        Expr(kind.in_span(self.span_from(start)))
    }

    /// Wrap a [`StmtKind`] into a [`Stmt`] spanning from `start`
    fn make_stmt(&self, start: usize, kind: StmtKind) -> Stmt {
        Stmt(kind.in_span(self.span_from(start)))
    }

    /// Determine if the current token can begin an expression
    fn starts_expression(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                Tok::Identifier(_)
                    | Tok::NumberLiteral(_)
                    | Tok::StringLiteral(_)
                    | Tok::None
                    | Tok::True
                    | Tok::False
                    | Tok::Ellipsis
                    | Tok::LeftParen
                    | Tok::LeftBracket
                    | Tok::LeftBrace
                    | Tok::Plus
                    | Tok::Minus
                    | Tok::Tilde
                    | Tok::Not
                    | Tok::Lambda
                    | Tok::Await
                    | Tok::Star
            )
        )
    }

    /// Fail with [`ParseError::InvalidAssignmentTarget`] unless `target` can be
    /// bound
    fn ensure_assignable(target: &Expr) -> ParseResult<'input, ()> {
        if target.is_assignable() {
            Ok(())
        } else {
            Err(ParseError::InvalidAssignmentTarget(
                target.to_string().in_span(target.span()),
            ))
        }
    }

    /// Parse a complete module
    ///
    /// # Errors
    /// Returns the first syntax error in the input.
    pub fn parse_program(&mut self) -> ParseResult<'input, Program> {
        let mut body = Vec::new();

        while !self.is_eof() {
            if self.try_consume(&Tok::Newline) {
                continue;
            }
            body.extend(self.parse_statement()?);
        }

        Ok(Program(body))
    }

    /// Parse the whole input as one expression (a bare tuple is allowed)
    ///
    /// # Errors
    /// Returns the first syntax error in the input, including any tokens left
    /// over after the expression.
    pub fn parse_expression(&mut self) -> ParseResult<'input, Expr> {
        let expr = self.parse_testlist_star()?;
        self.try_consume(&Tok::Newline);

        if self.is_eof() {
            Ok(expr)
        } else {
            Err(self.unexpected(&["end of input"]))
        }
    }

    /// Parse the whole input as `name(arguments) -> returns`
    ///
    /// # Errors
    /// Returns the first syntax error in the input.
    pub(crate) fn parse_signature(&mut self) -> ParseResult<'input, Signature> {
        let name = self.expect_identifier()?;
        self.expect(&Tok::LeftParen)?;
        let (args, keywords) = self.parse_call_arguments()?;
        self.expect(&Tok::Arrow)?;
        let returns = self.parse_test()?;
        self.try_consume(&Tok::Newline);

        if !self.is_eof() {
            return Err(self.unexpected(&["end of input"]));
        }

        Ok(Signature {
            name,
            args,
            keywords,
            returns,
        })
    }

    // === STATEMENTS ===

    /// Parse one logical line, or one compound statement. A line of simple
    /// statements separated by `;` yields more than one [`Stmt`].
    fn parse_statement(&mut self) -> ParseResult<'input, Vec<Stmt>> {
        match self.peek_kind() {
            Some(Tok::If) => Ok(vec![self.parse_if()?]),
            Some(Tok::While) => Ok(vec![self.parse_while()?]),
            Some(Tok::For) => Ok(vec![self.parse_for()?]),
            Some(Tok::Try) => Ok(vec![self.parse_try()?]),
            Some(Tok::With) => Ok(vec![self.parse_with()?]),
            Some(Tok::Def) => Ok(vec![self.parse_function_def(Vec::new())?]),
            Some(Tok::Class) => Ok(vec![self.parse_class_def(Vec::new())?]),
            Some(Tok::At) => Ok(vec![self.parse_decorated()?]),
            Some(Tok::Async) => match self.peek_kind_at(1) {
                Some(Tok::Def) => Ok(vec![self.parse_function_def(Vec::new())?]),
                Some(Tok::For) => Ok(vec![self.parse_for()?]),
                Some(Tok::With) => Ok(vec![self.parse_with()?]),
                _ => {
                    self.advance();
                    Err(self.unexpected(&["def", "for", "with"]))
                }
            },
            _ => self.parse_simple_line(),
        }
    }

    /// Parse simple statements separated by `;` up to the end of the line
    fn parse_simple_line(&mut self) -> ParseResult<'input, Vec<Stmt>> {
        let mut stmts = vec![self.parse_small_statement()?];

        while self.try_consume(&Tok::Semicolon) {
            if self.check(&Tok::Newline) || self.is_eof() {
                break;
            }
            stmts.push(self.parse_small_statement()?);
        }

        if !self.is_eof() {
            self.expect(&Tok::Newline)?;
        }

        Ok(stmts)
    }

    /// Parse a `:` followed by either an indented block or a simple line
    fn parse_block(&mut self) -> ParseResult<'input, Vec<Stmt>> {
        self.expect(&Tok::Colon)?;

        if !self.try_consume(&Tok::Newline) {
            return self.parse_simple_line();
        }

        self.expect(&Tok::Indent)?;
        let mut body = Vec::new();
        while !self.try_consume(&Tok::Dedent) {
            if self.is_eof() {
                return Err(self.unexpected(&["DEDENT"]));
            }
            body.extend(self.parse_statement()?);
        }

        Ok(body)
    }

    /// Parse a statement that fits on one line and contains no block
    fn parse_small_statement(&mut self) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();

        let kind = match self.peek_kind() {
            Some(Tok::Pass) => {
                self.advance();
                StmtKind::Pass
            }
            Some(Tok::Break) => {
                self.advance();
                StmtKind::Break
            }
            Some(Tok::Continue) => {
                self.advance();
                StmtKind::Continue
            }
            Some(Tok::Return) => {
                self.advance();
                let value = if self.starts_expression() {
                    Some(self.parse_testlist_star()?)
                } else {
                    None
                };
                StmtKind::Return(value)
            }
            Some(Tok::Raise) => {
                self.advance();
                if self.starts_expression() {
                    let exc = self.parse_test()?;
                    let cause = if self.try_consume(&Tok::From) {
                        Some(self.parse_test()?)
                    } else {
                        None
                    };
                    StmtKind::Raise {
                        exc: Some(exc),
                        cause,
                    }
                } else {
                    StmtKind::Raise {
                        exc: None,
                        cause: None,
                    }
                }
            }
            Some(Tok::Global) => {
                self.advance();
                StmtKind::Global(self.parse_name_list()?)
            }
            Some(Tok::Nonlocal) => {
                self.advance();
                StmtKind::Nonlocal(self.parse_name_list()?)
            }
            Some(Tok::Del) => {
                self.advance();
                let mut targets = Vec::new();
                loop {
                    let target = self.parse_star_or_bitor()?;
                    Self::ensure_assignable(&target)?;
                    targets.push(target);
                    if !self.try_consume(&Tok::Comma) || !self.starts_expression() {
                        break;
                    }
                }
                StmtKind::Delete(targets)
            }
            Some(Tok::Assert) => {
                self.advance();
                let test = self.parse_test()?;
                let msg = if self.try_consume(&Tok::Comma) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                StmtKind::Assert { test, msg }
            }
            Some(Tok::Import) => {
                self.advance();
                let mut names = Vec::new();
                loop {
                    names.push(self.parse_alias(true)?);
                    if !self.try_consume(&Tok::Comma) {
                        break;
                    }
                }
                StmtKind::Import(names)
            }
            Some(Tok::From) => self.parse_import_from()?,
            _ => return self.parse_expression_statement(start),
        };

        Ok(self.make_stmt(start, kind))
    }

    /// Parse `a, b, c` after `global` or `nonlocal`
    fn parse_name_list(&mut self) -> ParseResult<'input, Vec<Spanned<String>>> {
        let mut names = vec![self.expect_identifier()?];
        while self.try_consume(&Tok::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    /// Parse a possibly dotted module name such as `os.path`
    fn parse_dotted_name(&mut self) -> ParseResult<'input, Spanned<String>> {
        let start = self.current_pos();
        let mut name = self.expect_identifier()?.into_value();
        while self.try_consume(&Tok::Dot) {
            name.push('.');
            name.push_str(self.expect_identifier()?.value());
        }
        Ok(name.in_span(self.span_from(start)))
    }

    /// Parse `name [as asname]`, where `name` may be dotted if `dotted` is set
    fn parse_alias(&mut self, dotted: bool) -> ParseResult<'input, Alias> {
        let name = if dotted {
            self.parse_dotted_name()?
        } else {
            self.expect_identifier()?
        };
        let asname = if self.try_consume(&Tok::As) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    /// Parse `from [.]*module import names`
    fn parse_import_from(&mut self) -> ParseResult<'input, StmtKind> {
        self.expect(&Tok::From)?;

        let mut level = 0;
        loop {
            if self.try_consume(&Tok::Dot) {
                level += 1;
            } else if self.try_consume(&Tok::Ellipsis) {
                level += 3;
            } else {
                break;
            }
        }

        let module = if matches!(self.peek_kind(), Some(Tok::Identifier(_))) {
            Some(self.parse_dotted_name()?)
        } else if level == 0 {
            return Err(self.unexpected(&["module name"]));
        } else {
            None
        };

        self.expect(&Tok::Import)?;

        let mut names = Vec::new();
        if self.check(&Tok::Star) {
            let span = self.advance();
            names.push(Alias {
                name: "*".to_string().in_span(span),
                asname: None,
            });
        } else {
            let parenthesized = self.try_consume(&Tok::LeftParen);
            loop {
                names.push(self.parse_alias(false)?);
                if !self.try_consume(&Tok::Comma) || (parenthesized && self.check(&Tok::RightParen)) {
                    break;
                }
            }
            if parenthesized {
                self.expect(&Tok::RightParen)?;
            }
        }

        Ok(StmtKind::ImportFrom {
            module,
            names,
            level,
        })
    }

    /// Parse an expression statement or any of the assignment forms
    fn parse_expression_statement(&mut self, start: usize) -> ParseResult<'input, Stmt> {
        let first = self.parse_testlist_star_or_yield()?;

        let kind = match self.peek_kind() {
            Some(Tok::Assign) => {
                let mut targets = vec![first];
                let value = loop {
                    self.advance();
                    let value = self.parse_testlist_star_or_yield()?;
                    if !self.check(&Tok::Assign) {
                        break value;
                    }
                    targets.push(value);
                };
                for target in &targets {
                    Self::ensure_assignable(target)?;
                }
                StmtKind::Assign { targets, value }
            }
            Some(Tok::AugAssign(op)) => {
                let op = BinOp::from_text(op).ok_or_else(|| self.unexpected(&["="]))?;
                if !matches!(
                    first.kind(),
                    ExprKind::Name(_) | ExprKind::Attribute(..) | ExprKind::Subscript(..)
                ) {
                    return Err(ParseError::InvalidAssignmentTarget(
                        first.to_string().in_span(first.span()),
                    ));
                }
                self.advance();
                StmtKind::AugAssign {
                    target: first,
                    op,
                    value: self.parse_testlist_star_or_yield()?,
                }
            }
            Some(Tok::Colon) => {
                self.advance();
                Self::ensure_assignable(&first)?;
                let annotation = self.parse_test()?;
                let value = if self.try_consume(&Tok::Assign) {
                    Some(self.parse_testlist_star_or_yield()?)
                } else {
                    None
                };
                StmtKind::AnnAssign {
                    target: first,
                    annotation,
                    value,
                }
            }
            _ => StmtKind::Expr(first),
        };

        Ok(self.make_stmt(start, kind))
    }

    /// Parse `if`/`elif` and everything chained after it
    fn parse_if(&mut self) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();
        // `if` or `elif`
        self.advance();

        let test = self.parse_named_test()?;
        let body = self.parse_block()?;
        let orelse = if self.check(&Tok::Elif) {
            vec![self.parse_if()?]
        } else if self.try_consume(&Tok::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };

        Ok(self.make_stmt(start, StmtKind::If { test, body, orelse }))
    }

    /// Parse an optional `else` block of a loop
    fn parse_loop_else(&mut self) -> ParseResult<'input, Vec<Stmt>> {
        if self.try_consume(&Tok::Else) {
            self.parse_block()
        } else {
            Ok(Vec::new())
        }
    }

    /// Parse a `while` loop
    fn parse_while(&mut self) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();
        self.expect(&Tok::While)?;

        let test = self.parse_named_test()?;
        let body = self.parse_block()?;
        let orelse = self.parse_loop_else()?;

        Ok(self.make_stmt(start, StmtKind::While { test, body, orelse }))
    }

    /// Parse a `for` or `async for` loop
    fn parse_for(&mut self) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();
        let is_async = self.try_consume(&Tok::Async);
        self.expect(&Tok::For)?;

        let target = self.parse_target_list()?;
        Self::ensure_assignable(&target)?;
        self.expect(&Tok::In)?;
        let iter = self.parse_testlist_star()?;
        let body = self.parse_block()?;
        let orelse = self.parse_loop_else()?;

        Ok(self.make_stmt(
            start,
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            },
        ))
    }

    /// Parse a `try` statement with its handlers
    fn parse_try(&mut self) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();
        self.expect(&Tok::Try)?;
        let body = self.parse_block()?;

        let mut handlers = Vec::new();
        while self.check(&Tok::Except) {
            let handler_start = self.current_pos();
            self.advance();

            let (ty, name) = if self.check(&Tok::Colon) {
                (None, None)
            } else {
                let ty = self.parse_test()?;
                let name = if self.try_consume(&Tok::As) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                (Some(ty), name)
            };
            let handler_body = self.parse_block()?;

            handlers.push(
                ExceptHandler {
                    ty,
                    name,
                    body: handler_body,
                }
                .in_span(self.span_from(handler_start)),
            );
        }

        let orelse = if self.try_consume(&Tok::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        let finalbody = if self.try_consume(&Tok::Finally) {
            self.parse_block()?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.unexpected(&["except", "finally"]));
        }

        Ok(self.make_stmt(
            start,
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
        ))
    }

    /// Parse a `with` or `async with` statement
    fn parse_with(&mut self) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();
        let is_async = self.try_consume(&Tok::Async);
        self.expect(&Tok::With)?;

        let mut items = Vec::new();
        loop {
            let context = self.parse_test()?;
            let vars = if self.try_consume(&Tok::As) {
                let target = self.parse_target_list()?;
                Self::ensure_assignable(&target)?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, vars });
            if !self.try_consume(&Tok::Comma) {
                break;
            }
        }
        let body = self.parse_block()?;

        Ok(self.make_stmt(
            start,
            StmtKind::With {
                items,
                body,
                is_async,
            },
        ))
    }

    /// Parse decorators followed by the `def` or `class` they apply to
    fn parse_decorated(&mut self) -> ParseResult<'input, Stmt> {
        let mut decorators = Vec::new();
        while self.try_consume(&Tok::At) {
            decorators.push(self.parse_named_test()?);
            self.expect(&Tok::Newline)?;
        }

        match self.peek_kind() {
            Some(Tok::Def | Tok::Async) => self.parse_function_def(decorators),
            Some(Tok::Class) => self.parse_class_def(decorators),
            _ => Err(self.unexpected(&["def", "class"])),
        }
    }

    /// Parse a function definition
    fn parse_function_def(&mut self, decorators: Vec<Expr>) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();
        let is_async = self.try_consume(&Tok::Async);
        self.expect(&Tok::Def)?;

        let name = self.expect_identifier()?;
        self.expect(&Tok::LeftParen)?;
        let params = self.parse_parameters(&Tok::RightParen, true)?;
        self.expect(&Tok::RightParen)?;

        let returns = if self.try_consume(&Tok::Arrow) {
            Some(self.parse_test()?)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(self.make_stmt(
            start,
            StmtKind::FunctionDef(FunctionDef {
                name,
                params,
                returns,
                body,
                decorators,
                is_async,
            }),
        ))
    }

    /// Parse a class definition
    fn parse_class_def(&mut self, decorators: Vec<Expr>) -> ParseResult<'input, Stmt> {
        let start = self.current_pos();
        self.expect(&Tok::Class)?;

        let name = self.expect_identifier()?;
        let (bases, keywords) = if self.try_consume(&Tok::LeftParen) {
            self.parse_call_arguments()?
        } else {
            (Vec::new(), Vec::new())
        };
        let body = self.parse_block()?;

        Ok(self.make_stmt(
            start,
            StmtKind::ClassDef(ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            }),
        ))
    }

    /// Parse a parameter list up to (not including) `closing`
    ///
    /// Annotations are only allowed when `annotations` is set, since a `:`
    /// ends the parameters of a `lambda`.
    fn parse_parameters(
        &mut self,
        closing: &Tok<'_>,
        annotations: bool,
    ) -> ParseResult<'input, Parameters> {
        let mut params: Vec<Spanned<Parameter>> = Vec::new();
        let mut kind = ParameterKind::Positional;

        while !self.check(closing) {
            let start = self.current_pos();

            if self.try_consume(&Tok::Slash) {
                params = params
                    .into_iter()
                    .map(|param| {
                        param.map(|param| Parameter {
                            kind: ParameterKind::PositionalOnly,
                            ..param
                        })
                    })
                    .collect();
            } else if self.try_consume(&Tok::Star) {
                if matches!(self.peek_kind(), Some(Tok::Identifier(_))) {
                    params.push(self.parse_parameter(
                        start,
                        ParameterKind::VarPositional,
                        annotations,
                    )?);
                }
                kind = ParameterKind::KeywordOnly;
            } else if self.try_consume(&Tok::DoubleStar) {
                params.push(self.parse_parameter(start, ParameterKind::VarKeyword, annotations)?);
            } else {
                params.push(self.parse_parameter(start, kind, annotations)?);
            }

            if !self.try_consume(&Tok::Comma) {
                break;
            }
        }

        Ok(Parameters(params))
    }

    /// Parse a parameter name with its optional annotation and default
    fn parse_parameter(
        &mut self,
        start: usize,
        kind: ParameterKind,
        annotations: bool,
    ) -> ParseResult<'input, Spanned<Parameter>> {
        let name = self.expect_identifier()?;
        let annotation = if annotations && self.try_consume(&Tok::Colon) {
            Some(self.parse_test()?)
        } else {
            None
        };
        let default = if self.try_consume(&Tok::Assign) {
            Some(self.parse_test()?)
        } else {
            None
        };

        Ok(Parameter {
            name,
            kind,
            annotation,
            default,
        }
        .in_span(self.span_from(start)))
    }

    // === EXPRESSIONS ===

    /// Parse a `yield` expression, or a comma separated expression list
    fn parse_testlist_star_or_yield(&mut self) -> ParseResult<'input, Expr> {
        if self.check(&Tok::Yield) {
            self.parse_yield()
        } else {
            self.parse_testlist_star()
        }
    }

    /// Parse `yield`, `yield value` or `yield from value`
    fn parse_yield(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        self.expect(&Tok::Yield)?;

        let kind = if self.try_consume(&Tok::From) {
            ExprKind::YieldFrom(Box::new(self.parse_test()?))
        } else if self.starts_expression() {
            ExprKind::Yield(Some(Box::new(self.parse_testlist_star()?)))
        } else {
            ExprKind::Yield(None)
        };

        Ok(self.make_expr(start, kind))
    }

    /// Parse comma separated items produced by `item`, yielding a bare tuple
    /// if any comma was present
    fn parse_comma_list(
        &mut self,
        item: fn(&mut Self) -> ParseResult<'input, Expr>,
    ) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let first = item(self)?;
        if !self.check(&Tok::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.try_consume(&Tok::Comma) {
            if !self.starts_expression() {
                break;
            }
            items.push(item(self)?);
        }

        Ok(self.make_expr(start, ExprKind::Tuple(items)))
    }

    /// Parse expressions (starred ones included) separated by commas
    fn parse_testlist_star(&mut self) -> ParseResult<'input, Expr> {
        self.parse_comma_list(Self::parse_star_or_named)
    }

    /// Parse the target list of a `for` loop or comprehension
    fn parse_target_list(&mut self) -> ParseResult<'input, Expr> {
        self.parse_comma_list(Self::parse_star_or_bitor)
    }

    /// Parse `*value` or an assignment expression
    fn parse_star_or_named(&mut self) -> ParseResult<'input, Expr> {
        if self.check(&Tok::Star) {
            self.parse_starred()
        } else {
            self.parse_named_test()
        }
    }

    /// Parse `*value` or a bitwise-or level expression
    fn parse_star_or_bitor(&mut self) -> ParseResult<'input, Expr> {
        if self.check(&Tok::Star) {
            self.parse_starred()
        } else {
            self.parse_bitor()
        }
    }

    /// Parse `*value`
    fn parse_starred(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        self.expect(&Tok::Star)?;
        let value = self.parse_bitor()?;
        Ok(self.make_expr(start, ExprKind::Starred(Box::new(value))))
    }

    /// Parse `name := value`, or any other expression
    fn parse_named_test(&mut self) -> ParseResult<'input, Expr> {
        if matches!(self.peek_kind(), Some(Tok::Identifier(_)))
            && matches!(self.peek_kind_at(1), Some(Tok::Walrus))
        {
            let start = self.current_pos();
            let name = self.expect_identifier()?;
            let target = Expr(name.map(ExprKind::Name));
            self.advance();
            let value = self.parse_test()?;
            return Ok(self.make_expr(
                start,
                ExprKind::NamedExpr(Box::new(target), Box::new(value)),
            ));
        }

        self.parse_test()
    }

    /// Parse a conditional expression or `lambda`
    fn parse_test(&mut self) -> ParseResult<'input, Expr> {
        if self.check(&Tok::Lambda) {
            return self.parse_lambda();
        }

        let start = self.current_pos();
        let body = self.parse_or_test()?;
        if !self.try_consume(&Tok::If) {
            return Ok(body);
        }

        let test = self.parse_or_test()?;
        self.expect(&Tok::Else)?;
        let orelse = self.parse_test()?;

        Ok(self.make_expr(
            start,
            ExprKind::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
        ))
    }

    /// Parse `lambda params: body`
    fn parse_lambda(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        self.expect(&Tok::Lambda)?;
        let params = self.parse_parameters(&Tok::Colon, false)?;
        self.expect(&Tok::Colon)?;
        let body = self.parse_test()?;

        Ok(self.make_expr(start, ExprKind::Lambda(Box::new(params), Box::new(body))))
    }

    /// Parse operands of `op` produced by `operand`, flattened into one
    /// [`ExprKind::BoolOp`]
    fn parse_bool_level(
        &mut self,
        op: BoolOp,
        token: &Tok<'_>,
        operand: fn(&mut Self) -> ParseResult<'input, Expr>,
    ) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let first = operand(self)?;
        if !self.check(token) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.try_consume(token) {
            values.push(operand(self)?);
        }

        Ok(self.make_expr(start, ExprKind::BoolOp(op, values)))
    }

    /// Parse `a or b`
    fn parse_or_test(&mut self) -> ParseResult<'input, Expr> {
        self.parse_bool_level(BoolOp::Or, &Tok::Or, Self::parse_and_test)
    }

    /// Parse `a and b`
    fn parse_and_test(&mut self) -> ParseResult<'input, Expr> {
        self.parse_bool_level(BoolOp::And, &Tok::And, Self::parse_not_test)
    }

    /// Parse `not a`
    fn parse_not_test(&mut self) -> ParseResult<'input, Expr> {
        if !self.check(&Tok::Not) {
            return self.parse_comparison();
        }

        let start = self.current_pos();
        self.advance();
        let operand = self.parse_not_test()?;
        Ok(self.make_expr(start, ExprKind::UnaryOp(UnaryOp::Not, Box::new(operand))))
    }

    /// Peek at a comparison operator, returning it with its token count
    fn peek_comparison(&self) -> Option<(CmpOp, usize)> {
        Some(match self.peek_kind()? {
            Tok::EqEq => (CmpOp::Eq, 1),
            Tok::NotEq => (CmpOp::NotEq, 1),
            Tok::Less => (CmpOp::Lt, 1),
            Tok::LessEq => (CmpOp::LtE, 1),
            Tok::Greater => (CmpOp::Gt, 1),
            Tok::GreaterEq => (CmpOp::GtE, 1),
            Tok::In => (CmpOp::In, 1),
            Tok::Not if matches!(self.peek_kind_at(1), Some(Tok::In)) => (CmpOp::NotIn, 2),
            Tok::Is if matches!(self.peek_kind_at(1), Some(Tok::Not)) => (CmpOp::IsNot, 2),
            Tok::Is => (CmpOp::Is, 1),
            _ => return None,
        })
    }

    /// Parse a possibly chained comparison
    fn parse_comparison(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let left = self.parse_bitor()?;

        let mut comparisons = Vec::new();
        while let Some((op, width)) = self.peek_comparison() {
            for _ in 0..width {
                self.advance();
            }
            comparisons.push((op, self.parse_bitor()?));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(self.make_expr(start, ExprKind::Compare(Box::new(left), comparisons)))
        }
    }

    /// Parse a left-associative binary operator level
    fn parse_binary_level(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<'input, Expr>,
        operator: fn(&Tok<'_>) -> Option<BinOp>,
    ) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let mut lhs = operand(self)?;

        while let Some(op) = self.peek_kind().and_then(operator) {
            self.advance();
            let rhs = operand(self)?;
            lhs = self.make_expr(start, ExprKind::BinOp(Box::new(lhs), op, Box::new(rhs)));
        }

        Ok(lhs)
    }

    /// Parse `a | b`
    fn parse_bitor(&mut self) -> ParseResult<'input, Expr> {
        self.parse_binary_level(Self::parse_bitxor, |tok| {
            matches!(tok, Tok::Pipe).then_some(BinOp::BitOr)
        })
    }

    /// Parse `a ^ b`
    fn parse_bitxor(&mut self) -> ParseResult<'input, Expr> {
        self.parse_binary_level(Self::parse_bitand, |tok| {
            matches!(tok, Tok::Caret).then_some(BinOp::BitXor)
        })
    }

    /// Parse `a & b`
    fn parse_bitand(&mut self) -> ParseResult<'input, Expr> {
        self.parse_binary_level(Self::parse_shift, |tok| {
            matches!(tok, Tok::Ampersand).then_some(BinOp::BitAnd)
        })
    }

    /// Parse `a << b` and `a >> b`
    fn parse_shift(&mut self) -> ParseResult<'input, Expr> {
        self.parse_binary_level(Self::parse_arith, |tok| match tok {
            Tok::LeftShift => Some(BinOp::LShift),
            Tok::RightShift => Some(BinOp::RShift),
            _ => None,
        })
    }

    /// Parse `a + b` and `a - b`
    fn parse_arith(&mut self) -> ParseResult<'input, Expr> {
        self.parse_binary_level(Self::parse_term, |tok| match tok {
            Tok::Plus => Some(BinOp::Add),
            Tok::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    /// Parse the multiplicative operators
    fn parse_term(&mut self) -> ParseResult<'input, Expr> {
        self.parse_binary_level(Self::parse_factor, |tok| match tok {
            Tok::Star => Some(BinOp::Mult),
            Tok::At => Some(BinOp::MatMult),
            Tok::Slash => Some(BinOp::Div),
            Tok::DoubleSlash => Some(BinOp::FloorDiv),
            Tok::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    /// Parse the prefix operators `+`, `-` and `~`
    fn parse_factor(&mut self) -> ParseResult<'input, Expr> {
        let op = match self.peek_kind() {
            Some(Tok::Plus) => UnaryOp::UAdd,
            Some(Tok::Minus) => UnaryOp::USub,
            Some(Tok::Tilde) => UnaryOp::Invert,
            _ => return self.parse_power(),
        };

        let start = self.current_pos();
        self.advance();
        let operand = self.parse_factor()?;
        Ok(self.make_expr(start, ExprKind::UnaryOp(op, Box::new(operand))))
    }

    /// Parse `a ** b`, which binds tighter than a unary operator on its left
    fn parse_power(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let base = self.parse_await_primary()?;
        if !self.try_consume(&Tok::DoubleStar) {
            return Ok(base);
        }

        let exponent = self.parse_factor()?;
        Ok(self.make_expr(
            start,
            ExprKind::BinOp(Box::new(base), BinOp::Pow, Box::new(exponent)),
        ))
    }

    /// Parse `await value`
    fn parse_await_primary(&mut self) -> ParseResult<'input, Expr> {
        if !self.check(&Tok::Await) {
            return self.parse_primary();
        }

        let start = self.current_pos();
        self.advance();
        let value = self.parse_primary()?;
        Ok(self.make_expr(start, ExprKind::Await(Box::new(value))))
    }

    /// Parse an atom followed by any calls, subscripts and attribute accesses
    fn parse_primary(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let mut expr = self.parse_atom()?;

        loop {
            let kind = if self.try_consume(&Tok::LeftParen) {
                let (args, keywords) = self.parse_call_arguments()?;
                ExprKind::Call {
                    func: Box::new(expr),
                    args,
                    keywords,
                }
            } else if self.try_consume(&Tok::LeftBracket) {
                let index = self.parse_subscript_list()?;
                self.expect(&Tok::RightBracket)?;
                ExprKind::Subscript(Box::new(expr), Box::new(index))
            } else if self.try_consume(&Tok::Dot) {
                ExprKind::Attribute(Box::new(expr), self.expect_identifier()?)
            } else {
                break;
            };
            expr = self.make_expr(start, kind);
        }

        Ok(expr)
    }

    /// Parse the arguments of a call (or class bases) after the `(`, including
    /// the closing `)`
    fn parse_call_arguments(&mut self) -> ParseResult<'input, (Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !self.check(&Tok::RightParen) {
            let start = self.current_pos();

            if self.check(&Tok::Star) {
                args.push(self.parse_starred()?);
            } else if self.try_consume(&Tok::DoubleStar) {
                keywords.push(Keyword {
                    name: None,
                    value: self.parse_test()?,
                });
            } else if matches!(self.peek_kind(), Some(Tok::Identifier(_)))
                && matches!(self.peek_kind_at(1), Some(Tok::Assign))
            {
                let name = self.expect_identifier()?;
                self.advance();
                keywords.push(Keyword {
                    name: Some(name),
                    value: self.parse_test()?,
                });
            } else {
                let value = self.parse_named_test()?;
                if self.check(&Tok::For) || self.check(&Tok::Async) {
                    let generators = self.parse_comprehension_clauses()?;
                    args.push(
                        self.make_expr(start, ExprKind::GeneratorExp(Box::new(value), generators)),
                    );
                } else {
                    args.push(value);
                }
            }

            if !self.try_consume(&Tok::Comma) {
                break;
            }
        }

        self.expect(&Tok::RightParen)?;
        Ok((args, keywords))
    }

    /// Parse the contents of `[...]` after a value
    fn parse_subscript_list(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let mut items = vec![self.parse_subscript_item()?];
        let mut trailing_comma = false;

        while self.try_consume(&Tok::Comma) {
            trailing_comma = true;
            if self.check(&Tok::RightBracket) {
                break;
            }
            items.push(self.parse_subscript_item()?);
            trailing_comma = false;
        }

        if items.len() == 1 && !trailing_comma {
            Ok(items.remove(0))
        } else {
            Ok(self.make_expr(start, ExprKind::Tuple(items)))
        }
    }

    /// Determine if the current token ends one part of a slice
    fn at_slice_end(&self) -> bool {
        self.check(&Tok::Colon) || self.check(&Tok::Comma) || self.check(&Tok::RightBracket)
    }

    /// Parse an index or a `lower:upper:step` slice
    fn parse_subscript_item(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();

        let lower = if self.check(&Tok::Colon) {
            None
        } else {
            let lower = self.parse_star_or_named()?;
            if !self.check(&Tok::Colon) {
                return Ok(lower);
            }
            Some(Box::new(lower))
        };

        self.expect(&Tok::Colon)?;
        let upper = if self.at_slice_end() {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };
        let step = if self.try_consume(&Tok::Colon) && !self.at_slice_end() {
            Some(Box::new(self.parse_test()?))
        } else {
            None
        };

        Ok(self.make_expr(start, ExprKind::Slice { lower, upper, step }))
    }

    /// Parse the `for ... in ... if ...` clauses of a comprehension
    fn parse_comprehension_clauses(&mut self) -> ParseResult<'input, Vec<Comprehension>> {
        let mut generators = Vec::new();

        loop {
            let is_async = self.try_consume(&Tok::Async);
            if !self.try_consume(&Tok::For) {
                if is_async {
                    return Err(self.unexpected(&["for"]));
                }
                break;
            }

            let target = self.parse_target_list()?;
            Self::ensure_assignable(&target)?;
            self.expect(&Tok::In)?;
            let iter = self.parse_or_test()?;

            let mut ifs = Vec::new();
            while self.try_consume(&Tok::If) {
                ifs.push(self.parse_or_test()?);
            }

            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
        }

        Ok(generators)
    }

    /// Determine if a comprehension clause starts at the current token
    fn at_comprehension(&self) -> bool {
        self.check(&Tok::For)
            || (self.check(&Tok::Async) && matches!(self.peek_kind_at(1), Some(Tok::For)))
    }

    /// Parse the remaining items of a display after its first item, up to and
    /// including `closing`
    fn parse_display_items(
        &mut self,
        first: Expr,
        closing: &Tok<'_>,
    ) -> ParseResult<'input, Vec<Expr>> {
        let mut items = vec![first];
        while self.try_consume(&Tok::Comma) {
            if self.check(closing) {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect(closing)?;
        Ok(items)
    }

    /// Parse a parenthesized expression, tuple or generator expression
    fn parse_parenthesized(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        self.expect(&Tok::LeftParen)?;

        if self.try_consume(&Tok::RightParen) {
            return Ok(self.make_expr(start, ExprKind::Tuple(Vec::new())));
        }
        if self.check(&Tok::Yield) {
            let value = self.parse_yield()?;
            self.expect(&Tok::RightParen)?;
            return Ok(value);
        }

        let first = self.parse_star_or_named()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&Tok::RightParen)?;
            return Ok(self.make_expr(start, ExprKind::GeneratorExp(Box::new(first), generators)));
        }
        if self.try_consume(&Tok::RightParen) {
            return Ok(first);
        }

        let items = self.parse_display_items(first, &Tok::RightParen)?;
        Ok(self.make_expr(start, ExprKind::Tuple(items)))
    }

    /// Parse a list display or list comprehension
    fn parse_list(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        self.expect(&Tok::LeftBracket)?;

        if self.try_consume(&Tok::RightBracket) {
            return Ok(self.make_expr(start, ExprKind::List(Vec::new())));
        }

        let first = self.parse_star_or_named()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&Tok::RightBracket)?;
            return Ok(self.make_expr(start, ExprKind::ListComp(Box::new(first), generators)));
        }

        let items = self.parse_display_items(first, &Tok::RightBracket)?;
        Ok(self.make_expr(start, ExprKind::List(items)))
    }

    /// Parse one `key: value` or `**mapping` entry of a dictionary display
    fn parse_dict_item(&mut self) -> ParseResult<'input, DictItem> {
        if self.try_consume(&Tok::DoubleStar) {
            return Ok(DictItem::Unpack(self.parse_bitor()?));
        }

        let key = self.parse_test()?;
        self.expect(&Tok::Colon)?;
        Ok(DictItem::Pair(key, self.parse_test()?))
    }

    /// Parse a dictionary or set display, or one of their comprehensions
    fn parse_braced(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        self.expect(&Tok::LeftBrace)?;

        if self.try_consume(&Tok::RightBrace) {
            return Ok(self.make_expr(start, ExprKind::Dict(Vec::new())));
        }

        let first = if self.check(&Tok::DoubleStar) {
            self.parse_dict_item()?
        } else {
            let key = self.parse_star_or_named()?;
            if !self.try_consume(&Tok::Colon) {
                // a set
                if self.at_comprehension() {
                    let generators = self.parse_comprehension_clauses()?;
                    self.expect(&Tok::RightBrace)?;
                    return Ok(
                        self.make_expr(start, ExprKind::SetComp(Box::new(key), generators))
                    );
                }
                let items = self.parse_display_items(key, &Tok::RightBrace)?;
                return Ok(self.make_expr(start, ExprKind::Set(items)));
            }

            let value = self.parse_test()?;
            if self.at_comprehension() {
                let generators = self.parse_comprehension_clauses()?;
                self.expect(&Tok::RightBrace)?;
                return Ok(self.make_expr(
                    start,
                    ExprKind::DictComp(Box::new(key), Box::new(value), generators),
                ));
            }
            DictItem::Pair(key, value)
        };

        let mut items = vec![first];
        while self.try_consume(&Tok::Comma) {
            if self.check(&Tok::RightBrace) {
                break;
            }
            items.push(self.parse_dict_item()?);
        }
        self.expect(&Tok::RightBrace)?;

        Ok(self.make_expr(start, ExprKind::Dict(items)))
    }

    /// Parse adjacent string literals, which concatenate into one constant
    fn parse_strings(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();
        let mut value = String::new();
        let mut is_bytes = false;

        while let Some(Tok::StringLiteral(literal)) = self.peek_kind() {
            value.push_str(&literal.value);
            is_bytes |= literal.kind == StringKind::Bytes;
            self.advance();
        }

        let constant = if is_bytes {
            Constant::Bytes(value)
        } else {
            Constant::Str(value)
        };
        Ok(self.make_expr(start, ExprKind::Constant(constant)))
    }

    /// Parse an atom: a name, a literal or a bracketed construct
    fn parse_atom(&mut self) -> ParseResult<'input, Expr> {
        let start = self.current_pos();

        let kind = match self.peek_kind() {
            Some(Tok::LeftParen) => return self.parse_parenthesized(),
            Some(Tok::LeftBracket) => return self.parse_list(),
            Some(Tok::LeftBrace) => return self.parse_braced(),
            Some(Tok::StringLiteral(_)) => return self.parse_strings(),
            Some(Tok::Identifier(name)) => ExprKind::Name((*name).to_string()),
            Some(Tok::NumberLiteral(number)) => ExprKind::Constant(match number {
                NumberLiteral::Integer(text) => Constant::Int((*text).to_string()),
                NumberLiteral::Float(text) => Constant::Float((*text).to_string()),
                NumberLiteral::Imaginary(text) => Constant::Complex((*text).to_string()),
            }),
            Some(Tok::None) => ExprKind::Constant(Constant::None),
            Some(Tok::True) => ExprKind::Constant(Constant::Bool(true)),
            Some(Tok::False) => ExprKind::Constant(Constant::Bool(false)),
            Some(Tok::Ellipsis) => ExprKind::Constant(Constant::Ellipsis),
            _ => return Err(self.unexpected(&["expression"])),
        };

        self.advance();
        Ok(self.make_expr(start, kind))
    }
}
