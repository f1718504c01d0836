//! Tokens and lexical errors
//!
//! This module contains the token types and lexical error types for the Python
//! lexer. The actual lexer implementation is in [`crate::python_lexer`].

use derive_more::Display;

/// An error encountered during lexing. You will usually find this wrapped in a
/// [`Spanned<LexicalError>`](dtc_utils::span::Spanned).
///
/// Does not implement [`std::error::Error`] because it should be converted to a
/// [`dtc_diagnostics::Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexicalError<'input> {
    /// An unknown token was encountered.
    UnknownToken(&'input str),
    /// A string literal was left unterminated.
    UnterminatedStringLiteral,
    /// A dedent returned to a column that no enclosing block was indented to.
    InconsistentDedent,
}

/// A valid number literal in Python
///
/// The text is kept exactly as written (underscores and radix prefixes
/// included), since the checker only ever needs to know which kind of number a
/// literal is.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum NumberLiteral<'input> {
    /// An integer literal in any radix, e.g. `42`, `0x_ff` or `0b1010`
    #[display("{_0}")]
    Integer(&'input str),
    /// A floating point literal, e.g. `1.5`, `.5` or `1e10`
    #[display("{_0}")]
    Float(&'input str),
    /// An imaginary literal, e.g. `3j` or `1.5J`
    #[display("{_0}")]
    Imaginary(&'input str),
}
impl<'input> NumberLiteral<'input> {
    /// Get the text content of this [`NumberLiteral`]
    #[must_use]
    pub const fn text_content(&self) -> &'input str {
        match self {
            Self::Integer(n) | Self::Float(n) | Self::Imaginary(n) => n,
        }
    }
}

/// The kind of value a string literal evaluates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// A `str`, including `u''` and raw strings
    Text,
    /// A `bytes` literal (`b''`, `rb''`)
    Bytes,
    /// A formatted string literal (`f''`). Replacement fields are kept in
    /// its value as written.
    Formatted,
}

/// A string or bytes literal
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{raw}")]
pub struct StringLiteral<'input> {
    /// The complete literal as written, including prefix and quotes
    pub raw: &'input str,
    /// The value with escape sequences processed
    pub value: String,
    /// What the literal evaluates to
    pub kind: StringKind,
}

/// Enum representing all of the result tokens in the Python lexer
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Tok<'input> {
    // === LAYOUT ===
    /// The end of a logical line
    #[display("NEWLINE")]
    Newline,
    /// An increase in indentation
    #[display("INDENT")]
    Indent,
    /// A decrease in indentation
    #[display("DEDENT")]
    Dedent,

    // === ARITHMETIC OPERATORS ===
    /// The token `+`
    #[display("+")]
    Plus,
    /// The token `-`
    #[display("-")]
    Minus,
    /// The token `*`
    #[display("*")]
    Star,
    /// The token `**`
    #[display("**")]
    DoubleStar,
    /// The token `/`
    #[display("/")]
    Slash,
    /// The token `//`
    #[display("//")]
    DoubleSlash,
    /// The token `%`
    #[display("%")]
    Percent,
    /// The token `@`
    #[display("@")]
    At,

    // === BITWISE OPERATORS ===
    /// The token `&`
    #[display("&")]
    Ampersand,
    /// The token `|`
    #[display("|")]
    Pipe,
    /// The token `^`
    #[display("^")]
    Caret,
    /// The token `~`
    #[display("~")]
    Tilde,
    /// The token `<<`
    #[display("<<")]
    LeftShift,
    /// The token `>>`
    #[display(">>")]
    RightShift,

    // === COMPARISON OPERATORS ===
    /// The token `==`
    #[display("==")]
    EqEq,
    /// The token `!=`
    #[display("!=")]
    NotEq,
    /// The token `>`
    #[display(">")]
    Greater,
    /// The token `>=`
    #[display(">=")]
    GreaterEq,
    /// The token `<`
    #[display("<")]
    Less,
    /// The token `<=`
    #[display("<=")]
    LessEq,

    // === ASSIGNMENT ===
    /// The token `=`
    #[display("=")]
    Assign,
    /// The token `:=`
    #[display(":=")]
    Walrus,
    /// An augmented assignment such as `+=`. The payload is the operator
    /// without its `=`.
    #[display("{_0}=")]
    AugAssign(&'static str),

    // === DELIMITERS ===
    /// The token `(`
    #[display("(")]
    LeftParen,
    /// The token `)`
    #[display(")")]
    RightParen,
    /// The token `[`
    #[display("[")]
    LeftBracket,
    /// The token `]`
    #[display("]")]
    RightBracket,
    /// The token `{`
    #[display("{{")]
    LeftBrace,
    /// The token `}`
    #[display("}}")]
    RightBrace,
    /// The token `,`
    #[display(",")]
    Comma,
    /// The token `:`
    #[display(":")]
    Colon,
    /// The token `;`
    #[display(";")]
    Semicolon,
    /// The token `.`
    #[display(".")]
    Dot,
    /// The token `...`
    #[display("...")]
    Ellipsis,
    /// The token `->`
    #[display("->")]
    Arrow,

    // === KEYWORDS ===
    /// The keyword `False`
    #[display("False")]
    False,
    /// The keyword `None`
    #[display("None")]
    None,
    /// The keyword `True`
    #[display("True")]
    True,
    /// The keyword `and`
    #[display("and")]
    And,
    /// The keyword `as`
    #[display("as")]
    As,
    /// The keyword `assert`
    #[display("assert")]
    Assert,
    /// The keyword `async`
    #[display("async")]
    Async,
    /// The keyword `await`
    #[display("await")]
    Await,
    /// The keyword `break`
    #[display("break")]
    Break,
    /// The keyword `class`
    #[display("class")]
    Class,
    /// The keyword `continue`
    #[display("continue")]
    Continue,
    /// The keyword `def`
    #[display("def")]
    Def,
    /// The keyword `del`
    #[display("del")]
    Del,
    /// The keyword `elif`
    #[display("elif")]
    Elif,
    /// The keyword `else`
    #[display("else")]
    Else,
    /// The keyword `except`
    #[display("except")]
    Except,
    /// The keyword `finally`
    #[display("finally")]
    Finally,
    /// The keyword `for`
    #[display("for")]
    For,
    /// The keyword `from`
    #[display("from")]
    From,
    /// The keyword `global`
    #[display("global")]
    Global,
    /// The keyword `if`
    #[display("if")]
    If,
    /// The keyword `import`
    #[display("import")]
    Import,
    /// The keyword `in`
    #[display("in")]
    In,
    /// The keyword `is`
    #[display("is")]
    Is,
    /// The keyword `lambda`
    #[display("lambda")]
    Lambda,
    /// The keyword `nonlocal`
    #[display("nonlocal")]
    Nonlocal,
    /// The keyword `not`
    #[display("not")]
    Not,
    /// The keyword `or`
    #[display("or")]
    Or,
    /// The keyword `pass`
    #[display("pass")]
    Pass,
    /// The keyword `raise`
    #[display("raise")]
    Raise,
    /// The keyword `return`
    #[display("return")]
    Return,
    /// The keyword `try`
    #[display("try")]
    Try,
    /// The keyword `while`
    #[display("while")]
    While,
    /// The keyword `with`
    #[display("with")]
    With,
    /// The keyword `yield`
    #[display("yield")]
    Yield,

    // === LITERALS ===
    /// Any identifier
    #[display("{_0}")]
    Identifier(&'input str),
    /// Any number literal
    #[display("{_0}")]
    NumberLiteral(NumberLiteral<'input>),
    /// Any string or bytes literal
    #[display("{_0}")]
    StringLiteral(StringLiteral<'input>),
}
impl<'input> Tok<'input> {
    /// Resolve an identifier-shaped word to its keyword token, if it is one
    #[must_use]
    pub fn keyword_or_identifier(word: &'input str) -> Self {
        match word {
            "False" => Self::False,
            "None" => Self::None,
            "True" => Self::True,
            "and" => Self::And,
            "as" => Self::As,
            "assert" => Self::Assert,
            "async" => Self::Async,
            "await" => Self::Await,
            "break" => Self::Break,
            "class" => Self::Class,
            "continue" => Self::Continue,
            "def" => Self::Def,
            "del" => Self::Del,
            "elif" => Self::Elif,
            "else" => Self::Else,
            "except" => Self::Except,
            "finally" => Self::Finally,
            "for" => Self::For,
            "from" => Self::From,
            "global" => Self::Global,
            "if" => Self::If,
            "import" => Self::Import,
            "in" => Self::In,
            "is" => Self::Is,
            "lambda" => Self::Lambda,
            "nonlocal" => Self::Nonlocal,
            "not" => Self::Not,
            "or" => Self::Or,
            "pass" => Self::Pass,
            "raise" => Self::Raise,
            "return" => Self::Return,
            "try" => Self::Try,
            "while" => Self::While,
            "with" => Self::With,
            "yield" => Self::Yield,
            _ => Self::Identifier(word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(Tok::keyword_or_identifier("def"), Tok::Def);
        assert_eq!(Tok::keyword_or_identifier("None"), Tok::None);
        assert_eq!(
            Tok::keyword_or_identifier("none"),
            Tok::Identifier("none")
        );
    }

    #[test]
    fn tokens_display_as_written() {
        assert_eq!(Tok::AugAssign("//").to_string(), "//=");
        assert_eq!(Tok::LeftBrace.to_string(), "{");
        assert_eq!(Tok::Dedent.to_string(), "DEDENT");
        assert_eq!(
            Tok::NumberLiteral(NumberLiteral::Float("1_0.5")).to_string(),
            "1_0.5"
        );
    }
}
