//! Hand-written lexer for Python source
//!
//! This module scans through the input text and produces tokens, including the
//! `NEWLINE`, `INDENT` and `DEDENT` layout tokens that carry Python's block
//! structure. Newlines inside brackets and after a `\` are joined away, blank
//! lines and comment-only lines produce no tokens at all, and the end of the
//! input always closes the last logical line and every open block.

use std::collections::VecDeque;

use dtc_utils::span::{SourceId, Span, Spannable, Spanned};

use crate::lexer::{LexicalError, NumberLiteral, StringKind, StringLiteral, Tok};

/// Shorthand for the item type yielded by the lexer
type LexResult<'input> = Spanned<Result<Tok<'input>, LexicalError<'input>>>;

/// A hand-written lexer for Python
#[derive(Debug, Clone)]
pub struct PythonLexer<'input> {
    /// The input source code
    input: &'input str,
    /// Current position in the input (byte offset)
    pos: usize,
    /// The source unit used for span creation
    source: SourceId,
    /// Columns of every open block. Never empty, the bottom is always `0`.
    indent_stack: Vec<usize>,
    /// How many brackets are currently open
    paren_depth: usize,
    /// Whether the next token would start a new logical line
    at_line_start: bool,
    /// Tokens produced but not yet yielded
    pending: VecDeque<LexResult<'input>>,
    /// Whether the end of the input has been processed
    finished: bool,
}

impl<'input> PythonLexer<'input> {
    /// Create a new [`PythonLexer`] given an input string and its source unit
    #[must_use]
    pub fn new(input: &'input str, source: SourceId) -> Self {
        Self {
            input,
            pos: 0,
            source,
            indent_stack: vec![0],
            paren_depth: 0,
            at_line_start: true,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Peek at the current character without consuming it
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    /// Check if we're at the end of input
    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Advance by one character and return it
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume `expected` if it is the next character
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Create a [`Span`] in this lexer's source unit
    fn span(&self, start: usize, end: usize) -> Span {
        Span::from_positions_and_source(start, end, self.source)
    }

    /// Queue a token with the given bounds
    fn push(&mut self, start: usize, end: usize, token: Result<Tok<'input>, LexicalError<'input>>) {
        let span = self.span(start, end);
        self.pending.push_back(token.in_span(span));
    }

    /// Consume a line terminator (`\n`, `\r\n` or `\r`) if one is next
    fn eat_newline(&mut self) -> bool {
        if self.eat('\n') {
            return true;
        }
        if self.eat('\r') {
            self.eat('\n');
            return true;
        }
        false
    }

    /// Consume a comment up to, but not including, the end of its line
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance();
        }
    }

    /// Consume leading whitespace and return the column it reaches
    fn measure_indentation(&mut self) -> usize {
        let mut col = 0;
        loop {
            match self.peek() {
                Some(' ') => col += 1,
                Some('\t') => col = (col / 8 + 1) * 8,
                Some('\x0c') => col = 0,
                _ => return col,
            }
            self.advance();
        }
    }

    /// Skip blank and comment-only lines, then emit the `INDENT`/`DEDENT`
    /// tokens for the first line that contains code
    fn start_logical_line(&mut self) {
        loop {
            let col = self.measure_indentation();
            match self.peek() {
                None => return,
                Some('#') => self.skip_comment(),
                Some('\n' | '\r') => {
                    self.eat_newline();
                }
                Some(_) => {
                    self.apply_indentation(col);
                    self.at_line_start = false;
                    return;
                }
            }
        }
    }

    /// Compare `col` against the open blocks and queue layout tokens
    fn apply_indentation(&mut self, col: usize) {
        let here = self.pos;
        let top = self.indent_stack.last().copied().unwrap_or(0);

        if col > top {
            self.indent_stack.push(col);
            self.push(here, here, Ok(Tok::Indent));
            return;
        }

        while let Some(&open) = self.indent_stack.last() {
            if open <= col {
                break;
            }
            self.indent_stack.pop();
            self.push(here, here, Ok(Tok::Dedent));
        }

        if self.indent_stack.last().copied().unwrap_or(0) != col {
            self.push(here, here, Err(LexicalError::InconsistentDedent));
        }
    }

    /// Skip whitespace, comments and joined lines within a logical line
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\x0c') => {
                    self.advance();
                }
                Some('#') => self.skip_comment(),
                Some('\\') if matches!(self.peek_ahead(1), Some('\n' | '\r')) => {
                    self.advance();
                    self.eat_newline();
                }
                Some('\n' | '\r') if self.paren_depth > 0 => {
                    self.eat_newline();
                }
                _ => return,
            }
        }
    }

    /// Close the last logical line and every open block
    fn finish(&mut self) {
        let end = self.input.len();
        if !self.at_line_start {
            self.push(end, end, Ok(Tok::Newline));
            self.at_line_start = true;
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(end, end, Ok(Tok::Dedent));
        }
        self.finished = true;
    }

    /// Produce the next batch of tokens into the pending queue
    fn lex_next(&mut self) {
        if self.at_line_start && self.paren_depth == 0 {
            self.start_logical_line();
            if !self.pending.is_empty() {
                return;
            }
        }

        self.skip_trivia();

        if self.is_eof() {
            self.finish();
            return;
        }

        let start = self.pos;
        if self.eat_newline() {
            self.at_line_start = true;
            self.push(start, self.pos, Ok(Tok::Newline));
            return;
        }

        let token = self.read_token();
        self.push(start, self.pos, token);
    }

    /// Read a single non-layout token
    fn read_token(&mut self) -> Result<Tok<'input>, LexicalError<'input>> {
        let start = self.pos;
        match self.peek() {
            Some('\'' | '"') => self.read_string(start, ""),
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_word(),
            Some(ch) if ch.is_ascii_digit() => Ok(self.read_number()),
            Some('.') if self.peek_ahead(1).is_some_and(|ch| ch.is_ascii_digit()) => {
                Ok(self.read_number())
            }
            _ => self.read_operator_or_punctuation(),
        }
    }

    /// Read an identifier, keyword, or a string literal with a prefix
    fn read_word(&mut self) -> Result<Tok<'input>, LexicalError<'input>> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let word = &self.input[start..self.pos];
        if matches!(self.peek(), Some('\'' | '"')) && is_string_prefix(word) {
            return self.read_string(start, word);
        }

        Ok(Tok::keyword_or_identifier(word))
    }

    /// Read a string literal whose opening quote is the next character
    fn read_string(
        &mut self,
        start: usize,
        prefix: &str,
    ) -> Result<Tok<'input>, LexicalError<'input>> {
        let prefix = prefix.to_ascii_lowercase();
        let is_raw = prefix.contains('r');
        let kind = if prefix.contains('b') {
            StringKind::Bytes
        } else if prefix.contains('f') {
            StringKind::Formatted
        } else {
            StringKind::Text
        };

        let quote = self
            .advance()
            .ok_or(LexicalError::UnterminatedStringLiteral)?;
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(LexicalError::UnterminatedStringLiteral),
                Some(ch) if ch == quote => {
                    if !triple {
                        self.advance();
                        break;
                    }
                    if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                    value.push(ch);
                }
                // the newline is left for the layout logic to pick up
                Some('\n' | '\r') if !triple => {
                    return Err(LexicalError::UnterminatedStringLiteral)
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self
                        .advance()
                        .ok_or(LexicalError::UnterminatedStringLiteral)?;
                    if is_raw {
                        value.push('\\');
                        value.push(escaped);
                    } else {
                        self.push_escape(escaped, &mut value);
                    }
                }
                Some(ch) => {
                    self.advance();
                    value.push(ch);
                }
            }
        }

        Ok(Tok::StringLiteral(StringLiteral {
            raw: &self.input[start..self.pos],
            value,
            kind,
        }))
    }

    /// Append the character an escape sequence (whose `\` and first character
    /// were already consumed) stands for
    ///
    /// Unknown escapes are kept verbatim, as Python does.
    fn push_escape(&mut self, escaped: char, value: &mut String) {
        let resolved = match escaped {
            '\n' => return,
            '\r' => {
                self.eat('\n');
                return;
            }
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '\\' | '\'' | '"' => escaped,
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|ch| ch.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.advance();
                        }
                        None => break,
                    }
                }
                char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            'x' | 'u' | 'U' => {
                let digits = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                if let Some(ch) = self.read_hex_escape(digits) {
                    ch
                } else {
                    value.push('\\');
                    value.push(escaped);
                    return;
                }
            }
            other => {
                value.push('\\');
                value.push(other);
                return;
            }
        };
        value.push(resolved);
    }

    /// Read exactly `digits` hex digits as a code point, consuming nothing if
    /// they are not all present
    fn read_hex_escape(&mut self, digits: usize) -> Option<char> {
        let text = self.input.get(self.pos..self.pos + digits)?;
        if !text.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        let ch = u32::from_str_radix(text, 16).ok().and_then(char::from_u32)?;
        self.pos += digits;
        Some(ch)
    }

    /// Consume a run of decimal digits and underscores
    fn skip_digits(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a number literal (integer in any radix, float, or imaginary)
    fn read_number(&mut self) -> Tok<'input> {
        let start = self.pos;

        if self.peek() == Some('0')
            && matches!(self.peek_ahead(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'))
        {
            self.advance();
            self.advance();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_hexdigit() || ch == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
            return Tok::NumberLiteral(NumberLiteral::Integer(&self.input[start..self.pos]));
        }

        let mut is_float = false;
        self.skip_digits();

        if self.peek() == Some('.') && self.peek_ahead(1) != Some('.') {
            self.advance();
            self.skip_digits();
            is_float = true;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_ahead(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self
                .peek_ahead(digit_at)
                .is_some_and(|ch| ch.is_ascii_digit())
            {
                self.advance();
                if signed {
                    self.advance();
                }
                self.skip_digits();
                is_float = true;
            }
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            self.advance();
            return Tok::NumberLiteral(NumberLiteral::Imaginary(&self.input[start..self.pos]));
        }

        let text = &self.input[start..self.pos];
        Tok::NumberLiteral(if is_float {
            NumberLiteral::Float(text)
        } else {
            NumberLiteral::Integer(text)
        })
    }

    /// Read an operator or punctuation token
    fn read_operator_or_punctuation(&mut self) -> Result<Tok<'input>, LexicalError<'input>> {
        let start = self.pos;
        let ch = self.advance().ok_or(LexicalError::UnknownToken(""))?;

        let token = match ch {
            '+' if self.eat('=') => Tok::AugAssign("+"),
            '+' => Tok::Plus,
            '-' if self.eat('=') => Tok::AugAssign("-"),
            '-' if self.eat('>') => Tok::Arrow,
            '-' => Tok::Minus,
            '*' if self.eat('*') => {
                if self.eat('=') {
                    Tok::AugAssign("**")
                } else {
                    Tok::DoubleStar
                }
            }
            '*' if self.eat('=') => Tok::AugAssign("*"),
            '*' => Tok::Star,
            '/' if self.eat('/') => {
                if self.eat('=') {
                    Tok::AugAssign("//")
                } else {
                    Tok::DoubleSlash
                }
            }
            '/' if self.eat('=') => Tok::AugAssign("/"),
            '/' => Tok::Slash,
            '%' if self.eat('=') => Tok::AugAssign("%"),
            '%' => Tok::Percent,
            '@' if self.eat('=') => Tok::AugAssign("@"),
            '@' => Tok::At,
            '&' if self.eat('=') => Tok::AugAssign("&"),
            '&' => Tok::Ampersand,
            '|' if self.eat('=') => Tok::AugAssign("|"),
            '|' => Tok::Pipe,
            '^' if self.eat('=') => Tok::AugAssign("^"),
            '^' => Tok::Caret,
            '~' => Tok::Tilde,
            '<' if self.eat('<') => {
                if self.eat('=') {
                    Tok::AugAssign("<<")
                } else {
                    Tok::LeftShift
                }
            }
            '<' if self.eat('=') => Tok::LessEq,
            '<' => Tok::Less,
            '>' if self.eat('>') => {
                if self.eat('=') {
                    Tok::AugAssign(">>")
                } else {
                    Tok::RightShift
                }
            }
            '>' if self.eat('=') => Tok::GreaterEq,
            '>' => Tok::Greater,
            '=' if self.eat('=') => Tok::EqEq,
            '=' => Tok::Assign,
            '!' if self.eat('=') => Tok::NotEq,
            ':' if self.eat('=') => Tok::Walrus,
            ':' => Tok::Colon,
            ',' => Tok::Comma,
            ';' => Tok::Semicolon,
            '.' if self.peek() == Some('.') && self.peek_ahead(1) == Some('.') => {
                self.advance();
                self.advance();
                Tok::Ellipsis
            }
            '.' => Tok::Dot,
            '(' | '[' | '{' => {
                self.paren_depth += 1;
                match ch {
                    '(' => Tok::LeftParen,
                    '[' => Tok::LeftBracket,
                    _ => Tok::LeftBrace,
                }
            }
            ')' | ']' | '}' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                match ch {
                    ')' => Tok::RightParen,
                    ']' => Tok::RightBracket,
                    _ => Tok::RightBrace,
                }
            }
            _ => return Err(LexicalError::UnknownToken(&self.input[start..self.pos])),
        };

        Ok(token)
    }
}

/// Determine if `word` is a valid string literal prefix
fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

impl<'input> Iterator for PythonLexer<'input> {
    type Item = LexResult<'input>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            self.lex_next();
        }
    }
}

#[cfg(test)]
mod tests {
    use dtc_utils::spanned;

    use super::*;

    /// Lex `input` and return only the token values, failing on any error
    fn kinds(input: &str) -> Vec<Tok<'_>> {
        PythonLexer::new(input, SourceId::new(0))
            .map(|x| x.transpose().expect("lexing should succeed").into_value())
            .collect()
    }

    #[test]
    fn simple_function_has_layout_tokens() {
        assert_eq!(
            kinds("def f(x):\n    return x\n"),
            vec![
                Tok::Def,
                Tok::Identifier("f"),
                Tok::LeftParen,
                Tok::Identifier("x"),
                Tok::RightParen,
                Tok::Colon,
                Tok::Newline,
                Tok::Indent,
                Tok::Return,
                Tok::Identifier("x"),
                Tok::Newline,
                Tok::Dedent,
            ]
        );
    }

    #[test]
    fn spans_point_at_source_text() {
        let tokens: Vec<_> = PythonLexer::new("a = 10\n", SourceId::new(3))
            .map(|x| x.transpose().expect("lexing should succeed"))
            .collect();

        assert_eq!(
            tokens,
            vec![
                spanned!(0, Tok::Identifier("a"), 1, SourceId::new(3)),
                spanned!(2, Tok::Assign, 3, SourceId::new(3)),
                spanned!(
                    4,
                    Tok::NumberLiteral(NumberLiteral::Integer("10")),
                    6,
                    SourceId::new(3)
                ),
                spanned!(6, Tok::Newline, 7, SourceId::new(3)),
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(
            kinds("a\n\n   # comment\n# another\nb # trailing\n"),
            vec![
                Tok::Identifier("a"),
                Tok::Newline,
                Tok::Identifier("b"),
                Tok::Newline,
            ]
        );
    }

    #[test]
    fn missing_final_newline_is_supplied() {
        assert_eq!(
            kinds("if x:\n    y"),
            vec![
                Tok::If,
                Tok::Identifier("x"),
                Tok::Colon,
                Tok::Newline,
                Tok::Indent,
                Tok::Identifier("y"),
                Tok::Newline,
                Tok::Dedent,
            ]
        );
    }

    #[test]
    fn nested_blocks_dedent_together() {
        let tokens = kinds("if a:\n  if b:\n    c\nd\n");
        let dedents = tokens.iter().filter(|t| **t == Tok::Dedent).count();

        assert_eq!(dedents, 2);
        assert_eq!(
            &tokens[tokens.len() - 4..],
            &[Tok::Dedent, Tok::Dedent, Tok::Identifier("d"), Tok::Newline]
        );
    }

    #[test]
    fn brackets_and_backslashes_join_lines() {
        assert_eq!(
            kinds("x = [1,\n     2]\ny = 1 + \\\n    2\n"),
            vec![
                Tok::Identifier("x"),
                Tok::Assign,
                Tok::LeftBracket,
                Tok::NumberLiteral(NumberLiteral::Integer("1")),
                Tok::Comma,
                Tok::NumberLiteral(NumberLiteral::Integer("2")),
                Tok::RightBracket,
                Tok::Newline,
                Tok::Identifier("y"),
                Tok::Assign,
                Tok::NumberLiteral(NumberLiteral::Integer("1")),
                Tok::Plus,
                Tok::NumberLiteral(NumberLiteral::Integer("2")),
                Tok::Newline,
            ]
        );
    }

    #[test]
    fn inconsistent_dedent_is_an_error() {
        let tokens: Vec<_> = PythonLexer::new("if a:\n    b\n  c\n", SourceId::new(0))
            .map(Spanned::into_value)
            .collect();

        assert!(tokens.contains(&Err(LexicalError::InconsistentDedent)));
    }

    #[test]
    fn numbers_are_classified() {
        assert_eq!(
            kinds("1_000 0xff 0b10 1.5 .5 1e10 2E-3 3j 1.5J 7."),
            vec![
                Tok::NumberLiteral(NumberLiteral::Integer("1_000")),
                Tok::NumberLiteral(NumberLiteral::Integer("0xff")),
                Tok::NumberLiteral(NumberLiteral::Integer("0b10")),
                Tok::NumberLiteral(NumberLiteral::Float("1.5")),
                Tok::NumberLiteral(NumberLiteral::Float(".5")),
                Tok::NumberLiteral(NumberLiteral::Float("1e10")),
                Tok::NumberLiteral(NumberLiteral::Float("2E-3")),
                Tok::NumberLiteral(NumberLiteral::Imaginary("3j")),
                Tok::NumberLiteral(NumberLiteral::Imaginary("1.5J")),
                Tok::NumberLiteral(NumberLiteral::Float("7.")),
                Tok::Newline,
            ]
        );
    }

    #[test]
    fn string_prefixes_and_quotes() {
        let tokens = kinds(r#"'a' "b" b'c' rb'\d' f"{x}" u'e' '''f'g'''"#);
        let literals: Vec<_> = tokens
            .into_iter()
            .filter_map(|tok| match tok {
                Tok::StringLiteral(s) => Some((s.value, s.kind)),
                _ => None,
            })
            .collect();

        assert_eq!(
            literals,
            vec![
                ("a".to_string(), StringKind::Text),
                ("b".to_string(), StringKind::Text),
                ("c".to_string(), StringKind::Bytes),
                ("\\d".to_string(), StringKind::Bytes),
                ("{x}".to_string(), StringKind::Formatted),
                ("e".to_string(), StringKind::Text),
                ("f'g".to_string(), StringKind::Text),
            ]
        );
    }

    #[test]
    fn unterminated_triple_string_fails() {
        let tokens: Vec<_> = PythonLexer::new("'''abc", SourceId::new(0))
            .map(Spanned::into_value)
            .collect();

        assert_eq!(tokens[0], Err(LexicalError::UnterminatedStringLiteral));
    }

    #[test]
    fn escapes_are_processed() {
        let tokens = kinds(r"'a\tb\x41\u00e9\n\q'");
        let Some(Tok::StringLiteral(literal)) = tokens.first() else {
            panic!("expected a string literal");
        };

        assert_eq!(literal.value, "a\tbA\u{e9}\n\\q");
    }

    #[test]
    fn single_quoted_string_cannot_span_lines() {
        let tokens: Vec<_> = PythonLexer::new("x = 'abc\ny = 1\n", SourceId::new(0))
            .map(Spanned::into_value)
            .collect();

        assert!(tokens.contains(&Err(LexicalError::UnterminatedStringLiteral)));
        assert!(tokens.contains(&Ok(Tok::Identifier("y"))));
    }

    #[test]
    fn operators_use_longest_match() {
        assert_eq!(
            kinds("** **= // //= -> := ... != <<= >> @"),
            vec![
                Tok::DoubleStar,
                Tok::AugAssign("**"),
                Tok::DoubleSlash,
                Tok::AugAssign("//"),
                Tok::Arrow,
                Tok::Walrus,
                Tok::Ellipsis,
                Tok::NotEq,
                Tok::AugAssign("<<"),
                Tok::RightShift,
                Tok::At,
                Tok::Newline,
            ]
        );
    }

    #[test]
    fn unknown_characters_are_reported() {
        let tokens: Vec<_> = PythonLexer::new("a $ b", SourceId::new(0)).collect();

        assert_eq!(
            tokens[1],
            spanned!(2, Err(LexicalError::UnknownToken("$")), 3)
        );
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(kinds("").is_empty());
        assert!(kinds("\n\n# only a comment\n").is_empty());
    }
}
