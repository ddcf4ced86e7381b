//! A single-lookahead scanner for XPath 1.0 expressions.
//!
//! The scanner materializes exactly one lexeme at a time. Several lexical
//! ambiguities of the language can only be settled by looking at the
//! previous lexeme (XPath 1.0, section 3.7):
//!
//! - `*` is a name-test wildcard at the start of input or after an operator,
//!   `/`, `//`, `@`, `::`, `(`, `[`, `,` or `$`; anywhere else it multiplies.
//! - `or`, `and`, `div` and `mod` are operator keywords under the same rule
//!   and ordinary names otherwise.
//! - A name followed by `::` is an axis name (if it is one of the thirteen
//!   axes), and a name followed by `(` may be a function or node-type test.

use crate::ast::{Axis, Operator};
use crate::error::{AbbreviatedStep, ParseError, ParseErrorKind, Span};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// The kind of the current lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexKind {
    // Operators
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Union,
    // Structural
    Slash,
    SlashSlash,
    Dot,
    DotDot,
    ColonColon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    At,
    Dollar,
    /// `*` used as a name test.
    Star,
    // Literals
    Number,
    String,
    /// NameTest, NodeType, FunctionName, or the name of a variable reference.
    Name,
    /// An axis name; the `::` that follows is a separate lexeme.
    Axis,
    Eof,
    Unknown,
}

impl LexKind {
    /// The binary operator this lexeme denotes, if any.
    pub fn operator(self) -> Option<Operator> {
        let op = match self {
            LexKind::Or => Operator::Or,
            LexKind::And => Operator::And,
            LexKind::Eq => Operator::Eq,
            LexKind::Ne => Operator::Ne,
            LexKind::Lt => Operator::Lt,
            LexKind::Le => Operator::Le,
            LexKind::Gt => Operator::Gt,
            LexKind::Ge => Operator::Ge,
            LexKind::Plus => Operator::Plus,
            LexKind::Minus => Operator::Minus,
            LexKind::Multiply => Operator::Multiply,
            LexKind::Divide => Operator::Divide,
            LexKind::Modulo => Operator::Modulo,
            LexKind::Union => Operator::Union,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_operator(self) -> bool {
        self.operator().is_some()
    }
}

impl fmt::Display for LexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LexKind::Or => "or",
            LexKind::And => "and",
            LexKind::Eq => "=",
            LexKind::Ne => "!=",
            LexKind::Lt => "<",
            LexKind::Le => "<=",
            LexKind::Gt => ">",
            LexKind::Ge => ">=",
            LexKind::Plus => "+",
            LexKind::Minus => "-",
            LexKind::Multiply => "*",
            LexKind::Divide => "div",
            LexKind::Modulo => "mod",
            LexKind::Union => "|",
            LexKind::Slash => "/",
            LexKind::SlashSlash => "//",
            LexKind::Dot => ".",
            LexKind::DotDot => "..",
            LexKind::ColonColon => "::",
            LexKind::LParen => "(",
            LexKind::RParen => ")",
            LexKind::LBracket => "[",
            LexKind::RBracket => "]",
            LexKind::Comma => ",",
            LexKind::At => "@",
            LexKind::Dollar => "$",
            LexKind::Star => "*",
            LexKind::Number => "<number>",
            LexKind::String => "<string literal>",
            LexKind::Name => "<name>",
            LexKind::Axis => "<axis>",
            LexKind::Eof => "<eof>",
            LexKind::Unknown => "<unknown>",
        };
        f.write_str(text)
    }
}

/// A snapshot of one lexeme: its kind, its window, and its raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: LexKind,
    pub span: Span,
    pub text: &'a str,
}

// XML 1.0 (fifth edition) NameStartChar and NameChar, without ':'.
const NAME_START: &str = r"A-Z_a-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}\x{37F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}\x{10000}-\x{EFFFF}";
const NAME_EXTRA: &str = r"\-.0-9\x{B7}\x{300}-\x{36F}\x{203F}-\x{2040}";

static NCNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^[{NAME_START}][{NAME_START}{NAME_EXTRA}]*"))
        .expect("NCName pattern is a valid regex")
});

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/// Tokenizes `text` into a single-lookahead stream.
///
/// Construction decodes the first lexeme; [`Scanner::advance`] discards the
/// current lexeme and decodes the next one.
#[derive(Debug)]
pub struct Scanner<'a> {
    text: &'a str,
    cur: usize,
    kind: LexKind,
    lex_start: usize,
    prev_lex_end: usize,
    prev_kind: LexKind,
    prefix: &'a str,
    name: &'a str,
    string_value: &'a str,
    can_be_function: bool,
    axis: Option<Axis>,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Result<Self, ParseError> {
        Self::with_offset(text, 0)
    }

    /// Starts scanning at byte offset `start` (clamped to the text length).
    pub fn with_offset(text: &'a str, start: usize) -> Result<Self, ParseError> {
        let mut start = start.min(text.len());
        while !text.is_char_boundary(start) {
            start -= 1;
        }
        let mut scanner = Scanner {
            text,
            cur: start,
            kind: LexKind::Unknown,
            lex_start: start,
            prev_lex_end: start,
            prev_kind: LexKind::Unknown,
            prefix: "",
            name: "",
            string_value: "",
            can_be_function: false,
            axis: None,
        };
        scanner.advance()?;
        Ok(scanner)
    }

    pub fn source(&self) -> &'a str {
        self.text
    }

    pub fn kind(&self) -> LexKind {
        self.kind
    }

    pub fn lex_start(&self) -> usize {
        self.lex_start
    }

    pub fn lex_end(&self) -> usize {
        self.cur
    }

    /// End offset of the lexeme before the current one.
    pub fn prev_lex_end(&self) -> usize {
        self.prev_lex_end
    }

    pub fn span(&self) -> Span {
        Span::new(self.lex_start, self.cur)
    }

    /// Local part of a `Name` or `Axis` lexeme; `*` for `prefix:*`.
    pub fn name(&self) -> &'a str {
        debug_assert!(matches!(self.kind, LexKind::Name | LexKind::Axis));
        self.name
    }

    /// Prefix of a `Name` lexeme; empty when unqualified.
    pub fn prefix(&self) -> &'a str {
        debug_assert!(matches!(self.kind, LexKind::Name | LexKind::Axis));
        self.prefix
    }

    /// Decoded content of a `String` lexeme, without the quotes.
    pub fn string_value(&self) -> &'a str {
        debug_assert_eq!(self.kind, LexKind::String);
        self.string_value
    }

    /// True when the name is followed (possibly after whitespace) by `(`.
    pub fn can_be_function(&self) -> bool {
        debug_assert_eq!(self.kind, LexKind::Name);
        self.can_be_function
    }

    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    /// The raw text of the current lexeme, or `<eof>` at the end of input.
    pub fn raw_value(&self) -> String {
        if self.kind == LexKind::Eof {
            LexKind::Eof.to_string()
        } else {
            self.text[self.lex_start..self.cur].to_string()
        }
    }

    pub fn lexeme(&self) -> Lexeme<'a> {
        Lexeme {
            kind: self.kind,
            span: self.span(),
            text: &self.text[self.lex_start..self.cur],
        }
    }

    fn cur_char(&self) -> Option<char> {
        self.text[self.cur..].chars().next()
    }

    fn next_char(&mut self) {
        if let Some(ch) = self.cur_char() {
            self.cur += ch.len_utf8();
        }
    }

    fn skip_space(&mut self) {
        while self.cur_char().is_some_and(is_whitespace) {
            self.next_char();
        }
    }

    /// Discards the current lexeme and decodes the next one.
    pub fn advance(&mut self) -> Result<(), ParseError> {
        self.prev_lex_end = self.cur;
        self.prev_kind = self.kind;
        self.skip_space();
        self.lex_start = self.cur;

        let Some(ch) = self.cur_char() else {
            self.kind = LexKind::Eof;
            return Ok(());
        };

        match ch {
            '(' | ')' | '[' | ']' | '@' | ',' | '$' => {
                self.kind = match ch {
                    '(' => LexKind::LParen,
                    ')' => LexKind::RParen,
                    '[' => LexKind::LBracket,
                    ']' => LexKind::RBracket,
                    '@' => LexKind::At,
                    ',' => LexKind::Comma,
                    _ => LexKind::Dollar,
                };
                self.next_char();
            }
            '.' => {
                self.next_char();
                match self.cur_char() {
                    Some('.') => {
                        self.kind = LexKind::DotDot;
                        self.next_char();
                    }
                    Some(d) if d.is_ascii_digit() => {
                        self.cur = self.lex_start;
                        self.kind = LexKind::Number;
                        self.scan_number()?;
                    }
                    _ => self.kind = LexKind::Dot,
                }
            }
            ':' => {
                self.next_char();
                if self.cur_char() == Some(':') {
                    self.kind = LexKind::ColonColon;
                    self.next_char();
                } else {
                    self.kind = LexKind::Unknown;
                }
            }
            '*' => {
                self.kind = LexKind::Star;
                self.next_char();
                self.check_operator(true);
            }
            '/' => {
                self.next_char();
                if self.cur_char() == Some('/') {
                    self.kind = LexKind::SlashSlash;
                    self.next_char();
                } else {
                    self.kind = LexKind::Slash;
                }
            }
            '|' => self.single(LexKind::Union),
            '+' => self.single(LexKind::Plus),
            '-' => self.single(LexKind::Minus),
            '=' => self.single(LexKind::Eq),
            '!' => {
                self.next_char();
                if self.cur_char() == Some('=') {
                    self.kind = LexKind::Ne;
                    self.next_char();
                } else {
                    self.kind = LexKind::Unknown;
                }
            }
            '<' | '>' => {
                self.next_char();
                let or_equal = self.cur_char() == Some('=');
                if or_equal {
                    self.next_char();
                }
                self.kind = match (ch, or_equal) {
                    ('<', false) => LexKind::Lt,
                    ('<', true) => LexKind::Le,
                    (_, false) => LexKind::Gt,
                    (_, true) => LexKind::Ge,
                };
            }
            '"' | '\'' => {
                self.kind = LexKind::String;
                self.scan_string(ch)?;
            }
            '0'..='9' => {
                self.kind = LexKind::Number;
                self.scan_number()?;
            }
            _ => self.scan_name(),
        }
        Ok(())
    }

    fn single(&mut self, kind: LexKind) {
        self.kind = kind;
        self.next_char();
    }

    fn scan_ncname(&mut self) -> Option<&'a str> {
        let text = self.text;
        let found = NCNAME.find(&text[self.cur..])?;
        let name = &text[self.cur..self.cur + found.end()];
        self.cur += found.end();
        Some(name)
    }

    // "foo:bar" or "foo:*" is one lexeme (no whitespace allowed around the colon).
    // "foo::" or "foo ::" is two lexemes; the first is reported as an axis name.
    // "foo:?" reports "foo" and leaves ':' to be scanned as an unknown lexeme.
    fn scan_name(&mut self) {
        let Some(name) = self.scan_ncname() else {
            self.kind = LexKind::Unknown;
            self.next_char();
            return;
        };

        self.kind = LexKind::Name;
        self.prefix = "";
        self.name = name;
        self.can_be_function = false;
        self.axis = None;
        let mut colon_colon = false;
        let save = self.cur;

        if self.cur_char() == Some(':') {
            self.next_char();
            if self.cur_char() == Some(':') {
                colon_colon = true;
                self.cur = save;
            } else if let Some(local) = self.scan_ncname() {
                self.prefix = name;
                self.name = local;
                let after = self.cur;
                self.skip_space();
                self.can_be_function = self.cur_char() == Some('(');
                self.cur = after;
            } else if self.cur_char() == Some('*') {
                self.next_char();
                self.prefix = name;
                self.name = "*";
            } else {
                self.cur = save;
            }
        } else {
            self.skip_space();
            match self.cur_char() {
                Some(':') => {
                    self.next_char();
                    colon_colon = self.cur_char() == Some(':');
                }
                Some('(') => self.can_be_function = true,
                _ => {}
            }
            self.cur = save;
        }

        if !self.check_operator(false) && colon_colon {
            self.axis = Axis::from_name(self.name).filter(|_| self.prefix.is_empty());
            if self.axis.is_some() {
                self.kind = LexKind::Axis;
            }
        }
    }

    /// Reclassifies `*` or an operator keyword as an operator when the
    /// previous lexeme can end an operand.
    fn check_operator(&mut self, star: bool) -> bool {
        let op_kind = if star {
            LexKind::Multiply
        } else {
            if !self.prefix.is_empty() {
                return false;
            }
            match self.name {
                "or" => LexKind::Or,
                "and" => LexKind::And,
                "div" => LexKind::Divide,
                "mod" => LexKind::Modulo,
                _ => return false,
            }
        };

        // Start of input (Unknown) or an operator: the next token begins an operand.
        if self.prev_kind == LexKind::Unknown || self.prev_kind.is_operator() {
            return false;
        }
        if matches!(
            self.prev_kind,
            LexKind::Slash
                | LexKind::SlashSlash
                | LexKind::At
                | LexKind::ColonColon
                | LexKind::LParen
                | LexKind::LBracket
                | LexKind::Comma
                | LexKind::Dollar
        ) {
            return false;
        }

        self.kind = op_kind;
        true
    }

    fn scan_number(&mut self) -> Result<(), ParseError> {
        while self.cur_char().is_some_and(|c| c.is_ascii_digit()) {
            self.next_char();
        }
        if self.cur_char() == Some('.') {
            self.next_char();
            while self.cur_char().is_some_and(|c| c.is_ascii_digit()) {
                self.next_char();
            }
        }
        if matches!(self.cur_char(), Some('e' | 'E')) {
            self.next_char();
            if matches!(self.cur_char(), Some('+' | '-')) {
                self.next_char();
            }
            while self.cur_char().is_some_and(|c| c.is_ascii_digit()) {
                self.next_char();
            }
            return Err(self.error(ParseErrorKind::ScientificNotationUnsupported));
        }
        Ok(())
    }

    fn scan_string(&mut self, quote: char) -> Result<(), ParseError> {
        let body_start = self.cur + quote.len_utf8();
        match self.text[body_start..].find(quote) {
            Some(offset) => {
                let body_end = body_start + offset;
                self.string_value = &self.text[body_start..body_end];
                self.cur = body_end + quote.len_utf8();
                Ok(())
            }
            None => {
                self.cur = self.text.len();
                Err(self.error(ParseErrorKind::UnclosedStringLiteral))
            }
        }
    }

    /// Fails unless the current lexeme is `expected`.
    pub fn check(&self, expected: LexKind) -> Result<(), ParseError> {
        if self.kind == expected {
            return Ok(());
        }
        let found = self.raw_value();
        let kind = if expected == LexKind::Eof {
            ParseErrorKind::EndOfInputExpected { found }
        } else {
            ParseErrorKind::TokenExpected { expected, found }
        };
        Err(self.error(kind))
    }

    /// Checks the current lexeme and moves past it.
    pub fn pass(&mut self, expected: LexKind) -> Result<(), ParseError> {
        self.check(expected)?;
        self.advance()
    }

    /// Builds an error whose window is the current lexeme.
    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.text, self.span())
    }

    pub fn unexpected_token(&self) -> ParseError {
        self.error(ParseErrorKind::UnexpectedToken {
            found: self.raw_value(),
        })
    }

    pub fn node_test_expected(&self) -> ParseError {
        self.error(ParseErrorKind::NodeTestExpected {
            found: self.raw_value(),
        })
    }

    pub fn predicate_after_abbreviated_step(&self, step: AbbreviatedStep) -> ParseError {
        self.error(ParseErrorKind::PredicateAfterAbbreviatedStep { step })
    }
}

/// Scans `text` to the end, returning every lexeme before `Eof`.
pub fn tokenize(text: &str) -> Result<Vec<Lexeme<'_>>, ParseError> {
    let mut scanner = Scanner::new(text)?;
    let mut lexemes = Vec::new();
    while scanner.kind() != LexKind::Eof {
        lexemes.push(scanner.lexeme());
        scanner.advance()?;
    }
    Ok(lexemes)
}
