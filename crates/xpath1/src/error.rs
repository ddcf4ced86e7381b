use crate::scanner::LexKind;
use std::fmt;
use thiserror::Error;

/// A half-open byte window `[start, end)` into the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Which abbreviated step was followed by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbbreviatedStep {
    /// `.`
    Dot,
    /// `..`
    DotDot,
}

impl AbbreviatedStep {
    /// The axis the abbreviation stands for.
    pub fn full_axis_name(self) -> &'static str {
        match self {
            AbbreviatedStep::Dot => "self",
            AbbreviatedStep::DotDot => "parent",
        }
    }
}

impl fmt::Display for AbbreviatedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbbreviatedStep::Dot => f.write_str("."),
            AbbreviatedStep::DotDot => f.write_str(".."),
        }
    }
}

/// The closed set of reasons a parse can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Unexpected token '{found}' in the expression.")]
    UnexpectedToken { found: String },

    #[error("Expected a node test, found '{found}'.")]
    NodeTestExpected { found: String },

    #[error("Expected token '{expected}', found '{found}'.")]
    TokenExpected { expected: LexKind, found: String },

    #[error("Abbreviated step '{step}' cannot be followed by a predicate. Use the full form '{}::node()[predicate]' instead.",
        .step.full_axis_name())]
    PredicateAfterAbbreviatedStep { step: AbbreviatedStep },

    #[error("Scientific notation is not allowed.")]
    ScientificNotationUnsupported,

    #[error("String literal was not closed.")]
    UnclosedStringLiteral,

    #[error("Expected end of the expression, found '{found}'.")]
    EndOfInputExpected { found: String },

    /// The builder refused to construct a node (unknown function, undefined
    /// prefix, ...). The window is the syntactic unit being built.
    #[error("{0}")]
    BuilderRejected(String),
}

/// A parse failure: the reason, the full expression and the offending window.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub expression: String,
    pub span: Span,
}

const TRIM_SIZE: usize = 32;
const TRIM_MARKER: &str = "...";

enum Trim {
    Left,
    Right,
    Middle,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, expression: impl Into<String>, span: Span) -> Self {
        ParseError {
            kind,
            expression: expression.into(),
            span,
        }
    }

    /// The expression text with the error window marked out as ` -->...<-- `.
    ///
    /// Long segments are shortened so that the message stays readable for
    /// large expressions. Returns `None` for blank expressions.
    pub fn marked(&self) -> Option<String> {
        let text = self.expression.as_str();
        if text.trim_matches(' ').is_empty() {
            return None;
        }
        let start = floor_char_boundary(text, self.span.start.min(text.len()));
        let end = floor_char_boundary(text, self.span.end.clamp(start, text.len()));

        let mut out = String::new();
        append_trimmed(&mut out, &text[..start], Trim::Left);
        if end > start {
            out.push_str(" -->");
            append_trimmed(&mut out, &text[start..end], Trim::Middle);
        }
        out.push_str("<-- ");
        append_trimmed(&mut out, &text[end..], Trim::Right);
        Some(out)
    }

    /// The message followed by the marked-out expression on its own line.
    pub fn detailed_message(&self) -> String {
        match self.marked() {
            Some(marked) if !marked.is_empty() => format!("{}\n{}", self.kind, marked),
            _ => self.kind.to_string(),
        }
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn append_trimmed(out: &mut String, segment: &str, trim: Trim) {
    let chars: Vec<char> = segment.chars().collect();
    if chars.len() <= TRIM_SIZE {
        out.push_str(segment);
        return;
    }
    match trim {
        Trim::Left => {
            out.push_str(TRIM_MARKER);
            out.extend(&chars[chars.len() - TRIM_SIZE..]);
        }
        Trim::Right => {
            out.extend(&chars[..TRIM_SIZE]);
            out.push_str(TRIM_MARKER);
        }
        Trim::Middle => {
            out.extend(&chars[..TRIM_SIZE / 2]);
            out.push_str(TRIM_MARKER);
            out.extend(&chars[chars.len() - TRIM_SIZE / 2..]);
        }
    }
}

/// Crate-level error for callers that fold XPath failures into larger error enums.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XPathError {
    #[error("XPath parse error in '{}': {}", .0.expression, .0.kind)]
    Parse(#[from] ParseError),
}

impl XPathError {
    pub fn as_parse_error(&self) -> &ParseError {
        match self {
            XPathError::Parse(e) => e,
        }
    }
}
