//! A recursive-descent parser for the XPath 1.0 expression language.
//!
//! Binary operators are handled by precedence climbing over the table in
//! [`Operator::precedence`]; location paths, filter expressions and unions are
//! structural rules of the grammar. The parser is generic over [`Builder`]
//! and never inspects the nodes the builder returns.

use crate::ast::{Axis, NodeKind, Operator};
use crate::builder::Builder;
use crate::error::{AbbreviatedStep, ParseError, ParseErrorKind, Span};
use crate::scanner::{LexKind, Scanner};
use crate::tree::{TreeBuilder, TreeNode};
use std::cell::RefCell;

/// Parses `text` into the generic debug tree.
pub fn parse_expression(text: &str) -> Result<TreeNode, ParseError> {
    Parser::new(text).parse(&mut TreeBuilder::new())
}

/// A single-use parser for one expression.
///
/// [`Parser::parse`] consumes the parser, so an instance runs exactly one
/// parse and cannot be shared between parses.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    text: &'a str,
    start: usize,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Parser { text, start: 0 }
    }

    /// Parses from byte offset `start` instead of the beginning of `text`.
    pub fn with_offset(text: &'a str, start: usize) -> Self {
        Parser { text, start }
    }

    /// Runs the parse, calling `builder.start()` before and `builder.end()`
    /// after, whatever the outcome.
    pub fn parse<B: Builder>(self, builder: &mut B) -> Result<B::Node, ParseError> {
        log::trace!("Parsing XPath expression '{}'", self.text);
        let positions = PosStack::default();

        builder.start();
        let outcome = self.run(builder, &positions);
        debug_assert!(
            positions.is_empty(),
            "position windows were left unbalanced"
        );

        match outcome {
            Ok(node) => builder.end(Some(node)).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::BuilderRejected("the builder discarded the result".into()),
                    self.text,
                    Span::new(self.start, self.text.len()),
                )
            }),
            Err(err) => {
                builder.end(None);
                log::debug!("XPath parse failed: {}", err.detailed_message());
                Err(err)
            }
        }
    }

    fn run<B: Builder>(&self, builder: &mut B, positions: &PosStack) -> Result<B::Node, ParseError> {
        let scanner = Scanner::with_offset(self.text, self.start)?;
        let mut grammar = Grammar {
            scanner,
            builder,
            positions,
        };
        let node = grammar.parse_expr()?;
        grammar.scanner.check(LexKind::Eof)?;
        Ok(node)
    }
}

/// Windows of the syntactic units currently being built, innermost last.
#[derive(Debug, Default)]
struct PosStack {
    spans: RefCell<Vec<Span>>,
}

impl PosStack {
    fn push(&self, span: Span) -> PosGuard<'_> {
        let mut spans = self.spans.borrow_mut();
        spans.push(span);
        PosGuard {
            stack: self,
            depth: spans.len(),
        }
    }

    fn innermost(&self) -> Option<Span> {
        self.spans.borrow().last().copied()
    }

    fn is_empty(&self) -> bool {
        self.spans.borrow().is_empty()
    }
}

/// Pops its window when the grammar rule that pushed it returns.
struct PosGuard<'p> {
    stack: &'p PosStack,
    depth: usize,
}

impl Drop for PosGuard<'_> {
    fn drop(&mut self) {
        let mut spans = self.stack.spans.borrow_mut();
        debug_assert_eq!(spans.len(), self.depth, "position windows popped out of order");
        spans.pop();
    }
}

struct Grammar<'a, 'p, B: Builder> {
    scanner: Scanner<'a>,
    builder: &'p mut B,
    positions: &'p PosStack,
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

impl<'a, 'p, B: Builder> Grammar<'a, 'p, B> {
    fn push_pos(&self, start: usize, end: usize) -> PosGuard<'p> {
        let positions: &'p PosStack = self.positions;
        positions.push(Span::new(start, end))
    }

    /// Runs one builder call, turning a rejection into a parse error whose
    /// window is the innermost unit being built.
    fn build(
        &mut self,
        call: impl FnOnce(&mut B) -> Result<B::Node, B::Error>,
    ) -> Result<B::Node, ParseError> {
        call(self.builder).map_err(|e| {
            let span = self
                .positions
                .innermost()
                .unwrap_or_else(|| self.scanner.span());
            ParseError::new(
                ParseErrorKind::BuilderRejected(e.to_string()),
                self.scanner.source(),
                span,
            )
        })
    }

    fn any_node(&mut self, axis: Axis) -> Result<B::Node, ParseError> {
        self.build(|b| b.axis(axis, NodeKind::All, None, None))
    }

    // --- Location paths and node tests ---

    fn is_step(kind: LexKind) -> bool {
        matches!(
            kind,
            LexKind::Dot
                | LexKind::DotDot
                | LexKind::At
                | LexKind::Axis
                | LexKind::Star
                | LexKind::Name
        )
    }

    /// LocationPath ::= RelativeLocationPath | '/' RelativeLocationPath? | '//' RelativeLocationPath
    fn parse_location_path(&mut self) -> Result<B::Node, ParseError> {
        match self.scanner.kind() {
            LexKind::Slash => {
                self.scanner.advance()?;
                let root = self.any_node(Axis::Root)?;
                if Self::is_step(self.scanner.kind()) {
                    let path = self.parse_relative_location_path()?;
                    self.build(|b| b.join_step(root, path))
                } else {
                    Ok(root)
                }
            }
            LexKind::SlashSlash => {
                self.scanner.advance()?;
                let root = self.any_node(Axis::Root)?;
                let descendants = self.any_node(Axis::DescendantOrSelf)?;
                let path = self.parse_relative_location_path()?;
                let tail = self.build(|b| b.join_step(descendants, path))?;
                self.build(|b| b.join_step(root, tail))
            }
            _ => self.parse_relative_location_path(),
        }
    }

    /// RelativeLocationPath ::= Step (('/' | '//') Step)*
    fn parse_relative_location_path(&mut self) -> Result<B::Node, ParseError> {
        let step = self.parse_step()?;
        match self.scanner.kind() {
            LexKind::Slash => {
                self.scanner.advance()?;
                let rest = self.parse_relative_location_path()?;
                self.build(|b| b.join_step(step, rest))
            }
            LexKind::SlashSlash => {
                self.scanner.advance()?;
                let descendants = self.any_node(Axis::DescendantOrSelf)?;
                let rest = self.parse_relative_location_path()?;
                let tail = self.build(|b| b.join_step(descendants, rest))?;
                self.build(|b| b.join_step(step, tail))
            }
            _ => Ok(step),
        }
    }

    /// Step ::= '.' | '..' | (AxisName '::' | '@')? NodeTest Predicate*
    fn parse_step(&mut self) -> Result<B::Node, ParseError> {
        match self.scanner.kind() {
            LexKind::Dot => {
                self.scanner.advance()?;
                let node = self.any_node(Axis::SelfAxis)?;
                if self.scanner.kind() == LexKind::LBracket {
                    return Err(self
                        .scanner
                        .predicate_after_abbreviated_step(AbbreviatedStep::Dot));
                }
                Ok(node)
            }
            LexKind::DotDot => {
                self.scanner.advance()?;
                let node = self.any_node(Axis::Parent)?;
                if self.scanner.kind() == LexKind::LBracket {
                    return Err(self
                        .scanner
                        .predicate_after_abbreviated_step(AbbreviatedStep::DotDot));
                }
                Ok(node)
            }
            _ => {
                let axis = match self.scanner.kind() {
                    LexKind::Axis => {
                        let Some(axis) = self.scanner.axis() else {
                            return Err(self.scanner.unexpected_token());
                        };
                        self.scanner.advance()?;
                        self.scanner.pass(LexKind::ColonColon)?;
                        axis
                    }
                    LexKind::At => {
                        self.scanner.advance()?;
                        Axis::Attribute
                    }
                    // A node test must start with a name or '*'.
                    LexKind::Name | LexKind::Star => Axis::Child,
                    _ => return Err(self.scanner.unexpected_token()),
                };

                let mut node = self.parse_node_test(axis)?;
                while self.scanner.kind() == LexKind::LBracket {
                    let condition = self.parse_predicate()?;
                    node = self.build(|b| b.predicate(node, condition, axis.is_reverse()))?;
                }
                Ok(node)
            }
        }
    }

    fn is_node_type(&self) -> bool {
        self.scanner.prefix().is_empty()
            && NodeKind::from_node_type_name(self.scanner.name()).is_some()
    }

    /// NodeTest ::= NameTest | ('comment' | 'text' | 'node') '(' ')' | 'processing-instruction' '(' Literal? ')'
    /// NameTest ::= '*' | NCName ':' '*' | QName
    fn parse_node_test(&mut self, axis: Axis) -> Result<B::Node, ParseError> {
        let start = self.scanner.lex_start();
        let (kind, prefix, name) = self.scan_node_test(axis)?;
        let _pos = self.push_pos(start, self.scanner.prev_lex_end());
        self.build(|b| b.axis(axis, kind, prefix, name))
    }

    fn scan_node_test(
        &mut self,
        axis: Axis,
    ) -> Result<(NodeKind, Option<&'a str>, Option<&'a str>), ParseError> {
        match self.scanner.kind() {
            LexKind::Name if self.scanner.can_be_function() && self.is_node_type() => {
                let kind = NodeKind::from_node_type_name(self.scanner.name())
                    .ok_or_else(|| self.scanner.node_test_expected())?;
                self.scanner.advance()?;
                self.scanner.pass(LexKind::LParen)?;

                let mut target = None;
                if kind == NodeKind::ProcessingInstruction && self.scanner.kind() != LexKind::RParen {
                    self.scanner.check(LexKind::String)?;
                    target = Some(self.scanner.string_value());
                    self.scanner.advance()?;
                }

                self.scanner.pass(LexKind::RParen)?;
                Ok((kind, None, target))
            }
            LexKind::Name => {
                let prefix = non_empty(self.scanner.prefix());
                let name = self.scanner.name();
                self.scanner.advance()?;
                let name = (name != "*").then_some(name);
                Ok((axis.principal_node_kind(), prefix, name))
            }
            LexKind::Star => {
                self.scanner.advance()?;
                Ok((axis.principal_node_kind(), None, None))
            }
            _ => Err(self.scanner.node_test_expected()),
        }
    }

    /// Predicate ::= '[' Expr ']'
    fn parse_predicate(&mut self) -> Result<B::Node, ParseError> {
        self.scanner.pass(LexKind::LBracket)?;
        let node = self.parse_expr()?;
        self.scanner.pass(LexKind::RBracket)?;
        Ok(node)
    }

    // --- Expressions ---

    // Expr               ::= OrExpr
    // OrExpr             ::= AndExpr ('or' AndExpr)*
    // AndExpr            ::= EqualityExpr ('and' EqualityExpr)*
    // EqualityExpr       ::= RelationalExpr (('=' | '!=') RelationalExpr)*
    // RelationalExpr     ::= AdditiveExpr (('<' | '>' | '<=' | '>=') AdditiveExpr)*
    // AdditiveExpr       ::= MultiplicativeExpr (('+' | '-') MultiplicativeExpr)*
    // MultiplicativeExpr ::= UnaryExpr (('*' | 'div' | 'mod') UnaryExpr)*
    // UnaryExpr          ::= ('-')* UnionExpr
    fn parse_expr(&mut self) -> Result<B::Node, ParseError> {
        self.parse_sub_expr(0)
    }

    fn parse_sub_expr(&mut self, caller_prec: u8) -> Result<B::Node, ParseError> {
        let mut node = if self.scanner.kind() == LexKind::Minus {
            self.scanner.advance()?;
            let operand = self.parse_sub_expr(Operator::UnaryMinus.precedence())?;
            self.build(|b| b.operator(Operator::UnaryMinus, Some(operand), None))?
        } else {
            self.parse_union_expr()?
        };

        loop {
            let op = match self.scanner.kind().operator() {
                Some(op) if op != Operator::Union => op,
                _ => return Ok(node),
            };
            let prec = op.precedence();
            if prec <= caller_prec {
                return Ok(node);
            }

            // Binds tighter than the caller's operator, so it is handled here.
            self.scanner.advance()?;
            let right = self.parse_sub_expr(prec)?;
            node = self.build(|b| b.operator(op, Some(node), Some(right)))?;
        }
    }

    /// UnionExpr ::= PathExpr ('|' PathExpr)*
    fn parse_union_expr(&mut self) -> Result<B::Node, ParseError> {
        let mut node = self.parse_path_expr()?;

        while self.scanner.kind() == LexKind::Union {
            self.scanner.advance()?;
            let start = self.scanner.lex_start();
            let right = self.parse_path_expr()?;
            let _pos = self.push_pos(start, self.scanner.prev_lex_end());
            node = self.build(|b| b.operator(Operator::Union, Some(node), Some(right)))?;
        }
        Ok(node)
    }

    /// PathExpr ::= LocationPath | FilterExpr (('/' | '//') RelativeLocationPath)?
    fn parse_path_expr(&mut self) -> Result<B::Node, ParseError> {
        // A FilterExpr starts with a PrimaryExpr; everything else is a LocationPath.
        if !self.is_primary_expr() {
            return self.parse_location_path();
        }

        let start = self.scanner.lex_start();
        let node = self.parse_filter_expr()?;
        let end = self.scanner.prev_lex_end();

        match self.scanner.kind() {
            LexKind::Slash => {
                self.scanner.advance()?;
                let _pos = self.push_pos(start, end);
                let path = self.parse_relative_location_path()?;
                self.build(|b| b.join_step(node, path))
            }
            LexKind::SlashSlash => {
                self.scanner.advance()?;
                let _pos = self.push_pos(start, end);
                let descendants = self.any_node(Axis::DescendantOrSelf)?;
                let path = self.parse_relative_location_path()?;
                let tail = self.build(|b| b.join_step(descendants, path))?;
                self.build(|b| b.join_step(node, tail))
            }
            _ => Ok(node),
        }
    }

    /// FilterExpr ::= PrimaryExpr Predicate*
    fn parse_filter_expr(&mut self) -> Result<B::Node, ParseError> {
        let start = self.scanner.lex_start();
        let mut node = self.parse_primary_expr()?;
        let end = self.scanner.prev_lex_end();

        while self.scanner.kind() == LexKind::LBracket {
            let _pos = self.push_pos(start, end);
            let condition = self.parse_predicate()?;
            node = self.build(|b| b.predicate(node, condition, false))?;
        }
        Ok(node)
    }

    fn is_primary_expr(&self) -> bool {
        match self.scanner.kind() {
            LexKind::String | LexKind::Number | LexKind::Dollar | LexKind::LParen => true,
            LexKind::Name => self.scanner.can_be_function() && !self.is_node_type(),
            _ => false,
        }
    }

    /// PrimaryExpr ::= Literal | Number | VariableReference | '(' Expr ')' | FunctionCall
    fn parse_primary_expr(&mut self) -> Result<B::Node, ParseError> {
        match self.scanner.kind() {
            LexKind::String => {
                let value = self.scanner.string_value();
                let node = self.build(|b| b.string(value))?;
                self.scanner.advance()?;
                Ok(node)
            }
            LexKind::Number => {
                let text = self.scanner.lexeme().text;
                let node = self.build(|b| b.number(text))?;
                self.scanner.advance()?;
                Ok(node)
            }
            LexKind::Dollar => {
                let start = self.scanner.lex_start();
                self.scanner.advance()?;
                self.scanner.check(LexKind::Name)?;
                let prefix = non_empty(self.scanner.prefix());
                let name = self.scanner.name();
                let node = {
                    let _pos = self.push_pos(start, self.scanner.lex_end());
                    self.build(|b| b.variable(prefix, name))?
                };
                self.scanner.advance()?;
                Ok(node)
            }
            LexKind::LParen => {
                self.scanner.advance()?;
                let node = self.parse_expr()?;
                self.scanner.pass(LexKind::RParen)?;
                Ok(node)
            }
            _ => self.parse_function_call(),
        }
    }

    /// FunctionCall ::= FunctionName '(' (Expr (',' Expr)*)? ')'
    fn parse_function_call(&mut self) -> Result<B::Node, ParseError> {
        self.scanner.check(LexKind::Name)?;
        let prefix = non_empty(self.scanner.prefix());
        let name = self.scanner.name();
        let start = self.scanner.lex_start();

        self.scanner.pass(LexKind::Name)?;
        self.scanner.pass(LexKind::LParen)?;

        let mut args = Vec::new();
        if self.scanner.kind() != LexKind::RParen {
            loop {
                args.push(self.parse_expr()?);
                if self.scanner.kind() != LexKind::Comma {
                    self.scanner.check(LexKind::RParen)?;
                    break;
                }
                self.scanner.advance()?;
            }
        }

        self.scanner.advance()?;
        let _pos = self.push_pos(start, self.scanner.prev_lex_end());
        self.build(|b| b.function(prefix, name, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::LexKind;

    fn child(name: &str) -> TreeNode {
        TreeNode::child(name)
    }

    fn descendant_path(name: &str) -> TreeNode {
        TreeNode::join(
            TreeNode::root(),
            TreeNode::join(
                TreeNode::axis(Axis::DescendantOrSelf, NodeKind::All, None),
                child(name),
            ),
        )
    }

    #[test]
    fn test_parse_operator_precedence() {
        let result = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            result,
            TreeNode::binary(
                Operator::Plus,
                TreeNode::number("1"),
                TreeNode::binary(Operator::Multiply, TreeNode::number("2"), TreeNode::number("3")),
            )
        );

        let result = parse_expression("1 * 2 + 3").unwrap();
        assert_eq!(
            result,
            TreeNode::binary(
                Operator::Plus,
                TreeNode::binary(Operator::Multiply, TreeNode::number("1"), TreeNode::number("2")),
                TreeNode::number("3"),
            )
        );
    }

    #[test]
    fn test_parse_left_associativity() {
        let result = parse_expression("8 - 4 - 2").unwrap();
        assert_eq!(result.to_string(), "(Minus (Minus (number 8) (number 4)) (number 2))");
        let result = parse_expression("8 div 4 mod 3").unwrap();
        assert_eq!(
            result.to_string(),
            "(Modulo (Divide (number 8) (number 4)) (number 3))"
        );
    }

    #[test]
    fn test_parse_boolean_logic() {
        let result = parse_expression("a = b or c = d and e = f").unwrap();
        let eq = |l: &str, r: &str| TreeNode::binary(Operator::Eq, child(l), child(r));
        assert_eq!(
            result,
            TreeNode::binary(
                Operator::Or,
                eq("a", "b"),
                TreeNode::binary(Operator::And, eq("c", "d"), eq("e", "f")),
            )
        );
    }

    #[test]
    fn test_parse_relational_below_equality() {
        let result = parse_expression("1 < 2 = 3 >= 4").unwrap();
        assert_eq!(
            result.to_string(),
            "(Eq (Lt (number 1) (number 2)) (Ge (number 3) (number 4)))"
        );
    }

    #[test]
    fn test_parse_unary_minus() {
        let result = parse_expression("-5").unwrap();
        assert_eq!(
            result,
            TreeNode::Operator {
                op: Operator::UnaryMinus,
                left: Some(Box::new(TreeNode::number("5"))),
                right: None,
            }
        );

        let result = parse_expression("10 - -5").unwrap();
        assert_eq!(result.to_string(), "(Minus (number 10) (Negate (number 5)))");

        // Unary minus binds tighter than multiplication.
        let result = parse_expression("-2 * 3").unwrap();
        assert_eq!(result.to_string(), "(Multiply (Negate (number 2)) (number 3))");
    }

    #[test]
    fn test_union_binds_loosest_of_path_constructs() {
        let result = parse_expression("//a | //b").unwrap();
        assert_eq!(
            result,
            TreeNode::binary(Operator::Union, descendant_path("a"), descendant_path("b"))
        );

        let result = parse_expression("a | b | c").unwrap();
        assert_eq!(
            result.to_string(),
            "(Union (Union (Child Element a) (Child Element b)) (Child Element c))"
        );
    }

    #[test]
    fn test_union_inside_arithmetic_operand() {
        let result = parse_expression("count(a | b) + 1").unwrap();
        assert_eq!(
            result.to_string(),
            "(Plus (function count (Union (Child Element a) (Child Element b))) (number 1))"
        );
        let result = parse_expression("-a | b").unwrap();
        assert_eq!(
            result.to_string(),
            "(Negate (Union (Child Element a) (Child Element b)))"
        );
    }

    #[test]
    fn test_wildcard_versus_multiply() {
        let result = parse_expression("/*").unwrap();
        assert_eq!(
            result,
            TreeNode::join(
                TreeNode::root(),
                TreeNode::axis(Axis::Child, NodeKind::Element, None)
            )
        );

        let result = parse_expression("2*3").unwrap();
        assert_eq!(
            result,
            TreeNode::binary(Operator::Multiply, TreeNode::number("2"), TreeNode::number("3"))
        );

        let result = parse_expression("* * *").unwrap();
        assert_eq!(
            result.to_string(),
            "(Multiply (Child Element *) (Child Element *))"
        );
    }

    #[test]
    fn test_parse_root_only() {
        assert_eq!(parse_expression("/").unwrap(), TreeNode::root());
        assert_eq!(
            parse_expression("/ | a").unwrap().to_string(),
            "(Union (Root All) (Child Element a))"
        );
    }

    #[test]
    fn test_parse_simple_path() {
        let result = parse_expression("/a/b/c").unwrap();
        assert_eq!(
            result,
            TreeNode::join(
                TreeNode::root(),
                TreeNode::join(child("a"), TreeNode::join(child("b"), child("c")))
            )
        );
    }

    #[test]
    fn test_parse_descendant_steps() {
        let result = parse_expression("a//b").unwrap();
        assert_eq!(
            result.to_string(),
            "(step (Child Element a) (step (DescendantOrSelf All) (Child Element b)))"
        );
    }

    #[test]
    fn test_parse_abbreviated_steps() {
        assert_eq!(parse_expression(".").unwrap().to_string(), "(Self All)");
        assert_eq!(
            parse_expression("../x").unwrap().to_string(),
            "(step (Parent All) (Child Element x))"
        );
    }

    #[test]
    fn test_parse_axes() {
        let result = parse_expression("following-sibling::foo").unwrap();
        assert_eq!(result.to_string(), "(FollowingSibling Element foo)");
        let result = parse_expression("preceding::*").unwrap();
        assert_eq!(result.to_string(), "(Preceding Element *)");
        let result = parse_expression("attribute::id").unwrap();
        assert_eq!(result.to_string(), "(Attribute Attribute id)");
        let result = parse_expression("namespace::*").unwrap();
        assert_eq!(result.to_string(), "(Namespace Namespace *)");
        let result = parse_expression("@xml:lang").unwrap();
        assert_eq!(result.to_string(), "(Attribute Attribute xml:lang)");
    }

    #[test]
    fn test_parse_node_type_tests() {
        assert_eq!(parse_expression("text()").unwrap().to_string(), "(Child Text)");
        assert_eq!(
            parse_expression("self::node()").unwrap().to_string(),
            "(Self All)"
        );
        assert_eq!(
            parse_expression("comment()").unwrap().to_string(),
            "(Child Comment)"
        );
        let pi = parse_expression("processing-instruction('php')").unwrap();
        assert_eq!(
            pi,
            TreeNode::axis(Axis::Child, NodeKind::ProcessingInstruction, Some("php"))
        );
        // A prefixed name is never a node-type test.
        assert_eq!(
            parse_expression("ex:text()").unwrap().to_string(),
            "(function ex:text)"
        );
    }

    #[test]
    fn test_node_type_name_without_parens_is_a_name_test() {
        assert_eq!(parse_expression("text").unwrap().to_string(), "(Child Element text)");
        assert_eq!(
            parse_expression("node/comment").unwrap().to_string(),
            "(step (Child Element node) (Child Element comment))"
        );
    }

    #[test]
    fn test_parse_predicate() {
        let result = parse_expression("foo[@id = 'a']").unwrap();
        assert_eq!(
            result,
            TreeNode::Predicate {
                node: Box::new(child("foo")),
                condition: Box::new(TreeNode::binary(
                    Operator::Eq,
                    TreeNode::axis(Axis::Attribute, NodeKind::Attribute, Some("id")),
                    TreeNode::string("a"),
                )),
                reverse: false,
            }
        );
    }

    #[test]
    fn test_reverse_axis_predicates_are_flagged() {
        let result = parse_expression("ancestor::div[1]").unwrap();
        assert!(matches!(result, TreeNode::Predicate { reverse: true, .. }));

        let result = parse_expression("preceding-sibling::*[2][@x]").unwrap();
        match result {
            TreeNode::Predicate { node, reverse, .. } => {
                assert!(reverse);
                assert!(matches!(*node, TreeNode::Predicate { reverse: true, .. }));
            }
            other => panic!("Expected predicate, got {other}"),
        }

        // A parenthesized step is a filter expression: positions count forwards.
        let result = parse_expression("(ancestor::div)[1]").unwrap();
        assert!(matches!(result, TreeNode::Predicate { reverse: false, .. }));

        let result = parse_expression("child::p[1]").unwrap();
        assert!(matches!(result, TreeNode::Predicate { reverse: false, .. }));
    }

    #[test]
    fn test_parse_path_starting_with_variable() {
        let result = parse_expression("$myVar/foo/bar").unwrap();
        assert_eq!(
            result,
            TreeNode::join(
                TreeNode::Variable {
                    prefix: None,
                    name: "myVar".into()
                },
                TreeNode::join(child("foo"), child("bar"))
            )
        );
    }

    #[test]
    fn test_parse_filter_expression_paths() {
        let result = parse_expression("id('x')//p").unwrap();
        assert_eq!(
            result.to_string(),
            "(step (function id (string 'x')) (step (DescendantOrSelf All) (Child Element p)))"
        );
        let result = parse_expression("(a|b)[1]/c").unwrap();
        assert_eq!(
            result.to_string(),
            "(step (predicate (Union (Child Element a) (Child Element b)) (number 1)) (Child Element c))"
        );
    }

    #[test]
    fn test_parse_function_calls() {
        let result = parse_expression("concat('a', $p:v, 1.5)").unwrap();
        assert_eq!(
            result.to_string(),
            "(function concat (string 'a') (variable $p:v) (number 1.5))"
        );
        let result = parse_expression("position()").unwrap();
        assert_eq!(
            result,
            TreeNode::Function {
                prefix: None,
                name: "position".into(),
                args: vec![]
            }
        );
        // A keyword-named function in operand position.
        let result = parse_expression("or(1)").unwrap();
        assert_eq!(result.to_string(), "(function or (number 1))");
        let result = parse_expression("count(x) div 2").unwrap();
        assert_eq!(
            result.to_string(),
            "(Divide (function count (Child Element x)) (number 2))"
        );
    }

    #[test]
    fn test_parsing_is_deterministic() {
        for text in ["/a/b[@c='d']", "//x | y/z", "sum(a) * -2", "..//@*"] {
            assert_eq!(parse_expression(text).unwrap(), parse_expression(text).unwrap());
        }
    }

    #[test]
    fn test_scientific_notation_error() {
        let err = parse_expression("1e5").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ScientificNotationUnsupported);
        assert_eq!(err.span, Span::new(0, 3));
        assert_eq!(err.expression, "1e5");

        let err = parse_expression("a[2.5e+3]").unwrap_err();
        assert_eq!(err.span, Span::new(2, 8));
    }

    #[test]
    fn test_unclosed_string_error() {
        let err = parse_expression("\"abc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedStringLiteral);
        assert_eq!(err.span, Span::new(0, 4));
    }

    #[test]
    fn test_predicate_after_abbreviated_step() {
        let err = parse_expression(".[1]").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::PredicateAfterAbbreviatedStep {
                step: AbbreviatedStep::Dot
            }
        );
        assert_eq!(err.span, Span::new(1, 2));

        let err = parse_expression("a/..[1]").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::PredicateAfterAbbreviatedStep {
                step: AbbreviatedStep::DotDot
            }
        );
    }

    #[test]
    fn test_grammar_errors() {
        let err = parse_expression("child::").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::NodeTestExpected {
                found: "<eof>".into()
            }
        );

        let err = parse_expression("@'x'").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NodeTestExpected { found: "'x'".into() });

        let err = parse_expression("]").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken { found: "]".into() });

        let err = parse_expression("//").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                found: "<eof>".into()
            }
        );

        let err = parse_expression("f(1").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::TokenExpected {
                expected: LexKind::RParen,
                found: "<eof>".into()
            }
        );

        let err = parse_expression("a[1").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::TokenExpected {
                expected: LexKind::RBracket,
                found: "<eof>".into()
            }
        );

        let err = parse_expression("$").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::TokenExpected {
                expected: LexKind::Name,
                ..
            }
        ));

        let err = parse_expression("processing-instruction(1)").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::TokenExpected {
                expected: LexKind::String,
                ..
            }
        ));
    }

    #[test]
    fn test_trailing_input() {
        let err = parse_expression("a b").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EndOfInputExpected { found: "b".into() });
        assert_eq!(err.span, Span::new(2, 3));

        let err = parse_expression("sideways::x").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EndOfInputExpected { found: "::".into() });
    }

    #[test]
    fn test_parse_with_offset() {
        let result = Parser::with_offset("{a/b}", 1).parse(&mut TreeBuilder::new());
        // The closing brace is not part of the grammar.
        let err = result.unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EndOfInputExpected { found: "}".into() });
        assert_eq!(err.span, Span::new(4, 5));

        let result = Parser::with_offset("xx /a", 3).parse(&mut TreeBuilder::new());
        assert_eq!(result.unwrap(), TreeNode::join(TreeNode::root(), child("a")));
    }

    /// Records the order of builder calls.
    #[derive(Default)]
    struct RecordingBuilder {
        calls: Vec<String>,
        ended_with_result: Option<bool>,
    }

    impl Builder for RecordingBuilder {
        type Node = ();
        type Error = std::convert::Infallible;

        fn start(&mut self) {
            self.calls.push("start".into());
        }
        fn end(&mut self, result: Option<()>) -> Option<()> {
            self.ended_with_result = Some(result.is_some());
            self.calls.push("end".into());
            result
        }
        fn string(&mut self, value: &str) -> Result<(), Self::Error> {
            self.calls.push(format!("string {value}"));
            Ok(())
        }
        fn number(&mut self, text: &str) -> Result<(), Self::Error> {
            self.calls.push(format!("number {text}"));
            Ok(())
        }
        fn operator(&mut self, op: Operator, _: Option<()>, _: Option<()>) -> Result<(), Self::Error> {
            self.calls.push(format!("operator {op}"));
            Ok(())
        }
        fn axis(
            &mut self,
            axis: Axis,
            _: NodeKind,
            _: Option<&str>,
            name: Option<&str>,
        ) -> Result<(), Self::Error> {
            self.calls.push(format!("axis {axis} {}", name.unwrap_or("-")));
            Ok(())
        }
        fn join_step(&mut self, _: (), _: ()) -> Result<(), Self::Error> {
            self.calls.push("join".into());
            Ok(())
        }
        fn predicate(&mut self, _: (), _: (), reverse: bool) -> Result<(), Self::Error> {
            self.calls.push(format!("predicate {reverse}"));
            Ok(())
        }
        fn variable(&mut self, _: Option<&str>, name: &str) -> Result<(), Self::Error> {
            self.calls.push(format!("variable {name}"));
            Ok(())
        }
        fn function(&mut self, _: Option<&str>, name: &str, args: Vec<()>) -> Result<(), Self::Error> {
            self.calls.push(format!("function {name}/{}", args.len()));
            Ok(())
        }
    }

    #[test]
    fn test_builder_call_order_is_depth_first() {
        let mut builder = RecordingBuilder::default();
        Parser::new("//a[1]").parse(&mut builder).unwrap();
        assert_eq!(
            builder.calls,
            vec![
                "start",
                "axis Root -",
                "axis DescendantOrSelf -",
                "axis Child a",
                "number 1",
                "predicate false",
                "join",
                "join",
                "end",
            ]
        );
        assert_eq!(builder.ended_with_result, Some(true));
    }

    #[test]
    fn test_builder_end_called_on_failure() {
        let mut builder = RecordingBuilder::default();
        assert!(Parser::new("f(1,").parse(&mut builder).is_err());
        assert_eq!(builder.calls.first().map(String::as_str), Some("start"));
        assert_eq!(builder.calls.last().map(String::as_str), Some("end"));
        assert_eq!(builder.ended_with_result, Some(false));
    }

    /// Accepts only a small function library and rejects numeric union operands.
    struct StrictBuilder;

    impl Builder for StrictBuilder {
        type Node = TreeNode;
        type Error = String;

        fn start(&mut self) {}
        fn end(&mut self, result: Option<TreeNode>) -> Option<TreeNode> {
            result
        }
        fn string(&mut self, value: &str) -> Result<TreeNode, String> {
            Ok(TreeNode::string(value))
        }
        fn number(&mut self, text: &str) -> Result<TreeNode, String> {
            Ok(TreeNode::number(text))
        }
        fn operator(
            &mut self,
            op: Operator,
            left: Option<TreeNode>,
            right: Option<TreeNode>,
        ) -> Result<TreeNode, String> {
            if op == Operator::Union
                && [&left, &right]
                    .into_iter()
                    .flatten()
                    .any(|n| matches!(n, TreeNode::Number(_)))
            {
                return Err("Union operands must be node-sets.".into());
            }
            TreeBuilder.operator(op, left, right).map_err(|e| match e {})
        }
        fn axis(
            &mut self,
            axis: Axis,
            kind: NodeKind,
            prefix: Option<&str>,
            name: Option<&str>,
        ) -> Result<TreeNode, String> {
            TreeBuilder.axis(axis, kind, prefix, name).map_err(|e| match e {})
        }
        fn join_step(&mut self, left: TreeNode, right: TreeNode) -> Result<TreeNode, String> {
            Ok(TreeNode::join(left, right))
        }
        fn predicate(&mut self, node: TreeNode, condition: TreeNode, reverse: bool) -> Result<TreeNode, String> {
            TreeBuilder.predicate(node, condition, reverse).map_err(|e| match e {})
        }
        fn variable(&mut self, _: Option<&str>, name: &str) -> Result<TreeNode, String> {
            Err(format!("Variable '{name}' is not defined."))
        }
        fn function(&mut self, prefix: Option<&str>, name: &str, args: Vec<TreeNode>) -> Result<TreeNode, String> {
            match name {
                "count" | "position" => TreeBuilder.function(prefix, name, args).map_err(|e| match e {}),
                _ => Err(format!("Unknown function '{name}()'.")),
            }
        }
    }

    #[test]
    fn test_builder_rejection_reports_unit_window() {
        let _ = env_logger::builder().is_test(true).try_init();
        let err = Parser::new("1 + bogus(2)").parse(&mut StrictBuilder).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::BuilderRejected("Unknown function 'bogus()'.".into())
        );
        assert_eq!(err.span, Span::new(4, 12));

        let err = Parser::new("count($undefined)").parse(&mut StrictBuilder).unwrap_err();
        assert_eq!(err.span, Span::new(6, 16));

        let err = Parser::new("a | 1").parse(&mut StrictBuilder).unwrap_err();
        assert_eq!(err.span, Span::new(4, 5));
        assert_eq!(err.marked().unwrap(), "a |  -->1<-- ");

        assert!(Parser::new("count(a | b)").parse(&mut StrictBuilder).is_ok());
    }
}
