//! The capability the parser drives to materialize a tree.
//!
//! The grammar never looks inside the nodes it receives back; it only threads
//! them into later calls. Swapping the builder therefore changes the output
//! representation without touching any grammar logic.

use crate::ast::{Axis, NodeKind, Operator};
use std::fmt::Display;

/// Tree-construction callbacks invoked by [`crate::parser::Parser`].
///
/// Calls arrive in a single depth-first, left-to-right order matching the
/// grammar. Construction calls may fail (an unknown function, an undefined
/// prefix, a union operand that cannot be a node-set); the parser reports
/// such failures with the window of the syntactic unit being built.
pub trait Builder {
    type Node;
    type Error: Display;

    /// Called once before parsing begins.
    fn start(&mut self);

    /// Called once after parsing ends, on success and on failure alike.
    /// `result` is `None` when the parse failed.
    fn end(&mut self, result: Option<Self::Node>) -> Option<Self::Node>;

    fn string(&mut self, value: &str) -> Result<Self::Node, Self::Error>;

    /// `text` is the numeric literal exactly as written.
    fn number(&mut self, text: &str) -> Result<Self::Node, Self::Error>;

    /// Binary operators, `Union` included, pass both operands; a chain of
    /// unions folds to the left. `UnaryMinus` passes only `left`.
    fn operator(
        &mut self,
        op: Operator,
        left: Option<Self::Node>,
        right: Option<Self::Node>,
    ) -> Result<Self::Node, Self::Error>;

    /// `name` is `None` for wildcards and node-type tests (except
    /// `processing-instruction('target')`, which carries the target).
    fn axis(
        &mut self,
        axis: Axis,
        kind: NodeKind,
        prefix: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self::Node, Self::Error>;

    fn join_step(&mut self, left: Self::Node, right: Self::Node) -> Result<Self::Node, Self::Error>;

    /// `reverse` is set for predicates written directly on a reverse-axis
    /// step, where positions count from the far end.
    fn predicate(
        &mut self,
        node: Self::Node,
        condition: Self::Node,
        reverse: bool,
    ) -> Result<Self::Node, Self::Error>;

    fn variable(&mut self, prefix: Option<&str>, name: &str) -> Result<Self::Node, Self::Error>;

    fn function(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        args: Vec<Self::Node>,
    ) -> Result<Self::Node, Self::Error>;
}
