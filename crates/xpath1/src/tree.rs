//! A generic debug tree: one node shape per builder call.

use crate::ast::{Axis, NodeKind, Operator};
use crate::builder::Builder;
use std::convert::Infallible;
use std::fmt;

/// The tree produced by [`TreeBuilder`]. Each variant mirrors one
/// construction call of [`Builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    String(String),
    /// The numeric literal as written; it is never evaluated.
    Number(String),
    Operator {
        op: Operator,
        left: Option<Box<TreeNode>>,
        right: Option<Box<TreeNode>>,
    },
    Axis {
        axis: Axis,
        kind: NodeKind,
        prefix: Option<String>,
        name: Option<String>,
    },
    JoinStep {
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Predicate {
        node: Box<TreeNode>,
        condition: Box<TreeNode>,
        reverse: bool,
    },
    Variable {
        prefix: Option<String>,
        name: String,
    },
    Function {
        prefix: Option<String>,
        name: String,
        args: Vec<TreeNode>,
    },
}

impl TreeNode {
    pub fn string(value: impl Into<String>) -> Self {
        TreeNode::String(value.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        TreeNode::Number(text.into())
    }

    pub fn binary(op: Operator, left: TreeNode, right: TreeNode) -> Self {
        TreeNode::Operator {
            op,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn axis(axis: Axis, kind: NodeKind, name: Option<&str>) -> Self {
        TreeNode::Axis {
            axis,
            kind,
            prefix: None,
            name: name.map(str::to_string),
        }
    }

    /// `child::name`
    pub fn child(name: &str) -> Self {
        TreeNode::axis(Axis::Child, NodeKind::Element, Some(name))
    }

    pub fn root() -> Self {
        TreeNode::axis(Axis::Root, NodeKind::All, None)
    }

    pub fn join(left: TreeNode, right: TreeNode) -> Self {
        TreeNode::JoinStep {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The shape name used in debug dumps.
    pub fn shape(&self) -> &'static str {
        match self {
            TreeNode::String(_) => "string",
            TreeNode::Number(_) => "number",
            TreeNode::Operator { .. } => "operator",
            TreeNode::Axis { .. } => "axis",
            TreeNode::JoinStep { .. } => "step",
            TreeNode::Predicate { .. } => "predicate",
            TreeNode::Variable { .. } => "variable",
            TreeNode::Function { .. } => "function",
        }
    }
}

fn write_qname(f: &mut fmt::Formatter<'_>, prefix: &Option<String>, name: &str) -> fmt::Result {
    match prefix {
        Some(p) if !p.is_empty() => write!(f, "{p}:{name}"),
        _ => f.write_str(name),
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeNode::String(value) => write!(f, "(string '{value}')"),
            TreeNode::Number(text) => write!(f, "(number {text})"),
            TreeNode::Operator { op, left, right } => {
                write!(f, "({op}")?;
                for operand in [left, right].into_iter().flatten() {
                    write!(f, " {operand}")?;
                }
                f.write_str(")")
            }
            TreeNode::Axis {
                axis,
                kind,
                prefix,
                name,
            } => {
                write!(f, "({axis} {kind}")?;
                match name {
                    Some(name) => {
                        f.write_str(" ")?;
                        write_qname(f, prefix, name)?;
                    }
                    None if matches!(
                        kind,
                        NodeKind::Element | NodeKind::Attribute | NodeKind::Namespace
                    ) =>
                    {
                        f.write_str(" ")?;
                        write_qname(f, prefix, "*")?;
                    }
                    None => {}
                }
                f.write_str(")")
            }
            TreeNode::JoinStep { left, right } => write!(f, "(step {left} {right})"),
            TreeNode::Predicate {
                node,
                condition,
                reverse,
            } => {
                let tag = if *reverse { "predicate-reverse" } else { "predicate" };
                write!(f, "({tag} {node} {condition})")
            }
            TreeNode::Variable { prefix, name } => {
                f.write_str("(variable $")?;
                write_qname(f, prefix, name)?;
                f.write_str(")")
            }
            TreeNode::Function { prefix, name, args } => {
                f.write_str("(function ")?;
                write_qname(f, prefix, name)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Builds a [`TreeNode`] for every construct; never rejects anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder
    }
}

fn owned(s: Option<&str>) -> Option<String> {
    s.map(str::to_string)
}

impl Builder for TreeBuilder {
    type Node = TreeNode;
    type Error = Infallible;

    fn start(&mut self) {}

    fn end(&mut self, result: Option<TreeNode>) -> Option<TreeNode> {
        result
    }

    fn string(&mut self, value: &str) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::String(value.to_string()))
    }

    fn number(&mut self, text: &str) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::Number(text.to_string()))
    }

    fn operator(
        &mut self,
        op: Operator,
        left: Option<TreeNode>,
        right: Option<TreeNode>,
    ) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::Operator {
            op,
            left: left.map(Box::new),
            right: right.map(Box::new),
        })
    }

    fn axis(
        &mut self,
        axis: Axis,
        kind: NodeKind,
        prefix: Option<&str>,
        name: Option<&str>,
    ) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::Axis {
            axis,
            kind,
            prefix: owned(prefix),
            name: owned(name),
        })
    }

    fn join_step(&mut self, left: TreeNode, right: TreeNode) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::join(left, right))
    }

    fn predicate(
        &mut self,
        node: TreeNode,
        condition: TreeNode,
        reverse: bool,
    ) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::Predicate {
            node: Box::new(node),
            condition: Box::new(condition),
            reverse,
        })
    }

    fn variable(&mut self, prefix: Option<&str>, name: &str) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::Variable {
            prefix: owned(prefix),
            name: name.to_string(),
        })
    }

    fn function(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        args: Vec<TreeNode>,
    ) -> Result<TreeNode, Infallible> {
        Ok(TreeNode::Function {
            prefix: owned(prefix),
            name: name.to_string(),
            args,
        })
    }
}
