//! Closed vocabularies shared by the scanner, the parser and every builder:
//! axes, node kinds and operators.

use std::fmt;

/// The axis of movement from the context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfAxis,
    /// The document root, produced by a leading `/` or `//`.
    Root,
}

impl Axis {
    /// Resolves an axis name as written before `::`. `Root` has no textual form.
    pub fn from_name(name: &str) -> Option<Axis> {
        let axis = match name {
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "attribute" => Axis::Attribute,
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "following" => Axis::Following,
            "following-sibling" => Axis::FollowingSibling,
            "namespace" => Axis::Namespace,
            "parent" => Axis::Parent,
            "preceding" => Axis::Preceding,
            "preceding-sibling" => Axis::PrecedingSibling,
            "self" => Axis::SelfAxis,
            _ => return None,
        };
        Some(axis)
    }

    /// Positional predicates on reverse axes count from the far end.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }

    /// The node kind a name test selects on this axis.
    pub fn principal_node_kind(self) -> NodeKind {
        match self {
            Axis::Attribute => NodeKind::Attribute,
            Axis::Namespace => NodeKind::Namespace,
            _ => NodeKind::Element,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Ancestor => "Ancestor",
            Axis::AncestorOrSelf => "AncestorOrSelf",
            Axis::Attribute => "Attribute",
            Axis::Child => "Child",
            Axis::Descendant => "Descendant",
            Axis::DescendantOrSelf => "DescendantOrSelf",
            Axis::Following => "Following",
            Axis::FollowingSibling => "FollowingSibling",
            Axis::Namespace => "Namespace",
            Axis::Parent => "Parent",
            Axis::Preceding => "Preceding",
            Axis::PrecedingSibling => "PrecedingSibling",
            Axis::SelfAxis => "Self",
            Axis::Root => "Root",
        };
        f.write_str(name)
    }
}

/// The kind of node an axis step selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `node()`: any kind.
    All,
    Element,
    Attribute,
    Namespace,
    Text,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    /// Maps a reserved node-type test name (`text`, `node`, ...) to its kind.
    pub fn from_node_type_name(name: &str) -> Option<NodeKind> {
        match name {
            "node" => Some(NodeKind::All),
            "text" => Some(NodeKind::Text),
            "comment" => Some(NodeKind::Comment),
            "processing-instruction" => Some(NodeKind::ProcessingInstruction),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::All => "All",
            NodeKind::Element => "Element",
            NodeKind::Attribute => "Attribute",
            NodeKind::Namespace => "Namespace",
            NodeKind::Text => "Text",
            NodeKind::Comment => "Comment",
            NodeKind::ProcessingInstruction => "ProcessingInstruction",
        };
        f.write_str(name)
    }
}

/// Arithmetic, logical, comparison and set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Logical
    Or,
    And,
    // Equality
    Eq,
    Ne,
    // Relational
    Lt,
    Le,
    Gt,
    Ge,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
    UnaryMinus,
    // Set
    Union,
}

impl Operator {
    /// Binding strength used by the precedence climb. `Union` is folded
    /// structurally by the parser and never takes part in the climb.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Or => 1,
            Operator::And => 2,
            Operator::Eq | Operator::Ne => 3,
            Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => 4,
            Operator::Plus | Operator::Minus => 5,
            Operator::Multiply | Operator::Divide | Operator::Modulo => 6,
            Operator::UnaryMinus => 7,
            Operator::Union => 8,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Or => "Or",
            Operator::And => "And",
            Operator::Eq => "Eq",
            Operator::Ne => "Ne",
            Operator::Lt => "Lt",
            Operator::Le => "Le",
            Operator::Gt => "Gt",
            Operator::Ge => "Ge",
            Operator::Plus => "Plus",
            Operator::Minus => "Minus",
            Operator::Multiply => "Multiply",
            Operator::Divide => "Divide",
            Operator::Modulo => "Modulo",
            Operator::UnaryMinus => "Negate",
            Operator::Union => "Union",
        };
        f.write_str(name)
    }
}
