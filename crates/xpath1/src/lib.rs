pub mod ast;
pub mod builder;
pub mod datasource;
pub mod error;
pub mod parser;
pub mod scanner;
pub mod tree;

pub use ast::{Axis, NodeKind, Operator};
pub use builder::Builder;
pub use datasource::{DataSourceNode, NodeType, QName};
pub use error::{AbbreviatedStep, ParseError, ParseErrorKind, Span, XPathError};
pub use parser::{Parser, parse_expression};
pub use scanner::{LexKind, Lexeme, Scanner, tokenize};
pub use tree::{TreeBuilder, TreeNode};

// Re-export test utilities for integration testing in downstream crates
pub use datasource::tests;
