//! Navigable document sources for predicate generation and template reversal.

pub mod xml;

pub use tronsfarmer_xpath1::{DataSourceNode, NodeType, QName};
pub use xml::{XmlDocument, XmlNode};
