//! Reversal of XSLT 1.0 stylesheets.
//!
//! For each value a template writes, the [`Reverter`] emits a template that
//! matches that value in a transformed document and rebuilds the element
//! path the original template matched. The two building blocks are the
//! [`synthesis`] of element skeletons from forward paths and the
//! [`upstairs`] predicates that locate a value by its surroundings.

pub mod config;
pub mod datasources;
pub mod error;
pub mod output;
pub mod reverter;
pub mod synthesis;
pub mod upstairs;

pub use config::{ReverterConfig, XSLT_NAMESPACE};
pub use datasources::{DataSourceNode, NodeType, QName, XmlDocument, XmlNode};
pub use error::{Location, XsltError};
pub use output::{ElementId, OutputDocument, OutputElement};
pub use reverter::{Reverter, ReverterReport};
pub use synthesis::{ElementFactory, PathSynthesizer, Skeleton, synthesize_expression};
pub use upstairs::{NamespaceClassifier, NamespaceUri, UpstairsBuilder, upstairs_predicate};
