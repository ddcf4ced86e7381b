//! XPath 1.0 path-expression parsing and XSLT stylesheet reversal.
//!
//! - [`xpath1`]: scanner, recursive-descent parser and the [`Builder`]
//!   capability it drives.
//! - [`xslt`]: element skeleton synthesis, upstairs match predicates and the
//!   stylesheet [`Reverter`] built on them.

pub use tronsfarmer_xpath1 as xpath1;
pub use tronsfarmer_xslt as xslt;

pub use tronsfarmer_xpath1::{
    Builder, ParseError, ParseErrorKind, Parser, Span, TreeBuilder, TreeNode, XPathError,
    parse_expression,
};
pub use tronsfarmer_xslt::{
    Reverter, ReverterConfig, ReverterReport, Skeleton, XsltError, synthesize_expression,
    upstairs_predicate,
};

/// Reverses `stylesheet` with the default configuration.
pub fn revert_stylesheet(stylesheet: &str) -> Result<String, XsltError> {
    log::debug!("Reversing stylesheet ({} bytes)", stylesheet.len());
    Reverter::default().revert(stylesheet)
}
