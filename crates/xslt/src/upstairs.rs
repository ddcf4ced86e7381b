//! Builds the reverse-match predicate for an element of a template.
//!
//! Starting from a source element, the builder walks up to a boundary
//! element and describes each addressable ancestor by its local name, its
//! attributes and its siblings, e.g.
//! `parent::node()[name()='b' and preceding-sibling::a]`. Inside a
//! `//text()[...]` match the result selects text produced at the position of
//! the source element.
//!
//! Attribute and text values are embedded as they are, without escaping
//! quote characters.

use std::fmt::Write;
use tronsfarmer_xpath1::{DataSourceNode, NodeType};

/// Decides which elements are structural wrappers (template instructions)
/// that are skipped without emitting a constraint.
pub trait NamespaceClassifier {
    fn is_wrapper(&self, namespace_uri: Option<&str>) -> bool;
}

impl<F> NamespaceClassifier for F
where
    F: Fn(Option<&str>) -> bool,
{
    fn is_wrapper(&self, namespace_uri: Option<&str>) -> bool {
        self(namespace_uri)
    }
}

/// Classifies elements in one namespace as wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceUri<'s>(pub &'s str);

impl NamespaceClassifier for NamespaceUri<'_> {
    fn is_wrapper(&self, namespace_uri: Option<&str>) -> bool {
        namespace_uri == Some(self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpstairsBuilder<C> {
    classifier: C,
}

impl<C: NamespaceClassifier> UpstairsBuilder<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// The predicate fragment for `source`, stopping at `boundary`. Empty
    /// when no addressable element lies between them, or when the document
    /// root is reached first.
    pub fn build<'a, N: DataSourceNode<'a>>(&self, source: N, boundary: N) -> String {
        let Some(element) = self.addressable(source, boundary) else {
            return String::new();
        };

        let mut fragment = format!("parent::node()[name()='{}'", local_name(element));

        for attr in element.attributes() {
            let _ = write!(fragment, " and @{}='{}'", local_name(attr), attr.string_value());
        }

        let (preceding, following) = siblings(element);
        for sibling in preceding {
            if let Some(test) = sibling_test(sibling) {
                fragment.push_str(" and preceding-sibling::");
                fragment.push_str(&test);
            }
        }
        for sibling in following {
            if let Some(test) = sibling_test(sibling) {
                fragment.push_str(" and following-sibling::");
                fragment.push_str(&test);
            }
        }

        if let Some(parent) = element.parent() {
            let up = self.build(parent, boundary);
            if !up.is_empty() {
                fragment.push_str(" and ");
                fragment.push_str(&up);
            }
        }

        fragment.push(']');
        fragment
    }

    /// The nearest element at or above `node` that is below `boundary` and
    /// is not a wrapper.
    fn addressable<'a, N: DataSourceNode<'a>>(&self, node: N, boundary: N) -> Option<N> {
        let mut current = node;
        loop {
            if current == boundary {
                return None;
            }
            match current.node_type() {
                NodeType::Root => return None,
                NodeType::Element if !self.classifier.is_wrapper(current.namespace_uri()) => {
                    return Some(current);
                }
                _ => current = current.parent()?,
            }
        }
    }
}

fn local_name<'a, N: DataSourceNode<'a>>(node: N) -> &'a str {
    node.name().map(|q| q.local_part).unwrap_or_default()
}

/// Preceding siblings nearest-first, then following siblings nearest-first.
fn siblings<'a, N: DataSourceNode<'a>>(node: N) -> (Vec<N>, Vec<N>) {
    let Some(parent) = node.parent() else {
        return (Vec::new(), Vec::new());
    };
    let all: Vec<N> = parent.children().collect();
    let Some(index) = all.iter().position(|&n| n == node) else {
        return (Vec::new(), Vec::new());
    };
    let preceding = all[..index].iter().rev().copied().collect();
    let following = all[index + 1..].to_vec();
    (preceding, following)
}

/// The node test for a sibling, or `None` when it is not addressable.
fn sibling_test<'a, N: DataSourceNode<'a>>(sibling: N) -> Option<String> {
    match sibling.node_type() {
        NodeType::Text => {
            let value = sibling.string_value();
            let trimmed = value.trim();
            // Insignificant whitespace between elements.
            if trimmed.is_empty() {
                return None;
            }
            Some(format!("text()[contains(.,'{trimmed}')]"))
        }
        NodeType::Element => {
            // Attribute axis on purpose: a bare `k='v'` would compare child elements.
            let equalities: Vec<String> = sibling
                .attributes()
                .map(|attr| format!("@{}='{}'", local_name(attr), attr.string_value()))
                .collect();
            let name = local_name(sibling);
            if equalities.is_empty() {
                Some(name.to_string())
            } else {
                Some(format!("{name}[{}]", equalities.join(" and ")))
            }
        }
        _ => None,
    }
}

/// Convenience for the common case of a single wrapper namespace.
pub fn upstairs_predicate<'a, N: DataSourceNode<'a>>(
    source: N,
    boundary: N,
    wrapper_namespace: &str,
) -> String {
    UpstairsBuilder::new(NamespaceUri(wrapper_namespace)).build(source, boundary)
}
