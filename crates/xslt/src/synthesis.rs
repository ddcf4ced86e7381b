//! Builds an element skeleton that a forward selection path would match.
//!
//! Only a chain of named child-element steps, optionally anchored at the
//! root, can be synthesized. Anything else (predicates, wildcards, other
//! axes, unions, function calls) declines with `None`; declining is an
//! expected outcome, not an error.

use crate::config::DEFAULT_SKELETON_ROOT;
use tronsfarmer_xpath1::{Axis, NodeKind, TreeNode, XPathError, parse_expression};

/// Creates and links elements of the destination tree.
pub trait ElementFactory {
    type Element: Copy;

    fn create_element(&mut self, name: &str) -> Self::Element;

    fn append_child(&mut self, parent: Self::Element, child: Self::Element);
}

/// A synthesized element tree and its leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton<E> {
    pub root: E,
    /// Elements without synthesized children, in traversal order. Callers
    /// insert value-producing instructions here.
    pub attachments: Vec<E>,
}

#[derive(Debug, Clone)]
pub struct PathSynthesizer {
    root_name: String,
}

impl Default for PathSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SKELETON_ROOT)
    }
}

impl PathSynthesizer {
    /// `root_name` names the element synthesized for a bare `/`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
        }
    }

    pub fn synthesize<F: ElementFactory>(
        &self,
        path: &TreeNode,
        factory: &mut F,
    ) -> Option<Skeleton<F::Element>> {
        // Validate the whole chain first so a decline allocates nothing.
        let names = self.step_names(path)?;
        let (first, rest) = names.split_first()?;

        let root = factory.create_element(first);
        let mut leaf = root;
        for name in rest {
            let child = factory.create_element(name);
            factory.append_child(leaf, child);
            leaf = child;
        }

        Some(Skeleton {
            root,
            attachments: vec![leaf],
        })
    }

    /// Parses `text` and synthesizes its skeleton. A malformed expression is
    /// an error; a well-formed but unsupported one is `Ok(None)`.
    pub fn synthesize_expression<F: ElementFactory>(
        &self,
        text: &str,
        factory: &mut F,
    ) -> Result<Option<Skeleton<F::Element>>, XPathError> {
        let path = parse_expression(text)?;
        Ok(self.synthesize(&path, factory))
    }

    fn step_names(&self, path: &TreeNode) -> Option<Vec<String>> {
        let mut steps = Vec::new();
        flatten_steps(path, &mut steps);

        let mut names = Vec::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            match step {
                // The root only anchors the chain; it gets an element of its
                // own when nothing follows it.
                TreeNode::Axis {
                    axis: Axis::Root, ..
                } if i == 0 => {
                    if steps.len() == 1 {
                        names.push(self.root_name.clone());
                    }
                }
                TreeNode::Axis {
                    axis: Axis::Child,
                    kind: NodeKind::Element,
                    prefix,
                    name: Some(name),
                } => names.push(match prefix {
                    Some(prefix) => format!("{prefix}:{name}"),
                    None => name.clone(),
                }),
                other => {
                    log::debug!("Cannot synthesize a skeleton for step {other}");
                    return None;
                }
            }
        }
        Some(names)
    }
}

fn flatten_steps<'t>(node: &'t TreeNode, out: &mut Vec<&'t TreeNode>) {
    match node {
        TreeNode::JoinStep { left, right } => {
            flatten_steps(left, out);
            flatten_steps(right, out);
        }
        other => out.push(other),
    }
}

/// Parses and synthesizes with the default root element name.
pub fn synthesize_expression<F: ElementFactory>(
    text: &str,
    factory: &mut F,
) -> Result<Option<Skeleton<F::Element>>, XPathError> {
    PathSynthesizer::default().synthesize_expression(text, factory)
}
