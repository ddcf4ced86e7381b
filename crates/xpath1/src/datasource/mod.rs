//! Defines the core abstraction for a navigable, read-only document tree.
use std::hash::Hash;

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

impl<'a> QName<'a> {
    pub fn local(local_part: &'a str) -> Self {
        QName {
            prefix: None,
            local_part,
        }
    }
}

impl std::fmt::Display for QName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_part),
            None => f.write_str(self.local_part),
        }
    }
}

/// The type of a node in the tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract for a node in a read-only, hierarchical document.
///
/// Predicate generation and template reversal are written against this trait
/// only, so they run unchanged over a parsed XML document or an in-memory
/// mock.
///
/// `'a` is the lifetime of the underlying document.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node (e.g., `xsl:template`). Returns `None` for
    /// node types that do not have names, such as text or root nodes. For a
    /// processing-instruction, this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI of an element or attribute, if it is in one.
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The string value of the node, as defined by the XPath 1.0 `string()` function.
    /// - For a text node, this is its content.
    /// - For an element, this is the concatenation of the string values of all
    ///   its descendant text nodes.
    /// - For an attribute, this is its value.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node, in document order.
    /// The iterator will be empty for non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node, in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. Returns `None` for the root node.
    fn parent(&self) -> Option<Self>;
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    #[derive(Debug, Clone)]
    struct MockNodeData {
        node_type: NodeType,
        prefix: Option<&'static str>,
        local: Option<&'static str>,
        namespace: Option<&'static str>,
        value: String,
        parent: Option<usize>,
        children: Vec<usize>,
        attributes: Vec<usize>,
    }

    /// An in-memory tree whose node ids are assigned in document order.
    #[derive(Debug, Default)]
    pub struct MockTree {
        nodes: Vec<MockNodeData>,
    }

    /// A node handle that borrows its tree so it can navigate itself.
    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree,
    }

    impl MockTree {
        /// Creates a tree containing only the root node (id 0).
        pub fn new() -> Self {
            let mut tree = MockTree::default();
            tree.push(NodeType::Root, None, None, None, String::new(), None);
            tree
        }

        pub fn root(&self) -> MockNode<'_> {
            self.node(0)
        }

        pub fn node(&self, id: usize) -> MockNode<'_> {
            MockNode { id, tree: self }
        }

        fn push(
            &mut self,
            node_type: NodeType,
            prefix: Option<&'static str>,
            local: Option<&'static str>,
            namespace: Option<&'static str>,
            value: String,
            parent: Option<usize>,
        ) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNodeData {
                node_type,
                prefix,
                local,
                namespace,
                value,
                parent,
                children: Vec::new(),
                attributes: Vec::new(),
            });
            if let Some(parent) = parent {
                if node_type == NodeType::Attribute {
                    self.nodes[parent].attributes.push(id);
                } else {
                    self.nodes[parent].children.push(id);
                }
            }
            id
        }

        /// Appends an element; `name` may be `prefix:local`.
        pub fn element(&mut self, parent: usize, name: &'static str, namespace: Option<&'static str>) -> usize {
            let (prefix, local) = match name.split_once(':') {
                Some((p, l)) => (Some(p), l),
                None => (None, name),
            };
            self.push(NodeType::Element, prefix, Some(local), namespace, String::new(), Some(parent))
        }

        pub fn attribute(&mut self, element: usize, name: &'static str, value: &str) -> usize {
            self.push(NodeType::Attribute, None, Some(name), None, value.to_string(), Some(element))
        }

        pub fn text(&mut self, parent: usize, value: &str) -> usize {
            self.push(NodeType::Text, None, None, None, value.to_string(), Some(parent))
        }

        pub fn comment(&mut self, parent: usize, value: &str) -> usize {
            self.push(NodeType::Comment, None, None, None, value.to_string(), Some(parent))
        }

        fn text_content(&self, id: usize, out: &mut String) {
            let data = &self.nodes[id];
            match data.node_type {
                NodeType::Text => out.push_str(&data.value),
                NodeType::Root | NodeType::Element => {
                    for &child in &data.children {
                        self.text_content(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    impl PartialEq for MockNode<'_> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for MockNode<'_> {}

    impl PartialOrd for MockNode<'_> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl Ord for MockNode<'_> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl Hash for MockNode<'_> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.tree.nodes[self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            let data = &self.tree.nodes[self.id];
            data.local.map(|local_part| QName {
                prefix: data.prefix,
                local_part,
            })
        }

        fn namespace_uri(&self) -> Option<&'a str> {
            self.tree.nodes[self.id].namespace
        }

        fn string_value(&self) -> String {
            let data = &self.tree.nodes[self.id];
            match data.node_type {
                NodeType::Root | NodeType::Element => {
                    let mut out = String::new();
                    self.tree.text_content(self.id, &mut out);
                    out
                }
                _ => data.value.clone(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                tree.nodes[self.id]
                    .attributes
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                tree.nodes[self.id]
                    .children
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn parent(&self) -> Option<Self> {
            self.tree.nodes[self.id]
                .parent
                .map(|id| MockNode { id, tree: self.tree })
        }
    }

    pub const XSL_NS: &str = "http://www.w3.org/1999/XSL/Transform";

    /// Creates a small template tree for testing:
    /// ```text
    /// <xsl:template match="/page/body">          <!-- id 1, attr 2 -->
    ///   <div class="box">                        <!-- id 3, attr 4 -->
    ///     <h1>Title</h1>                         <!-- id 5, text 6 -->
    ///     <!-- note -->                          <!-- id 7 -->
    ///     <span><xsl:value-of select="."/></span><!-- id 8, 9, attr 10 -->
    ///     tail text                              <!-- id 11 -->
    ///   </div>
    /// </xsl:template>
    /// ```
    pub fn create_test_tree() -> MockTree {
        let mut tree = MockTree::new();
        let template = tree.element(0, "xsl:template", Some(XSL_NS));
        tree.attribute(template, "match", "/page/body");
        let div = tree.element(template, "div", None);
        tree.attribute(div, "class", "box");
        let h1 = tree.element(div, "h1", None);
        tree.text(h1, "Title");
        tree.comment(div, " note ");
        let span = tree.element(div, "span", None);
        let value_of = tree.element(span, "xsl:value-of", Some(XSL_NS));
        tree.attribute(value_of, "select", ".");
        tree.text(div, " tail text ");
        tree
    }

}
