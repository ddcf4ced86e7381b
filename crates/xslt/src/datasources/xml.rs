// XML datasource implementation using roxmltree
use crate::error::Location;
use roxmltree::Node;
use std::hash::{Hash, Hasher};
use tronsfarmer_xpath1::{DataSourceNode, NodeType, QName};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Wrapper around roxmltree::Document providing data source capabilities
pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self { doc })
    }

    pub fn root_node(&self) -> XmlNode<'_, 'input> {
        XmlNode::Element(self.doc.root())
    }

    pub fn root_element(&self) -> XmlNode<'_, 'input> {
        XmlNode::Element(self.doc.root_element())
    }

    /// Line and column where `node` starts in the source text.
    pub fn location(&self, node: XmlNode<'_, '_>) -> Location {
        let start = match node {
            XmlNode::Element(n) => n.range().start,
            XmlNode::Attribute { parent, .. } => parent.range().start,
        };
        self.doc.text_pos_at(start).into()
    }
}

/// Represents either an element/text node or an attribute in the XML tree.
/// Attributes need special handling because roxmltree treats them as data on elements,
/// not as navigable nodes in the tree.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    /// A regular node (element, text, comment, etc.)
    Element(Node<'a, 'input>),
    /// An attribute, represented by its parent element and the attribute index
    Attribute {
        parent: Node<'a, 'input>,
        index: usize,
    },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    pub fn new(node: Node<'a, 'input>) -> Self {
        XmlNode::Element(node)
    }

    pub fn inner(&self) -> Option<Node<'a, 'input>> {
        match self {
            XmlNode::Element(node) => Some(*node),
            XmlNode::Attribute { .. } => None,
        }
    }

    /// True for an element with the given namespace URI and local name.
    pub fn is_element_named(&self, namespace: &str, local: &str) -> bool {
        self.inner().is_some_and(|n| {
            n.is_element()
                && n.tag_name().name() == local
                && n.tag_name().namespace() == Some(namespace)
        })
    }

    /// The value of an unqualified attribute of an element.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.inner().and_then(|n| n.attribute(name))
    }

    /// Element descendants in document order, excluding `self`.
    pub fn descendant_elements(&self) -> impl Iterator<Item = XmlNode<'a, 'input>> + use<'a, 'input> {
        self.inner()
            .into_iter()
            .flat_map(|n| n.descendants().skip(1))
            .filter(|n| n.is_element())
            .map(XmlNode::Element)
    }
}

impl PartialEq for XmlNode<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (XmlNode::Element(a), XmlNode::Element(b)) => a.id() == b.id(),
            (
                XmlNode::Attribute {
                    parent: p1,
                    index: i1,
                },
                XmlNode::Attribute {
                    parent: p2,
                    index: i2,
                },
            ) => p1.id() == p2.id() && i1 == i2,
            _ => false,
        }
    }
}

impl Eq for XmlNode<'_, '_> {}

impl PartialOrd for XmlNode<'_, '_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for XmlNode<'_, '_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (XmlNode::Element(a), XmlNode::Element(b)) => a.id().get().cmp(&b.id().get()),
            (
                XmlNode::Attribute {
                    parent: p1,
                    index: i1,
                },
                XmlNode::Attribute {
                    parent: p2,
                    index: i2,
                },
            ) => p1.id().get().cmp(&p2.id().get()).then(i1.cmp(i2)),
            // Elements come before their attributes in document order
            (XmlNode::Element(e), XmlNode::Attribute { parent, .. }) => {
                if e.id() == parent.id() {
                    std::cmp::Ordering::Less
                } else {
                    e.id().get().cmp(&parent.id().get())
                }
            }
            (XmlNode::Attribute { parent, .. }, XmlNode::Element(e)) => {
                if parent.id() == e.id() {
                    std::cmp::Ordering::Greater
                } else {
                    parent.id().get().cmp(&e.id().get())
                }
            }
        }
    }
}

impl Hash for XmlNode<'_, '_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            XmlNode::Element(node) => {
                0u8.hash(state);
                node.id().hash(state);
            }
            XmlNode::Attribute { parent, index } => {
                1u8.hash(state);
                parent.id().hash(state);
                index.hash(state);
            }
        }
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a, 'a> {
    fn node_type(&self) -> NodeType {
        match self {
            XmlNode::Element(n) if n.is_root() => NodeType::Root,
            XmlNode::Element(n) if n.is_text() => NodeType::Text,
            XmlNode::Element(n) if n.is_comment() => NodeType::Comment,
            XmlNode::Element(n) if n.is_pi() => NodeType::ProcessingInstruction,
            XmlNode::Element(_) => NodeType::Element,
            XmlNode::Attribute { .. } => NodeType::Attribute,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self {
            XmlNode::Element(n) if n.is_element() => {
                let tag = n.tag_name();
                // The default namespace has no prefix.
                let prefix = tag
                    .namespace()
                    .and_then(|uri| n.lookup_prefix(uri))
                    .filter(|p| !p.is_empty());
                Some(QName {
                    prefix,
                    local_part: tag.name(),
                })
            }
            XmlNode::Element(n) if n.is_pi() => n.pi().map(|pi| QName::local(pi.target)),
            XmlNode::Element(_) => None,
            XmlNode::Attribute { parent, index } => parent.attributes().nth(*index).map(|attr| {
                let prefix = match attr.namespace() {
                    Some(XML_NAMESPACE) => Some("xml"),
                    Some(uri) => parent.lookup_prefix(uri),
                    None => None,
                };
                QName {
                    prefix,
                    local_part: attr.name(),
                }
            }),
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        match self {
            XmlNode::Element(n) if n.is_element() => n.tag_name().namespace(),
            XmlNode::Element(_) => None,
            XmlNode::Attribute { parent, index } => {
                parent.attributes().nth(*index).and_then(|attr| attr.namespace())
            }
        }
    }

    fn string_value(&self) -> String {
        match self {
            XmlNode::Element(n) if n.is_text() || n.is_comment() => {
                n.text().unwrap_or("").to_string()
            }
            XmlNode::Element(n) if n.is_pi() => {
                n.pi().and_then(|pi| pi.value).unwrap_or("").to_string()
            }
            XmlNode::Element(n) => n
                .descendants()
                .filter(|d| d.is_text())
                .filter_map(|d| d.text())
                .collect(),
            XmlNode::Attribute { parent, index } => parent
                .attributes()
                .nth(*index)
                .map(|attr| attr.value().to_string())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Element(node) => {
                let parent = *node;
                let count = node.attributes().len();
                Box::new((0..count).map(move |index| XmlNode::Attribute { parent, index }))
            }
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Element(node) => Box::new(node.children().map(XmlNode::Element)),
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            XmlNode::Element(node) => node.parent().map(XmlNode::Element),
            XmlNode::Attribute { parent, .. } => Some(XmlNode::Element(*parent)),
        }
    }
}
