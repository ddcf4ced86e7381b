//! An arena-backed element tree for the reversed stylesheet, serialized with
//! quick-xml.

use crate::error::XsltError;
use crate::synthesis::ElementFactory;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Write;

/// Handle to an element of an [`OutputDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputElement {
    /// Qualified name as written, e.g. `xsl:template`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<ElementId>,
}

/// Elements are created detached and linked with [`OutputDocument::append_child`].
/// Only elements reachable from the document element are serialized.
#[derive(Debug, Default)]
pub struct OutputDocument {
    elements: Vec<OutputElement>,
    root: Option<ElementId>,
    /// `(prefix, uri)` pairs declared on the document element.
    namespaces: Vec<(String, String)>,
}

impl OutputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, name: &str) -> ElementId {
        self.elements.push(OutputElement {
            name: name.to_string(),
            ..Default::default()
        });
        ElementId(self.elements.len() - 1)
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.elements[parent.0].children.push(child);
    }

    /// Sets an attribute, replacing an existing value of the same name.
    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        let attributes = &mut self.elements[element.0].attributes;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn set_root(&mut self, element: ElementId) {
        self.root = Some(element);
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.push((prefix.to_string(), uri.to_string()));
    }

    pub fn element(&self, id: ElementId) -> &OutputElement {
        &self.elements[id.0]
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Writes the document, indenting by `indent` spaces per level when set.
    pub fn write_to<W: Write>(&self, sink: W, indent: Option<usize>) -> Result<(), XsltError> {
        let mut writer = match indent {
            Some(size) => Writer::new_with_indent(sink, b' ', size),
            None => Writer::new(sink),
        };
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        if let Some(root) = self.root {
            self.write_element(&mut writer, root, true)?;
        }
        Ok(())
    }

    pub fn to_xml_string(&self, indent: Option<usize>) -> Result<String, XsltError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, indent)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn write_element<W: Write>(
        &self,
        writer: &mut Writer<W>,
        id: ElementId,
        is_document_element: bool,
    ) -> Result<(), XsltError> {
        let element = self.element(id);
        let mut start = BytesStart::new(element.name.as_str());
        if is_document_element {
            for (prefix, uri) in &self.namespaces {
                start.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
            }
        }
        for (name, value) in &element.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if element.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for &child in &element.children {
            self.write_element(writer, child, false)?;
        }
        writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
        Ok(())
    }
}

impl ElementFactory for OutputDocument {
    type Element = ElementId;

    fn create_element(&mut self, name: &str) -> ElementId {
        OutputDocument::create_element(self, name)
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        OutputDocument::append_child(self, parent, child)
    }
}
