//! SVG document tree.

use std::collections::HashMap;

/// A complete SVG document.
#[derive(Debug, Clone)]
pub struct Document {
    /// XML declaration (e.g., `<?xml version="1.0" encoding="UTF-8"?>`)
    pub xml_declaration: Option<XmlDeclaration>,
    /// DOCTYPE declaration
    pub doctype: Option<String>,
    /// The root SVG element
    pub root: Element,
}

/// XML declaration attributes.
#[derive(Debug, Clone)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// A stable handle to an element, assigned by [`Document::reindex`].
///
/// Rules that need to mutate an element found earlier (the identifier
/// rewriter in particular) hold a `NodeId` and resolve it through the
/// document on demand. The handle never keeps the element alive: if
/// another rule removed the node, resolution simply returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// An SVG/XML element.
#[derive(Debug, Clone)]
pub struct Element {
    /// Stable handle, valid until the next [`Document::reindex`].
    pub id: NodeId,
    /// Element name with optional prefix (e.g., "svg", "xlink:href")
    pub name: QName,
    /// Attributes on this element
    pub attributes: Vec<Attribute>,
    /// Child nodes
    pub children: Vec<Node>,
}

/// A qualified name (possibly with namespace prefix).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace prefix (e.g., "svg", "xlink")
    pub prefix: Option<String>,
    /// Local name (e.g., "rect", "href")
    pub local: String,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// Parse a qualified name from a string like "prefix:local" or just "local".
    pub fn parse(s: &str) -> Self {
        if let Some((prefix, local)) = s.split_once(':') {
            Self::with_prefix(prefix, local)
        } else {
            Self::new(s)
        }
    }

    /// Check if this is a namespace declaration (xmlns or xmlns:prefix).
    pub fn is_xmlns(&self) -> bool {
        self.prefix.as_deref() == Some("xmlns") || (self.prefix.is_none() && self.local == "xmlns")
    }

    /// Get the full name as a string.
    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: QName::parse(&name.into()),
            value: value.into(),
        }
    }
}

/// A node in the SVG tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// An element node
    Element(Element),
    /// A text node
    Text(String),
    /// A comment node
    Comment(String),
    /// A CDATA section
    CData(String),
    /// A processing instruction (e.g., `<?xml-stylesheet ... ?>`)
    ProcessingInstruction {
        target: String,
        content: Option<String>,
    },
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId(0),
            name: QName::parse(&name.into()),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value by full name ("href", "xlink:href").
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.full_name() == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Set an attribute value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if let Some(attr) = self
            .attributes
            .iter_mut()
            .find(|a| a.name.full_name() == name)
        {
            attr.value = value.into();
        } else {
            self.attributes.push(Attribute::new(name, value));
        }
    }

    /// Remove an attribute by full name.
    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|a| a.name.full_name() != name);
    }

    /// Check if this element has a specific local name.
    pub fn is(&self, name: &str) -> bool {
        self.name.local == name
    }

    /// Get all namespace declarations on this element.
    pub fn namespaces(&self) -> HashMap<Option<&str>, &str> {
        let mut ns = HashMap::new();
        for attr in &self.attributes {
            if attr.name.local == "xmlns" && attr.name.prefix.is_none() {
                ns.insert(None, attr.value.as_str());
            } else if attr.name.prefix.as_deref() == Some("xmlns") {
                ns.insert(Some(attr.name.local.as_str()), attr.value.as_str());
            }
        }
        ns
    }

    /// Iterate over child elements only (skip text, comments, etc.).
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate over child elements mutably.
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Concatenated text and CDATA content of direct children.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }
}

impl Document {
    /// Recursively visit all elements in the document.
    pub fn for_each_element(&self, mut f: impl FnMut(&Element)) {
        fn visit(elem: &Element, f: &mut impl FnMut(&Element)) {
            f(elem);
            for child in elem.child_elements() {
                visit(child, f);
            }
        }
        visit(&self.root, &mut f);
    }

    /// Recursively visit all elements mutably.
    pub fn for_each_element_mut(&mut self, mut f: impl FnMut(&mut Element)) {
        fn visit(elem: &mut Element, f: &mut impl FnMut(&mut Element)) {
            f(elem);
            for child in elem.child_elements_mut() {
                visit(child, f);
            }
        }
        visit(&mut self.root, &mut f);
    }

    /// Assign fresh sequential [`NodeId`]s to every element.
    ///
    /// Called once after parsing; handles stay valid through attribute
    /// mutation and node removal (removed ids just stop resolving).
    pub fn reindex(&mut self) {
        let mut next = 0usize;
        self.for_each_element_mut(|elem| {
            elem.id = NodeId(next);
            next += 1;
        });
    }

    /// Resolve a handle to an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        fn find(elem: &Element, id: NodeId) -> Option<&Element> {
            if elem.id == id {
                return Some(elem);
            }
            elem.child_elements().find_map(|c| find(c, id))
        }
        find(&self.root, id)
    }

    /// Resolve a handle to an element, mutably.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        fn find(elem: &mut Element, id: NodeId) -> Option<&mut Element> {
            if elem.id == id {
                return Some(elem);
            }
            elem.child_elements_mut().find_map(|c| find(c, id))
        }
        find(&mut self.root, id)
    }

    /// Detach the element with the given handle from its parent.
    /// The root element cannot be removed. Returns whether a node was removed.
    pub fn remove_element(&mut self, id: NodeId) -> bool {
        fn remove_in(elem: &mut Element, id: NodeId) -> bool {
            let before = elem.children.len();
            elem.children
                .retain(|n| !matches!(n, Node::Element(e) if e.id == id));
            if elem.children.len() != before {
                return true;
            }
            elem.child_elements_mut().any(|c| remove_in(c, id))
        }
        remove_in(&mut self.root, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut root = Element::new("svg");
        let mut g = Element::new("g");
        g.children.push(Node::Element(Element::new("rect")));
        root.children.push(Node::Element(g));
        let mut doc = Document {
            xml_declaration: None,
            doctype: None,
            root,
        };
        doc.reindex();
        doc
    }

    #[test]
    fn test_reindex_and_lookup() {
        let doc = sample();
        assert_eq!(doc.root.id, NodeId(0));
        assert!(doc.element(NodeId(2)).is_some_and(|e| e.is("rect")));
        assert!(doc.element(NodeId(99)).is_none());
    }

    #[test]
    fn test_remove_element() {
        let mut doc = sample();
        assert!(doc.remove_element(NodeId(2)));
        assert!(doc.element(NodeId(2)).is_none());
        assert!(!doc.remove_element(NodeId(2)));
        // root is not removable
        assert!(!doc.remove_element(NodeId(0)));
    }

    #[test]
    fn test_attr_by_full_name() {
        let mut e = Element::new("use");
        e.set_attr("xlink:href", "#a");
        assert_eq!(e.get_attr("xlink:href"), Some("#a"));
        assert_eq!(e.get_attr("href"), None);
        e.remove_attr("xlink:href");
        assert!(!e.has_attr("xlink:href"));
    }
}
