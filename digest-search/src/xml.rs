//! Namespace-aware XML tree and element accessor for feed parsing.
//!
//! Feeds declare their elements in whatever namespace they like (Atom in
//! `http://www.w3.org/2005/Atom`, RSS 2.0 usually in none). Instead of
//! branching on prefixes, documents are parsed into a small tree whose
//! elements carry their resolved namespace URI, and [`NsAccessor`] resolves
//! logical paths such as `"author/name"` against one namespace.

use crate::error::DigestError;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

/// A node in the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its resolved namespace URI and local name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Namespace URI, `None` when the element is in no namespace.
    pub namespace: Option<String>,
    /// Local name without prefix.
    pub name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// All descendant text in document order, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_owned()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether this element has local name `name` in namespace `namespace`.
    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse `xml` into a tree, resolving every element's namespace.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Parse`] on malformed XML, mismatched tags, or a
    /// document without a root element.
    pub fn parse(xml: &str) -> Result<Self, DigestError> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| DigestError::Parse(format!("malformed XML: {e}")))?;

            match event {
                Event::Start(ref e) => {
                    stack.push(start_element(resolved, e)?);
                }
                Event::Empty(ref e) => {
                    let element = start_element(resolved, e)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| DigestError::Parse("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(ref e) => {
                    let text = match e.unescape() {
                        Ok(t) => t.into_owned(),
                        Err(_) => lenient_unescape(&String::from_utf8_lossy(e)),
                    };
                    push_text(&mut stack, text);
                }
                Event::CData(ref e) => {
                    push_text(&mut stack, String::from_utf8_lossy(e).into_owned());
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DigestError::Parse("unexpected end of document".into()));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| DigestError::Parse("document has no root element".into()))
    }

    /// Namespace declared for the root element, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.root.namespace.as_deref()
    }
}

fn start_element(resolved: ResolveResult<'_>, e: &BytesStart<'_>) -> Result<XmlElement, DigestError> {
    let namespace = match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    };
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DigestError::Parse(format!("bad attribute: {err}")))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => lenient_unescape(&String::from_utf8_lossy(&attr.value)),
        };
        attributes.push((key, value));
    }

    Ok(XmlElement {
        namespace,
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Unescape text that strict unescaping rejected.
///
/// Every `&` that does not open a resolvable reference (an unknown name,
/// a bad character reference, or no `;` at all) is taken literally; all
/// other references still resolve. Escaped markup therefore always comes
/// out as markup for the HTML stripper to remove.
fn lenient_unescape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        escaped.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let resolvable = after
            .find(';')
            .map(|end| &after[..end])
            .is_some_and(is_resolvable_reference);
        escaped.push_str(if resolvable { "&" } else { "&amp;" });
        rest = after;
    }
    escaped.push_str(rest);
    match unescape(&escaped) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_owned(),
    }
}

fn is_resolvable_reference(name: &str) -> bool {
    let Some(number) = name.strip_prefix('#') else {
        return resolve_predefined_entity(name).is_some();
    };
    let (digits, radix) = match number.strip_prefix('x') {
        Some(hex) => (hex, 16),
        None => (number, 10),
    };
    if digits.starts_with(['+', '-']) {
        return false;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .is_some_and(|c| c != '\0')
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(stack: &mut [XmlElement], text: String) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Text(text));
    }
}

/// Resolves logical element paths within one namespace.
///
/// `None` selects elements in no namespace, which is how RSS 2.0 and
/// undeclared Atom documents are read.
#[derive(Debug, Clone, Copy)]
pub struct NsAccessor<'a> {
    namespace: Option<&'a str>,
}

impl<'a> NsAccessor<'a> {
    /// Accessor for an explicit namespace (or none).
    pub fn new(namespace: Option<&'a str>) -> Self {
        Self { namespace }
    }

    /// Accessor for whatever namespace the document's root declares.
    pub fn for_document(document: &'a XmlDocument) -> Self {
        Self::new(document.namespace())
    }

    /// Direct children of `parent` named `name`.
    pub fn children<'e>(
        &self,
        parent: &'e XmlElement,
        name: &'e str,
    ) -> impl Iterator<Item = &'e XmlElement> + 'e
    where
        'a: 'e,
    {
        let namespace: Option<&'e str> = self.namespace;
        parent.elements().filter(move |el| el.is(namespace, name))
    }

    /// First element reached by following a `/`-separated path.
    pub fn find<'e>(&self, parent: &'e XmlElement, path: &str) -> Option<&'e XmlElement> {
        path.split('/').try_fold(parent, |current, step| {
            current.elements().find(|el| el.is(self.namespace, step))
        })
    }

    /// Trimmed text at `path`, `None` when the element is absent or empty.
    pub fn text(&self, parent: &XmlElement, path: &str) -> Option<String> {
        self.find(parent, path)
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
    }
}
