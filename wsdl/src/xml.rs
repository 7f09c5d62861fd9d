use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::{collections::HashMap, io::BufRead, rc::Rc};
use url::Url;

use super::error;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, prefixed_name),
    }
}

#[derive(Debug, Clone, Default)]
struct Scope {
    default: Option<String>,
    prefixes: HashMap<String, String>,
}

/// An element of a parsed document with its in-scope namespace declarations.
#[derive(Debug)]
pub struct Node {
    pub namespace: Option<String>,
    pub name: String,
    pub text: String,
    pub children: Vec<Node>,
    attributes: Vec<(String, String)>,
    scope: Rc<Scope>,
}

impl Scope {
    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }

        self.prefixes.get(prefix).map(String::as_str)
    }
}

impl Node {
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// An unprefixed attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// A prefixed attribute whose prefix is bound to `namespace`.
    pub fn attribute_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes.iter().find_map(|(key, value)| {
            match split_namespaced_name(key) {
                (Some(prefix), local)
                    if local == name && self.scope.lookup(prefix) == Some(namespace) =>
                {
                    Some(value.as_str())
                }
                _ => None,
            }
        })
    }

    /// Resolves a QName-valued attribute into `(namespace, local name)`.
    /// Unprefixed values take the default namespace, or no namespace at all.
    pub fn resolve_qname(&self, value: &str) -> Option<(String, String)> {
        let (prefix, local) = split_namespaced_name(value.trim());

        let namespace = match prefix {
            Some(prefix) => self.scope.lookup(prefix)?.to_owned(),
            None => self.scope.default.clone().unwrap_or_default(),
        };

        Some((namespace, local.to_owned()))
    }

    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter()
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All text below this node, in document order of the elements.
    pub fn text_content(&self) -> String {
        let mut text = self.text.clone();

        for child in &self.children {
            let inner = child.text_content();
            if !inner.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&inner);
            }
        }

        text
    }
}

fn start_node<B: BufRead>(
    reader: &Reader<B>,
    start: &BytesStart<'_>,
    parent: &Rc<Scope>,
    url: &Url,
) -> Result<Node, error::Error> {
    let xml_error = |source| error::Error::XmlParseError {
        url: url.clone(),
        source,
    };

    let qualified = reader.decode(start.name()).map_err(xml_error)?.to_owned();

    let mut attributes = Vec::new();
    let mut default = None;
    let mut declared = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let key = reader.decode(attribute.key).map_err(xml_error)?.to_owned();
        let value = attribute.unescaped_value().map_err(xml_error)?;
        let value = reader.decode(&value).map_err(xml_error)?.to_owned();

        if key == "xmlns" {
            default = Some(value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_owned(), value));
        } else {
            attributes.push((key, value));
        }
    }

    let scope = if default.is_none() && declared.is_empty() {
        Rc::clone(parent)
    } else {
        let mut scope = Scope::clone(parent);

        if let Some(default) = default {
            scope.default = Some(default).filter(|namespace| !namespace.is_empty());
        }

        scope.prefixes.extend(declared);
        Rc::new(scope)
    };

    let (prefix, local_name) = split_namespaced_name(&qualified);

    let namespace = match prefix {
        Some(prefix) => Some(
            scope
                .lookup(prefix)
                .ok_or_else(|| {
                    error::Error::malformed(url, format!("undeclared namespace prefix `{}`", prefix))
                })?
                .to_owned(),
        ),
        None => scope.default.clone(),
    };

    Ok(Node {
        namespace,
        name: local_name.to_owned(),
        text: String::new(),
        children: Vec::new(),
        attributes,
        scope,
    })
}

fn append_text(stack: &mut [Node], text: &str) {
    let text = text.trim();

    if let (Some(node), false) = (stack.last_mut(), text.is_empty()) {
        if !node.text.is_empty() {
            node.text.push(' ');
        }
        node.text.push_str(text);
    }
}

/// Parses a whole document into its root [`Node`].
pub fn parse(bytes: &[u8], url: &Url) -> Result<Node, error::Error> {
    let xml_error = |source| error::Error::XmlParseError {
        url: url.clone(),
        source,
    };

    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let root_scope = Rc::new(Scope::default());
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;
    let mut buffer = Vec::new();

    loop {
        match reader.read_event(&mut buffer).map_err(xml_error)? {
            Event::Start(start) => {
                let parent = stack.last().map_or(&root_scope, |node| &node.scope);
                let node = start_node(&reader, &start, parent, url)?;
                stack.push(node);
            }

            Event::Empty(start) => {
                let parent = stack.last().map_or(&root_scope, |node| &node.scope);
                let node = start_node(&reader, &start, parent, url)?;

                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }

            Event::End(..) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| error::Error::malformed(url, "unbalanced closing tag"))?;

                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }

            Event::Text(text) => {
                let unescaped = text.unescaped().map_err(xml_error)?;
                let text = reader.decode(&unescaped).map_err(xml_error)?;
                append_text(&mut stack, text);
            }

            Event::CData(text) => {
                let text = reader.decode(&text).map_err(xml_error)?;
                append_text(&mut stack, text);
            }

            Event::Eof => break,

            _ => (),
        }

        buffer.clear();
    }

    if !stack.is_empty() {
        return Err(error::Error::malformed(url, "unexpected end of document"));
    }

    root.ok_or_else(|| error::Error::malformed(url, "document has no root element"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("file:///test.xml").unwrap()
    }

    #[test]
    fn resolves_prefixes_and_default_namespace() {
        let document = br#"<root xmlns="urn:default" xmlns:a="urn:a">
            <a:child type="a:Thing" other="Plain"/>
            <inner xmlns:a="urn:shadow"><a:leaf ref="a:Name"/></inner>
        </root>"#;

        let root = parse(document, &url()).unwrap();
        assert!(root.is("urn:default", "root"));

        let child = root.child("child").unwrap();
        assert_eq!(child.namespace.as_deref(), Some("urn:a"));
        assert_eq!(
            child.resolve_qname(child.attribute("type").unwrap()),
            Some(("urn:a".to_owned(), "Thing".to_owned()))
        );
        assert_eq!(
            child.resolve_qname("Plain"),
            Some(("urn:default".to_owned(), "Plain".to_owned()))
        );

        let leaf = root.child("inner").unwrap().child("leaf").unwrap();
        assert_eq!(leaf.namespace.as_deref(), Some("urn:shadow"));
        assert_eq!(leaf.resolve_qname("missing:Name"), None);
    }

    #[test]
    fn collects_text_and_rejects_undeclared_prefixes() {
        let root = parse(b"<doc>hello <b>big</b> world</doc>", &url()).unwrap();
        assert_eq!(root.text_content(), "hello world big");

        let error = parse(b"<x:doc/>", &url()).unwrap_err();
        assert_eq!(error.kind(), crate::error::ErrorKind::Parse);
    }

    #[test]
    fn unbalanced_document_is_a_parse_error() {
        let error = parse(b"<doc><open></doc>", &url()).unwrap_err();
        assert_eq!(error.kind(), crate::error::ErrorKind::Parse);
    }
}
