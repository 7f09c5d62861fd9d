use std::fmt;
use url::Url;

#[derive(Default, Debug, Clone)]
pub struct Namespaces(Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedName {
    namespace_idx: usize,
    pub name: String,
}

/// Upper occurrence bound of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub min: u32,
    pub max: MaxOccurs,
}

/// How an element or attribute names its type.
#[derive(Debug, Clone)]
pub enum TypeUse {
    Named(NamespacedName),
    Complex(Box<ComplexType>),
    Simple(Box<SimpleType>),
    Unspecified,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: NamespacedName,
    pub ty: TypeUse,
    pub occurs: Occurrence,
    pub nillable: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelGroup {
    pub occurs: Occurrence,
    pub particles: Vec<Particle>,
}

#[derive(Debug, Clone)]
pub enum Particle {
    Element(Element),
    ElementRef {
        reference: NamespacedName,
        occurs: Occurrence,
    },
    GroupRef {
        reference: NamespacedName,
        occurs: Occurrence,
    },
    Sequence(ModelGroup),
    Choice(ModelGroup),
    All(ModelGroup),
    Any(Occurrence),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: NamespacedName,
    pub ty: TypeUse,
    pub required: bool,
    pub array_type: Option<NamespacedName>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AttributeUse {
    Attribute(Attribute),
    Reference {
        reference: NamespacedName,
        required: bool,
        array_type: Option<NamespacedName>,
    },
    Group(NamespacedName),
    Any,
}

#[derive(Debug, Clone)]
pub struct Derivation {
    pub base: NamespacedName,
    pub particle: Option<Particle>,
    pub attributes: Vec<AttributeUse>,
}

#[derive(Debug, Clone)]
pub enum Content {
    Empty,
    Particle(Particle),
    ComplexExtension(Derivation),
    ComplexRestriction(Derivation),
    SimpleExtension(Derivation),
    SimpleRestriction(Derivation),
}

#[derive(Debug, Clone)]
pub struct ComplexType {
    pub name: Option<NamespacedName>,
    pub content: Content,
    pub attributes: Vec<AttributeUse>,
    pub mixed: bool,
    pub documentation: Option<String>,
}

/// Constraining facets of a simple type restriction.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Facets {
    pub enumeration: Vec<String>,
    pub pattern: Vec<String>,
    pub length: Option<u32>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub white_space: Option<String>,
    pub min_inclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub max_exclusive: Option<String>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum SimpleDerivation {
    Restriction { base: TypeUse, facets: Facets },
    List { item: TypeUse },
    Union { members: Vec<TypeUse> },
}

#[derive(Debug, Clone)]
pub struct SimpleType {
    pub name: Option<NamespacedName>,
    pub derivation: SimpleDerivation,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub name: NamespacedName,
    pub particle: Option<Particle>,
}

#[derive(Debug, Clone)]
pub struct AttributeGroup {
    pub name: NamespacedName,
    pub attributes: Vec<AttributeUse>,
}

/// A top-level schema component, kept in declaration order.
#[derive(Debug, Clone)]
pub enum SchemaItem {
    Element(Element),
    ComplexType(ComplexType),
    SimpleType(SimpleType),
    Group(Group),
    AttributeGroup(AttributeGroup),
    Attribute(Attribute),
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub target_namespace: String,
    pub location: Url,
    pub items: Vec<SchemaItem>,
}

#[derive(Debug, Clone)]
pub enum PartContent {
    Element(NamespacedName),
    Type(NamespacedName),
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub content: PartContent,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: NamespacedName,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub input: Option<NamespacedName>,
    pub output: Option<NamespacedName>,
    pub faults: Vec<NamespacedName>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub action: Option<String>,
    pub style: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: NamespacedName,
    pub ty: NamespacedName,
    pub transport: Option<String>,
    pub style: Option<String>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: NamespacedName,
    pub binding: NamespacedName,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Default, Debug, Clone)]
pub struct Definition {
    pub target_namespace: Option<String>,
    pub documents: Vec<Url>,
    pub schemas: Vec<Schema>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

impl Namespaces {
    pub fn namespaces(&self) -> &[String] {
        &self.0
    }

    pub fn add_or_get(&mut self, namespace: &str) -> usize {
        if let Some(index) = self.index_of(namespace) {
            index
        } else {
            let index = self.0.len();
            self.0.push(namespace.to_owned());
            index
        }
    }

    pub fn get(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or_default()
    }

    pub fn index_of(&self, namespace: &str) -> Option<usize> {
        self.0.iter().position(|value| value == namespace)
    }

    /// `{namespace}local` rendering used in diagnostics.
    pub fn display(&self, name: &NamespacedName) -> String {
        format!("{{{}}}{}", self.get(name.namespace_idx), name.name)
    }
}

impl NamespacedName {
    pub fn new(namespaces: &mut Namespaces, namespace: &str, name: String) -> Self {
        Self {
            namespace_idx: namespaces.add_or_get(namespace),
            name,
        }
    }

    pub fn index(&self) -> usize {
        self.namespace_idx
    }

    pub fn namespace<'a>(&self, namespaces: &'a Namespaces) -> &'a str {
        namespaces.get(self.namespace_idx)
    }

    pub fn is_in(&self, namespaces: &Namespaces, namespace: &str) -> bool {
        namespaces.get(self.namespace_idx) == namespace
    }

    /// A name in the same namespace.
    pub fn sibling(&self, name: String) -> Self {
        Self {
            namespace_idx: self.namespace_idx,
            name,
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns{}:{}", self.namespace_idx, self.name)
    }
}

impl Occurrence {
    pub const ONCE: Occurrence = Occurrence {
        min: 1,
        max: MaxOccurs::Bounded(1),
    };

    pub fn is_repeated(&self) -> bool {
        match self.max {
            MaxOccurs::Unbounded => true,
            MaxOccurs::Bounded(max) => max > 1,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }
}

impl Default for Occurrence {
    fn default() -> Self {
        Self::ONCE
    }
}

impl Definition {
    pub fn message(&self, name: &NamespacedName) -> Option<&Message> {
        self.messages.iter().find(|message| &message.name == name)
    }

    pub fn port_type(&self, name: &NamespacedName) -> Option<&PortType> {
        self.port_types
            .iter()
            .find(|port_type| &port_type.name == name)
    }

    pub fn binding(&self, name: &NamespacedName) -> Option<&Binding> {
        self.bindings.iter().find(|binding| &binding.name == name)
    }

    /// The first binding that implements `port_type`.
    pub fn binding_for(&self, port_type: &NamespacedName) -> Option<&Binding> {
        self.bindings.iter().find(|binding| &binding.ty == port_type)
    }

    /// Address of the first service port whose binding implements `port_type`.
    pub fn address_for(&self, port_type: &NamespacedName) -> Option<&str> {
        self.services
            .iter()
            .flat_map(|service| service.ports.iter())
            .filter(|port| {
                self.binding(&port.binding)
                    .map_or(false, |binding| &binding.ty == port_type)
            })
            .find_map(|port| port.location.as_deref())
    }

    /// Appends another document's contents after this one's.
    pub fn merge(&mut self, other: Definition) {
        if self.target_namespace.is_none() {
            self.target_namespace = other.target_namespace;
        }

        self.documents.extend(other.documents);
        self.schemas.extend(other.schemas);
        self.messages.extend(other.messages);
        self.port_types.extend(other.port_types);
        self.bindings.extend(other.bindings);
        self.services.extend(other.services);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_interned_once() {
        let mut namespaces = Namespaces::default();
        let a = NamespacedName::new(&mut namespaces, "urn:a", "One".into());
        let b = NamespacedName::new(&mut namespaces, "urn:b", "Two".into());
        let c = NamespacedName::new(&mut namespaces, "urn:a", "Three".into());

        assert_eq!(namespaces.namespaces().len(), 2);
        assert_eq!(a.index(), c.index());
        assert_ne!(a.index(), b.index());
        assert_eq!(namespaces.display(&c), "{urn:a}Three");
    }

    #[test]
    fn occurrence_classification() {
        let unbounded = Occurrence {
            min: 0,
            max: MaxOccurs::Unbounded,
        };

        assert!(unbounded.is_repeated());
        assert!(unbounded.is_optional());
        assert!(!Occurrence::ONCE.is_repeated());
        assert!(!Occurrence::ONCE.is_optional());
        assert!(Occurrence {
            min: 1,
            max: MaxOccurs::Bounded(3)
        }
        .is_repeated());
    }
}
