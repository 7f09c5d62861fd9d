use tracing::trace;
use url::Url;

use super::{
    error, ns,
    types::{
        Attribute, AttributeGroup, AttributeUse, Binding, BindingOperation, ComplexType, Content,
        Definition, Derivation, Element, Facets, Group, MaxOccurs, Message, ModelGroup,
        NamespacedName, Namespaces, Occurrence, Operation, Part, PartContent, Particle, Port,
        PortType, Schema, SchemaItem, Service, SimpleDerivation,
        SimpleType, TypeUse,
    },
    xml::Node,
};

/// A document location discovered while parsing, still to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    pub namespace: Option<String>,
    pub location: String,
    /// Namespace adopted by an included schema that declares none.
    pub chameleon: Option<String>,
}

pub(crate) struct Parsed {
    pub definition: Definition,
    pub references: Vec<Reference>,
}

#[derive(Clone, Default)]
struct Target {
    namespace: String,
    qualified_elements: bool,
    qualified_attributes: bool,
}

struct Parser<'a> {
    url: &'a Url,
    namespaces: &'a mut Namespaces,
    target: Target,
    references: Vec<Reference>,
}

fn documentation(node: &Node) -> Option<String> {
    let mut texts = Vec::new();

    for child in node.children() {
        match child.name.as_str() {
            "documentation" => texts.push(child.text_content()),
            "annotation" => texts.extend(
                child
                    .children()
                    .filter(|inner| inner.name == "documentation")
                    .map(Node::text_content),
            ),
            _ => (),
        }
    }

    let lines = texts
        .iter()
        .flat_map(|text| text.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn is_soap_extension(node: &Node) -> bool {
    matches!(
        node.namespace.as_deref(),
        Some(ns::SOAP11_BINDING) | Some(ns::SOAP12_BINDING)
    )
}

impl<'a> Parser<'a> {
    fn new(url: &'a Url, namespaces: &'a mut Namespaces) -> Self {
        Self {
            url,
            namespaces,
            target: Target::default(),
            references: Vec::new(),
        }
    }

    fn malformed(&self, message: impl Into<String>) -> error::Error {
        error::Error::malformed(self.url, message)
    }

    fn required<'n>(&self, node: &'n Node, attribute: &str) -> Result<&'n str, error::Error> {
        node.attribute(attribute).ok_or_else(|| {
            self.malformed(format!(
                "missing `{}` attribute on <{}>",
                attribute, node.name
            ))
        })
    }

    fn target_namespaced(&mut self, name: &str) -> NamespacedName {
        let target = self.target.namespace.clone();
        NamespacedName::new(self.namespaces, &target, name.to_owned())
    }

    fn unqualified(&mut self, name: &str) -> NamespacedName {
        NamespacedName::new(self.namespaces, "", name.to_owned())
    }

    fn resolve_namespace(&mut self, node: &Node, prefixed_name: &str) -> Result<NamespacedName, error::Error> {
        match node.resolve_qname(prefixed_name) {
            Some((namespace, name)) => Ok(NamespacedName::new(self.namespaces, &namespace, name)),
            None => Err(self.malformed(format!(
                "undeclared namespace prefix in `{}`",
                prefixed_name
            ))),
        }
    }

    fn resolve_attribute(&mut self, node: &Node, attribute: &str) -> Result<NamespacedName, error::Error> {
        let value = self.required(node, attribute)?;
        self.resolve_namespace(node, value)
    }

    fn number(&self, node: &Node, attribute: &str) -> Result<Option<u32>, error::Error> {
        node.attribute(attribute)
            .map(|value| {
                value.trim().parse::<u32>().map_err(|_| {
                    self.malformed(format!(
                        "invalid `{}` value `{}` on <{}>",
                        attribute, value, node.name
                    ))
                })
            })
            .transpose()
    }

    fn occurs(&self, node: &Node) -> Result<Occurrence, error::Error> {
        let min = self.number(node, "minOccurs")?.unwrap_or(1);

        let max = match node.attribute("maxOccurs").map(str::trim) {
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(_) => MaxOccurs::Bounded(self.number(node, "maxOccurs")?.unwrap_or(1)),
            None => MaxOccurs::Bounded(1),
        };

        Ok(Occurrence { min, max })
    }

    fn parse(mut self, root: &Node, chameleon: Option<&str>) -> Result<Parsed, error::Error> {
        let mut definition = Definition {
            documents: vec![self.url.clone()],
            ..Definition::default()
        };

        match root.name.as_str() {
            "definitions" => self.parse_definitions(root, &mut definition)?,

            "schema" => {
                let schema = self.parse_schema(root, chameleon)?;
                definition.target_namespace = Some(schema.target_namespace.clone());
                definition.schemas.push(schema);
            }

            "description" => return Err(self.malformed("WSDL 2.0 documents are not supported")),

            other => {
                return Err(self.malformed(format!(
                    "expected <definitions> or <schema>, found <{}>",
                    other
                )))
            }
        }

        Ok(Parsed {
            definition,
            references: self.references,
        })
    }

    fn parse_definitions(&mut self, node: &Node, definition: &mut Definition) -> Result<(), error::Error> {
        let namespace = node.attribute("targetNamespace").unwrap_or_default().to_owned();
        definition.target_namespace = Some(namespace.clone());

        self.target = Target {
            namespace,
            ..Target::default()
        };

        for child in node.children() {
            match child.name.as_str() {
                "import" => {
                    let location = self.required(child, "location")?;

                    self.references.push(Reference {
                        namespace: child.attribute("namespace").map(ToOwned::to_owned),
                        location: location.to_owned(),
                        chameleon: None,
                    });
                }

                "types" => {
                    for schema in child.children().filter(|inner| inner.name == "schema") {
                        let schema = self.parse_schema(schema, None)?;
                        definition.schemas.push(schema);
                    }
                }

                "message" => {
                    let message = self.parse_message(child)?;
                    definition.messages.push(message);
                }

                "portType" => {
                    let port_type = self.parse_port_type(child)?;
                    definition.port_types.push(port_type);
                }

                "binding" => {
                    let binding = self.parse_binding(child)?;
                    definition.bindings.push(binding);
                }

                "service" => {
                    let service = self.parse_service(child)?;
                    definition.services.push(service);
                }

                name => trace!("ignoring <{}> inside <definitions>", name),
            }
        }

        Ok(())
    }

    fn parse_schema(&mut self, node: &Node, chameleon: Option<&str>) -> Result<Schema, error::Error> {
        let namespace = node
            .attribute("targetNamespace")
            .or(chameleon)
            .unwrap_or_default()
            .to_owned();

        let previous = std::mem::replace(
            &mut self.target,
            Target {
                namespace: namespace.clone(),
                qualified_elements: node.attribute("elementFormDefault") == Some("qualified"),
                qualified_attributes: node.attribute("attributeFormDefault") == Some("qualified"),
            },
        );

        let items = self.parse_schema_items(node);
        self.target = previous;

        Ok(Schema {
            target_namespace: namespace,
            location: self.url.clone(),
            items: items?,
        })
    }

    fn parse_schema_items(&mut self, node: &Node) -> Result<Vec<SchemaItem>, error::Error> {
        let mut items = Vec::new();

        for child in node.children() {
            match child.name.as_str() {
                "import" | "include" | "redefine" => {
                    if let Some(location) = child.attribute("schemaLocation") {
                        self.references.push(Reference {
                            namespace: child.attribute("namespace").map(ToOwned::to_owned),
                            location: location.to_owned(),
                            chameleon: (child.name != "import")
                                .then(|| self.target.namespace.clone()),
                        });
                    }
                }

                "element" => items.push(SchemaItem::Element(self.parse_element(child, true)?)),

                "complexType" => {
                    items.push(SchemaItem::ComplexType(self.parse_complex_type(child, true)?))
                }

                "simpleType" => {
                    items.push(SchemaItem::SimpleType(self.parse_simple_type(child, true)?))
                }

                "group" => {
                    let name = self.required(child, "name")?;
                    let name = self.target_namespaced(name);
                    let particle = self.parse_particles(child)?.into_iter().next();
                    items.push(SchemaItem::Group(Group { name, particle }));
                }

                "attributeGroup" => {
                    let name = self.required(child, "name")?;
                    let name = self.target_namespaced(name);
                    let attributes = self.parse_attribute_uses(child)?;
                    items.push(SchemaItem::AttributeGroup(AttributeGroup { name, attributes }));
                }

                "attribute" => {
                    items.push(SchemaItem::Attribute(self.parse_attribute(child, true)?))
                }

                name => trace!("ignoring <{}> inside <schema>", name),
            }
        }

        Ok(items)
    }

    fn type_use(&mut self, node: &Node) -> Result<TypeUse, error::Error> {
        if let Some(ty) = node.attribute("type") {
            return Ok(TypeUse::Named(self.resolve_namespace(node, ty)?));
        }

        for child in node.children() {
            match child.name.as_str() {
                "complexType" => {
                    return Ok(TypeUse::Complex(Box::new(
                        self.parse_complex_type(child, false)?,
                    )))
                }

                "simpleType" => {
                    return Ok(TypeUse::Simple(Box::new(
                        self.parse_simple_type(child, false)?,
                    )))
                }

                _ => (),
            }
        }

        Ok(TypeUse::Unspecified)
    }

    fn parse_element(&mut self, node: &Node, top_level: bool) -> Result<Element, error::Error> {
        let name = self.required(node, "name")?;

        let qualified = match node.attribute("form") {
            Some(form) => form == "qualified",
            None => self.target.qualified_elements,
        };

        let name = if top_level || qualified {
            self.target_namespaced(name)
        } else {
            self.unqualified(name)
        };

        Ok(Element {
            name,
            ty: self.type_use(node)?,
            occurs: if top_level {
                Occurrence::ONCE
            } else {
                self.occurs(node)?
            },
            nillable: node.attribute("nillable") == Some("true"),
            documentation: documentation(node),
        })
    }

    fn parse_particles(&mut self, node: &Node) -> Result<Vec<Particle>, error::Error> {
        let mut particles = Vec::new();

        for child in node.children() {
            if let Some(particle) = self.parse_particle(child)? {
                particles.push(particle);
            }
        }

        Ok(particles)
    }

    fn parse_particle(&mut self, node: &Node) -> Result<Option<Particle>, error::Error> {
        let particle = match node.name.as_str() {
            "element" => match node.attribute("ref") {
                Some(reference) => Particle::ElementRef {
                    reference: self.resolve_namespace(node, reference)?,
                    occurs: self.occurs(node)?,
                },
                None => Particle::Element(self.parse_element(node, false)?),
            },

            "sequence" | "choice" | "all" => {
                let group = ModelGroup {
                    occurs: self.occurs(node)?,
                    particles: self.parse_particles(node)?,
                };

                match node.name.as_str() {
                    "sequence" => Particle::Sequence(group),
                    "choice" => Particle::Choice(group),
                    _ => Particle::All(group),
                }
            }

            "group" => Particle::GroupRef {
                reference: self.resolve_attribute(node, "ref")?,
                occurs: self.occurs(node)?,
            },

            "any" => Particle::Any(self.occurs(node)?),

            _ => return Ok(None),
        };

        Ok(Some(particle))
    }

    fn array_type(&mut self, node: &Node) -> Result<Option<NamespacedName>, error::Error> {
        match node.attribute_ns(ns::WSDL, "arrayType") {
            Some(value) => {
                let item = value.split('[').next().unwrap_or(value);
                Ok(Some(self.resolve_namespace(node, item)?))
            }
            None => Ok(None),
        }
    }

    fn parse_attribute(&mut self, node: &Node, top_level: bool) -> Result<Attribute, error::Error> {
        let name = self.required(node, "name")?;

        let qualified = match node.attribute("form") {
            Some(form) => form == "qualified",
            None => self.target.qualified_attributes,
        };

        let name = if top_level || qualified {
            self.target_namespaced(name)
        } else {
            self.unqualified(name)
        };

        Ok(Attribute {
            name,
            ty: self.type_use(node)?,
            required: node.attribute("use") == Some("required"),
            array_type: self.array_type(node)?,
            documentation: documentation(node),
        })
    }

    fn parse_attribute_uses(&mut self, node: &Node) -> Result<Vec<AttributeUse>, error::Error> {
        let mut attributes = Vec::new();

        for child in node.children() {
            let attribute = match child.name.as_str() {
                "attribute" => match child.attribute("ref") {
                    Some(reference) => AttributeUse::Reference {
                        reference: self.resolve_namespace(child, reference)?,
                        required: child.attribute("use") == Some("required"),
                        array_type: self.array_type(child)?,
                    },
                    None => AttributeUse::Attribute(self.parse_attribute(child, false)?),
                },

                "attributeGroup" => AttributeUse::Group(self.resolve_attribute(child, "ref")?),

                "anyAttribute" => AttributeUse::Any,

                _ => continue,
            };

            attributes.push(attribute);
        }

        Ok(attributes)
    }

    fn parse_derivation(&mut self, node: &Node) -> Result<Derivation, error::Error> {
        Ok(Derivation {
            base: self.resolve_attribute(node, "base")?,
            particle: self.parse_particles(node)?.into_iter().next(),
            attributes: self.parse_attribute_uses(node)?,
        })
    }

    fn parse_complex_type(&mut self, node: &Node, named: bool) -> Result<ComplexType, error::Error> {
        let name = if named {
            let name = self.required(node, "name")?;
            Some(self.target_namespaced(name))
        } else {
            None
        };

        let mut mixed = node.attribute("mixed") == Some("true");
        let mut content = Content::Empty;

        for child in node.children() {
            match child.name.as_str() {
                "sequence" | "choice" | "all" | "group" => {
                    if let Some(particle) = self.parse_particle(child)? {
                        content = Content::Particle(particle);
                    }
                }

                "complexContent" | "simpleContent" => {
                    mixed |= child.attribute("mixed") == Some("true");
                    let simple = child.name == "simpleContent";

                    for derivation in child.children() {
                        content = match (simple, derivation.name.as_str()) {
                            (false, "extension") => {
                                Content::ComplexExtension(self.parse_derivation(derivation)?)
                            }
                            (false, "restriction") => {
                                Content::ComplexRestriction(self.parse_derivation(derivation)?)
                            }
                            (true, "extension") => {
                                Content::SimpleExtension(self.parse_derivation(derivation)?)
                            }
                            (true, "restriction") => {
                                Content::SimpleRestriction(self.parse_derivation(derivation)?)
                            }
                            _ => continue,
                        };
                    }
                }

                _ => (),
            }
        }

        Ok(ComplexType {
            name,
            content,
            attributes: self.parse_attribute_uses(node)?,
            mixed,
            documentation: documentation(node),
        })
    }

    fn parse_facets(&self, node: &Node) -> Result<Facets, error::Error> {
        let mut facets = Facets::default();

        for child in node.children() {
            let value = match child.attribute("value") {
                Some(value) => value,
                None => continue,
            };

            match child.name.as_str() {
                "enumeration" => facets.enumeration.push(value.to_owned()),
                "pattern" => facets.pattern.push(value.to_owned()),
                "length" => facets.length = self.number(child, "value")?,
                "minLength" => facets.min_length = self.number(child, "value")?,
                "maxLength" => facets.max_length = self.number(child, "value")?,
                "totalDigits" => facets.total_digits = self.number(child, "value")?,
                "fractionDigits" => facets.fraction_digits = self.number(child, "value")?,
                "whiteSpace" => facets.white_space = Some(value.to_owned()),
                "minInclusive" => facets.min_inclusive = Some(value.to_owned()),
                "maxInclusive" => facets.max_inclusive = Some(value.to_owned()),
                "minExclusive" => facets.min_exclusive = Some(value.to_owned()),
                "maxExclusive" => facets.max_exclusive = Some(value.to_owned()),
                name => trace!("ignoring facet <{}>", name),
            }
        }

        Ok(facets)
    }

    fn inline_simple_type(&mut self, node: &Node) -> Result<Option<TypeUse>, error::Error> {
        match node.child("simpleType") {
            Some(child) => Ok(Some(TypeUse::Simple(Box::new(
                self.parse_simple_type(child, false)?,
            )))),
            None => Ok(None),
        }
    }

    fn parse_simple_type(&mut self, node: &Node, named: bool) -> Result<SimpleType, error::Error> {
        let name = if named {
            let name = self.required(node, "name")?;
            Some(self.target_namespaced(name))
        } else {
            None
        };

        let mut derivation = None;

        for child in node.children() {
            derivation = Some(match child.name.as_str() {
                "restriction" => {
                    let base = match child.attribute("base") {
                        Some(base) => TypeUse::Named(self.resolve_namespace(child, base)?),
                        None => self
                            .inline_simple_type(child)?
                            .unwrap_or(TypeUse::Unspecified),
                    };

                    SimpleDerivation::Restriction {
                        base,
                        facets: self.parse_facets(child)?,
                    }
                }

                "list" => {
                    let item = match child.attribute("itemType") {
                        Some(item) => TypeUse::Named(self.resolve_namespace(child, item)?),
                        None => self
                            .inline_simple_type(child)?
                            .unwrap_or(TypeUse::Unspecified),
                    };

                    SimpleDerivation::List { item }
                }

                "union" => {
                    let mut members = Vec::new();

                    for member in child
                        .attribute("memberTypes")
                        .unwrap_or_default()
                        .split_whitespace()
                    {
                        members.push(TypeUse::Named(self.resolve_namespace(child, member)?));
                    }

                    for inline in child.children().filter(|inner| inner.name == "simpleType") {
                        members.push(TypeUse::Simple(Box::new(
                            self.parse_simple_type(inline, false)?,
                        )));
                    }

                    SimpleDerivation::Union { members }
                }

                _ => continue,
            });
        }

        let derivation = derivation.ok_or_else(|| {
            self.malformed("<simpleType> without restriction, list or union")
        })?;

        Ok(SimpleType {
            name,
            derivation,
            documentation: documentation(node),
        })
    }

    fn parse_message(&mut self, node: &Node) -> Result<Message, error::Error> {
        let name = self.required(node, "name")?;
        let name = self.target_namespaced(name);
        let mut parts = Vec::new();

        for part in node.children().filter(|child| child.name == "part") {
            let content = match (part.attribute("element"), part.attribute("type")) {
                (Some(element), _) => PartContent::Element(self.resolve_namespace(part, element)?),
                (None, Some(ty)) => PartContent::Type(self.resolve_namespace(part, ty)?),
                (None, None) => {
                    return Err(self.malformed(format!(
                        "message part in `{}` names neither an element nor a type",
                        name.name
                    )))
                }
            };

            parts.push(Part {
                name: self.required(part, "name")?.to_owned(),
                content,
            });
        }

        Ok(Message { name, parts })
    }

    fn parse_port_type(&mut self, node: &Node) -> Result<PortType, error::Error> {
        let name = self.required(node, "name")?;
        let name = self.target_namespaced(name);
        let mut operations = Vec::new();

        for operation in node.children().filter(|child| child.name == "operation") {
            let name = self.required(operation, "name")?;
            let name = self.target_namespaced(name);

            let mut input = None;
            let mut output = None;
            let mut faults = Vec::new();

            for child in operation.children() {
                match child.name.as_str() {
                    "input" => input = Some(self.resolve_attribute(child, "message")?),
                    "output" => output = Some(self.resolve_attribute(child, "message")?),
                    "fault" => faults.push(self.resolve_attribute(child, "message")?),
                    _ => (),
                }
            }

            operations.push(Operation {
                name,
                documentation: documentation(operation),
                input,
                output,
                faults,
            });
        }

        Ok(PortType {
            name,
            documentation: documentation(node),
            operations,
        })
    }

    fn parse_binding(&mut self, node: &Node) -> Result<Binding, error::Error> {
        let name = self.required(node, "name")?;
        let name = self.target_namespaced(name);
        let ty = self.resolve_attribute(node, "type")?;

        let mut transport = None;
        let mut style = None;
        let mut operations = Vec::new();

        for child in node.children() {
            match (is_soap_extension(child), child.name.as_str()) {
                (true, "binding") => {
                    transport = child.attribute("transport").map(ToOwned::to_owned);
                    style = child.attribute("style").map(ToOwned::to_owned);
                }

                (false, "operation") => {
                    let mut operation = BindingOperation {
                        name: self.required(child, "name")?.to_owned(),
                        action: None,
                        style: None,
                        input: None,
                        output: None,
                    };

                    for inner in child.children() {
                        let body_use = || {
                            inner
                                .children()
                                .find(|body| body.name == "body")
                                .and_then(|body| body.attribute("use"))
                                .map(ToOwned::to_owned)
                        };

                        match (is_soap_extension(inner), inner.name.as_str()) {
                            (true, "operation") => {
                                operation.action =
                                    inner.attribute("soapAction").map(ToOwned::to_owned);
                                operation.style = inner.attribute("style").map(ToOwned::to_owned);
                            }
                            (false, "input") => operation.input = body_use(),
                            (false, "output") => operation.output = body_use(),
                            _ => (),
                        }
                    }

                    operations.push(operation);
                }

                (_, name) => trace!("ignoring <{}> inside <binding>", name),
            }
        }

        Ok(Binding {
            name,
            ty,
            transport,
            style,
            operations,
        })
    }

    fn parse_service(&mut self, node: &Node) -> Result<Service, error::Error> {
        let name = self.required(node, "name")?;
        let name = self.target_namespaced(name);
        let mut ports = Vec::new();

        for port in node.children().filter(|child| child.name == "port") {
            let name = self.required(port, "name")?;
            let name = self.target_namespaced(name);

            ports.push(Port {
                name,
                binding: self.resolve_attribute(port, "binding")?,
                location: port
                    .child("address")
                    .and_then(|address| address.attribute("location"))
                    .map(ToOwned::to_owned),
            });
        }

        Ok(Service {
            name,
            documentation: documentation(node),
            ports,
        })
    }
}

pub(crate) fn parse(
    root: &Node,
    url: &Url,
    namespaces: &mut Namespaces,
    chameleon: Option<&str>,
) -> Result<Parsed, error::Error> {
    Parser::new(url, namespaces).parse(root, chameleon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    fn parse_str(document: &str) -> (Parsed, Namespaces) {
        let url = Url::parse("file:///service.wsdl").unwrap();
        let root = xml::parse(document.as_bytes(), &url).unwrap();
        let mut namespaces = Namespaces::default();
        let parsed = parse(&root, &url, &mut namespaces, None).unwrap();
        (parsed, namespaces)
    }

    #[test]
    fn parses_schema_items_in_declaration_order() {
        let (parsed, namespaces) = parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" targetNamespace="urn:t">
                <xs:simpleType name="Color">
                    <xs:restriction base="xs:string">
                        <xs:enumeration value="red"/>
                        <xs:enumeration value="green"/>
                        <xs:maxLength value="5"/>
                    </xs:restriction>
                </xs:simpleType>
                <xs:element name="Paint">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="color" type="t:Color" minOccurs="0" maxOccurs="unbounded"/>
                        </xs:sequence>
                        <xs:attribute name="id" type="xs:int" use="required"/>
                    </xs:complexType>
                </xs:element>
                <xs:include schemaLocation="common.xsd"/>
            </xs:schema>"#,
        );

        let schema = &parsed.definition.schemas[0];
        assert_eq!(schema.target_namespace, "urn:t");
        assert_eq!(schema.items.len(), 2);

        match &schema.items[0] {
            SchemaItem::SimpleType(SimpleType {
                derivation: SimpleDerivation::Restriction { facets, .. },
                ..
            }) => {
                assert_eq!(facets.enumeration, vec!["red", "green"]);
                assert_eq!(facets.max_length, Some(5));
            }
            other => panic!("unexpected item {:?}", other),
        }

        match &schema.items[1] {
            SchemaItem::Element(Element {
                ty: TypeUse::Complex(complex),
                ..
            }) => {
                let particles = match &complex.content {
                    Content::Particle(Particle::Sequence(group)) => &group.particles,
                    other => panic!("unexpected content {:?}", other),
                };

                match &particles[0] {
                    Particle::Element(element) => {
                        assert!(element.occurs.is_repeated());
                        assert!(element.occurs.is_optional());
                        assert_eq!(element.name.namespace(&namespaces), "");
                    }
                    other => panic!("unexpected particle {:?}", other),
                }

                assert_eq!(complex.attributes.len(), 1);
            }
            other => panic!("unexpected item {:?}", other),
        }

        assert_eq!(
            parsed.references,
            vec![Reference {
                namespace: None,
                location: "common.xsd".into(),
                chameleon: Some("urn:t".into()),
            }]
        );
    }

    #[test]
    fn parses_bindings_and_services() {
        let (parsed, _) = parse_str(
            r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
                    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
                    xmlns:tns="urn:svc" targetNamespace="urn:svc">
                <message name="PingIn"><part name="body" type="tns:Ping"/></message>
                <portType name="PingPort">
                    <operation name="Ping">
                        <documentation>Checks the service.</documentation>
                        <input message="tns:PingIn"/>
                        <fault name="oops" message="tns:PingIn"/>
                    </operation>
                </portType>
                <binding name="PingBinding" type="tns:PingPort">
                    <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
                    <operation name="Ping">
                        <soap:operation soapAction="urn:svc#Ping"/>
                        <input><soap:body use="literal"/></input>
                    </operation>
                </binding>
                <service name="PingService">
                    <port name="PingPort" binding="tns:PingBinding">
                        <soap:address location="http://localhost/ping"/>
                    </port>
                </service>
            </definitions>"#,
        );

        let definition = &parsed.definition;
        let operation = &definition.port_types[0].operations[0];
        assert_eq!(operation.documentation.as_deref(), Some("Checks the service."));
        assert!(operation.output.is_none());
        assert_eq!(operation.faults.len(), 1);

        let binding = &definition.bindings[0];
        assert_eq!(binding.style.as_deref(), Some("document"));
        assert_eq!(binding.operations[0].action.as_deref(), Some("urn:svc#Ping"));
        assert_eq!(binding.operations[0].input.as_deref(), Some("literal"));

        assert_eq!(
            definition.address_for(&definition.port_types[0].name),
            Some("http://localhost/ping")
        );
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let url = Url::parse("file:///broken.xsd").unwrap();
        let root = xml::parse(
            br#"<schema xmlns="http://www.w3.org/2001/XMLSchema"><complexType/></schema>"#,
            &url,
        )
        .unwrap();

        let error = parse(&root, &url, &mut Namespaces::default(), None)
            .err()
            .unwrap();
        assert_eq!(error.kind(), crate::error::ErrorKind::Parse);
    }
}
