use std::collections::HashMap;
use tracing::{debug, warn};

use super::{
    error::Error,
    ns,
    resolved::{
        Builtin, Declaration, DeclarationId, Member, MemberKind, Origin, ResolvedModel,
        ResolvedOperation, ResolvedPortType, Shape, SymbolSpace, TypeIdx, TypeRef, Unsupported,
    },
    types::{
        Attribute, AttributeGroup, AttributeUse, ComplexType, Content, Definition, Derivation,
        Element, Facets, Group, NamespacedName, Namespaces, PartContent, Particle, SchemaItem,
        SimpleDerivation, SimpleType, TypeUse,
    },
};

/// What to do when the schema uses something generated code cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedPolicy {
    /// Substitute the closest supported form and record a warning.
    #[default]
    Degrade,
    /// Fail with [`Error::UnsupportedConstruct`].
    Abort,
}

#[derive(Clone, Copy)]
enum Source<'a> {
    Element(&'a Element),
    Complex(&'a ComplexType),
    Simple(&'a SimpleType),
}

struct Slot<'a> {
    name: NamespacedName,
    origin: Origin,
    source: Source<'a>,
    resolving: bool,
    declaration: Option<Declaration>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

struct Resolver<'a> {
    definition: &'a Definition,
    namespaces: &'a Namespaces,
    policy: UnsupportedPolicy,

    groups: HashMap<&'a NamespacedName, &'a Group>,
    attribute_groups: HashMap<&'a NamespacedName, &'a AttributeGroup>,
    attributes: HashMap<&'a NamespacedName, &'a Attribute>,

    index: HashMap<DeclarationId, TypeIdx>,
    slots: Vec<Slot<'a>>,
    children: Vec<Vec<TypeIdx>>,

    stack: Vec<TypeIdx>,
    expanding: Vec<&'a NamespacedName>,
    unsupported: Vec<Unsupported>,
}

impl<'a> Resolver<'a> {
    fn new(
        definition: &'a Definition,
        namespaces: &'a Namespaces,
        policy: UnsupportedPolicy,
    ) -> Self {
        Self {
            definition,
            namespaces,
            policy,
            groups: HashMap::new(),
            attribute_groups: HashMap::new(),
            attributes: HashMap::new(),
            index: HashMap::new(),
            slots: Vec::new(),
            children: Vec::new(),
            stack: Vec::new(),
            expanding: Vec::new(),
            unsupported: Vec::new(),
        }
    }

    fn register(&mut self) {
        let definition = self.definition;

        for schema in &definition.schemas {
            for item in &schema.items {
                match item {
                    SchemaItem::Element(element) => self.declare(
                        SymbolSpace::Element,
                        &element.name,
                        Origin::Element,
                        Source::Element(element),
                    ),

                    SchemaItem::ComplexType(complex) => {
                        if let Some(name) = &complex.name {
                            self.declare(
                                SymbolSpace::Type,
                                name,
                                Origin::Type,
                                Source::Complex(complex),
                            );
                        }
                    }

                    SchemaItem::SimpleType(simple) => {
                        if let Some(name) = &simple.name {
                            self.declare(
                                SymbolSpace::Type,
                                name,
                                Origin::Type,
                                Source::Simple(simple),
                            );
                        }
                    }

                    SchemaItem::Group(group) => {
                        self.groups.entry(&group.name).or_insert(group);
                    }

                    SchemaItem::AttributeGroup(group) => {
                        self.attribute_groups.entry(&group.name).or_insert(group);
                    }

                    SchemaItem::Attribute(attribute) => {
                        self.attributes.entry(&attribute.name).or_insert(attribute);
                    }
                }
            }
        }
    }

    fn declare(
        &mut self,
        space: SymbolSpace,
        name: &NamespacedName,
        origin: Origin,
        source: Source<'a>,
    ) {
        let id = DeclarationId {
            space,
            name: name.clone(),
        };

        if self.index.contains_key(&id) {
            debug!(
                name = %self.namespaces.display(name),
                "duplicate declaration, keeping the first"
            );
            return;
        }

        self.push_slot(id, origin, source);
    }

    fn push_slot(&mut self, id: DeclarationId, origin: Origin, source: Source<'a>) -> TypeIdx {
        let idx = TypeIdx(self.slots.len());

        self.slots.push(Slot {
            name: id.name.clone(),
            origin,
            source,
            resolving: false,
            declaration: None,
        });
        self.children.push(Vec::new());
        self.index.insert(id, idx);

        idx
    }

    fn unsupported(
        &mut self,
        construct: impl Into<String>,
        context: &NamespacedName,
    ) -> Result<(), Error> {
        let unsupported = Unsupported {
            construct: construct.into(),
            context: self.namespaces.display(context),
        };

        match self.policy {
            UnsupportedPolicy::Abort => Err(Error::UnsupportedConstruct(unsupported)),
            UnsupportedPolicy::Degrade => {
                warn!(%unsupported, "degrading unsupported construct");
                self.unsupported.push(unsupported);
                Ok(())
            }
        }
    }

    fn unresolved(&self, name: &NamespacedName) -> Error {
        Error::UnresolvedReference(self.namespaces.display(name))
    }

    fn is_builtin_namespace(&self, name: &NamespacedName) -> bool {
        [ns::XSD, ns::XSD_2000, ns::XSD_1999, ns::SOAP_ENCODING]
            .iter()
            .any(|namespace| name.is_in(self.namespaces, namespace))
    }

    fn owner_name(&self, owner: TypeIdx) -> NamespacedName {
        self.slots[owner.0].name.clone()
    }

    fn type_ref(&self, name: &NamespacedName) -> Result<TypeRef, Error> {
        let id = DeclarationId {
            space: SymbolSpace::Type,
            name: name.clone(),
        };

        if let Some(&idx) = self.index.get(&id) {
            return Ok(TypeRef::Declared(idx));
        }

        if self.is_builtin_namespace(name) {
            if !Builtin::is_known(&name.name) {
                debug!(name = %self.namespaces.display(name), "treating unknown primitive as text");
            }

            return Ok(TypeRef::Builtin(Builtin::from_xsd(&name.name)));
        }

        Err(self.unresolved(name))
    }

    fn element_ref(&self, name: &NamespacedName) -> Result<TypeIdx, Error> {
        let id = DeclarationId {
            space: SymbolSpace::Element,
            name: name.clone(),
        };

        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| self.unresolved(name))
    }

    /// Registers an anonymous type named after its owner.
    fn synthesize(&mut self, owner: TypeIdx, local: &str, source: Source<'a>) -> TypeIdx {
        let owner_name = self.owner_name(owner);
        let base = format!("{}_{}", owner_name.name, local);

        let mut candidate = base.clone();
        let mut suffix = 1;

        while self.index.contains_key(&DeclarationId {
            space: SymbolSpace::Type,
            name: owner_name.sibling(candidate.clone()),
        }) {
            suffix += 1;
            candidate = format!("{}{}", base, suffix);
        }

        let id = DeclarationId {
            space: SymbolSpace::Type,
            name: owner_name.sibling(candidate),
        };

        let idx = self.push_slot(id, Origin::Anonymous, source);
        self.children[owner.0].push(idx);

        idx
    }

    fn type_use(&mut self, ty: &'a TypeUse, owner: TypeIdx, local: &str) -> Result<TypeRef, Error> {
        match ty {
            TypeUse::Named(name) => self.type_ref(name),
            TypeUse::Complex(complex) => Ok(TypeRef::Declared(self.synthesize(
                owner,
                local,
                Source::Complex(complex),
            ))),
            TypeUse::Simple(simple) => self.simple_use(simple, owner, local),
            TypeUse::Unspecified => Ok(TypeRef::Builtin(Builtin::String)),
        }
    }

    /// Inline simple types only become declarations when they enumerate values.
    fn simple_use(
        &mut self,
        simple: &'a SimpleType,
        owner: TypeIdx,
        local: &str,
    ) -> Result<TypeRef, Error> {
        match &simple.derivation {
            SimpleDerivation::Restriction { facets, .. } if !facets.enumeration.is_empty() => Ok(
                TypeRef::Declared(self.synthesize(owner, local, Source::Simple(simple))),
            ),
            SimpleDerivation::Restriction { base, .. } => self.type_use(base, owner, local),
            SimpleDerivation::List { .. } => {
                let context = self.owner_name(owner);
                self.unsupported("list simple type", &context)?;
                Ok(TypeRef::Builtin(Builtin::String))
            }
            SimpleDerivation::Union { .. } => {
                let context = self.owner_name(owner);
                self.unsupported("union simple type", &context)?;
                Ok(TypeRef::Builtin(Builtin::String))
            }
        }
    }

    /// Resolves a declaration and reports whether it is available. `false` means it is
    /// still being resolved further up the stack.
    fn ensure(&mut self, idx: TypeIdx) -> Result<bool, Error> {
        let slot = &self.slots[idx.0];

        if slot.declaration.is_some() {
            return Ok(true);
        }

        if slot.resolving {
            debug!(
                name = %self.namespaces.display(&slot.name),
                depth = self.stack.len(),
                "declaration is already being resolved"
            );
            return Ok(false);
        }

        self.slots[idx.0].resolving = true;
        self.stack.push(idx);

        let declaration = self.resolve_slot(idx)?;

        self.stack.pop();
        let slot = &mut self.slots[idx.0];
        slot.resolving = false;
        slot.declaration = Some(declaration);

        Ok(true)
    }

    fn resolve_slot(&mut self, idx: TypeIdx) -> Result<Declaration, Error> {
        let (name, origin, source) = {
            let slot = &self.slots[idx.0];
            (slot.name.clone(), slot.origin, slot.source)
        };

        let (shape, facets, documentation) = match source {
            Source::Element(element) => match &element.ty {
                TypeUse::Complex(complex) => (
                    Shape::Struct(self.complex_members(complex, idx)?),
                    Facets::default(),
                    element
                        .documentation
                        .clone()
                        .or_else(|| complex.documentation.clone()),
                ),
                other => (
                    Shape::Newtype {
                        ty: self.type_use(other, idx, "Type")?,
                        boxed: false,
                    },
                    Facets::default(),
                    element.documentation.clone(),
                ),
            },

            Source::Complex(complex) => (
                Shape::Struct(self.complex_members(complex, idx)?),
                Facets::default(),
                complex.documentation.clone(),
            ),

            Source::Simple(simple) => {
                let (shape, facets) = self.simple_shape(simple, idx)?;
                (shape, facets, simple.documentation.clone())
            }
        };

        Ok(Declaration {
            name,
            origin,
            shape,
            facets,
            documentation,
        })
    }

    fn simple_shape(
        &mut self,
        simple: &'a SimpleType,
        idx: TypeIdx,
    ) -> Result<(Shape, Facets), Error> {
        let context = self.owner_name(idx);

        match &simple.derivation {
            SimpleDerivation::Restriction { facets, .. } if !facets.enumeration.is_empty() => {
                let mut values: Vec<String> = Vec::new();
                for value in &facets.enumeration {
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }

                Ok((Shape::Enumeration(values), facets.clone()))
            }

            SimpleDerivation::Restriction { base, facets } => {
                let ty = self.type_use(base, idx, "Base")?;

                if let TypeRef::Declared(target) = ty {
                    if !self.ensure(target)? {
                        self.unsupported("cyclic simple type derivation", &context)?;
                        return Ok((Shape::Alias(TypeRef::Builtin(Builtin::String)), facets.clone()));
                    }
                }

                Ok((Shape::Alias(ty), facets.clone()))
            }

            SimpleDerivation::List { .. } => {
                self.unsupported("list simple type", &context)?;
                Ok((Shape::Alias(TypeRef::Builtin(Builtin::String)), Facets::default()))
            }

            SimpleDerivation::Union { .. } => {
                self.unsupported("union simple type", &context)?;
                Ok((Shape::Alias(TypeRef::Builtin(Builtin::String)), Facets::default()))
            }
        }
    }

    fn text_member(&self, owner: TypeIdx, ty: TypeRef) -> Member {
        Member {
            name: self.owner_name(owner).sibling("value".into()),
            kind: MemberKind::Text,
            ty,
            repeated: false,
            optional: false,
            boxed: false,
            documentation: None,
        }
    }

    fn complex_members(
        &mut self,
        complex: &'a ComplexType,
        owner: TypeIdx,
    ) -> Result<Vec<Member>, Error> {
        let mut members = Vec::new();

        match &complex.content {
            Content::Empty => {}

            Content::Particle(particle) => {
                self.particle_members(particle, owner, false, false, &mut members)?
            }

            Content::ComplexExtension(derivation) => {
                members.extend(self.base_members(&derivation.base, owner, false)?);

                if let Some(particle) = &derivation.particle {
                    self.particle_members(particle, owner, false, false, &mut members)?;
                }

                self.attribute_members(&derivation.attributes, owner, &mut members)?;
            }

            Content::ComplexRestriction(derivation) => {
                if derivation.base.is_in(self.namespaces, ns::SOAP_ENCODING)
                    && derivation.base.name == "Array"
                {
                    self.array_members(derivation, owner, &mut members)?;
                } else {
                    match &derivation.particle {
                        Some(particle) => {
                            self.particle_members(particle, owner, false, false, &mut members)?
                        }
                        None => members.extend(self.base_members(&derivation.base, owner, false)?),
                    }

                    self.attribute_members(&derivation.attributes, owner, &mut members)?;
                }
            }

            Content::SimpleExtension(derivation) | Content::SimpleRestriction(derivation) => {
                members.extend(self.base_members(&derivation.base, owner, true)?);
                self.attribute_members(&derivation.attributes, owner, &mut members)?;
            }
        }

        self.attribute_members(&complex.attributes, owner, &mut members)?;

        if complex.mixed
            && members
                .iter()
                .any(|member| member.kind == MemberKind::Element)
        {
            let context = self.owner_name(owner);
            self.unsupported("mixed content", &context)?;
        }

        Ok(members)
    }

    fn base_members(
        &mut self,
        base: &NamespacedName,
        owner: TypeIdx,
        simple_content: bool,
    ) -> Result<Vec<Member>, Error> {
        let ty = self.type_ref(base)?;

        let target = match ty {
            TypeRef::Builtin(_) if base.name == "anyType" && !simple_content => {
                return Ok(Vec::new())
            }
            TypeRef::Builtin(_) => return Ok(vec![self.text_member(owner, ty)]),
            TypeRef::Declared(target) => target,
        };

        if !self.ensure(target)? {
            let context = self.owner_name(owner);
            self.unsupported("cyclic type derivation", &context)?;
            return Ok(Vec::new());
        }

        let shape = self.slots[target.0]
            .declaration
            .as_ref()
            .map(|declaration| &declaration.shape);

        Ok(match shape {
            Some(Shape::Struct(members)) => members.clone(),
            _ => vec![self.text_member(owner, ty)],
        })
    }

    /// `soapenc:Array` restrictions become a single repeated `item` member.
    fn array_members(
        &mut self,
        derivation: &'a Derivation,
        owner: TypeIdx,
        members: &mut Vec<Member>,
    ) -> Result<(), Error> {
        if let Some(particle) = &derivation.particle {
            self.particle_members(particle, owner, true, true, members)?;
            return Ok(());
        }

        let array_type = derivation.attributes.iter().find_map(|attribute| match attribute {
            AttributeUse::Attribute(Attribute { array_type, .. })
            | AttributeUse::Reference { array_type, .. } => array_type.as_ref(),
            _ => None,
        });

        match array_type {
            Some(item) => {
                let ty = self.type_ref(item)?;
                members.push(Member {
                    name: self.owner_name(owner).sibling("item".into()),
                    kind: MemberKind::Element,
                    ty,
                    repeated: true,
                    optional: true,
                    boxed: false,
                    documentation: None,
                });
            }
            None => {
                let context = self.owner_name(owner);
                self.unsupported("encoded array without an item type", &context)?;
            }
        }

        Ok(())
    }

    fn particle_members(
        &mut self,
        particle: &'a Particle,
        owner: TypeIdx,
        repeated: bool,
        optional: bool,
        members: &mut Vec<Member>,
    ) -> Result<(), Error> {
        match particle {
            Particle::Element(element) => {
                let ty = self.type_use(&element.ty, owner, &element.name.name)?;

                push_element(
                    members,
                    Member {
                        name: element.name.clone(),
                        kind: MemberKind::Element,
                        ty,
                        repeated: repeated || element.occurs.is_repeated(),
                        optional: optional || element.occurs.is_optional() || element.nillable,
                        boxed: false,
                        documentation: element.documentation.clone(),
                    },
                );
            }

            Particle::ElementRef { reference, occurs } => {
                let target = self.element_ref(reference)?;
                let documentation = match self.slots[target.0].source {
                    Source::Element(element) => element.documentation.clone(),
                    _ => None,
                };

                push_element(
                    members,
                    Member {
                        name: reference.clone(),
                        kind: MemberKind::Element,
                        ty: TypeRef::Declared(target),
                        repeated: repeated || occurs.is_repeated(),
                        optional: optional || occurs.is_optional(),
                        boxed: false,
                        documentation,
                    },
                );
            }

            Particle::GroupRef { reference, occurs } => {
                let group = match self.groups.get(reference) {
                    Some(&group) => group,
                    None => return Err(self.unresolved(reference)),
                };

                if self.expanding.contains(&reference) {
                    let context = self.owner_name(owner);
                    return self.unsupported("recursive model group", &context);
                }

                if let Some(inner) = &group.particle {
                    self.expanding.push(reference);
                    let result = self.particle_members(
                        inner,
                        owner,
                        repeated || occurs.is_repeated(),
                        optional || occurs.is_optional(),
                        members,
                    );
                    self.expanding.pop();
                    result?;
                }
            }

            Particle::Sequence(group) | Particle::All(group) => {
                for inner in &group.particles {
                    self.particle_members(
                        inner,
                        owner,
                        repeated || group.occurs.is_repeated(),
                        optional || group.occurs.is_optional(),
                        members,
                    )?;
                }
            }

            Particle::Choice(group) => {
                for inner in &group.particles {
                    self.particle_members(
                        inner,
                        owner,
                        repeated || group.occurs.is_repeated(),
                        true,
                        members,
                    )?;
                }
            }

            Particle::Any(_) => {
                let context = self.owner_name(owner);
                self.unsupported("element wildcard", &context)?;
            }
        }

        Ok(())
    }

    fn attribute_members(
        &mut self,
        attributes: &'a [AttributeUse],
        owner: TypeIdx,
        members: &mut Vec<Member>,
    ) -> Result<(), Error> {
        for attribute in attributes {
            match attribute {
                AttributeUse::Attribute(attribute) => {
                    let ty = self.type_use(&attribute.ty, owner, &attribute.name.name)?;
                    push_attribute(
                        members,
                        Member {
                            name: attribute.name.clone(),
                            kind: MemberKind::Attribute,
                            ty,
                            repeated: false,
                            optional: !attribute.required,
                            boxed: false,
                            documentation: attribute.documentation.clone(),
                        },
                    );
                }

                AttributeUse::Reference {
                    reference,
                    required,
                    ..
                } => {
                    if reference.is_in(self.namespaces, ns::SOAP_ENCODING) {
                        continue;
                    }

                    let (ty, documentation) = match self.attributes.get(reference) {
                        Some(&declared) => (
                            self.type_use(&declared.ty, owner, &declared.name.name)?,
                            declared.documentation.clone(),
                        ),
                        None if reference.is_in(self.namespaces, ns::XML) => {
                            (TypeRef::Builtin(Builtin::String), None)
                        }
                        None => return Err(self.unresolved(reference)),
                    };

                    push_attribute(
                        members,
                        Member {
                            name: reference.clone(),
                            kind: MemberKind::Attribute,
                            ty,
                            repeated: false,
                            optional: !required,
                            boxed: false,
                            documentation,
                        },
                    );
                }

                AttributeUse::Group(reference) => {
                    let group = match self.attribute_groups.get(reference) {
                        Some(&group) => group,
                        None => return Err(self.unresolved(reference)),
                    };

                    if self.expanding.contains(&reference) {
                        let context = self.owner_name(owner);
                        self.unsupported("recursive attribute group", &context)?;
                        continue;
                    }

                    self.expanding.push(reference);
                    let result = self.attribute_members(&group.attributes, owner, members);
                    self.expanding.pop();
                    result?;
                }

                AttributeUse::Any => {
                    let context = self.owner_name(owner);
                    self.unsupported("attribute wildcard", &context)?;
                }
            }
        }

        Ok(())
    }

    fn message_type(
        &mut self,
        message: &NamespacedName,
        context: &NamespacedName,
    ) -> Result<Option<TypeRef>, Error> {
        let definition = self.definition;
        let message = definition
            .message(message)
            .ok_or_else(|| self.unresolved(message))?;

        if message.parts.len() > 1 {
            self.unsupported("message with several parts", context)?;
        }

        message
            .parts
            .first()
            .map(|part| match &part.content {
                PartContent::Element(name) => {
                    self.element_ref(name).map(TypeRef::Declared)
                }
                PartContent::Type(name) => self.type_ref(name),
            })
            .transpose()
    }

    fn is_element_shaped(&self, idx: TypeIdx) -> bool {
        let slot = &self.slots[idx.0];

        slot.origin != Origin::Anonymous
            && matches!(
                slot.declaration.as_ref().map(|declaration| &declaration.shape),
                Some(Shape::Struct(_)) | Some(Shape::Newtype { .. })
            )
    }

    fn resolve_port_types(&mut self) -> Result<Vec<ResolvedPortType>, Error> {
        let definition = self.definition;
        let mut port_types: Vec<ResolvedPortType> = Vec::new();

        for port_type in &definition.port_types {
            if port_types.iter().any(|seen| seen.name == port_type.name) {
                debug!(
                    port_type = %self.namespaces.display(&port_type.name),
                    "duplicate port type, keeping the first"
                );
                continue;
            }

            let binding = definition.binding_for(&port_type.name);
            if binding.is_none() {
                debug!(
                    port_type = %self.namespaces.display(&port_type.name),
                    "no binding implements port type"
                );
            }

            let mut operations = Vec::new();

            for operation in &port_type.operations {
                let bound = binding.and_then(|binding| {
                    binding
                        .operations
                        .iter()
                        .find(|bound| bound.name == operation.name.name)
                });

                let style = bound
                    .and_then(|bound| bound.style.clone())
                    .or_else(|| binding.and_then(|binding| binding.style.clone()));

                // bodies go out document-literal whatever the binding says
                if style.as_deref() == Some("rpc") {
                    self.unsupported("rpc-style operation", &operation.name)?;
                }

                let encoded = bound.map_or(false, |bound| {
                    [&bound.input, &bound.output]
                        .iter()
                        .any(|body_use| body_use.as_deref() == Some("encoded"))
                });
                if encoded {
                    self.unsupported("encoded body", &operation.name)?;
                }

                let input = match &operation.input {
                    Some(message) => self.message_type(message, &operation.name)?,
                    None => None,
                };

                let input = match input {
                    Some(TypeRef::Declared(idx)) if self.is_element_shaped(idx) => idx,
                    _ => {
                        self.unsupported(
                            "operation input that is not a schema element or type",
                            &operation.name,
                        )?;
                        continue;
                    }
                };

                let output = match &operation.output {
                    Some(message) => self.message_type(message, &operation.name)?,
                    None => None,
                };

                let mut faults = Vec::new();
                for fault in &operation.faults {
                    faults.extend(self.message_type(fault, &operation.name)?);
                }

                operations.push(ResolvedOperation {
                    name: operation.name.clone(),
                    documentation: operation.documentation.clone(),
                    soap_action: bound
                        .and_then(|bound| bound.action.clone())
                        .unwrap_or_default(),
                    style,
                    input,
                    output,
                    faults,
                });
            }

            port_types.push(ResolvedPortType {
                name: port_type.name.clone(),
                documentation: port_type.documentation.clone(),
                address: definition.address_for(&port_type.name).map(ToOwned::to_owned),
                operations,
            });
        }

        Ok(port_types)
    }

    fn finish(self, port_types: Vec<ResolvedPortType>) -> Result<ResolvedModel, Error> {
        let mut order = Vec::with_capacity(self.slots.len());

        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.origin == Origin::Anonymous {
                continue;
            }

            let mut pending = vec![TypeIdx(idx)];
            while let Some(next) = pending.pop() {
                order.push(next);
                pending.extend(self.children[next.0].iter().rev());
            }
        }

        let namespaces = self.namespaces;
        let mut declarations = self
            .slots
            .into_iter()
            .map(|slot| {
                slot.declaration
                    .ok_or_else(|| Error::UnresolvedReference(namespaces.display(&slot.name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        break_cycles(&mut declarations, &order);

        Ok(ResolvedModel {
            namespaces: namespaces.clone(),
            declarations,
            order,
            index: self.index,
            port_types,
            unsupported: self.unsupported,
        })
    }
}

/// Repeated element names in one content model collapse into a repeated member.
fn push_element(members: &mut Vec<Member>, member: Member) {
    match members
        .iter_mut()
        .find(|existing| existing.kind == MemberKind::Element && existing.name == member.name)
    {
        Some(existing) => {
            existing.repeated = true;
            existing.optional |= member.optional;
        }
        None => members.push(member),
    }
}

/// Redeclared attributes replace inherited ones.
fn push_attribute(members: &mut Vec<Member>, member: Member) {
    match members
        .iter_mut()
        .find(|existing| existing.kind == MemberKind::Attribute && existing.name == member.name)
    {
        Some(existing) => *existing = member,
        None => members.push(member),
    }
}

/// Follows alias chains to the declaration that owns storage.
fn terminal(declarations: &[Declaration], mut idx: TypeIdx) -> TypeIdx {
    let mut hops = 0;

    while let Shape::Alias(TypeRef::Declared(next)) = declarations[idx.0].shape {
        if hops > declarations.len() {
            break;
        }

        idx = next;
        hops += 1;
    }

    idx
}

/// Outgoing edges that store the target inline: `(member position, target)`.
fn edges(declarations: &[Declaration], idx: TypeIdx) -> Vec<(usize, TypeIdx)> {
    match &declarations[idx.0].shape {
        Shape::Struct(members) => members
            .iter()
            .enumerate()
            .filter(|(_, member)| !member.repeated)
            .filter_map(|(position, member)| match member.ty {
                TypeRef::Declared(target) => Some((position, terminal(declarations, target))),
                TypeRef::Builtin(_) => None,
            })
            .collect(),
        Shape::Newtype {
            ty: TypeRef::Declared(target),
            ..
        } => vec![(0, terminal(declarations, *target))],
        _ => Vec::new(),
    }
}

fn set_boxed(declarations: &mut [Declaration], idx: TypeIdx, position: usize) {
    match &mut declarations[idx.0].shape {
        Shape::Struct(members) => members[position].boxed = true,
        Shape::Newtype { boxed, .. } => *boxed = true,
        _ => {}
    }
}

/// Marks every back edge of a depth-first walk as boxed, so each containment
/// cycle is broken exactly once.
fn break_cycles(declarations: &mut [Declaration], order: &[TypeIdx]) {
    let mut marks = vec![Mark::Unvisited; declarations.len()];
    let mut stack: Vec<(TypeIdx, Vec<(usize, TypeIdx)>, usize)> = Vec::new();

    for &root in order {
        if marks[root.0] != Mark::Unvisited {
            continue;
        }

        marks[root.0] = Mark::OnStack;
        stack.push((root, edges(declarations, root), 0));

        while let Some(frame) = stack.last_mut() {
            let idx = frame.0;
            let edge = frame.1.get(frame.2).copied();
            frame.2 += 1;

            let (position, target) = match edge {
                Some(edge) => edge,
                None => {
                    marks[idx.0] = Mark::Done;
                    stack.pop();
                    continue;
                }
            };

            match marks[target.0] {
                Mark::OnStack => {
                    debug!(
                        from = %declarations[idx.0].name,
                        to = %declarations[target.0].name,
                        "boxing recursive member"
                    );
                    set_boxed(declarations, idx, position);
                }
                Mark::Unvisited => {
                    marks[target.0] = Mark::OnStack;
                    let target_edges = edges(declarations, target);
                    stack.push((target, target_edges, 0));
                }
                Mark::Done => {}
            }
        }
    }
}

/// Turns a loaded definition into the resolved model generated code is built from.
pub fn resolve(
    definition: &Definition,
    namespaces: &Namespaces,
    policy: UnsupportedPolicy,
) -> Result<ResolvedModel, Error> {
    let mut resolver = Resolver::new(definition, namespaces, policy);
    resolver.register();

    let mut next = 0;
    while next < resolver.slots.len() {
        resolver.ensure(TypeIdx(next))?;
        next += 1;
    }

    let port_types = resolver.resolve_port_types()?;
    let model = resolver.finish(port_types)?;

    debug!(
        declarations = model.len(),
        port_types = model.port_types().len(),
        unsupported = model.unsupported().len(),
        "resolved definition"
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{loader, MemoryFetcher};
    use pretty_assertions::assert_eq;
    use url::Url;

    const TNS: &str = "urn:test";

    fn model_with(schema: &str, policy: UnsupportedPolicy) -> Result<ResolvedModel, Error> {
        let url = Url::parse("file:///test.xsd").unwrap();
        let document = format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/"
                          xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                          xmlns:tns="{}" targetNamespace="{}">{}</xs:schema>"#,
            TNS, TNS, schema
        );

        let fetcher = MemoryFetcher::new().with_document(url.clone(), document);
        let (definition, namespaces) = loader::load(url, &fetcher)?;
        resolve(&definition, &namespaces, policy)
    }

    fn model(schema: &str) -> ResolvedModel {
        model_with(schema, UnsupportedPolicy::Degrade).unwrap()
    }

    fn members<'m>(model: &'m ResolvedModel, space: SymbolSpace, name: &str) -> &'m [Member] {
        let idx = model.find(space, TNS, name).unwrap();
        match &model.declaration(idx).shape {
            Shape::Struct(members) => members,
            other => panic!("{} is not a struct: {:?}", name, other),
        }
    }

    fn member_names(members: &[Member]) -> Vec<&str> {
        members.iter().map(|member| member.name.name.as_str()).collect()
    }

    #[test]
    fn extension_puts_base_members_first() {
        let model = model(
            r#"<xs:complexType name="Base">
                 <xs:sequence><xs:element name="id" type="xs:int"/></xs:sequence>
                 <xs:attribute name="version" type="xs:string"/>
               </xs:complexType>
               <xs:complexType name="Derived">
                 <xs:complexContent>
                   <xs:extension base="tns:Base">
                     <xs:sequence><xs:element name="label" type="xs:string" minOccurs="0"/></xs:sequence>
                   </xs:extension>
                 </xs:complexContent>
               </xs:complexType>"#,
        );

        let derived = members(&model, SymbolSpace::Type, "Derived");
        assert_eq!(member_names(derived), vec!["id", "version", "label"]);
        assert_eq!(derived[0].ty, TypeRef::Builtin(Builtin::I32));
        assert!(derived[1].optional);
        assert!(derived[2].optional);
    }

    #[test]
    fn repeated_elements_become_repeated_members() {
        let model = model(
            r#"<xs:complexType name="List">
                 <xs:sequence>
                   <xs:element name="entry" type="xs:string" maxOccurs="unbounded"/>
                 </xs:sequence>
               </xs:complexType>"#,
        );

        let list = members(&model, SymbolSpace::Type, "List");
        assert!(list[0].repeated);
    }

    #[test]
    fn anonymous_types_follow_their_owner() {
        let model = model(
            r#"<xs:element name="Order">
                 <xs:complexType>
                   <xs:sequence>
                     <xs:element name="line">
                       <xs:complexType>
                         <xs:sequence><xs:element name="sku" type="xs:string"/></xs:sequence>
                       </xs:complexType>
                     </xs:element>
                     <xs:element name="status">
                       <xs:simpleType>
                         <xs:restriction base="xs:string">
                           <xs:enumeration value="open"/>
                           <xs:enumeration value="closed"/>
                         </xs:restriction>
                       </xs:simpleType>
                     </xs:element>
                   </xs:sequence>
                 </xs:complexType>
               </xs:element>
               <xs:complexType name="After"/>"#,
        );

        let names: Vec<_> = model
            .declarations()
            .map(|(_, declaration)| declaration.name.name.as_str())
            .collect();
        assert_eq!(names, vec!["Order", "Order_line", "Order_status", "After"]);

        let status = model.find(SymbolSpace::Type, TNS, "Order_status").unwrap();
        assert_eq!(
            model.declaration(status).shape,
            Shape::Enumeration(vec!["open".into(), "closed".into()])
        );
        assert_eq!(model.declaration(status).origin, Origin::Anonymous);
    }

    #[test]
    fn recursion_is_boxed_once() {
        let model = model(
            r#"<xs:complexType name="Node">
                 <xs:sequence>
                   <xs:element name="next" type="tns:Node" minOccurs="0"/>
                   <xs:element name="children" type="tns:Node" maxOccurs="unbounded"/>
                 </xs:sequence>
               </xs:complexType>
               <xs:complexType name="Ping">
                 <xs:sequence><xs:element name="pong" type="tns:Pong"/></xs:sequence>
               </xs:complexType>
               <xs:complexType name="Pong">
                 <xs:sequence><xs:element name="ping" type="tns:Ping" minOccurs="0"/></xs:sequence>
               </xs:complexType>"#,
        );

        let node = members(&model, SymbolSpace::Type, "Node");
        assert!(node[0].boxed);
        assert!(!node[1].boxed);

        let ping = members(&model, SymbolSpace::Type, "Ping");
        let pong = members(&model, SymbolSpace::Type, "Pong");
        assert_eq!(
            [ping[0].boxed, pong[0].boxed].iter().filter(|&&b| b).count(),
            1
        );
    }

    #[test]
    fn simple_content_gets_a_text_member() {
        let model = model(
            r#"<xs:complexType name="Amount">
                 <xs:simpleContent>
                   <xs:extension base="xs:decimal">
                     <xs:attribute name="currency" type="xs:string" use="required"/>
                   </xs:extension>
                 </xs:simpleContent>
               </xs:complexType>"#,
        );

        let amount = members(&model, SymbolSpace::Type, "Amount");
        assert_eq!(amount[0].kind, MemberKind::Text);
        assert_eq!(amount[0].ty, TypeRef::Builtin(Builtin::F64));
        assert_eq!(amount[1].kind, MemberKind::Attribute);
        assert!(!amount[1].optional);
    }

    #[test]
    fn encoded_arrays_use_the_array_type() {
        let model = model(
            r#"<xs:complexType name="Names">
                 <xs:complexContent>
                   <xs:restriction base="soapenc:Array">
                     <xs:attribute ref="soapenc:arrayType" wsdl:arrayType="xs:string[]"/>
                   </xs:restriction>
                 </xs:complexContent>
               </xs:complexType>"#,
        );

        let names = members(&model, SymbolSpace::Type, "Names");
        assert_eq!(member_names(names), vec!["item"]);
        assert!(names[0].repeated);
        assert_eq!(names[0].ty, TypeRef::Builtin(Builtin::String));
    }

    #[test]
    fn groups_are_expanded_in_place() {
        let model = model(
            r#"<xs:group name="Contact">
                 <xs:sequence><xs:element name="email" type="xs:string"/></xs:sequence>
               </xs:group>
               <xs:attributeGroup name="Audit">
                 <xs:attribute name="created" type="xs:dateTime"/>
               </xs:attributeGroup>
               <xs:complexType name="Person">
                 <xs:sequence>
                   <xs:element name="name" type="xs:string"/>
                   <xs:group ref="tns:Contact"/>
                 </xs:sequence>
                 <xs:attributeGroup ref="tns:Audit"/>
               </xs:complexType>"#,
        );

        let person = members(&model, SymbolSpace::Type, "Person");
        assert_eq!(member_names(person), vec!["name", "email", "created"]);
    }

    #[test]
    fn wildcards_degrade_or_abort() {
        let schema = r#"<xs:complexType name="Open">
                          <xs:sequence><xs:any/></xs:sequence>
                        </xs:complexType>"#;

        let degraded = model(schema);
        assert_eq!(degraded.unsupported().len(), 1);
        assert!(members(&degraded, SymbolSpace::Type, "Open").is_empty());

        let err = model_with(schema, UnsupportedPolicy::Abort).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnsupportedConstruct);
    }

    #[test]
    fn missing_type_is_unresolved() {
        let err = model_with(
            r#"<xs:element name="Broken" type="tns:Missing"/>"#,
            UnsupportedPolicy::Degrade,
        )
        .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::UnresolvedReference);
        assert!(err.to_string().contains("{urn:test}Missing"));
    }

    #[test]
    fn element_and_type_may_share_a_name() {
        let model = model(
            r#"<xs:element name="Item" type="tns:Item"/>
               <xs:complexType name="Item">
                 <xs:sequence><xs:element name="code" type="xs:string"/></xs:sequence>
               </xs:complexType>"#,
        );

        let element = model.find(SymbolSpace::Element, TNS, "Item").unwrap();
        let ty = model.find(SymbolSpace::Type, TNS, "Item").unwrap();
        assert_ne!(element, ty);
        assert_eq!(
            model.declaration(element).shape,
            Shape::Newtype {
                ty: TypeRef::Declared(ty),
                boxed: false
            }
        );
    }
}
