//! The resolved type model: every schema type, element and operation with all
//! references replaced by arena indices.

use std::{collections::HashMap, fmt};

use super::types::{Facets, NamespacedName, Namespaces};

/// XSD keeps elements and types in separate symbol spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolSpace {
    Type,
    Element,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclarationId {
    pub space: SymbolSpace,
    pub name: NamespacedName,
}

/// Index of a [`Declaration`] in [`ResolvedModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdx(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    String,
    Boolean,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(Builtin),
    Declared(TypeIdx),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Element,
    Attribute,
    /// Character content of a simple-content type.
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: NamespacedName,
    pub kind: MemberKind,
    pub ty: TypeRef,
    pub repeated: bool,
    pub optional: bool,
    /// Set on members that close a containment cycle.
    pub boxed: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Struct(Vec<Member>),
    Newtype { ty: TypeRef, boxed: bool },
    Enumeration(Vec<String>),
    Alias(TypeRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Element,
    Type,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: NamespacedName,
    pub origin: Origin,
    pub shape: Shape,
    pub facets: Facets,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperation {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub soap_action: String,
    pub style: Option<String>,
    pub input: TypeIdx,
    pub output: Option<TypeRef>,
    pub faults: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPortType {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub address: Option<String>,
    pub operations: Vec<ResolvedOperation>,
}

/// A construct the resolver replaced with its nearest supported form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    pub construct: String,
    pub context: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub(crate) namespaces: Namespaces,
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) order: Vec<TypeIdx>,
    pub(crate) index: HashMap<DeclarationId, TypeIdx>,
    pub(crate) port_types: Vec<ResolvedPortType>,
    pub(crate) unsupported: Vec<Unsupported>,
}

impl TypeIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Builtin {
    /// Maps an XSD (or SOAP-encoding) primitive. Unknown names are textual.
    pub fn from_xsd(name: &str) -> Builtin {
        match name {
            "boolean" => Builtin::Boolean,
            "byte" => Builtin::I8,
            "short" => Builtin::I16,
            "int" => Builtin::I32,
            "long" | "integer" | "negativeInteger" | "nonPositiveInteger" => Builtin::I64,
            "unsignedByte" => Builtin::U8,
            "unsignedShort" => Builtin::U16,
            "unsignedInt" => Builtin::U32,
            "unsignedLong" | "nonNegativeInteger" | "positiveInteger" => Builtin::U64,
            "float" => Builtin::F32,
            "double" | "decimal" => Builtin::F64,
            _ => Builtin::String,
        }
    }

    pub fn is_known(name: &str) -> bool {
        matches!(
            name,
            "string"
                | "normalizedString"
                | "token"
                | "language"
                | "Name"
                | "NCName"
                | "ID"
                | "IDREF"
                | "IDREFS"
                | "ENTITY"
                | "ENTITIES"
                | "NMTOKEN"
                | "NMTOKENS"
                | "anyURI"
                | "QName"
                | "NOTATION"
                | "dateTime"
                | "date"
                | "time"
                | "duration"
                | "gYear"
                | "gYearMonth"
                | "gMonth"
                | "gMonthDay"
                | "gDay"
                | "base64Binary"
                | "hexBinary"
                | "anyType"
                | "anySimpleType"
        ) || Builtin::from_xsd(name) != Builtin::String
    }
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.construct, self.context)
    }
}

impl ResolvedModel {
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn declaration(&self, idx: TypeIdx) -> &Declaration {
        &self.declarations[idx.0]
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Declarations in emission order: declaration order, anonymous types after their owner.
    pub fn declarations(&self) -> impl Iterator<Item = (TypeIdx, &Declaration)> + '_ {
        self.order
            .iter()
            .map(move |&idx| (idx, &self.declarations[idx.0]))
    }

    /// Finds a declaration by namespace URI and local name.
    pub fn find(&self, space: SymbolSpace, namespace: &str, name: &str) -> Option<TypeIdx> {
        let namespace_idx = self.namespaces.index_of(namespace)?;

        self.index.iter().find_map(|(id, &idx)| {
            (id.space == space && id.name.index() == namespace_idx && id.name.name == name)
                .then(|| idx)
        })
    }

    pub fn port_types(&self) -> &[ResolvedPortType] {
        &self.port_types
    }

    pub fn unsupported(&self) -> &[Unsupported] {
        &self.unsupported
    }
}
