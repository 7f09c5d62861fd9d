//! Mapping of schema names onto Rust identifiers.
//!
//! Every generated item gets its identifier from an [`Allocator`] scope, so
//! distinct qualified names never end up sharing an identifier.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use heck::{ToSnakeCase, ToUpperCamelCase};
use soapgen_wsdl::{
    resolved::{ResolvedModel, Shape, TypeIdx},
    types::NamespacedName,
};
use tracing::debug;

/// Turns schema names into identifier candidates.
pub trait Sanitizer {
    fn type_name(&self, name: &str) -> String;
    fn member_name(&self, name: &str) -> String;

    fn variant_name(&self, value: &str) -> String {
        self.type_name(value)
    }
}

/// PascalCase types and variants, snake_case members and methods.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustNames;

/// An allocated identifier and the schema name it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub ident: String,
    pub namespace: String,
    pub local_name: String,
}

/// Hands out unique identifiers within one scope.
#[derive(Debug, Clone)]
pub struct Allocator<K> {
    taken: HashSet<String>,
    assigned: HashMap<K, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TypeKey {
    Declaration(TypeIdx),
    PortType(usize),
}

#[derive(Debug, Clone)]
pub struct PortTypeNames {
    pub ident: Identifier,
    pub operations: Vec<String>,
}

/// Identifiers for everything a [`ResolvedModel`] emits.
#[derive(Debug, Clone)]
pub struct IdentifierTable {
    declarations: HashMap<TypeIdx, Identifier>,
    members: HashMap<TypeIdx, Vec<String>>,
    port_types: Vec<PortTypeNames>,
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const PATH_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

/// Names the generated module defines or imports itself.
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    "BasicAuth",
    "Box",
    "Clone",
    "Debug",
    "Default",
    "Deserialize",
    "DeserializeOwned",
    "Duration",
    "Err",
    "FaultBody",
    "FaultEnvelope",
    "HttpHeader",
    "None",
    "Ok",
    "Option",
    "ResponseBody",
    "ResponseEnvelope",
    "Result",
    "Serialize",
    "SoapClient",
    "SoapError",
    "SoapFault",
    "Some",
    "String",
    "Vec",
    "XmlElement",
    "check_fault",
    "decode_response",
    "encode_request",
    "SOAP_ENVELOPE_NAMESPACE",
];

fn escape(name: String) -> String {
    if PATH_KEYWORDS.contains(&name.as_str()) {
        format!("{}_", name)
    } else if KEYWORDS.contains(&name.as_str()) {
        format!("r#{}", name)
    } else {
        name
    }
}

/// Escapes keywords, then prefixes names that cannot start an identifier.
fn finish(name: String, prefix: &str, empty: &str) -> String {
    if name.is_empty() {
        return empty.to_owned();
    }

    let name = escape(name);
    if is_identifier(&name) {
        return name;
    }

    let prefixed = format!("{}{}", prefix, name);
    if is_identifier(&prefixed) {
        prefixed
    } else {
        empty.to_owned()
    }
}

impl Sanitizer for RustNames {
    fn type_name(&self, name: &str) -> String {
        finish(name.to_upper_camel_case(), "T", "Type")
    }

    fn member_name(&self, name: &str) -> String {
        finish(name.to_snake_case(), "_", "field")
    }

    fn variant_name(&self, value: &str) -> String {
        finish(value.to_upper_camel_case(), "V", "Empty")
    }
}

/// Whether `name` can be used verbatim as a Rust identifier.
pub fn is_identifier(name: &str) -> bool {
    !PATH_KEYWORDS.contains(&name) && syn::parse_str::<syn::Ident>(name).is_ok()
}

fn checked(candidate: String, fallback: impl FnOnce() -> String) -> String {
    if is_identifier(&candidate) {
        candidate
    } else {
        let fallback = fallback();
        debug!(%candidate, %fallback, "sanitizer produced an invalid identifier");
        fallback
    }
}

impl<K: Eq + Hash> Allocator<K> {
    pub fn new() -> Self {
        Self {
            taken: HashSet::new(),
            assigned: HashMap::new(),
        }
    }

    pub fn with_reserved(reserved: &[&str]) -> Self {
        let mut allocator = Self::new();
        allocator
            .taken
            .extend(reserved.iter().map(|name| (*name).to_owned()));
        allocator
    }

    /// Returns the identifier for `key`, suffixing `candidate` with 1, 2, ...
    /// when another key already holds it.
    pub fn allocate(&mut self, key: K, candidate: String) -> String {
        if let Some(existing) = self.assigned.get(&key) {
            return existing.clone();
        }

        let ident = if self.taken.contains(&candidate) {
            let base = candidate.trim_start_matches("r#");
            let mut suffix = 1;

            loop {
                let attempt = format!("{}{}", base, suffix);
                if !self.taken.contains(&attempt) {
                    break attempt;
                }
                suffix += 1;
            }
        } else {
            candidate
        };

        self.taken.insert(ident.clone());
        self.assigned.insert(key, ident.clone());

        ident
    }
}

impl<K: Eq + Hash> Default for Allocator<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierTable {
    pub fn allocate(model: &ResolvedModel, sanitizer: &dyn Sanitizer) -> Self {
        let namespaces = model.namespaces();
        let identifier = |ident: String, name: &NamespacedName| Identifier {
            ident,
            namespace: name.namespace(namespaces).to_owned(),
            local_name: name.name.clone(),
        };

        let mut types = Allocator::with_reserved(RESERVED_TYPE_NAMES);
        let mut declarations = HashMap::new();
        let mut members = HashMap::new();

        for (idx, declaration) in model.declarations() {
            let local = &declaration.name.name;
            let candidate = checked(sanitizer.type_name(local), || RustNames.type_name(local));
            let ident = types.allocate(TypeKey::Declaration(idx), candidate);
            declarations.insert(idx, identifier(ident, &declaration.name));

            let scoped = match &declaration.shape {
                Shape::Struct(fields) => {
                    let mut scope = Allocator::new();
                    fields
                        .iter()
                        .enumerate()
                        .map(|(position, member)| {
                            let local = &member.name.name;
                            let candidate = checked(sanitizer.member_name(local), || {
                                RustNames.member_name(local)
                            });
                            scope.allocate(position, candidate)
                        })
                        .collect()
                }

                Shape::Enumeration(values) => {
                    let mut scope = Allocator::new();
                    values
                        .iter()
                        .enumerate()
                        .map(|(position, value)| {
                            let candidate = checked(sanitizer.variant_name(value), || {
                                RustNames.variant_name(value)
                            });
                            scope.allocate(position, candidate)
                        })
                        .collect()
                }

                Shape::Newtype { .. } | Shape::Alias(_) => Vec::new(),
            };

            members.insert(idx, scoped);
        }

        let port_types = model
            .port_types()
            .iter()
            .enumerate()
            .map(|(position, port_type)| {
                let local = &port_type.name.name;
                let candidate = checked(sanitizer.type_name(local), || RustNames.type_name(local));
                let ident = types.allocate(TypeKey::PortType(position), candidate);

                let mut methods = Allocator::with_reserved(&["new"]);
                let operations = port_type
                    .operations
                    .iter()
                    .enumerate()
                    .map(|(position, operation)| {
                        let local = &operation.name.name;
                        let candidate = checked(sanitizer.member_name(local), || {
                            RustNames.member_name(local)
                        });
                        methods.allocate(position, candidate)
                    })
                    .collect();

                PortTypeNames {
                    ident: identifier(ident, &port_type.name),
                    operations,
                }
            })
            .collect();

        Self {
            declarations,
            members,
            port_types,
        }
    }

    pub fn declaration(&self, idx: TypeIdx) -> &Identifier {
        &self.declarations[&idx]
    }

    /// Field identifiers of a struct, or variant identifiers of an enumeration,
    /// in member order.
    pub fn members(&self, idx: TypeIdx) -> &[String] {
        self.members.get(&idx).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn port_type(&self, position: usize) -> &PortTypeNames {
        &self.port_types[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Verbatim;

    impl Sanitizer for Verbatim {
        fn type_name(&self, name: &str) -> String {
            name.to_owned()
        }

        fn member_name(&self, name: &str) -> String {
            name.to_owned()
        }
    }

    #[test]
    fn case_conversion() {
        assert_eq!(RustNames.type_name("getInfoResponse"), "GetInfoResponse");
        assert_eq!(RustNames.type_name("HTTPServer-config"), "HttpServerConfig");
        assert_eq!(RustNames.type_name("Order_line"), "OrderLine");
        assert_eq!(RustNames.member_name("GetInfoResult"), "get_info_result");
        assert_eq!(RustNames.member_name("item.ID"), "item_id");
        assert_eq!(RustNames.variant_name("in-progress"), "InProgress");
    }

    #[test]
    fn keywords_and_digits() {
        assert_eq!(RustNames.member_name("type"), "r#type");
        assert_eq!(RustNames.member_name("self"), "self_");
        assert_eq!(RustNames.type_name("self"), "Self_");
        assert_eq!(RustNames.member_name("3rdParty"), "_3rd_party");
        assert_eq!(RustNames.type_name("2fa"), "T2fa");
        assert_eq!(RustNames.variant_name("100"), "V100");
        assert_eq!(RustNames.variant_name(""), "Empty");
        assert_eq!(RustNames.member_name("--"), "field");
    }

    #[test]
    fn non_ascii_letters_survive() {
        assert_eq!(RustNames.type_name("ÉvSzám"), "ÉvSzám");
        assert_eq!(RustNames.type_name("ÁrfolyamLista"), "ÁrfolyamLista");
        assert_eq!(RustNames.type_name("über"), "Über");
        assert_eq!(RustNames.member_name("ÁrfolyamLista"), "árfolyam_lista");
        assert_eq!(RustNames.member_name("größe"), "größe");
        assert_eq!(RustNames.type_name("日付"), "日付");
        assert_eq!(RustNames.member_name("日付"), "日付");
    }

    #[test]
    fn generated_names_are_identifiers() {
        for name in ["match", "Self", "9lives", "a b c", "ÁrfolyamLista", "_"] {
            assert!(is_identifier(&RustNames.type_name(name)), "{}", name);
            assert!(is_identifier(&RustNames.member_name(name)), "{}", name);
            assert!(is_identifier(&RustNames.variant_name(name)), "{}", name);
        }
    }

    #[test]
    fn invalid_custom_names_fall_back() {
        let name = checked(Verbatim.member_name("my-field"), || {
            RustNames.member_name("my-field")
        });
        assert_eq!(name, "my_field");

        let name = checked(Verbatim.type_name("Plain"), || RustNames.type_name("Plain"));
        assert_eq!(name, "Plain");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut allocator = Allocator::with_reserved(&["String"]);

        assert_eq!(allocator.allocate(1, "Order".into()), "Order");
        assert_eq!(allocator.allocate(2, "Order".into()), "Order1");
        assert_eq!(allocator.allocate(3, "Order".into()), "Order2");
        assert_eq!(allocator.allocate(4, "String".into()), "String1");
        assert_eq!(allocator.allocate(5, "r#type".into()), "r#type");
        assert_eq!(allocator.allocate(6, "r#type".into()), "type1");

        assert_eq!(allocator.allocate(2, "Other".into()), "Order1");
        assert_eq!(allocator.allocate(3, "Order".into()), "Order2");
    }
}
