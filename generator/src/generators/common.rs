use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use proc_macro2::Span;
use syn::{parse_quote, Ident, Type};
use wsdlgen_xsd::{
    standard::is_visible, AttributeRef, Builtin, BuiltinKind, ElementRef, Occurrence, QName,
    SimpleDerivation, TypeGraph, TypeNode,
};

use crate::naming::{name_to_ident, pascal_name, NameSet};

/// A Rust type, without the `Option` or `Vec` its occurrence adds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RustType {
    /// A primitive or prelude type such as `i32` or `String`
    Primitive(&'static str),
    /// A type of the `wsdlgen_runtime` crate
    Helper(&'static str),
    /// `Vec<u8>`
    Bytes,
    /// `Vec<String>`
    Strings,
    /// A type emitted for the schema
    Generated(String),
}

impl RustType {
    /// How the builtin is carried between stub and invoker.
    pub fn builtin(builtin: Builtin) -> Self {
        use Builtin as B;
        use RustType::{Helper, Primitive};
        match builtin {
            B::AnyType | B::AnySimpleType | B::AnyAtomicType => Helper("AnyType"),
            B::Boolean => Primitive("bool"),
            B::Decimal | B::Double => Primitive("f64"),
            B::Float => Primitive("f32"),
            B::Integer | B::NonPositiveInteger | B::NegativeInteger | B::Long => Primitive("i64"),
            B::Int => Primitive("i32"),
            B::Short => Primitive("i16"),
            B::Byte => Primitive("i8"),
            B::NonNegativeInteger | B::PositiveInteger | B::UnsignedLong => Primitive("u64"),
            B::UnsignedInt => Primitive("u32"),
            B::UnsignedShort => Primitive("u16"),
            B::UnsignedByte => Primitive("u8"),
            B::DateTime => Helper("DateTime"),
            B::DateTimeStamp => Helper("DateTimeStamp"),
            B::Date => Helper("Date"),
            B::Time => Helper("Time"),
            B::GDay => Helper("GDay"),
            B::GMonth => Helper("GMonth"),
            B::GMonthDay => Helper("GMonthDay"),
            B::GYear => Helper("GYear"),
            B::GYearMonth => Helper("GYearMonth"),
            B::HexBinary => Helper("HexBinary"),
            B::Base64Binary => Helper("Base64Binary"),
            B::IdRefs => Helper("IdRefs"),
            B::NmTokens => Helper("NmTokens"),
            B::Entities => Helper("Entities"),
            B::Notation => Helper("Notation"),
            B::String
            | B::NormalizedString
            | B::Token
            | B::Language
            | B::Name
            | B::NcName
            | B::Id
            | B::IdRef
            | B::Entity
            | B::NmToken
            | B::QName
            | B::AnyUri
            | B::Duration
            | B::DayTimeDuration
            | B::YearMonthDuration => Primitive("String"),
        }
    }

    /// How the builtin appears in client signatures.
    pub fn exposed_builtin(builtin: Builtin) -> Self {
        match builtin.kind() {
            BuiltinKind::DateTime => Self::Helper("Timestamp"),
            BuiltinKind::Binary => Self::Bytes,
            BuiltinKind::List => Self::Strings,
            _ => Self::builtin(builtin),
        }
    }

    pub fn to_type(&self) -> Type {
        match self {
            Self::Primitive(name) => {
                let name = Ident::new(name, Span::call_site());
                parse_quote!(#name)
            }
            Self::Helper(name) => {
                let name = Ident::new(name, Span::call_site());
                parse_quote!(wsdlgen_runtime::#name)
            }
            Self::Bytes => parse_quote!(Vec<u8>),
            Self::Strings => parse_quote!(Vec<String>),
            Self::Generated(name) => {
                let name = name_to_ident(name);
                parse_quote!(#name)
            }
        }
    }
}

impl fmt::Display for RustType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(name) => f.write_str(name),
            Self::Helper(name) => write!(f, "wsdlgen_runtime::{name}"),
            Self::Bytes => f.write_str("Vec<u8>"),
            Self::Strings => f.write_str("Vec<String>"),
            Self::Generated(name) => f.write_str(name),
        }
    }
}

/// `ty` as it appears in a field of the given occurrence.
pub(crate) fn occurs(ty: Type, occurrence: Occurrence) -> Type {
    match occurrence {
        Occurrence::Required => ty,
        Occurrence::Optional => parse_quote!(Option<#ty>),
        Occurrence::Repeated => parse_quote!(Vec<#ty>),
    }
}

/// The types to emit and the Rust names chosen for them.
pub(crate) struct GeneratorContext<'g> {
    pub(crate) graph: &'g TypeGraph,
    type_names: BTreeMap<QName, String>,
    names: NameSet,
}

impl<'g> GeneratorContext<'g> {
    /// Every declared type of a visible namespace gets a name. Names are handed out in the
    /// graph's order, so a run over the same input always picks the same names.
    pub(crate) fn new(graph: &'g TypeGraph, requested: Option<&str>) -> Self {
        let mut names = NameSet::default();
        let mut type_names = BTreeMap::new();
        for (name, node) in graph.types() {
            if matches!(node, TypeNode::Builtin(_))
                || graph.is_synthesized(name)
                || !is_visible(name.namespace(), requested)
            {
                continue;
            }
            let base = pascal_name(&name.local_name).unwrap_or_else(|| "Type".into());
            type_names.insert(name.clone(), names.unique(&base, ""));
        }
        Self {
            graph,
            type_names,
            names,
        }
    }

    pub(crate) fn emitted(&self) -> impl Iterator<Item = (&QName, &str, &TypeNode)> + '_ {
        self.type_names.iter().filter_map(|(name, ident)| {
            let node = self.graph.get(name)?;
            Some((name, ident.as_str(), node))
        })
    }

    /// Takes a type name that is not used by any emitted type yet.
    pub(crate) fn unique_type_name(&mut self, base: &str) -> String {
        self.names.unique(base, "")
    }

    /// The builtin `name` is carried as: the builtin itself, or for a type that is not emitted,
    /// the builtin at the root of its derivation chain.
    fn carried_builtin(&self, name: &QName) -> Option<Builtin> {
        if let Some(builtin) = self.graph.builtin(name) {
            return Some(builtin);
        }
        if self.type_names.contains_key(name) {
            return None;
        }
        let root = self.graph.ancestors(name).last()?;
        match self.graph.get(root)? {
            TypeNode::Builtin(builtin) => Some(*builtin),
            TypeNode::Simple(simple) => Some(match simple.derivation {
                SimpleDerivation::List(_) => Builtin::NmTokens,
                _ => Builtin::String,
            }),
            TypeNode::Complex(_) => None,
        }
    }

    /// Types from namespaces that are not emitted are carried as their builtin base, or as raw
    /// content when they have element content.
    pub(crate) fn rust_type(&self, name: &QName) -> RustType {
        if let Some(builtin) = self.carried_builtin(name) {
            return RustType::builtin(builtin);
        }
        match self.type_names.get(name) {
            Some(ident) => RustType::Generated(ident.clone()),
            None => RustType::Helper("AnyType"),
        }
    }

    pub(crate) fn exposed_type(&self, name: &QName) -> RustType {
        match self.carried_builtin(name) {
            Some(builtin) => RustType::exposed_builtin(builtin),
            None => self.rust_type(name),
        }
    }

    /// The base types of `name` from the root down, followed by `name` itself.
    fn lineage(&self, name: &QName) -> Vec<QName> {
        let mut lineage: Vec<QName> = self.graph.ancestors(name).cloned().collect();
        lineage.reverse();
        lineage
    }

    /// The child elements of complex type `name`, inherited ones first. `None` unless `name`
    /// is a complex type with element content.
    pub(crate) fn content_elements(&self, name: &QName) -> Option<Vec<ElementRef>> {
        self.graph.get(name)?.complex()?;
        let mut seen = BTreeSet::new();
        let mut elements = vec![];
        for ancestor in self.lineage(name) {
            match self.graph.get(&ancestor)? {
                TypeNode::Complex(complex) => elements.extend(
                    complex
                        .elements
                        .iter()
                        .filter(|e| seen.insert(e.name.clone()))
                        .cloned(),
                ),
                TypeNode::Builtin(b) if b.kind() == BuiltinKind::Any => {}
                _ => return None,
            }
        }
        Some(elements)
    }

    pub(crate) fn content_attributes(&self, name: &QName) -> Vec<AttributeRef> {
        let mut seen = BTreeSet::new();
        self.lineage(name)
            .iter()
            .filter_map(|ancestor| self.graph.get(ancestor)?.complex())
            .flat_map(|complex| complex.attributes.iter())
            .filter(|a| seen.insert(a.name.clone()))
            .cloned()
            .collect()
    }

    /// The simple type a complex type with simple content extends or restricts.
    pub(crate) fn simple_content(&self, name: &QName) -> Option<QName> {
        self.graph
            .ancestors(name)
            .skip(1)
            .find(|ancestor| match self.graph.get(ancestor) {
                Some(TypeNode::Simple(_)) => true,
                Some(TypeNode::Builtin(b)) => b.kind() != BuiltinKind::Any,
                _ => false,
            })
            .cloned()
    }

    /// Whether a value of type `from` can contain a value of type `to` without a `Vec` in
    /// between. Such fields have to be boxed.
    pub(crate) fn reaches(&self, from: &QName, to: &QName) -> bool {
        let mut stack = vec![from.clone()];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if &current == to {
                return true;
            }
            if !self.type_names.contains_key(&current) || !seen.insert(current.clone()) {
                continue;
            }
            if let Some(elements) = self.content_elements(&current) {
                stack.extend(
                    elements
                        .into_iter()
                        .filter(|e| e.occurrence != Occurrence::Repeated)
                        .map(|e| e.type_),
                );
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsdlgen_xsd::{normalize, NormalizeOptions};

    const SCHEMA: &str = r#"
        <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   xmlns:tns="urn:shop" targetNamespace="urn:shop">
          <xs:complexType name="Item">
            <xs:sequence>
              <xs:element name="id" type="xs:int"/>
            </xs:sequence>
            <xs:attribute name="code" type="xs:string"/>
          </xs:complexType>
          <xs:complexType name="Book">
            <xs:complexContent>
              <xs:extension base="tns:Item">
                <xs:sequence>
                  <xs:element name="title" type="xs:string"/>
                  <xs:element name="sequel" type="tns:Book" minOccurs="0"/>
                  <xs:element name="related" type="tns:Book" maxOccurs="unbounded"/>
                </xs:sequence>
              </xs:extension>
            </xs:complexContent>
          </xs:complexType>
          <xs:complexType name="Price">
            <xs:simpleContent>
              <xs:extension base="xs:decimal">
                <xs:attribute name="currency" type="xs:string"/>
              </xs:extension>
            </xs:simpleContent>
          </xs:complexType>
          <xs:complexType name="string">
            <xs:sequence/>
          </xs:complexType>
        </xs:schema>"#;

    fn shop(local: &str) -> QName {
        QName::with_namespace("urn:shop", local)
    }

    #[test]
    fn inherited_content_comes_first() {
        let doc = roxmltree::Document::parse(SCHEMA).unwrap();
        let graph = normalize(std::slice::from_ref(&doc), NormalizeOptions::default())
            .unwrap()
            .graph;
        let context = GeneratorContext::new(&graph, None);

        let names: Vec<_> = context
            .content_elements(&shop("Book"))
            .unwrap()
            .into_iter()
            .map(|e| e.name.local_name)
            .collect();
        assert_eq!(names, vec!["id", "title", "sequel", "related"]);
        assert_eq!(context.content_attributes(&shop("Book")).len(), 1);

        assert_eq!(context.content_elements(&shop("Price")), None);
        assert_eq!(context.simple_content(&shop("Price")), Some(Builtin::Decimal.qname()));
        assert_eq!(context.content_elements(&Builtin::AnyType.qname()), None);

        assert!(context.reaches(&shop("Book"), &shop("Book")));
        assert!(!context.reaches(&shop("Item"), &shop("Book")));
    }

    #[test]
    fn type_mapping() {
        let doc = roxmltree::Document::parse(SCHEMA).unwrap();
        let graph = normalize(std::slice::from_ref(&doc), NormalizeOptions::default())
            .unwrap()
            .graph;
        let context = GeneratorContext::new(&graph, None);

        assert_eq!(context.rust_type(&shop("string")).to_string(), "StringType");
        assert_eq!(
            context.rust_type(&Builtin::HexBinary.qname()).to_string(),
            "wsdlgen_runtime::HexBinary"
        );
        assert_eq!(context.exposed_type(&Builtin::HexBinary.qname()), RustType::Bytes);
        assert_eq!(
            context.exposed_type(&Builtin::Date.qname()).to_string(),
            "wsdlgen_runtime::Timestamp"
        );
        assert_eq!(context.exposed_type(&Builtin::NmTokens.qname()), RustType::Strings);
        assert_eq!(
            context.exposed_type(&Builtin::Notation.qname()),
            context.rust_type(&Builtin::Notation.qname())
        );
        assert_eq!(context.exposed_type(&Builtin::Int.qname()), RustType::Primitive("i32"));

        let soapenc = |local| QName::with_namespace(wsdlgen_xsd::standard::SOAP_ENCODING_NAMESPACE, local);
        assert_eq!(context.rust_type(&soapenc("Array")), RustType::Helper("AnyType"));
        assert_eq!(context.rust_type(&soapenc("string")), RustType::Primitive("String"));
        assert_eq!(context.exposed_type(&soapenc("base64")), RustType::Bytes);
        assert_eq!(
            context.rust_type(&soapenc("arrayCoordinate")),
            RustType::Primitive("String")
        );

        let restricted = GeneratorContext::new(&graph, Some("urn:other"));
        assert_eq!(restricted.emitted().count(), 0);
        assert_eq!(restricted.rust_type(&shop("Item")), RustType::Helper("AnyType"));
        assert_eq!(restricted.exposed_type(&shop("Price")), RustType::Primitive("f64"));
    }
}
