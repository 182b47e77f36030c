//! Catalog of well-known schemas.
//!
//! Documents in these namespaces are normalized so that references into them resolve, but their
//! types are not part of the generated output unless the namespace is requested explicitly.

use std::collections::HashSet;

use lazy_static::lazy_static;

use super::builtins::XS_NAMESPACE;
use super::error::XsdError;
use super::xstypes::XML_NAMESPACE;

pub const SOAP_ENCODING_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/encoding/";
pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";

pub struct StandardSchema {
    pub namespace: &'static str,
    pub source: &'static str,
}

pub static STANDARD_SCHEMAS: &[StandardSchema] = &[
    StandardSchema {
        namespace: XML_NAMESPACE,
        source: XML_XSD,
    },
    StandardSchema {
        namespace: SOAP_ENCODING_NAMESPACE,
        source: SOAP_ENCODING_XSD,
    },
    StandardSchema {
        namespace: WSDL_NAMESPACE,
        source: WSDL_XSD,
    },
];

lazy_static! {
    static ref STANDARD_NAMESPACES: HashSet<&'static str> = STANDARD_SCHEMAS
        .iter()
        .map(|s| s.namespace)
        .chain([XS_NAMESPACE])
        .collect();
}

pub fn is_standard(namespace: Option<&str>) -> bool {
    namespace.is_some_and(|ns| STANDARD_NAMESPACES.contains(ns))
}

/// Whether types of `namespace` belong in the output. With a `requested` namespace only that one
/// is visible; otherwise everything but the standard namespaces is.
pub fn is_visible(namespace: Option<&str>, requested: Option<&str>) -> bool {
    match requested {
        Some(requested) => namespace == Some(requested),
        None => !is_standard(namespace),
    }
}

/// Parses the catalog documents.
pub(crate) fn parse_standard_schemas<'input>() -> Result<Vec<roxmltree::Document<'input>>, XsdError>
{
    STANDARD_SCHEMAS
        .iter()
        .map(|schema| {
            roxmltree::Document::parse(schema.source).map_err(|source| XsdError::StandardSchema {
                namespace: schema.namespace,
                source,
            })
        })
        .collect()
}

const XML_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.w3.org/XML/1998/namespace">
  <xs:attribute name="lang">
    <xs:simpleType>
      <xs:union memberTypes="xs:language">
        <xs:simpleType>
          <xs:restriction base="xs:string">
            <xs:enumeration value=""/>
          </xs:restriction>
        </xs:simpleType>
      </xs:union>
    </xs:simpleType>
  </xs:attribute>
  <xs:attribute name="space">
    <xs:simpleType>
      <xs:restriction base="xs:NCName">
        <xs:enumeration value="default"/>
        <xs:enumeration value="preserve"/>
      </xs:restriction>
    </xs:simpleType>
  </xs:attribute>
  <xs:attribute name="base" type="xs:anyURI"/>
  <xs:attribute name="id" type="xs:ID"/>
  <xs:attributeGroup name="specialAttrs">
    <xs:attribute ref="xml:base"/>
    <xs:attribute ref="xml:lang"/>
    <xs:attribute ref="xml:space"/>
    <xs:attribute ref="xml:id"/>
  </xs:attributeGroup>
</xs:schema>
"#;

const SOAP_ENCODING_XSD: &str = r###"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:tns="http://schemas.xmlsoap.org/soap/encoding/"
           targetNamespace="http://schemas.xmlsoap.org/soap/encoding/">
  <xs:attribute name="root">
    <xs:simpleType>
      <xs:restriction base="xs:boolean">
        <xs:pattern value="0|1"/>
      </xs:restriction>
    </xs:simpleType>
  </xs:attribute>
  <xs:attributeGroup name="commonAttributes">
    <xs:attribute name="id" type="xs:ID"/>
    <xs:attribute name="href" type="xs:anyURI"/>
  </xs:attributeGroup>
  <xs:simpleType name="arrayCoordinate">
    <xs:restriction base="xs:string"/>
  </xs:simpleType>
  <xs:attribute name="arrayType" type="xs:string"/>
  <xs:attribute name="offset" type="tns:arrayCoordinate"/>
  <xs:attribute name="position" type="tns:arrayCoordinate"/>
  <xs:attributeGroup name="arrayAttributes">
    <xs:attribute ref="tns:arrayType"/>
    <xs:attribute ref="tns:offset"/>
  </xs:attributeGroup>
  <xs:attributeGroup name="arrayMemberAttributes">
    <xs:attribute ref="tns:position"/>
  </xs:attributeGroup>
  <xs:complexType name="Array">
    <xs:sequence>
      <xs:any namespace="##any" minOccurs="0" maxOccurs="unbounded" processContents="lax"/>
    </xs:sequence>
    <xs:attributeGroup ref="tns:arrayAttributes"/>
    <xs:attributeGroup ref="tns:commonAttributes"/>
  </xs:complexType>
  <xs:element name="Array" type="tns:Array"/>
  <xs:complexType name="Struct">
    <xs:sequence>
      <xs:any namespace="##any" minOccurs="0" maxOccurs="unbounded" processContents="lax"/>
    </xs:sequence>
    <xs:attributeGroup ref="tns:commonAttributes"/>
  </xs:complexType>
  <xs:element name="Struct" type="tns:Struct"/>
  <xs:complexType name="string">
    <xs:simpleContent>
      <xs:extension base="xs:string">
        <xs:attributeGroup ref="tns:commonAttributes"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:element name="string" type="tns:string"/>
  <xs:complexType name="boolean">
    <xs:simpleContent>
      <xs:extension base="xs:boolean">
        <xs:attributeGroup ref="tns:commonAttributes"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:element name="boolean" type="tns:boolean"/>
  <xs:complexType name="int">
    <xs:simpleContent>
      <xs:extension base="xs:int">
        <xs:attributeGroup ref="tns:commonAttributes"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:element name="int" type="tns:int"/>
  <xs:complexType name="double">
    <xs:simpleContent>
      <xs:extension base="xs:double">
        <xs:attributeGroup ref="tns:commonAttributes"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:element name="double" type="tns:double"/>
  <xs:complexType name="dateTime">
    <xs:simpleContent>
      <xs:extension base="xs:dateTime">
        <xs:attributeGroup ref="tns:commonAttributes"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:element name="dateTime" type="tns:dateTime"/>
  <xs:complexType name="base64">
    <xs:simpleContent>
      <xs:extension base="xs:base64Binary">
        <xs:attributeGroup ref="tns:commonAttributes"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:element name="base64" type="tns:base64"/>
</xs:schema>
"###;

const WSDL_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://schemas.xmlsoap.org/wsdl/">
  <xs:attribute name="arrayType" type="xs:string"/>
</xs:schema>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_documents_parse() {
        let docs = parse_standard_schemas().unwrap();
        assert_eq!(docs.len(), STANDARD_SCHEMAS.len());
        for (doc, schema) in docs.iter().zip(STANDARD_SCHEMAS) {
            assert_eq!(
                doc.root_element().attribute("targetNamespace"),
                Some(schema.namespace)
            );
        }
        // wildcards inside the embedded text survive its raw string delimiters
        let encoding = &docs[STANDARD_SCHEMAS
            .iter()
            .position(|schema| schema.namespace == SOAP_ENCODING_NAMESPACE)
            .unwrap()];
        assert!(encoding
            .descendants()
            .any(|node| node.attribute("namespace") == Some("##any")));
        assert!(encoding
            .descendants()
            .any(|node| node.attribute("name") == Some("arrayCoordinate")));
    }

    #[test]
    fn visibility_rules() {
        assert!(is_standard(Some(XS_NAMESPACE)));
        assert!(is_standard(Some(SOAP_ENCODING_NAMESPACE)));
        assert!(!is_standard(Some("urn:user")));
        assert!(!is_standard(None));

        assert!(is_visible(Some("urn:user"), None));
        assert!(!is_visible(Some(SOAP_ENCODING_NAMESPACE), None));
        assert!(is_visible(
            Some(SOAP_ENCODING_NAMESPACE),
            Some(SOAP_ENCODING_NAMESPACE)
        ));
        assert!(!is_visible(Some("urn:user"), Some(SOAP_ENCODING_NAMESPACE)));
    }
}
