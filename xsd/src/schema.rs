use roxmltree::Node;
use tracing::debug;

use super::{
    builtins::XS_NAMESPACE,
    error::XsdError,
    standard::{is_standard, WSDL_NAMESPACE},
    values::attribute,
    xstypes::QName,
};

/// One `<xs:schema>` element of an input document, with the properties of its root that affect
/// how the declarations inside it are named.
#[derive(Copy, Clone, Debug)]
pub struct SchemaDocument<'a, 'input> {
    pub node: Node<'a, 'input>,
    pub target_namespace: Option<&'a str>,
    pub element_form_qualified: bool,
    pub attribute_form_qualified: bool,
}

impl<'a, 'input: 'a> SchemaDocument<'a, 'input> {
    pub const TAG_NAME: &'static str = "schema";

    fn map_from_xml(node: Node<'a, 'input>) -> Result<Self, XsdError> {
        let form_qualified = |name: &'static str| -> Result<bool, XsdError> {
            match attribute::<&str>(node, name)? {
                None | Some("unqualified") => Ok(false),
                Some("qualified") => Ok(true),
                Some(other) => Err(XsdError::InvalidValue {
                    element: Self::TAG_NAME.into(),
                    attribute: name,
                    value: other.into(),
                }),
            }
        };

        Ok(Self {
            node,
            target_namespace: node.attribute("targetNamespace"),
            element_form_qualified: form_qualified("elementFormDefault")?,
            attribute_form_qualified: form_qualified("attributeFormDefault")?,
        })
    }

    /// Collects the schemas of a document. The root is either a schema itself or a WSDL
    /// `<definitions>` element whose `<types>` section embeds any number of schemas.
    pub fn find_all(root: Node<'a, 'input>) -> Result<Vec<Self>, XsdError> {
        if is_xs(root, Self::TAG_NAME) {
            return Ok(vec![Self::map_from_xml(root)?]);
        }
        if root.tag_name().namespace() == Some(WSDL_NAMESPACE)
            && root.tag_name().name() == "definitions"
        {
            return root
                .descendants()
                .filter(|n| is_xs(*n, Self::TAG_NAME))
                .map(Self::map_from_xml)
                .collect();
        }
        Err(XsdError::NotASchema(root.tag_name().name().into()))
    }

    pub fn is_standard(&self) -> bool {
        is_standard(self.target_namespace)
    }

    /// Name of a top-level declaration of this schema.
    pub fn qualify(&self, local_name: &str) -> QName {
        QName::with_optional_namespace(self.target_namespace, local_name)
    }

    /// The top-level declarations of this schema, in document order. Children of `<redefine>`
    /// and `<override>` count as declarations of the schema itself.
    pub fn declarations(&self) -> impl Iterator<Item = Node<'a, 'input>> {
        xs_children(self.node).flat_map(|child| {
            let nested = matches!(child.tag_name().name(), "redefine" | "override");
            if nested {
                debug!(
                    schema_location = child.attribute("schemaLocation"),
                    "treating <{}> children as local declarations",
                    child.tag_name().name()
                );
            }
            let own = (!nested).then_some(child);
            own.into_iter()
                .chain(xs_children(child).filter(move |_| nested))
        })
    }
}

pub(crate) fn is_xs(node: Node, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(XS_NAMESPACE)
        && node.tag_name().name() == local_name
}

/// Element children in the XSD namespace, without annotations.
pub(crate) fn xs_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|c| {
        c.is_element()
            && c.tag_name().namespace() == Some(XS_NAMESPACE)
            && c.tag_name().name() != "annotation"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_root() {
        let doc = roxmltree::Document::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a"
                          elementFormDefault="qualified">
                 <xs:annotation/>
                 <xs:complexType name="A"/>
                 <xs:redefine schemaLocation="b.xsd">
                   <xs:simpleType name="B"/>
                 </xs:redefine>
                 <xs:element name="C"/>
               </xs:schema>"#,
        )
        .unwrap();
        let schemas = SchemaDocument::find_all(doc.root_element()).unwrap();
        assert_eq!(schemas.len(), 1);
        let schema = schemas[0];
        assert_eq!(schema.target_namespace, Some("urn:a"));
        assert!(schema.element_form_qualified);
        assert!(!schema.attribute_form_qualified);

        let names: Vec<_> = schema
            .declarations()
            .map(|d| d.attribute("name").unwrap())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn schemas_embedded_in_definitions() {
        let doc = roxmltree::Document::parse(
            r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
                            xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <types>
                   <xs:schema targetNamespace="urn:one"/>
                   <xs:schema targetNamespace="urn:two"/>
                 </types>
               </definitions>"#,
        )
        .unwrap();
        let namespaces: Vec<_> = SchemaDocument::find_all(doc.root_element())
            .unwrap()
            .iter()
            .map(|s| s.target_namespace)
            .collect();
        assert_eq!(namespaces, vec![Some("urn:one"), Some("urn:two")]);
        assert_eq!(WSDL_NAMESPACE, doc.root_element().tag_name().namespace().unwrap());
    }

    #[test]
    fn rejects_other_roots() {
        let doc = roxmltree::Document::parse("<html/>").unwrap();
        assert!(matches!(
            SchemaDocument::find_all(doc.root_element()),
            Err(XsdError::NotASchema(root)) if root == "html"
        ));
    }
}
