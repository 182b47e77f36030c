use roxmltree::Node;

use super::{
    builtins::BuiltinKind,
    error::XsdError,
    graph::{Facet, SimpleDerivation, SimpleType},
    mapping_context::MappingContext,
    schema::xs_children,
    values::{attribute, required_attribute},
    xstypes::QName,
};

/// Constraining facets (pt. 2, §4.3)
const FACETS: &[&str] = &[
    "length",
    "minLength",
    "maxLength",
    "pattern",
    "enumeration",
    "whiteSpace",
    "maxInclusive",
    "maxExclusive",
    "minExclusive",
    "minInclusive",
    "totalDigits",
    "fractionDigits",
    "assertion",
    "explicitTimezone",
];

pub(super) fn is_facet(name: &str) -> bool {
    FACETS.contains(&name)
}

impl SimpleType {
    pub const TAG_NAME: &'static str = "simpleType";

    /// Maps a `<simpleType>` named `name`. Inline base, item and member types are promoted to
    /// named types. The base kind is left as [`BuiltinKind::Text`] until the closure pass.
    pub(super) fn map_from_xml(
        context: &mut MappingContext,
        name: &QName,
        node: Node,
    ) -> Result<Self, XsdError> {
        let derivation = xs_children(node)
            .next()
            .ok_or_else(|| XsdError::MissingChild {
                parent: Self::TAG_NAME.into(),
                expected: "restriction",
            })?;

        let inline = |context: &mut MappingContext, suffix: &str| -> Result<Option<QName>, XsdError> {
            match xs_children(derivation).find(|c| c.tag_name().name() == Self::TAG_NAME) {
                Some(inline) => context
                    .promote(&format!("{}_{suffix}", name.local_name), inline)
                    .map(Some),
                None => Ok(None),
            }
        };

        let mut facets = vec![];
        let derivation = match derivation.tag_name().name() {
            "restriction" => {
                let base = match attribute::<QName>(derivation, "base")? {
                    Some(base) => base,
                    None => inline(context, "base")?.ok_or(XsdError::MissingAttribute {
                        element: "restriction".into(),
                        attribute: "base",
                    })?,
                };
                for facet in xs_children(derivation).filter(|c| is_facet(c.tag_name().name())) {
                    facets.push(Facet {
                        name: facet.tag_name().name().into(),
                        value: required_attribute(facet, "value")?,
                    });
                }
                SimpleDerivation::Restriction(base)
            }
            "list" => {
                let item = match attribute::<QName>(derivation, "itemType")? {
                    Some(item) => item,
                    None => inline(context, "item")?.ok_or(XsdError::MissingAttribute {
                        element: "list".into(),
                        attribute: "itemType",
                    })?,
                };
                SimpleDerivation::List(item)
            }
            "union" => {
                let mut members: Vec<QName> =
                    attribute(derivation, "memberTypes")?.unwrap_or_default();
                for member in xs_children(derivation) {
                    members.push(context.promote(&format!("{}_member", name.local_name), member)?);
                }
                SimpleDerivation::Union(members)
            }
            other => {
                return Err(XsdError::UnexpectedElement {
                    parent: Self::TAG_NAME.into(),
                    element: other.into(),
                })
            }
        };

        Ok(SimpleType {
            derivation,
            base_kind: BuiltinKind::Text,
            facets,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        builtins::{BuiltinKind, XS_NAMESPACE},
        graph::{SimpleDerivation, TypeNode},
        normalize, NormalizeOptions, QName,
    };

    #[test]
    fn classifies_derived_simple_types() {
        let doc = roxmltree::Document::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:t="urn:t" targetNamespace="urn:t">
                 <xs:simpleType name="Color">
                   <xs:restriction base="xs:token">
                     <xs:enumeration value="red"/>
                     <xs:enumeration value="green"/>
                   </xs:restriction>
                 </xs:simpleType>
                 <xs:simpleType name="Digest">
                   <xs:restriction base="t:Blob"/>
                 </xs:simpleType>
                 <xs:simpleType name="Blob">
                   <xs:restriction base="xs:base64Binary">
                     <xs:maxLength value="64"/>
                   </xs:restriction>
                 </xs:simpleType>
                 <xs:simpleType name="Sizes">
                   <xs:list>
                     <xs:simpleType>
                       <xs:restriction base="xs:int"/>
                     </xs:simpleType>
                   </xs:list>
                 </xs:simpleType>
                 <xs:simpleType name="Either">
                   <xs:union memberTypes="xs:int t:Color"/>
                 </xs:simpleType>
               </xs:schema>"#,
        )
        .unwrap();
        let graph = normalize(&[doc], NormalizeOptions::default()).unwrap().graph;
        let simple = |local: &str| {
            graph
                .get(&QName::with_namespace("urn:t", local))
                .and_then(TypeNode::simple)
                .unwrap()
                .clone()
        };

        let color = simple("Color");
        assert_eq!(color.base_kind, BuiltinKind::Text);
        assert_eq!(color.enumeration().collect::<Vec<_>>(), vec!["red", "green"]);

        // Forward reference to Blob, two steps away from the builtin
        assert_eq!(simple("Digest").base_kind, BuiltinKind::Binary);

        let sizes = simple("Sizes");
        assert_eq!(sizes.base_kind, BuiltinKind::List);
        assert_eq!(
            sizes.derivation,
            SimpleDerivation::List(QName::with_namespace("urn:t", "Sizes_item"))
        );
        assert_eq!(simple("Sizes_item").base_kind, BuiltinKind::Integer);

        assert_eq!(
            simple("Either").derivation,
            SimpleDerivation::Union(vec![
                QName::with_namespace(XS_NAMESPACE, "int"),
                QName::with_namespace("urn:t", "Color"),
            ])
        );
    }
}
