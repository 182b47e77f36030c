use roxmltree::Node;
use tracing::debug;

use super::{
    attribute_decl, element_decl,
    error::XsdError,
    graph::{ComplexType, ElementRef, Occurrence},
    mapping_context::{DeclarationKind, MappingContext},
    schema::xs_children,
    simple_type_def::is_facet,
    values::{attribute, required_attribute},
    xstypes::QName,
};

impl ComplexType {
    pub const TAG_NAME: &'static str = "complexType";

    /// Maps a `<complexType>` named `name`. Nested model groups are flattened in document order
    /// and group references are expanded in place.
    pub(super) fn map_from_xml(
        context: &mut MappingContext,
        name: &QName,
        node: Node,
        top_level: bool,
    ) -> Result<Self, XsdError> {
        let mut complex_type = ComplexType {
            base: None,
            elements: vec![],
            attributes: vec![],
            top_level,
        };
        map_content(context, name, node, &mut complex_type)?;
        Ok(complex_type)
    }
}

fn map_content(
    context: &mut MappingContext,
    owner: &QName,
    node: Node,
    complex_type: &mut ComplexType,
) -> Result<(), XsdError> {
    for child in xs_children(node) {
        match child.tag_name().name() {
            // (pt. 1, §3.4.2.2, §3.4.2.3)
            "simpleContent" | "complexContent" => {
                let derivation = xs_children(child)
                    .find(|d| matches!(d.tag_name().name(), "extension" | "restriction"))
                    .ok_or_else(|| XsdError::MissingChild {
                        parent: child.tag_name().name().into(),
                        expected: "extension",
                    })?;
                complex_type.base = Some(required_attribute(derivation, "base")?);
                map_content(context, owner, derivation, complex_type)?;
            }
            "sequence" | "all" | "choice" | "group" => {
                map_particle(
                    context,
                    owner,
                    child,
                    Occurrence::Required,
                    &mut complex_type.elements,
                )?;
            }
            "attribute" => {
                attribute_decl::map_local(context, owner, child, &mut complex_type.attributes)?
            }
            "attributeGroup" => attribute_decl::map_group_ref(
                context,
                owner,
                child,
                &mut complex_type.attributes,
            )?,
            "anyAttribute" | "openContent" | "assert" => {
                debug!(%owner, "skipping <{}>", child.tag_name().name())
            }
            // Value restrictions of simple content
            name if name == "simpleType" || is_facet(name) => {}
            other => {
                return Err(XsdError::UnexpectedElement {
                    parent: node.tag_name().name().into(),
                    element: other.into(),
                })
            }
        }
    }
    Ok(())
}

/// Occurrence of a particle on its own (pt. 1, §3.9.2)
fn occurrence(node: Node) -> Result<Occurrence, XsdError> {
    let min_occurs = attribute::<u64>(node, "minOccurs")?.unwrap_or(1);
    let repeated = match attribute::<&str>(node, "maxOccurs")? {
        None => false,
        Some("unbounded") => true,
        Some(value) => {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| XsdError::InvalidValue {
                    element: node.tag_name().name().into(),
                    attribute: "maxOccurs",
                    value: value.into(),
                })?
                > 1
        }
    };
    Ok(if repeated {
        Occurrence::Repeated
    } else if min_occurs == 0 {
        Occurrence::Optional
    } else {
        Occurrence::Required
    })
}

pub(super) fn map_particle(
    context: &mut MappingContext,
    owner: &QName,
    node: Node,
    outer: Occurrence,
    elements: &mut Vec<ElementRef>,
) -> Result<(), XsdError> {
    let occurrence = outer.nest(occurrence(node)?);
    match node.tag_name().name() {
        element_decl::TAG_NAME => {
            element_decl::map_local(context, owner, node, occurrence, elements)
        }
        "sequence" | "all" => {
            for child in xs_children(node) {
                map_particle(context, owner, child, occurrence, elements)?;
            }
            Ok(())
        }
        "choice" => {
            let member = occurrence.nest(Occurrence::Optional);
            for child in xs_children(node) {
                map_particle(context, owner, child, member, elements)?;
            }
            Ok(())
        }
        "group" => {
            let group: QName = required_attribute(node, "ref")?;
            context.expand_group(DeclarationKind::Group, &group, owner, |context, group| {
                for child in xs_children(group) {
                    map_particle(context, owner, child, occurrence, elements)?;
                }
                Ok(())
            })
        }
        "any" => {
            debug!(%owner, "skipping element wildcard");
            Ok(())
        }
        other => Err(XsdError::UnexpectedElement {
            parent: node
                .parent_element()
                .map(|p| p.tag_name().name().to_string())
                .unwrap_or_default(),
            element: other.into(),
        }),
    }
}
