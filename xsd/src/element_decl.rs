use roxmltree::Node;

use super::{
    builtins::XS_ANY_TYPE_NAME,
    error::XsdError,
    graph::{ComplexType, ElementRef, Occurrence, SimpleType},
    mapping_context::{DeclarationKind, MappingContext, PendingRef},
    schema::xs_children,
    values::{attribute, required_attribute},
    xstypes::QName,
};

pub(super) const TAG_NAME: &str = "element";

/// Maps a top-level `<element>`; an inline type is named after the element.
pub(super) fn map_top_level(
    context: &mut MappingContext,
    name: &QName,
    node: Node,
) -> Result<ElementRef, XsdError> {
    Ok(ElementRef {
        name: name.clone(),
        type_: element_type(context, &name.local_name, node)?,
        occurrence: Occurrence::Required,
    })
}

/// Maps an `<element>` particle of the content of `owner` and appends it to `elements`. An
/// inline type is named `{owner}_{element}`.
pub(super) fn map_local(
    context: &mut MappingContext,
    owner: &QName,
    node: Node,
    occurrence: Occurrence,
    elements: &mut Vec<ElementRef>,
) -> Result<(), XsdError> {
    if let Some(target) = attribute::<QName>(node, "ref")? {
        context.defer(PendingRef {
            kind: DeclarationKind::Element,
            target: target.clone(),
            owner: owner.clone(),
            index: elements.len(),
        });
        elements.push(ElementRef {
            name: target.clone(),
            type_: target,
            occurrence,
        });
        return Ok(());
    }

    let local_name: &str = required_attribute(node, "name")?;
    let qualified = match attribute::<&str>(node, "form")? {
        None => context.schema().element_form_qualified,
        Some("qualified") => true,
        Some("unqualified") => false,
        Some(other) => {
            return Err(XsdError::InvalidValue {
                element: TAG_NAME.into(),
                attribute: "form",
                value: other.into(),
            })
        }
    };
    let name = if qualified {
        context.schema().qualify(local_name)
    } else {
        QName::with_optional_namespace(None::<String>, local_name)
    };
    let hint = format!("{}_{}", owner.local_name, local_name);
    let type_ = element_type(context, &hint, node)?;
    elements.push(ElementRef {
        name,
        type_,
        occurrence,
    });
    Ok(())
}

/// The declared type of an element: the `type` attribute, a promoted inline definition, or
/// `xs:anyType` (pt. 1, §3.3.2.1)
fn element_type(context: &mut MappingContext, hint: &str, node: Node) -> Result<QName, XsdError> {
    if let Some(type_) = attribute(node, "type")? {
        return Ok(type_);
    }
    let inline = xs_children(node).find(|c| {
        matches!(
            c.tag_name().name(),
            ComplexType::TAG_NAME | SimpleType::TAG_NAME
        )
    });
    match inline {
        Some(inline) => context.promote(hint, inline),
        None => Ok(XS_ANY_TYPE_NAME.clone()),
    }
}
