use roxmltree::Node;
use tracing::debug;

use super::{
    builtins::XS_ANY_SIMPLE_TYPE_NAME,
    error::XsdError,
    graph::{AttributeRef, SimpleType},
    mapping_context::{DeclarationKind, MappingContext, PendingRef},
    schema::xs_children,
    values::{attribute, required_attribute},
    xstypes::QName,
};

pub(super) const TAG_NAME: &str = "attribute";

pub(super) fn map_top_level(
    context: &mut MappingContext,
    name: &QName,
    node: Node,
) -> Result<AttributeRef, XsdError> {
    Ok(AttributeRef {
        name: name.clone(),
        type_: attribute_type(context, &name.local_name, node)?,
        required: false,
    })
}

/// Maps an attribute use of `owner` and appends it to `attributes`. Prohibited attributes are
/// dropped.
pub(super) fn map_local(
    context: &mut MappingContext,
    owner: &QName,
    node: Node,
    attributes: &mut Vec<AttributeRef>,
) -> Result<(), XsdError> {
    let required = match attribute::<&str>(node, "use")? {
        None | Some("optional") => false,
        Some("required") => true,
        Some("prohibited") => return Ok(()),
        Some(other) => {
            return Err(XsdError::InvalidValue {
                element: TAG_NAME.into(),
                attribute: "use",
                value: other.into(),
            })
        }
    };

    if let Some(target) = attribute::<QName>(node, "ref")? {
        context.defer(PendingRef {
            kind: DeclarationKind::Attribute,
            target: target.clone(),
            owner: owner.clone(),
            index: attributes.len(),
        });
        attributes.push(AttributeRef {
            name: target.clone(),
            type_: target,
            required,
        });
        return Ok(());
    }

    let local_name: &str = required_attribute(node, "name")?;
    let qualified = match attribute::<&str>(node, "form")? {
        None => context.schema().attribute_form_qualified,
        Some(form) => form == "qualified",
    };
    let name = if qualified {
        context.schema().qualify(local_name)
    } else {
        QName::with_optional_namespace(None::<String>, local_name)
    };
    let hint = format!("{}_{}", owner.local_name, local_name);
    let type_ = attribute_type(context, &hint, node)?;
    attributes.push(AttributeRef {
        name,
        type_,
        required,
    });
    Ok(())
}

/// Expands an `<attributeGroup ref>` into the attribute uses of `owner`.
pub(super) fn map_group_ref(
    context: &mut MappingContext,
    owner: &QName,
    node: Node,
    attributes: &mut Vec<AttributeRef>,
) -> Result<(), XsdError> {
    let group: QName = required_attribute(node, "ref")?;
    context.expand_group(
        DeclarationKind::AttributeGroup,
        &group,
        owner,
        |context, group| {
            for child in xs_children(group) {
                match child.tag_name().name() {
                    TAG_NAME => map_local(context, owner, child, attributes)?,
                    "attributeGroup" => map_group_ref(context, owner, child, attributes)?,
                    other => debug!(%owner, "skipping <{other}> in attribute group"),
                }
            }
            Ok(())
        },
    )
}

fn attribute_type(context: &mut MappingContext, hint: &str, node: Node) -> Result<QName, XsdError> {
    if let Some(type_) = attribute(node, "type")? {
        return Ok(type_);
    }
    match xs_children(node).find(|c| c.tag_name().name() == SimpleType::TAG_NAME) {
        Some(inline) => context.promote(hint, inline),
        None => Ok(XS_ANY_SIMPLE_TYPE_NAME.clone()),
    }
}
