//! Rewriting of RPC-style operations into document style.
//!
//! An RPC operation lists its arguments as message parts. Each of its messages is replaced by a
//! synthesized complex type named after the message, with one element per former part, so that
//! code generation only ever deals with a single body element per message.

use std::collections::BTreeMap;

use tracing::{debug, info};
use wsdlgen_wsdl::{Message, Operation, OperationStyle, Part, ServiceDescription};
use wsdlgen_xsd::{
    builtins::XS_NAMESPACE, Builtin, ComplexType, ElementRef, Occurrence, QName, TypeGraph,
};

use crate::error::UnifyError;

type Strategy = fn(&TypeGraph, &Part) -> Option<QName>;

/// Ways of finding the type of a message part, in order of preference.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("builtin type", builtin_by_type),
    ("builtin element", builtin_by_element),
    ("builtin named like the element", builtin_by_element_local_name),
    ("declared type", declared_type),
    ("type named like the element", type_by_element_name),
    ("element declaration", element_declaration),
];

fn builtin_by_type(_: &TypeGraph, part: &Part) -> Option<QName> {
    let type_ = part.type_.as_ref()?;
    Builtin::parse(type_).map(Builtin::qname)
}

fn builtin_by_element(_: &TypeGraph, part: &Part) -> Option<QName> {
    let element = part.element.as_ref()?;
    Builtin::parse(element).map(Builtin::qname)
}

fn builtin_by_element_local_name(_: &TypeGraph, part: &Part) -> Option<QName> {
    let element = part.element.as_ref()?;
    Builtin::parse(&QName::with_namespace(XS_NAMESPACE, element.local_name.as_str()))
        .map(Builtin::qname)
}

fn declared_type(graph: &TypeGraph, part: &Part) -> Option<QName> {
    part.type_.as_ref().filter(|t| graph.contains(t)).cloned()
}

fn type_by_element_name(graph: &TypeGraph, part: &Part) -> Option<QName> {
    part.element.as_ref().filter(|e| graph.contains(e)).cloned()
}

fn element_declaration(graph: &TypeGraph, part: &Part) -> Option<QName> {
    let element = part.element.as_ref()?;
    graph.element(element).map(|e| e.type_.clone())
}

/// The type a message part stands for. The first strategy that succeeds decides.
pub fn resolve_part(graph: &TypeGraph, part: &Part) -> Option<QName> {
    STRATEGIES.iter().find_map(|(strategy, resolve)| {
        let found = resolve(graph, part)?;
        debug!(part = %part.name, %found, strategy = *strategy, "resolved message part");
        Some(found)
    })
}

/// Whether `message` already is the single-part form produced by [`unify_message`].
fn is_unified(graph: &TypeGraph, message: &Message) -> bool {
    matches!(
        message.parts.as_slice(),
        [part] if part.type_.as_ref() == Some(&message.name) && graph.is_synthesized(&message.name)
    )
}

/// Replaces the parts of `message` by a single part whose type is synthesized from them.
pub fn unify_message(message: &mut Message, graph: &mut TypeGraph) -> Result<(), UnifyError> {
    if is_unified(graph, message) {
        return Ok(());
    }

    let elements = message
        .parts
        .iter()
        .map(|part| {
            let type_ = resolve_part(graph, part).ok_or_else(|| UnifyError::UnresolvedPart {
                message: message.name.clone(),
                part: part.name.clone(),
            })?;
            Ok(ElementRef {
                name: message.name.sibling(part.name.as_str()),
                type_,
                occurrence: Occurrence::Required,
            })
        })
        .collect::<Result<Vec<_>, UnifyError>>()?;

    let composite = ComplexType {
        base: None,
        elements,
        attributes: vec![],
        top_level: true,
    };
    graph
        .insert_synthesized(message.name.clone(), composite)
        .map_err(|source| UnifyError::Synthesis {
            message: message.name.clone(),
            source,
        })?;

    message.parts = vec![Part {
        name: message.name.local_name.clone(),
        type_: Some(message.name.clone()),
        element: Some(message.name.clone()),
    }];
    Ok(())
}

/// Converts one operation. Document-style operations are left alone, so calling this twice is
/// harmless.
pub fn unify_operation(
    operation: &mut Operation,
    messages: &mut BTreeMap<QName, Message>,
    graph: &mut TypeGraph,
) -> Result<(), UnifyError> {
    if operation.style() == OperationStyle::DocumentEncoded {
        return Ok(());
    }
    for name in [&operation.input, &operation.output] {
        let message = messages
            .get_mut(name)
            .ok_or_else(|| wsdlgen_wsdl::WsdlError::UnknownMessage(name.clone()))?;
        unify_message(message, graph)?;
    }
    operation.mark_document_encoded();
    debug!(operation = %operation.name, "converted to document style");
    Ok(())
}

/// Converts every RPC operation of `description`, returning how many there were.
pub fn unify(description: &mut ServiceDescription, graph: &mut TypeGraph) -> Result<usize, UnifyError> {
    let ServiceDescription {
        ports, messages, ..
    } = description;

    let mut converted = 0;
    for port in ports.iter_mut() {
        for operation in port.operations.iter_mut() {
            if operation.style() == OperationStyle::RpcEncoded {
                unify_operation(operation, messages, graph)?;
                converted += 1;
            }
        }
    }
    info!(operations = converted, "unified operation styles");
    Ok(converted)
}
