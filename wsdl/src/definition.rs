use std::collections::BTreeMap;

use roxmltree::Node;
use tracing::debug;
use wsdlgen_xsd::QName;

use super::{error::WsdlError, HTTP_NAMESPACE, SOAP12_NAMESPACE, SOAP_NAMESPACE, WSDL_NAMESPACE};

/// Wire shape of an operation's request and response bodies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperationStyle {
    /// One accessor element per message part (`style="rpc"`)
    RpcEncoded,
    /// The body is a single element described by a schema type (`style="document"`)
    DocumentEncoded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub type_: Option<QName>,
    pub element: Option<QName>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub name: QName,
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: QName,
    pub output: QName,
    /// The SOAP action, verbatim
    pub action: String,
    style: OperationStyle,
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        input: QName,
        output: QName,
        action: impl Into<String>,
        style: OperationStyle,
    ) -> Self {
        Self {
            name: name.into(),
            documentation: None,
            input,
            output,
            action: action.into(),
            style,
        }
    }

    pub fn style(&self) -> OperationStyle {
        self.style
    }

    /// Records that the operation's messages now describe document-style bodies. There is no way
    /// back.
    pub fn mark_document_encoded(&mut self) {
        self.style = OperationStyle::DocumentEncoded;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub address: String,
    /// HTTP method used to reach `address`
    pub method: String,
    pub operations: Vec<Operation>,
}

/// A WSDL 1.1 document, reduced to what is needed to generate a client.
#[derive(Clone, Debug, Default)]
pub struct ServiceDescription {
    pub target_namespace: Option<String>,
    pub documentation: Option<String>,
    pub ports: Vec<Port>,
    pub messages: BTreeMap<QName, Message>,
}

impl ServiceDescription {
    pub const TAG_NAME: &'static str = "definitions";

    pub fn message(&self, name: &QName) -> Result<&Message, WsdlError> {
        self.messages
            .get(name)
            .ok_or_else(|| WsdlError::UnknownMessage(name.clone()))
    }

    pub fn message_mut(&mut self, name: &QName) -> Result<&mut Message, WsdlError> {
        self.messages
            .get_mut(name)
            .ok_or_else(|| WsdlError::UnknownMessage(name.clone()))
    }

    pub fn operations(&self) -> impl Iterator<Item = (&Port, &Operation)> {
        self.ports
            .iter()
            .flat_map(|port| port.operations.iter().map(move |op| (port, op)))
    }

    pub fn map_from_xml(definitions: Node) -> Result<Self, WsdlError> {
        if !is_wsdl(definitions, Self::TAG_NAME) {
            return Err(WsdlError::NotADefinition(
                definitions.tag_name().name().into(),
            ));
        }
        let target_namespace = definitions.attribute("targetNamespace");
        let qualify = |local: &str| QName::with_optional_namespace(target_namespace, local);

        let mut messages = BTreeMap::new();
        let mut port_types = BTreeMap::new();
        let mut bindings = BTreeMap::new();
        for child in definitions.children().filter(Node::is_element) {
            if child.tag_name().namespace() != Some(WSDL_NAMESPACE) {
                continue;
            }
            match child.tag_name().name() {
                "message" => {
                    let message = map_message(child, qualify(required(child, "message", "name")?))?;
                    messages.insert(message.name.clone(), message);
                }
                "portType" => {
                    port_types.insert(qualify(required(child, "portType", "name")?), child);
                }
                "binding" => {
                    bindings.insert(qualify(required(child, "binding", "name")?), child);
                }
                _ => {}
            }
        }

        let mut ports = vec![];
        for service in wsdl_children(definitions, "service") {
            for port in wsdl_children(service, "port") {
                let name = required(port, "port", "name")?;
                let binding_name = QName::parse(required(port, "port", "binding")?, port)?;
                let binding = *bindings
                    .get(&binding_name)
                    .ok_or_else(|| WsdlError::UnknownBinding {
                        port: name.into(),
                        binding: binding_name.clone(),
                    })?;
                let port_type_name = QName::parse(required(binding, "binding", "type")?, binding)?;
                let port_type = *port_types.get(&port_type_name).ok_or_else(|| {
                    WsdlError::UnknownPortType {
                        binding: binding_name.clone(),
                        port_type: port_type_name.clone(),
                    }
                })?;

                let (method, default_style) = binding_protocol(binding)?;
                let operations = wsdl_children(binding, "operation")
                    .map(|op| map_operation(&binding_name, op, port_type, default_style))
                    .collect::<Result<Vec<_>, _>>()?;
                debug!(
                    port = name,
                    binding = %binding_name,
                    operations = operations.len(),
                    "mapped port"
                );

                ports.push(Port {
                    name: name.into(),
                    address: address(port).unwrap_or_default().into(),
                    method,
                    operations,
                });
            }
        }

        Ok(Self {
            target_namespace: target_namespace.map(Into::into),
            documentation: documentation(definitions),
            ports,
            messages,
        })
    }
}

fn is_wsdl(node: Node, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(WSDL_NAMESPACE)
        && node.tag_name().name() == local_name
}

fn wsdl_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    local_name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |c| is_wsdl(*c, local_name))
}

/// Children in one of the binding extension namespaces.
fn extension<'a, 'input: 'a>(node: Node<'a, 'input>, local_name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| {
        c.is_element()
            && c.tag_name().name() == local_name
            && matches!(
                c.tag_name().namespace(),
                Some(SOAP_NAMESPACE | SOAP12_NAMESPACE | HTTP_NAMESPACE)
            )
    })
}

fn required<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, WsdlError> {
    node.attribute(attribute)
        .ok_or(WsdlError::MissingAttribute { element, attribute })
}

fn documentation(node: Node) -> Option<String> {
    let text: String = wsdl_children(node, "documentation")
        .flat_map(|d| d.descendants())
        .filter_map(|n| n.text().filter(|_| n.is_text()))
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn map_message(node: Node, name: QName) -> Result<Message, WsdlError> {
    let parts = wsdl_children(node, "part")
        .map(|part| -> Result<Part, WsdlError> {
            Ok(Part {
                name: required(part, "part", "name")?.into(),
                type_: part
                    .attribute("type")
                    .map(|t| QName::parse(t, part))
                    .transpose()?,
                element: part
                    .attribute("element")
                    .map(|e| QName::parse(e, part))
                    .transpose()?,
            })
        })
        .collect::<Result<_, _>>()?;
    Ok(Message { name, parts })
}

fn parse_style(style: &str) -> Result<OperationStyle, WsdlError> {
    match style {
        "rpc" => Ok(OperationStyle::RpcEncoded),
        "document" => Ok(OperationStyle::DocumentEncoded),
        other => Err(WsdlError::InvalidStyle(other.into())),
    }
}

/// Invocation method and default operation style of a binding.
fn binding_protocol(binding: Node) -> Result<(String, OperationStyle), WsdlError> {
    let Some(protocol) = extension(binding, "binding") else {
        return Ok(("POST".into(), OperationStyle::DocumentEncoded));
    };
    if protocol.tag_name().namespace() == Some(HTTP_NAMESPACE) {
        let verb = protocol.attribute("verb").unwrap_or("GET");
        return Ok((verb.into(), OperationStyle::DocumentEncoded));
    }
    let style = protocol.attribute("style").map(parse_style).transpose()?;
    Ok((
        "POST".into(),
        style.unwrap_or(OperationStyle::DocumentEncoded),
    ))
}

fn address<'a>(port: Node<'a, '_>) -> Option<&'a str> {
    extension(port, "address").and_then(|a| a.attribute("location"))
}

fn map_operation(
    binding_name: &QName,
    node: Node,
    port_type: Node,
    default_style: OperationStyle,
) -> Result<Operation, WsdlError> {
    let name = required(node, "operation", "name")?;
    let abstract_op = wsdl_children(port_type, "operation")
        .find(|op| op.attribute("name") == Some(name))
        .ok_or_else(|| WsdlError::UnknownOperation {
            binding: binding_name.clone(),
            operation: name.into(),
        })?;

    let message = |direction: &'static str| -> Result<QName, WsdlError> {
        let reference = wsdl_children(abstract_op, direction)
            .next()
            .and_then(|io| io.attribute("message").map(|m| (io, m)))
            .ok_or_else(|| WsdlError::MissingMessageReference {
                operation: name.into(),
                direction,
            })?;
        Ok(QName::parse(reference.1, reference.0)?)
    };

    let soap_operation = extension(node, "operation");
    let action = soap_operation
        .and_then(|op| op.attribute("soapAction").or_else(|| op.attribute("location")))
        .unwrap_or_default();
    let style = match soap_operation.and_then(|op| op.attribute("style")) {
        Some(style) => parse_style(style)?,
        None => default_style,
    };

    let mut operation = Operation::new(name, message("input")?, message("output")?, action, style);
    operation.documentation = documentation(abstract_op);
    Ok(operation)
}
