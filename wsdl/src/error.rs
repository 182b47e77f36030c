use thiserror::Error;
use wsdlgen_xsd::{QName, XsdError};

/// Input errors in a service description.
#[derive(Debug, Error)]
pub enum WsdlError {
    #[error("document root <{0}> is not a WSDL definitions element")]
    NotADefinition(String),
    #[error("<{element}> is missing the required attribute {attribute:?}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("invalid binding style {0:?}")]
    InvalidStyle(String),
    #[error("port {port:?} refers to the unknown binding {binding}")]
    UnknownBinding { port: String, binding: QName },
    #[error("binding {binding} refers to the unknown port type {port_type}")]
    UnknownPortType { binding: QName, port_type: QName },
    #[error("binding {binding} implements operation {operation:?}, which its port type lacks")]
    UnknownOperation { binding: QName, operation: String },
    #[error("operation {operation:?} has no {direction} message")]
    MissingMessageReference {
        operation: String,
        direction: &'static str,
    },
    #[error("message {0} is not declared")]
    UnknownMessage(QName),
    #[error(transparent)]
    Xsd(#[from] XsdError),
}
