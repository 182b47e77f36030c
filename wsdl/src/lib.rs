//! WSDL 1.1 service descriptions: ports, operations and messages.

mod definition;
pub mod error;

pub use definition::{Message, Operation, OperationStyle, Part, Port, ServiceDescription};
pub use error::WsdlError;
pub use wsdlgen_xsd::WSDL_NAMESPACE;

pub const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP12_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";
pub const HTTP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/http/";
