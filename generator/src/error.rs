use thiserror::Error;
use wsdlgen_wsdl::WsdlError;
use wsdlgen_xsd::{QName, XsdError};

/// Failure to rewrite an RPC operation into document style.
#[derive(Debug, Error)]
pub enum UnifyError {
    #[error("part {part:?} of message {message} names no known type or element")]
    UnresolvedPart { message: QName, part: String },
    #[error("cannot add the type synthesized for message {message}")]
    Synthesis {
        message: QName,
        #[source]
        source: XsdError,
    },
    #[error(transparent)]
    Wsdl(#[from] WsdlError),
}

/// Failure to produce the binding of one operation. The other operations are still generated.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("operation {operation:?}: {name:?} does not yield a valid identifier")]
    InvalidIdentifier { operation: String, name: String },
    #[error("operation {operation:?}: part {part:?} of message {message} names no known type or element")]
    UnresolvedPart {
        operation: String,
        message: QName,
        part: String,
    },
    #[error("operation {operation:?}")]
    Wsdl {
        operation: String,
        #[source]
        source: WsdlError,
    },
    /// A reference the normalizer should have rejected
    #[error("internal error in operation {operation:?}: {message}")]
    Internal { operation: String, message: String },
}

impl GenerationError {
    pub fn operation(&self) -> &str {
        match self {
            Self::InvalidIdentifier { operation, .. }
            | Self::UnresolvedPart { operation, .. }
            | Self::Wsdl { operation, .. }
            | Self::Internal { operation, .. } => operation,
        }
    }
}

/// Failure of a whole generator run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no input documents")]
    NoDocuments,
    #[error(transparent)]
    Xsd(#[from] XsdError),
    #[error(transparent)]
    Wsdl(#[from] WsdlError),
    #[error(transparent)]
    Unify(#[from] UnifyError),
}
