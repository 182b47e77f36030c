use thiserror::Error;

use super::xstypes::QName;

/// Errors raised while normalizing schema documents into a [`TypeGraph`](crate::TypeGraph).
///
/// The first group are input errors (the document itself is malformed), the second group are
/// resolution errors raised by the closure pass.
#[derive(Debug, Error)]
pub enum XsdError {
    #[error("failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),
    #[error("<{element}> is missing the required attribute {attribute:?}")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("invalid value {value:?} for attribute {attribute:?} of <{element}>")]
    InvalidValue {
        element: String,
        attribute: &'static str,
        value: String,
    },
    #[error("document root <{0}> is neither a schema nor a WSDL definitions element")]
    NotASchema(String),
    #[error("<{parent}> is missing a <{expected}> child")]
    MissingChild {
        parent: String,
        expected: &'static str,
    },
    #[error("unexpected <{element}> in <{parent}>")]
    UnexpectedElement { parent: String, element: String },
    #[error("standard schema for {namespace} failed to parse")]
    StandardSchema {
        namespace: &'static str,
        #[source]
        source: roxmltree::Error,
    },
    #[error("tried to overwrite built-in type {0}")]
    BuiltinOverwrite(QName),

    #[error("type {name} referenced by {referenced_by} is not declared")]
    UnresolvedType { name: QName, referenced_by: QName },
    #[error("element {name} referenced by {referenced_by} is not declared")]
    UnresolvedElement { name: QName, referenced_by: QName },
    #[error("attribute {name} referenced by {referenced_by} is not declared")]
    UnresolvedAttribute { name: QName, referenced_by: QName },
    #[error("group {name} referenced by {referenced_by} is not declared")]
    UnresolvedGroup { name: QName, referenced_by: QName },
    #[error("type {0} derives from itself")]
    DerivationCycle(QName),
    #[error("group {0} contains a reference to itself")]
    GroupCycle(QName),
    #[error("type {0} is already present in the type graph")]
    DuplicateType(QName),
}
