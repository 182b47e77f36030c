//! Normalization of XML Schema documents into a closed [`TypeGraph`].

pub mod builtins;
pub mod error;
pub mod graph;
pub mod standard;
pub mod xstypes;

mod attribute_decl;
mod complex_type_def;
mod element_decl;
mod mapping_context;
mod normalize;
mod schema;
mod simple_type_def;
mod values;

pub use builtins::{Builtin, BuiltinKind};
pub use error::XsdError;
pub use graph::{
    AttributeRef, ComplexType, ElementRef, Facet, FrozenTypeGraph, Occurrence, SimpleDerivation,
    SimpleType, TypeGraph, TypeNode,
};
pub use normalize::{normalize, Namespace, Normalized};
pub use schema::SchemaDocument;
pub use standard::WSDL_NAMESPACE;
pub use xstypes::QName;

/// What to do when a document declares a type that is already a built-in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BuiltinOverwriteAction {
    #[default]
    Deny,
    Warn,
    Allow,
}

/// Which declaration is kept when several documents declare the same name.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RedefinitionPolicy {
    /// The declaration of the last document in input order
    #[default]
    LastWins,
    FirstWins,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NormalizeOptions {
    pub redefinition: RedefinitionPolicy,
    pub builtin_overwrite: BuiltinOverwriteAction,
}
