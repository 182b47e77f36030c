//! Generates Rust client bindings from WSDL 1.1 service descriptions and XML Schema documents.
//!
//! A run goes through three stages:
//!
//! 1. the schemas embedded in or given next to the service description are normalized into one
//!    closed type graph ([`wsdlgen_xsd::normalize`]),
//! 2. RPC-style operations are rewritten into document style ([`unify`]),
//! 3. every operation gets a [`BindingPlan`], from which the client module is emitted.

mod binding;
pub mod config;
pub mod error;
mod generators;
mod naming;
pub mod unify;

use tracing::{debug, info};
use wsdlgen_wsdl::{ServiceDescription, WSDL_NAMESPACE};
use wsdlgen_xsd::{normalize, Normalized};

pub use binding::{BindingField, BindingPlan};
pub use config::Config;
pub use error::{Error, GenerationError, UnifyError};
pub use generators::{common::RustType, Generated};

/// Generates the client of the service described by the first of `documents`. The others
/// contribute schemas only. Without WSDL definitions first, only the schema types are emitted.
pub fn compile(config: &Config, documents: &[roxmltree::Document]) -> Result<Generated, Error> {
    let first = documents.first().ok_or(Error::NoDocuments)?.root_element();
    let Normalized { mut graph, namespaces } = normalize(documents, config.normalize_options())?;
    for namespace in &namespaces {
        debug!(
            namespace = namespace.name.as_deref(),
            standard = namespace.standard,
            documents = namespace.documents,
            "namespace"
        );
    }

    let mut description = if first.tag_name().namespace() == Some(WSDL_NAMESPACE) {
        ServiceDescription::map_from_xml(first)?
    } else {
        info!("no service description given, emitting types only");
        ServiceDescription::default()
    };
    info!(
        ports = description.ports.len(),
        messages = description.messages.len(),
        "read service description"
    );
    unify::unify(&mut description, &mut graph)?;

    let graph = graph.freeze();
    Ok(generators::generate(config, &description, &graph))
}
