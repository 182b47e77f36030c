use tracing::{debug, info};

use super::{
    error::XsdError,
    graph::TypeGraph,
    mapping_context::MappingContext,
    schema::SchemaDocument,
    standard::{is_standard, is_visible, parse_standard_schemas},
    NormalizeOptions,
};

/// A target namespace seen during normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub name: Option<String>,
    /// Part of the standard-schema catalog (or the XSD namespace itself)
    pub standard: bool,
    /// Number of schema documents that contributed to the namespace
    pub documents: usize,
}

#[derive(Clone, Debug)]
pub struct Normalized {
    pub graph: TypeGraph,
    /// In order of first appearance; the standard catalog comes first.
    pub namespaces: Vec<Namespace>,
}

impl Normalized {
    /// The namespaces whose types belong in the output.
    pub fn visible_namespaces<'s>(
        &'s self,
        requested: Option<&'s str>,
    ) -> impl Iterator<Item = &'s Namespace> + 's {
        self.namespaces
            .iter()
            .filter(move |ns| is_visible(ns.name.as_deref(), requested))
    }
}

/// Merges the schemas of `documents` (and the standard catalog) into one closed type graph.
///
/// Documents may be schemas or WSDL definitions with embedded schemas. Declarations may refer to
/// names declared later or in other documents; all references are checked once every document
/// has been mapped.
pub fn normalize(
    documents: &[roxmltree::Document],
    options: NormalizeOptions,
) -> Result<Normalized, XsdError> {
    let standard = parse_standard_schemas()?;

    let mut schemas = vec![];
    for document in standard.iter() {
        schemas.extend(SchemaDocument::find_all(document.root_element())?);
    }
    for document in documents {
        let found = SchemaDocument::find_all(document.root_element())?;
        debug!(
            root = document.root_element().tag_name().name(),
            schemas = found.len(),
            "read document"
        );
        schemas.extend(found);
    }

    let mut namespaces: Vec<Namespace> = vec![];
    for schema in &schemas {
        let name = schema.target_namespace;
        match namespaces.iter_mut().find(|ns| ns.name.as_deref() == name) {
            Some(namespace) => namespace.documents += 1,
            None => {
                debug!(namespace = name, "registered namespace");
                namespaces.push(Namespace {
                    name: name.map(Into::into),
                    standard: is_standard(name),
                    documents: 1,
                });
            }
        }
    }

    let mut context = MappingContext::new(schemas, options)?;
    context.map_declarations()?;
    let graph = context.finish()?;
    info!(
        namespaces = namespaces.len(),
        types = graph.types().count(),
        "normalized schemas"
    );

    Ok(Normalized { graph, namespaces })
}
