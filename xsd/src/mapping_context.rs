use std::collections::{BTreeMap, HashSet};

use roxmltree::Node;
use tracing::{debug, warn};

use super::{
    builtins::Builtin,
    error::XsdError,
    graph::{ComplexType, SimpleType, TypeGraph, TypeNode},
    schema::SchemaDocument,
    values::required_attribute,
    xstypes::QName,
    BuiltinOverwriteAction, NormalizeOptions, RedefinitionPolicy,
};

/// Symbol spaces of top-level declarations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(super) enum DeclarationKind {
    Type,
    Element,
    Attribute,
    Group,
    AttributeGroup,
}

impl DeclarationKind {
    fn from_tag_name(name: &str) -> Option<Self> {
        Some(match name {
            ComplexType::TAG_NAME | SimpleType::TAG_NAME => Self::Type,
            "element" => Self::Element,
            "attribute" => Self::Attribute,
            "group" => Self::Group,
            "attributeGroup" => Self::AttributeGroup,
            _ => return None,
        })
    }
}

#[derive(Copy, Clone, Debug)]
pub(super) struct Declared<'a, 'input> {
    pub node: Node<'a, 'input>,
    pub schema: usize,
}

/// A reference to a top-level element or attribute, resolved once every declaration is mapped.
#[derive(Clone, Debug)]
pub(super) struct PendingRef {
    pub kind: DeclarationKind,
    pub target: QName,
    /// Complex type whose element or attribute list holds the placeholder
    pub owner: QName,
    pub index: usize,
}

#[derive(Default)]
struct Declarations<'a, 'input> {
    types: BTreeMap<QName, Declared<'a, 'input>>,
    elements: BTreeMap<QName, Declared<'a, 'input>>,
    attributes: BTreeMap<QName, Declared<'a, 'input>>,
    groups: BTreeMap<QName, Declared<'a, 'input>>,
    attribute_groups: BTreeMap<QName, Declared<'a, 'input>>,
    /// Type declarations replaced by a later one, oldest first
    replaced_types: BTreeMap<QName, Vec<Declared<'a, 'input>>>,
}

impl<'a, 'input> Declarations<'a, 'input> {
    fn table(&self, kind: DeclarationKind) -> &BTreeMap<QName, Declared<'a, 'input>> {
        match kind {
            DeclarationKind::Type => &self.types,
            DeclarationKind::Element => &self.elements,
            DeclarationKind::Attribute => &self.attributes,
            DeclarationKind::Group => &self.groups,
            DeclarationKind::AttributeGroup => &self.attribute_groups,
        }
    }

    fn table_mut(&mut self, kind: DeclarationKind) -> &mut BTreeMap<QName, Declared<'a, 'input>> {
        match kind {
            DeclarationKind::Type => &mut self.types,
            DeclarationKind::Element => &mut self.elements,
            DeclarationKind::Attribute => &mut self.attributes,
            DeclarationKind::Group => &mut self.groups,
            DeclarationKind::AttributeGroup => &mut self.attribute_groups,
        }
    }
}

/// State of one normalization run.
///
/// Declarations are first registered by name (so later documents can redefine earlier ones and
/// references may point forward), then the winning declaration of every name is mapped into the
/// type graph. References to top-level elements and attributes are recorded as [`PendingRef`]s
/// and resolved by [`Self::finish()`].
pub(super) struct MappingContext<'a, 'input> {
    schemas: Vec<SchemaDocument<'a, 'input>>,
    current: usize,
    declarations: Declarations<'a, 'input>,
    graph: TypeGraph,
    /// Type names that are declared or were given to promoted anonymous types
    taken: HashSet<QName>,
    pending: Vec<PendingRef>,
    expanding: HashSet<(DeclarationKind, QName)>,
}

impl<'a, 'input> MappingContext<'a, 'input> {
    pub fn new(
        schemas: Vec<SchemaDocument<'a, 'input>>,
        options: NormalizeOptions,
    ) -> Result<Self, XsdError> {
        let mut declarations = Declarations::default();

        for (index, schema) in schemas.iter().enumerate() {
            for node in schema.declarations() {
                let tag_name = node.tag_name().name();
                let Some(kind) = DeclarationKind::from_tag_name(tag_name) else {
                    match tag_name {
                        "import" | "include" => debug!(
                            namespace = node.attribute("namespace"),
                            schema_location = node.attribute("schemaLocation"),
                            "skipping <{tag_name}>, documents are supplied explicitly"
                        ),
                        _ => debug!("skipping top-level <{tag_name}>"),
                    }
                    continue;
                };

                let name = schema.qualify(required_attribute(node, "name")?);
                if kind == DeclarationKind::Type && Builtin::parse(&name).is_some() {
                    match options.builtin_overwrite {
                        BuiltinOverwriteAction::Deny => return Err(XsdError::BuiltinOverwrite(name)),
                        BuiltinOverwriteAction::Warn => {
                            warn!(%name, "ignoring redefinition of built-in type")
                        }
                        BuiltinOverwriteAction::Allow => {}
                    }
                    continue;
                }

                let declared = Declared {
                    node,
                    schema: index,
                };
                let table = declarations.table_mut(kind);
                if table.contains_key(&name) {
                    debug!(%name, ?kind, policy = ?options.redefinition, "redefinition");
                    if options.redefinition == RedefinitionPolicy::FirstWins {
                        continue;
                    }
                }
                if let Some(replaced) = table.insert(name.clone(), declared) {
                    if kind == DeclarationKind::Type {
                        declarations.replaced_types.entry(name).or_default().push(replaced);
                    }
                }
            }
        }

        let graph = TypeGraph::with_builtins();
        let taken = graph
            .types()
            .map(|(name, _)| name.clone())
            .chain(declarations.types.keys().cloned())
            .collect();

        Ok(Self {
            schemas,
            current: 0,
            declarations,
            graph,
            taken,
            pending: vec![],
            expanding: HashSet::new(),
        })
    }

    /// The schema the declaration being mapped belongs to.
    pub fn schema(&self) -> &SchemaDocument<'a, 'input> {
        &self.schemas[self.current]
    }

    /// Runs `f` with the schema at `index` as the current one.
    fn in_schema<T>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.current, index);
        let result = f(self);
        self.current = previous;
        result
    }

    /// Maps the winning declaration of every top-level type, element and attribute.
    pub fn map_declarations(&mut self) -> Result<(), XsdError> {
        let types: Vec<_> = self.declarations.types.clone().into_iter().collect();
        for (name, declared) in types {
            let node = self.in_schema(declared.schema, |context| {
                context.map_type_definition(&name, declared.node, true)
            })?;
            let mut replaced = self
                .declarations
                .replaced_types
                .get(&name)
                .cloned()
                .unwrap_or_default();
            let node = self.derive_from_replaced(&name, node, &mut replaced)?;
            self.graph.insert_type(name, node);
        }

        let elements: Vec<_> = self.declarations.elements.clone().into_iter().collect();
        for (name, declared) in elements {
            let element = self.in_schema(declared.schema, |context| {
                super::element_decl::map_top_level(context, &name, declared.node)
            })?;
            self.graph.insert_element(element);
        }

        let attributes: Vec<_> = self.declarations.attributes.clone().into_iter().collect();
        for (name, declared) in attributes {
            let attribute = self.in_schema(declared.schema, |context| {
                super::attribute_decl::map_top_level(context, &name, declared.node)
            })?;
            self.graph.insert_attribute(attribute);
        }

        Ok(())
    }

    fn map_type_definition(
        &mut self,
        name: &QName,
        node: Node,
        top_level: bool,
    ) -> Result<TypeNode, XsdError> {
        match node.tag_name().name() {
            ComplexType::TAG_NAME => Ok(TypeNode::Complex(ComplexType::map_from_xml(
                self, name, node, top_level,
            )?)),
            SimpleType::TAG_NAME => Ok(TypeNode::Simple(SimpleType::map_from_xml(
                self, name, node,
            )?)),
            other => Err(XsdError::UnexpectedElement {
                parent: node
                    .parent_element()
                    .map(|p| p.tag_name().name().to_string())
                    .unwrap_or_default(),
                element: other.into(),
            }),
        }
    }

    /// A redefinition derived from its own name (the `<redefine>` pattern) is derived from the
    /// declaration it replaced instead. That declaration is kept under a new name.
    fn derive_from_replaced(
        &mut self,
        name: &QName,
        mut node: TypeNode,
        replaced: &mut Vec<Declared<'a, 'input>>,
    ) -> Result<TypeNode, XsdError> {
        if node.derivation_base() != Some(name) {
            return Ok(node);
        }
        let Some(previous) = replaced.pop() else {
            return Ok(node);
        };
        let original = self.unused_type_name(name.sibling(format!("{}_original", name.local_name)));
        debug!(%name, %original, "redefinition derives from the replaced declaration");

        let previous_node = self.in_schema(previous.schema, |context| {
            context.map_type_definition(&original, previous.node, true)
        })?;
        let previous_node = self.derive_from_replaced(name, previous_node, replaced)?;
        self.graph.insert_type(original.clone(), previous_node);
        node.set_derivation_base(original);
        Ok(node)
    }

    /// `name`, or the first of `name_2`, `name_3`, ... that no type has; reserved on return.
    fn unused_type_name(&mut self, name: QName) -> QName {
        let mut candidate = name.clone();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = name.sibling(format!("{}_{suffix}", name.local_name));
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    /// Gives the anonymous type definition `node` a name derived from `hint` in the current
    /// namespace, maps it and adds it to the graph.
    pub fn promote(&mut self, hint: &str, node: Node) -> Result<QName, XsdError> {
        let name = self.unused_type_name(self.schema().qualify(hint));
        let type_ = self.map_type_definition(&name, node, false)?;
        self.graph.insert_type(name.clone(), type_);
        Ok(name)
    }

    /// Runs `f` on the declaration of the group (or attribute group) `name`, with the group's
    /// schema as the current one.
    pub fn expand_group<T>(
        &mut self,
        kind: DeclarationKind,
        name: &QName,
        referenced_by: &QName,
        f: impl FnOnce(&mut Self, Node<'a, 'input>) -> Result<T, XsdError>,
    ) -> Result<T, XsdError> {
        let declared = self
            .declarations
            .table(kind)
            .get(name)
            .copied()
            .ok_or_else(|| XsdError::UnresolvedGroup {
                name: name.clone(),
                referenced_by: referenced_by.clone(),
            })?;

        let key = (kind, name.clone());
        if !self.expanding.insert(key.clone()) {
            return Err(XsdError::GroupCycle(name.clone()));
        }
        let result = self.in_schema(declared.schema, |context| f(context, declared.node));
        self.expanding.remove(&key);
        result
    }

    pub fn defer(&mut self, pending: PendingRef) {
        self.pending.push(pending);
    }

    /// The closure pass: resolves element and attribute references, then checks that the graph
    /// is closed and free of derivation cycles.
    pub fn finish(mut self) -> Result<TypeGraph, XsdError> {
        for pending in std::mem::take(&mut self.pending) {
            let resolved = match pending.kind {
                DeclarationKind::Element => self
                    .graph
                    .element(&pending.target)
                    .map(|e| e.type_.clone())
                    .ok_or_else(|| XsdError::UnresolvedElement {
                        name: pending.target.clone(),
                        referenced_by: pending.owner.clone(),
                    })?,
                _ => self
                    .graph
                    .attribute(&pending.target)
                    .map(|a| a.type_.clone())
                    .ok_or_else(|| XsdError::UnresolvedAttribute {
                        name: pending.target.clone(),
                        referenced_by: pending.owner.clone(),
                    })?,
            };

            if let Some(TypeNode::Complex(owner)) = self.graph.type_mut(&pending.owner) {
                let slot = match pending.kind {
                    DeclarationKind::Element => owner.elements.get_mut(pending.index).map(|e| &mut e.type_),
                    _ => owner.attributes.get_mut(pending.index).map(|a| &mut a.type_),
                };
                if let Some(slot) = slot {
                    *slot = resolved;
                }
            }
        }

        self.graph.check_closure()?;
        self.graph.check_acyclic()?;
        self.graph.compute_base_kinds();
        Ok(self.graph)
    }
}
