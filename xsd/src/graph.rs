use std::collections::{btree_map::Entry, BTreeMap, BTreeSet, HashSet};
use std::ops::Deref;

use super::builtins::{Builtin, BuiltinKind};
use super::error::XsdError;
use super::xstypes::QName;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Occurrence {
    Required,
    Optional,
    Repeated,
}

impl Occurrence {
    /// Occurrence of a particle nested inside a group with occurrence `self`.
    pub fn nest(self, inner: Occurrence) -> Occurrence {
        use Occurrence::*;
        match (self, inner) {
            (Repeated, _) | (_, Repeated) => Repeated,
            (Optional, _) | (_, Optional) => Optional,
            (Required, Required) => Required,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementRef {
    pub name: QName,
    pub type_: QName,
    pub occurrence: Occurrence,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeRef {
    pub name: QName,
    pub type_: QName,
    pub required: bool,
}

/// A constraining facet, kept only as far as needed to classify a type's shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Facet {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimpleDerivation {
    Restriction(QName),
    List(QName),
    Union(Vec<QName>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleType {
    pub derivation: SimpleDerivation,
    /// Kind of the builtin this type is ultimately derived from; computed by the closure pass.
    pub base_kind: BuiltinKind,
    pub facets: Vec<Facet>,
}

impl SimpleType {
    pub fn enumeration(&self) -> impl Iterator<Item = &str> {
        self.facets
            .iter()
            .filter(|f| f.name == "enumeration")
            .map(|f| f.value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexType {
    pub base: Option<QName>,
    pub elements: Vec<ElementRef>,
    pub attributes: Vec<AttributeRef>,
    pub top_level: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeNode {
    Builtin(Builtin),
    Simple(SimpleType),
    Complex(ComplexType),
}

impl TypeNode {
    pub fn complex(&self) -> Option<&ComplexType> {
        match self {
            Self::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn simple(&self) -> Option<&SimpleType> {
        match self {
            Self::Simple(s) => Some(s),
            _ => None,
        }
    }

    pub fn builtin(&self) -> Option<Builtin> {
        match self {
            Self::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    /// The type this node is derived from by restriction or extension, if any.
    pub(crate) fn derivation_base(&self) -> Option<&QName> {
        match self {
            Self::Builtin(_) => None,
            Self::Simple(s) => match &s.derivation {
                SimpleDerivation::Restriction(base) => Some(base),
                SimpleDerivation::List(_) | SimpleDerivation::Union(_) => None,
            },
            Self::Complex(c) => c.base.as_ref(),
        }
    }

    pub(crate) fn set_derivation_base(&mut self, base: QName) {
        match self {
            Self::Builtin(_) => {}
            Self::Simple(s) => {
                if let SimpleDerivation::Restriction(current) = &mut s.derivation {
                    *current = base;
                }
            }
            Self::Complex(c) => c.base = Some(base),
        }
    }

    /// Every type this node is defined in terms of: its base, list item type or union members.
    fn derived_from(&self) -> Vec<&QName> {
        match self {
            Self::Simple(SimpleType {
                derivation: SimpleDerivation::List(item),
                ..
            }) => vec![item],
            Self::Simple(SimpleType {
                derivation: SimpleDerivation::Union(members),
                ..
            }) => members.iter().collect(),
            _ => self.derivation_base().into_iter().collect(),
        }
    }
}

/// Maps qualified names to type definitions, top-level elements and top-level attributes.
///
/// Built by the normalizer, appended to by the style unifier, then [frozen](Self::freeze).
#[derive(Clone, Debug, Default)]
pub struct TypeGraph {
    types: BTreeMap<QName, TypeNode>,
    elements: BTreeMap<QName, ElementRef>,
    attributes: BTreeMap<QName, AttributeRef>,
    synthesized: BTreeSet<QName>,
}

impl TypeGraph {
    /// An empty graph, apart from the built-in datatypes.
    pub fn with_builtins() -> Self {
        let mut graph = Self::default();
        for builtin in Builtin::ALL.iter().copied() {
            graph.types.insert(builtin.qname(), TypeNode::Builtin(builtin));
        }
        graph
    }

    pub fn get(&self, name: &QName) -> Option<&TypeNode> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.types.contains_key(name)
    }

    pub fn element(&self, name: &QName) -> Option<&ElementRef> {
        self.elements.get(name)
    }

    pub fn attribute(&self, name: &QName) -> Option<&AttributeRef> {
        self.attributes.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = (&QName, &TypeNode)> {
        self.types.iter()
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementRef> {
        self.elements.values()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeRef> {
        self.attributes.values()
    }

    /// Whether `name` was inserted by [`Self::insert_synthesized()`] rather than declared in a
    /// schema document.
    pub fn is_synthesized(&self, name: &QName) -> bool {
        self.synthesized.contains(name)
    }

    /// The builtin `name` resolves to, without following derivations.
    pub fn builtin(&self, name: &QName) -> Option<Builtin> {
        self.get(name).and_then(TypeNode::builtin)
    }

    /// Iterator over `name` and its derivation ancestors, closest first.
    pub fn ancestors<'a>(&'a self, name: &'a QName) -> Ancestors<'a> {
        Ancestors {
            graph: self,
            next: Some(name),
            seen: HashSet::new(),
        }
    }

    pub(crate) fn insert_type(&mut self, name: QName, node: TypeNode) -> Option<TypeNode> {
        self.types.insert(name, node)
    }

    pub(crate) fn insert_element(&mut self, element: ElementRef) {
        self.elements.insert(element.name.clone(), element);
    }

    pub(crate) fn insert_attribute(&mut self, attribute: AttributeRef) {
        self.attributes.insert(attribute.name.clone(), attribute);
    }

    pub(crate) fn type_mut(&mut self, name: &QName) -> Option<&mut TypeNode> {
        self.types.get_mut(name)
    }

    /// Inserts a generated complex type. The name must be new, and every reference of the type
    /// must already resolve, so the graph stays closed.
    pub fn insert_synthesized(&mut self, name: QName, type_: ComplexType) -> Result<(), XsdError> {
        let referenced = type_
            .base
            .iter()
            .chain(type_.elements.iter().map(|e| &e.type_))
            .chain(type_.attributes.iter().map(|a| &a.type_));
        for reference in referenced {
            if !self.contains(reference) {
                return Err(XsdError::UnresolvedType {
                    name: reference.clone(),
                    referenced_by: name,
                });
            }
        }
        match self.types.entry(name) {
            Entry::Occupied(entry) => Err(XsdError::DuplicateType(entry.key().clone())),
            Entry::Vacant(entry) => {
                self.synthesized.insert(entry.key().clone());
                entry.insert(TypeNode::Complex(type_));
                Ok(())
            }
        }
    }

    /// Verifies that every type referenced from within the graph is present.
    pub fn check_closure(&self) -> Result<(), XsdError> {
        let missing = |name: &QName, referenced_by: &QName| XsdError::UnresolvedType {
            name: name.clone(),
            referenced_by: referenced_by.clone(),
        };

        for (owner, node) in &self.types {
            let referenced: Vec<&QName> = match node {
                TypeNode::Builtin(_) => vec![],
                TypeNode::Simple(s) => match &s.derivation {
                    SimpleDerivation::Restriction(base) => vec![base],
                    SimpleDerivation::List(item) => vec![item],
                    SimpleDerivation::Union(members) => members.iter().collect(),
                },
                TypeNode::Complex(c) => c
                    .base
                    .iter()
                    .chain(c.elements.iter().map(|e| &e.type_))
                    .chain(c.attributes.iter().map(|a| &a.type_))
                    .collect(),
            };
            if let Some(name) = referenced.into_iter().find(|r| !self.contains(r)) {
                return Err(missing(name, owner));
            }
        }
        for element in self.elements.values() {
            if !self.contains(&element.type_) {
                return Err(missing(&element.type_, &element.name));
            }
        }
        for attribute in self.attributes.values() {
            if !self.contains(&attribute.type_) {
                return Err(missing(&attribute.type_, &attribute.name));
            }
        }
        Ok(())
    }

    /// Verifies that no type is derived from itself, through bases, list item types or union
    /// members.
    pub fn check_acyclic(&self) -> Result<(), XsdError> {
        enum Visit<'a> {
            Enter(&'a QName),
            Leave(&'a QName),
        }

        let mut finished = HashSet::<&QName>::new();
        for start in self.types.keys() {
            let mut path = HashSet::new();
            let mut stack = vec![Visit::Enter(start)];
            while let Some(visit) = stack.pop() {
                match visit {
                    Visit::Leave(name) => {
                        path.remove(name);
                        finished.insert(name);
                    }
                    Visit::Enter(name) => {
                        if finished.contains(name) {
                            continue;
                        }
                        if !path.insert(name) {
                            return Err(XsdError::DerivationCycle(name.clone()));
                        }
                        stack.push(Visit::Leave(name));
                        if let Some(node) = self.get(name) {
                            stack.extend(node.derived_from().into_iter().map(Visit::Enter));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Computes the builtin kind of every simple type. Requires an acyclic graph.
    pub(crate) fn compute_base_kinds(&mut self) {
        let kinds: Vec<(QName, BuiltinKind)> = self
            .types
            .iter()
            .filter_map(|(name, node)| {
                let simple = node.simple()?;
                let kind = match &simple.derivation {
                    SimpleDerivation::List(_) => BuiltinKind::List,
                    SimpleDerivation::Union(_) => BuiltinKind::Text,
                    SimpleDerivation::Restriction(_) => self.restriction_kind(name),
                };
                Some((name.clone(), kind))
            })
            .collect();
        for (name, kind) in kinds {
            if let Some(TypeNode::Simple(simple)) = self.types.get_mut(&name) {
                simple.base_kind = kind;
            }
        }
    }

    fn restriction_kind(&self, name: &QName) -> BuiltinKind {
        for ancestor in self.ancestors(name) {
            match self.get(ancestor) {
                Some(TypeNode::Builtin(b)) => return b.kind(),
                Some(TypeNode::Simple(s)) => match s.derivation {
                    SimpleDerivation::List(_) => return BuiltinKind::List,
                    SimpleDerivation::Union(_) => return BuiltinKind::Text,
                    SimpleDerivation::Restriction(_) => {}
                },
                _ => {}
            }
        }
        BuiltinKind::Text
    }

    pub fn freeze(self) -> FrozenTypeGraph {
        FrozenTypeGraph(self)
    }
}

/// Iterator over the derivation ancestors of a type, starting with the type itself. Stops at a
/// type without a base, at an unknown name, or when a name repeats.
pub struct Ancestors<'a> {
    graph: &'a TypeGraph,
    next: Option<&'a QName>,
    seen: HashSet<&'a QName>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a QName;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !self.seen.insert(current) {
            return None;
        }
        self.next = self
            .graph
            .get(current)
            .and_then(TypeNode::derivation_base);
        Some(current)
    }
}

/// A [`TypeGraph`] that can no longer be mutated; handed to code generation.
#[derive(Clone, Debug)]
pub struct FrozenTypeGraph(TypeGraph);

impl Deref for FrozenTypeGraph {
    type Target = TypeGraph;

    fn deref(&self) -> &TypeGraph {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::XS_STRING_NAME;

    fn name(local: &str) -> QName {
        QName::with_namespace("urn:test", local)
    }

    fn derived(base: Option<QName>) -> TypeNode {
        TypeNode::Complex(ComplexType {
            base,
            elements: vec![],
            attributes: vec![],
            top_level: true,
        })
    }

    #[test]
    fn rejects_derivation_cycles() {
        let mut graph = TypeGraph::with_builtins();
        graph.insert_type(name("A"), derived(Some(name("B"))));
        graph.insert_type(name("B"), derived(Some(name("C"))));
        graph.insert_type(name("C"), derived(Some(name("A"))));
        graph.check_closure().unwrap();
        assert!(matches!(
            graph.check_acyclic(),
            Err(XsdError::DerivationCycle(_))
        ));
    }

    #[test]
    fn rejects_lists_and_unions_of_themselves() {
        let simple = |derivation| {
            TypeNode::Simple(SimpleType {
                derivation,
                base_kind: BuiltinKind::Text,
                facets: vec![],
            })
        };
        let mut graph = TypeGraph::with_builtins();
        graph.insert_type(name("Codes"), simple(SimpleDerivation::List(name("Code"))));
        graph.insert_type(
            name("Code"),
            simple(SimpleDerivation::Union(vec![XS_STRING_NAME.clone(), name("Codes")])),
        );
        graph.check_closure().unwrap();
        assert!(matches!(
            graph.check_acyclic(),
            Err(XsdError::DerivationCycle(_))
        ));

        // a member shared by several paths is not a cycle
        graph.insert_type(name("Code"), simple(SimpleDerivation::Union(vec![name("Word"), name("Word")])));
        graph.insert_type(name("Word"), simple(SimpleDerivation::Restriction(XS_STRING_NAME.clone())));
        graph.check_acyclic().unwrap();
    }

    #[test]
    fn chains_terminate() {
        let mut graph = TypeGraph::with_builtins();
        graph.insert_type(name("A"), derived(Some(name("B"))));
        graph.insert_type(name("B"), derived(None));
        graph.check_acyclic().unwrap();
        let chain: Vec<_> = graph.ancestors(&name("A")).cloned().collect();
        assert_eq!(chain, vec![name("A"), name("B")]);
    }

    #[test]
    fn detects_gaps() {
        let mut graph = TypeGraph::with_builtins();
        graph.insert_type(name("A"), derived(Some(name("Missing"))));
        match graph.check_closure() {
            Err(XsdError::UnresolvedType {
                name: missing,
                referenced_by,
            }) => {
                assert_eq!(missing, name("Missing"));
                assert_eq!(referenced_by, name("A"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn synthesized_types_must_be_new_and_closed() {
        let mut graph = TypeGraph::with_builtins();
        let wrapper = ComplexType {
            base: None,
            elements: vec![ElementRef {
                name: name("value"),
                type_: XS_STRING_NAME.clone(),
                occurrence: Occurrence::Required,
            }],
            attributes: vec![],
            top_level: true,
        };
        graph
            .insert_synthesized(name("Wrapper"), wrapper.clone())
            .unwrap();
        assert!(graph.is_synthesized(&name("Wrapper")));
        assert!(matches!(
            graph.insert_synthesized(name("Wrapper"), wrapper),
            Err(XsdError::DuplicateType(_))
        ));

        let dangling = ComplexType {
            base: Some(name("Nope")),
            elements: vec![],
            attributes: vec![],
            top_level: true,
        };
        assert!(matches!(
            graph.insert_synthesized(name("Other"), dangling),
            Err(XsdError::UnresolvedType { .. })
        ));
        graph.check_closure().unwrap();
    }

    #[test]
    fn occurrence_nesting() {
        use Occurrence::*;
        assert_eq!(Required.nest(Required), Required);
        assert_eq!(Optional.nest(Required), Optional);
        assert_eq!(Required.nest(Repeated), Repeated);
        assert_eq!(Repeated.nest(Optional), Repeated);
    }
}
