use super::error::XsdError;
use std::fmt;

pub type NCName = String;
pub type AnyURI = String;

/// The namespace the prefix `xml` is bound to by definition.
/// (Namespaces in XML 1.0, §3, Reserved Prefixes and Namespace Names)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name. Two names are equal iff both the namespace and the local name match exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace_name: Option<AnyURI>,
    pub local_name: NCName,
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace_name) = self.namespace_name.as_ref() {
            write!(f, "{{{}}}:{}", namespace_name, self.local_name)
        } else {
            write!(f, "{}", self.local_name)
        }
    }
}

impl QName {
    pub fn with_namespace(
        namespace_name: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self::with_optional_namespace(Some(namespace_name), local_name)
    }

    pub fn with_optional_namespace(
        namespace_name: Option<impl Into<String>>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace_name: namespace_name.map(Into::into),
            local_name: local_name.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace_name.as_deref()
    }

    /// Returns a name with the same namespace and a different local name.
    pub fn sibling(&self, local_name: impl Into<String>) -> Self {
        Self {
            namespace_name: self.namespace_name.clone(),
            local_name: local_name.into(),
        }
    }

    pub fn qualified(
        prefix: impl AsRef<str>,
        local_name: impl Into<String>,
        context: roxmltree::Node,
    ) -> Result<Self, XsdError> {
        let prefix = prefix.as_ref();
        let resolved_prefix = if prefix == "xml" {
            XML_NAMESPACE
        } else {
            context
                .lookup_namespace_uri(Some(prefix))
                .ok_or_else(|| XsdError::NamePrefixNotResolved(prefix.into()))?
        };
        Ok(Self::with_namespace(resolved_prefix, local_name))
    }

    pub fn unqualified(local_name: impl Into<String>, context: roxmltree::Node) -> Self {
        // If there is a default namespace declaration in scope, the expanded name corresponding to
        // an unprefixed element name has the URI of the default namespace as its namespace name.
        // If there is no default namespace declaration in scope, the namespace name has no value.
        // (Namespaces in XML 1.0, §6.2)
        let namespace_name = context.lookup_namespace_uri(None);
        QName::with_optional_namespace(namespace_name, local_name)
    }

    /// Resolves a lexical `prefix:local` (or bare `local`) name against the namespace bindings in
    /// scope at `context`.
    pub fn parse(source: &str, context: roxmltree::Node) -> Result<Self, XsdError> {
        let source = source.trim();
        if let Some((prefix, local)) = source.split_once(':') {
            Self::qualified(prefix, local, context)
        } else {
            Ok(Self::unqualified(source, context))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_prefixes_in_scope() {
        let doc = roxmltree::Document::parse(
            r#"<root xmlns="urn:default" xmlns:a="urn:a"><child xmlns:b="urn:b"/></root>"#,
        )
        .unwrap();
        let child = doc.root_element().first_element_child().unwrap();

        assert_eq!(
            QName::parse("a:Foo", child).unwrap(),
            QName::with_namespace("urn:a", "Foo")
        );
        assert_eq!(
            QName::parse("b:Bar", child).unwrap(),
            QName::with_namespace("urn:b", "Bar")
        );
        assert_eq!(
            QName::parse("Baz", child).unwrap(),
            QName::with_namespace("urn:default", "Baz")
        );
        assert_eq!(
            QName::parse("xml:lang", child).unwrap(),
            QName::with_namespace(XML_NAMESPACE, "lang")
        );
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let doc = roxmltree::Document::parse("<root/>").unwrap();
        let err = QName::parse("nope:Foo", doc.root_element()).unwrap_err();
        assert!(matches!(err, XsdError::NamePrefixNotResolved(p) if p == "nope"));
    }

    #[test]
    fn equality_is_exact() {
        let a = QName::with_namespace("urn:a", "Foo");
        assert_ne!(a, QName::with_namespace("urn:a", "foo"));
        assert_ne!(a, QName::with_namespace("urn:A", "Foo"));
        assert_ne!(a, QName::with_optional_namespace(None::<String>, "Foo"));
    }
}
