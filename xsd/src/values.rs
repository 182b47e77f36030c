use crate::{error::XsdError, xstypes::QName};
use roxmltree::Node;

/// Conversion of an attribute's normalized value to its ·actual value·.
pub trait ActualValue<'a>: Sized {
    fn convert(src: &'a str, parent: Node) -> Result<Self, String>;
}

impl<'a> ActualValue<'a> for &'a str {
    fn convert(src: &'a str, _parent: Node) -> Result<Self, String> {
        Ok(src)
    }
}

impl ActualValue<'_> for String {
    fn convert(src: &'_ str, _parent: Node) -> Result<Self, String> {
        Ok(src.to_string())
    }
}

impl ActualValue<'_> for QName {
    fn convert(src: &'_ str, parent: Node) -> Result<Self, String> {
        QName::parse(src, parent).map_err(|e| e.to_string())
    }
}

impl<'a, T: ActualValue<'a>> ActualValue<'a> for Vec<T> {
    fn convert(src: &'a str, parent: Node) -> Result<Self, String> {
        // NOTE: This assumes a list with whiteSpace="collapse"
        src.split_ascii_whitespace()
            .map(|a| ActualValue::convert(a, parent))
            .collect()
    }
}

impl ActualValue<'_> for bool {
    fn convert(src: &str, _parent: Node) -> Result<Self, String> {
        match src.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(format!("invalid value for boolean: {src}")),
        }
    }
}

impl ActualValue<'_> for u64 {
    fn convert(src: &str, _parent: Node) -> Result<Self, String> {
        src.trim().parse().map_err(|_| format!("not a count: {src}"))
    }
}

/// Reads and converts the attribute `name` of `node`, if present.
pub fn attribute<'a, T: ActualValue<'a>>(
    node: Node<'a, '_>,
    name: &'static str,
) -> Result<Option<T>, XsdError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(value) => T::convert(value, node).map(Some).map_err(|_| {
            // Prefix resolution failures are reported as such
            if let Some((prefix, _)) = value.split_once(':') {
                if node.lookup_namespace_uri(Some(prefix)).is_none() && prefix != "xml" {
                    return XsdError::NamePrefixNotResolved(prefix.into());
                }
            }
            XsdError::InvalidValue {
                element: node.tag_name().name().into(),
                attribute: name,
                value: value.into(),
            }
        }),
    }
}

/// Like [`attribute()`], but a missing attribute is an error.
pub fn required_attribute<'a, T: ActualValue<'a>>(
    node: Node<'a, '_>,
    name: &'static str,
) -> Result<T, XsdError> {
    attribute(node, name)?.ok_or_else(|| XsdError::MissingAttribute {
        element: node.tag_name().name().into(),
        attribute: name,
    })
}
