//! The contract between generated client stubs and the transport that carries their calls.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

/// Cancellation and deadline of a call. Clones share the cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    /// A context sharing the cancellation of `self` that also expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(match self.deadline {
                Some(current) => current.min(deadline),
                None => deadline,
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Qualified name of an XML element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name {
    pub namespace: Option<&'static str>,
    pub local: &'static str,
}

impl Name {
    pub const fn new(namespace: Option<&'static str>, local: &'static str) -> Self {
        Self { namespace, local }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Some(namespace) => write!(f, "{{{namespace}}}:{}", self.local),
            None => f.write_str(self.local),
        }
    }
}

/// An element child of [`Content`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub namespace: Option<String>,
    pub local: String,
    pub content: Content,
}

/// What an element holds, whichever XML library the invoker uses: attributes by local name,
/// character data, and child elements in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Content {
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Content {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == local)
            .map(|(_, value)| value.as_str())
    }

    /// Children named `local`, in any namespace.
    pub fn children<'c>(&'c self, local: &'c str) -> impl Iterator<Item = &'c Content> + 'c {
        self.children
            .iter()
            .filter(move |child| child.local == local)
            .map(|child| &child.content)
    }

    pub fn push<T: XmlType + ?Sized>(&mut self, name: Name, value: &T) {
        self.children.push(Element {
            namespace: name.namespace.map(Into::into),
            local: name.local.into(),
            content: value.to_content(),
        });
    }

    pub fn set_attribute<T: XmlType + ?Sized>(&mut self, local: &str, value: &T) {
        self.attributes
            .push((local.into(), value.to_content().text));
    }

    pub fn required<T: XmlType>(&self, local: &str) -> Result<T, Error> {
        match self.children(local).next() {
            Some(child) => T::from_content(child),
            None => Err(Error::MissingField(local.into())),
        }
    }

    pub fn optional<T: XmlType>(&self, local: &str) -> Result<Option<T>, Error> {
        self.children(local).next().map(T::from_content).transpose()
    }

    pub fn repeated<T: XmlType>(&self, local: &str) -> Result<Vec<T>, Error> {
        self.children(local).map(T::from_content).collect()
    }

    pub fn required_attribute<T: XmlType>(&self, local: &str) -> Result<T, Error> {
        self.optional_attribute(local)?
            .ok_or_else(|| Error::MissingField(format!("@{local}")))
    }

    pub fn optional_attribute<T: XmlType>(&self, local: &str) -> Result<Option<T>, Error> {
        self.attribute(local)
            .map(|value| T::from_content(&Content::from_text(value)))
            .transpose()
    }
}

/// A value written as, and read back from, the content of one element.
///
/// Every generated type implements it, as do the primitives and the types of this crate.
pub trait XmlType {
    fn to_content(&self) -> Content;

    fn from_content(content: &Content) -> Result<Self, Error>
    where
        Self: Sized;
}

/// Content of a whitespace separated list.
pub fn list_to_content<T: XmlType>(items: &[T]) -> Content {
    let literals: Vec<String> = items.iter().map(|item| item.to_content().text).collect();
    Content::from_text(literals.join(" "))
}

pub fn list_from_content<T: XmlType>(content: &Content) -> Result<Vec<T>, Error> {
    content
        .text
        .split_whitespace()
        .map(|literal| T::from_content(&Content::from_text(literal)))
        .collect()
}

macro_rules! parsed_literals {
    ($($ty:ty),*) => {
        $(
            impl XmlType for $ty {
                fn to_content(&self) -> Content {
                    Content::from_text(self.to_string())
                }

                fn from_content(content: &Content) -> Result<Self, Error> {
                    content.text.trim().parse().map_err(|_| Error::InvalidLiteral {
                        type_name: stringify!($ty),
                        literal: content.text.clone(),
                    })
                }
            }
        )*
    };
}

parsed_literals!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl XmlType for bool {
    fn to_content(&self) -> Content {
        Content::from_text(self.to_string())
    }

    fn from_content(content: &Content) -> Result<Self, Error> {
        match content.text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(Error::InvalidLiteral {
                type_name: "bool",
                literal: content.text.clone(),
            }),
        }
    }
}

impl XmlType for String {
    fn to_content(&self) -> Content {
        Content::from_text(self.as_str())
    }

    fn from_content(content: &Content) -> Result<Self, Error> {
        Ok(content.text.clone())
    }
}

impl<T: XmlType> XmlType for Box<T> {
    fn to_content(&self) -> Content {
        (**self).to_content()
    }

    fn from_content(content: &Content) -> Result<Self, Error> {
        T::from_content(content).map(Box::new)
    }
}

/// A response slot the invoker fills once per matching element.
pub trait Slot {
    fn fill(&mut self, content: &Content) -> Result<(), Error>;
}

impl<T: XmlType> Slot for Option<T> {
    fn fill(&mut self, content: &Content) -> Result<(), Error> {
        *self = Some(T::from_content(content)?);
        Ok(())
    }
}

impl<T: XmlType> Slot for Vec<T> {
    fn fill(&mut self, content: &Content) -> Result<(), Error> {
        self.push(T::from_content(content)?);
        Ok(())
    }
}

/// A request value written as one element `name` per entry of `values`.
pub struct Field<'a> {
    pub name: Name,
    pub values: Vec<&'a dyn XmlType>,
}

impl<'a> Field<'a> {
    pub fn one(name: Name, value: &'a dyn XmlType) -> Self {
        Self {
            name,
            values: vec![value],
        }
    }

    pub fn optional<T: XmlType>(name: Name, value: &'a Option<T>) -> Self {
        Self {
            name,
            values: value.iter().map(|value| value as &dyn XmlType).collect(),
        }
    }

    pub fn repeated<T: XmlType>(name: Name, values: &'a [T]) -> Self {
        Self {
            name,
            values: values.iter().map(|value| value as &dyn XmlType).collect(),
        }
    }

    pub fn contents(&self) -> impl Iterator<Item = Content> + '_ {
        self.values.iter().map(|value| value.to_content())
    }
}

/// A response slot read from the elements named `name`: an `Option<T>` for single elements,
/// a `Vec<T>` for repeated ones.
pub struct FieldMut<'a> {
    pub name: Name,
    slot: &'a mut dyn Slot,
}

impl<'a> FieldMut<'a> {
    pub fn new(name: Name, slot: &'a mut dyn Slot) -> Self {
        Self { name, slot }
    }

    pub fn fill(&mut self, content: &Content) -> Result<(), Error> {
        self.slot.fill(content).map_err(|source| Error::Unmarshal {
            field: self.name.to_string(),
            message: source.to_string(),
        })
    }
}

/// Body content of a request. With an `element`, the fields are the children of that element
/// (document style); without one, each field is a body element of its own.
pub struct Request<'a> {
    pub element: Option<Name>,
    pub fields: &'a [Field<'a>],
}

pub struct Response<'a, 'f> {
    pub element: Option<Name>,
    pub fields: &'f mut [FieldMut<'a>],
}

/// Carries calls to a service endpoint.
///
/// Implementations own their concurrency discipline; generated clients call `invoke` once per
/// operation call, without retries, and honour no ordering between calls.
pub trait Invoker {
    fn invoke(
        &self,
        ctx: &Context,
        action: &str,
        request: Request<'_>,
        response: Response<'_, '_>,
    ) -> Result<(), Error>;
}

impl<I: Invoker + ?Sized> Invoker for &I {
    fn invoke(
        &self,
        ctx: &Context,
        action: &str,
        request: Request<'_>,
        response: Response<'_, '_>,
    ) -> Result<(), Error> {
        (**self).invoke(ctx, action, request, response)
    }
}

impl<I: Invoker + ?Sized> Invoker for Arc<I> {
    fn invoke(
        &self,
        ctx: &Context,
        action: &str,
        request: Request<'_>,
        response: Response<'_, '_>,
    ) -> Result<(), Error> {
        (**self).invoke(ctx, action, request, response)
    }
}

/// Outcome of a failed call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("call to {action:?} failed")]
    Invoke {
        action: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("response is missing the required element {0}")]
    MissingField(String),
    #[error("{literal:?} is not a valid {type_name}")]
    InvalidLiteral {
        type_name: &'static str,
        literal: String,
    },
    #[error("failed to read {field}: {message}")]
    Unmarshal { field: String, message: String },
    #[error("call cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancellation_is_shared() {
        let ctx = Context::background();
        let child = ctx.with_deadline(Instant::now() + Duration::from_secs(3600));
        assert!(!child.is_cancelled());
        ctx.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn expired_deadline_cancels() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert!(ctx.is_cancelled());
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Node {
        label: String,
        weight: Option<f64>,
        tags: Vec<String>,
        next: Option<Box<Node>>,
        id: u32,
    }

    impl XmlType for Node {
        fn to_content(&self) -> Content {
            let mut content = Content::default();
            content.push(Name::new(Some("urn:graph"), "label"), &self.label);
            if let Some(value) = &self.weight {
                content.push(Name::new(Some("urn:graph"), "weight"), value);
            }
            for value in &self.tags {
                content.push(Name::new(Some("urn:graph"), "tag"), value);
            }
            if let Some(value) = &self.next {
                content.push(Name::new(Some("urn:graph"), "next"), value);
            }
            content.set_attribute("id", &self.id);
            content
        }

        fn from_content(content: &Content) -> Result<Self, Error> {
            Ok(Self {
                label: content.required("label")?,
                weight: content.optional("weight")?,
                tags: content.repeated("tag")?,
                next: content.optional("next")?,
                id: content.required_attribute("id")?,
            })
        }
    }

    /// Answers every call with the request fields, slot by slot.
    struct Echo;

    impl Invoker for Echo {
        fn invoke(
            &self,
            ctx: &Context,
            _action: &str,
            request: Request<'_>,
            response: Response<'_, '_>,
        ) -> Result<(), Error> {
            if ctx.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for (field, slot) in request.fields.iter().zip(response.fields.iter_mut()) {
                for content in field.contents() {
                    slot.fill(&content)?;
                }
            }
            Ok(())
        }
    }

    fn node() -> Node {
        Node {
            label: "root".into(),
            weight: Some(0.5),
            tags: vec!["a".into(), "b".into()],
            next: Some(Box::new(Node {
                label: "leaf".into(),
                weight: None,
                tags: vec![],
                next: None,
                id: 2,
            })),
            id: 1,
        }
    }

    #[test]
    fn values_round_trip_through_an_invoker() {
        let node = node();
        let counts = vec![3u8, 5];
        let fields = [
            Field::one(Name::new(None, "node"), &node),
            Field::repeated(Name::new(None, "count"), &counts),
        ];
        let mut node_slot: Option<Node> = None;
        let mut count_slot: Vec<u8> = Vec::new();
        let mut slots = [
            FieldMut::new(Name::new(None, "node"), &mut node_slot),
            FieldMut::new(Name::new(None, "count"), &mut count_slot),
        ];
        Echo.invoke(
            &Context::background(),
            "urn:graph#Copy",
            Request {
                element: None,
                fields: &fields,
            },
            Response {
                element: None,
                fields: &mut slots,
            },
        )
        .unwrap();
        assert_eq!(node_slot, Some(node));
        assert_eq!(count_slot, counts);
    }

    #[test]
    fn content_keeps_names_and_order() {
        let content = node().to_content();
        let locals: Vec<_> = content.children.iter().map(|c| c.local.as_str()).collect();
        assert_eq!(locals, ["label", "weight", "tag", "tag", "next"]);
        assert_eq!(content.children[0].namespace.as_deref(), Some("urn:graph"));
        assert_eq!(content.attribute("id"), Some("1"));
        assert_eq!(content.children[1].content.text, "0.5");
    }

    #[test]
    fn missing_required_content_is_reported() {
        let mut content = node().to_content();
        content.children.retain(|child| child.local != "label");
        assert!(matches!(
            Node::from_content(&content),
            Err(Error::MissingField(field)) if field == "label"
        ));
        content.attributes.clear();
        content.children.insert(
            0,
            Element {
                namespace: None,
                local: "label".into(),
                content: Content::from_text("x"),
            },
        );
        assert!(matches!(
            Node::from_content(&content),
            Err(Error::MissingField(field)) if field == "@id"
        ));
    }

    #[test]
    fn literals_follow_the_lexical_space() {
        assert_eq!(bool::from_content(&Content::from_text(" 1 ")).unwrap(), true);
        assert_eq!(bool::from_content(&Content::from_text("false")).unwrap(), false);
        assert!(bool::from_content(&Content::from_text("yes")).is_err());
        assert_eq!(i32::from_content(&Content::from_text(" -12\n")).unwrap(), -12);
        assert!(matches!(
            u8::from_content(&Content::from_text("300")),
            Err(Error::InvalidLiteral { type_name: "u8", .. })
        ));
        let sizes: Vec<u16> = list_from_content(&Content::from_text(" 1  2\t3 ")).unwrap();
        assert_eq!(sizes, [1, 2, 3]);
        assert_eq!(list_to_content(&sizes).text, "1 2 3");
    }

    #[test]
    fn slots_report_the_field_that_failed() {
        let mut slot: Option<i32> = None;
        let mut field = FieldMut::new(Name::new(None, "count"), &mut slot);
        field.fill(&Content::from_text("7")).unwrap();
        let error = field.fill(&Content::from_text("seven")).unwrap_err();
        assert!(matches!(&error, Error::Unmarshal { field, .. } if field == "count"));
        assert_eq!(slot, Some(7));
    }
}
