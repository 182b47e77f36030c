//! Types shared by generated clients.
//!
//! Builtin XML Schema types whose internal representation differs from what a caller wants to
//! handle are wrapped here; generated code converts between the wrapper (sent to and received
//! from the [`Invoker`]) and the exposed type through [`Representation`].

pub mod meta;
mod temporal;

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub use meta::{
    Content, Context, Error, Field, FieldMut, Invoker, Name, Request, Response, XmlType,
};

use temporal::Temporal;

/// Exposed type of the date and time family.
pub type Timestamp = std::time::SystemTime;

/// Conversion between an internal representation and the type exposed in client signatures.
pub trait Representation<Exposed>: Sized {
    fn from_exposed(value: Exposed) -> Self;
    fn into_exposed(self) -> Exposed;
}

impl<T: Representation<E>, E> Representation<Option<E>> for Option<T> {
    fn from_exposed(value: Option<E>) -> Self {
        value.map(T::from_exposed)
    }

    fn into_exposed(self) -> Option<E> {
        self.map(T::into_exposed)
    }
}

impl<T: Representation<E>, E> Representation<Vec<E>> for Vec<T> {
    fn from_exposed(value: Vec<E>) -> Self {
        value.into_iter().map(T::from_exposed).collect()
    }

    fn into_exposed(self) -> Vec<E> {
        self.into_iter().map(T::into_exposed).collect()
    }
}

macro_rules! representations {
    ($($(#[$meta:meta])* $name:ident($exposed:ty);)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq)]
            pub struct $name(pub $exposed);

            impl Representation<$exposed> for $name {
                fn from_exposed(value: $exposed) -> Self {
                    Self(value)
                }

                fn into_exposed(self) -> $exposed {
                    self.0
                }
            }
        )*
    };
}

representations! {
    DateTime(Timestamp);
    DateTimeStamp(Timestamp);
    Date(Timestamp);
    Time(Timestamp);
    GDay(Timestamp);
    GMonth(Timestamp);
    GMonthDay(Timestamp);
    GYear(Timestamp);
    GYearMonth(Timestamp);

    /// `xs:hexBinary` octets
    HexBinary(Vec<u8>);
    /// `xs:base64Binary` octets
    Base64Binary(Vec<u8>);

    IdRefs(Vec<String>);
    NmTokens(Vec<String>);
    Entities(Vec<String>);
}

macro_rules! temporal_literals {
    ($($name:ident => $temporal:ident;)*) => {
        $(
            impl XmlType for $name {
                fn to_content(&self) -> Content {
                    Content::from_text(Temporal::$temporal.format(self.0))
                }

                fn from_content(content: &Content) -> Result<Self, Error> {
                    Temporal::$temporal.parse(&content.text).map(Self)
                }
            }
        )*
    };
}

temporal_literals! {
    DateTime => DateTime;
    DateTimeStamp => DateTime;
    Date => Date;
    Time => Time;
    GDay => GDay;
    GMonth => GMonth;
    GMonthDay => GMonthDay;
    GYear => GYear;
    GYearMonth => GYearMonth;
}

impl XmlType for HexBinary {
    fn to_content(&self) -> Content {
        Content::from_text(self.0.iter().map(|b| format!("{b:02X}")).collect::<String>())
    }

    fn from_content(content: &Content) -> Result<Self, Error> {
        let literal = content.text.trim();
        let invalid = || Error::InvalidLiteral {
            type_name: "hexBinary",
            literal: content.text.clone(),
        };
        if literal.len() % 2 != 0 {
            return Err(invalid());
        }
        (0..literal.len())
            .step_by(2)
            .map(|i| {
                literal
                    .get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(invalid)
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Self)
    }
}

impl XmlType for Base64Binary {
    fn to_content(&self) -> Content {
        Content::from_text(STANDARD.encode(&self.0))
    }

    fn from_content(content: &Content) -> Result<Self, Error> {
        let literal: String = content.text.split_whitespace().collect();
        STANDARD
            .decode(literal)
            .map(Self)
            .map_err(|_| Error::InvalidLiteral {
                type_name: "base64Binary",
                literal: content.text.clone(),
            })
    }
}

macro_rules! token_lists {
    ($($name:ident),*) => {
        $(
            impl XmlType for $name {
                fn to_content(&self) -> Content {
                    meta::list_to_content(&self.0)
                }

                fn from_content(content: &Content) -> Result<Self, Error> {
                    meta::list_from_content(content).map(Self)
                }
            }
        )*
    };
}

token_lists!(IdRefs, NmTokens, Entities);

/// `xs:NOTATION` names, exposed as they are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notation(pub String);

impl XmlType for Notation {
    fn to_content(&self) -> Content {
        Content::from_text(self.0.as_str())
    }

    fn from_content(content: &Content) -> Result<Self, Error> {
        Ok(Self(content.text.trim().to_string()))
    }
}

/// Content of a type the client does not model (wildcards, standard-schema types), kept whole.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnyType(pub Content);

impl XmlType for AnyType {
    fn to_content(&self) -> Content {
        self.0.clone()
    }

    fn from_content(content: &Content) -> Result<Self, Error> {
        Ok(Self(content.clone()))
    }
}
