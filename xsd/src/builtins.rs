use lazy_static::lazy_static;

use super::xstypes::QName;

// Namespaces used by the specification (pt. 1, §1.3.1)
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

lazy_static! {
    /// The `xs:anyType` qualified name
    pub static ref XS_ANY_TYPE_NAME: QName = Builtin::AnyType.qname();
    /// The `xs:anySimpleType` qualified name
    pub static ref XS_ANY_SIMPLE_TYPE_NAME: QName = Builtin::AnySimpleType.qname();
    pub static ref XS_STRING_NAME: QName = Builtin::String.qname();
}

/// Semantic classification of a built-in datatype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// `anyType` and the other ur-types
    Any,
    Text,
    Integer,
    Decimal,
    Boolean,
    /// Dates, times and the Gregorian fragments
    DateTime,
    Binary,
    /// Whitespace-separated token lists
    List,
    Notation,
}

macro_rules! builtins {
    ($($variant:ident => $name:literal: $kind:ident),* $(,)?) => {
        /// The built-in datatypes of the `xs` namespace (pt. 2, §3)
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $($variant),*
        }

        impl Builtin {
            pub const ALL: &'static [Builtin] = &[$(Builtin::$variant),*];

            pub fn local_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),*
                }
            }

            pub fn kind(self) -> BuiltinKind {
                match self {
                    $(Self::$variant => BuiltinKind::$kind),*
                }
            }

            fn from_local_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

builtins! {
    AnyType => "anyType": Any,
    AnySimpleType => "anySimpleType": Any,
    AnyAtomicType => "anyAtomicType": Any,

    String => "string": Text,
    NormalizedString => "normalizedString": Text,
    Token => "token": Text,
    Language => "language": Text,
    Name => "Name": Text,
    NcName => "NCName": Text,
    Id => "ID": Text,
    IdRef => "IDREF": Text,
    IdRefs => "IDREFS": List,
    Entity => "ENTITY": Text,
    Entities => "ENTITIES": List,
    NmToken => "NMTOKEN": Text,
    NmTokens => "NMTOKENS": List,
    QName => "QName": Text,
    AnyUri => "anyURI": Text,
    Notation => "NOTATION": Notation,

    Boolean => "boolean": Boolean,

    Decimal => "decimal": Decimal,
    Float => "float": Decimal,
    Double => "double": Decimal,

    Integer => "integer": Integer,
    NonPositiveInteger => "nonPositiveInteger": Integer,
    NegativeInteger => "negativeInteger": Integer,
    NonNegativeInteger => "nonNegativeInteger": Integer,
    PositiveInteger => "positiveInteger": Integer,
    Long => "long": Integer,
    Int => "int": Integer,
    Short => "short": Integer,
    Byte => "byte": Integer,
    UnsignedLong => "unsignedLong": Integer,
    UnsignedInt => "unsignedInt": Integer,
    UnsignedShort => "unsignedShort": Integer,
    UnsignedByte => "unsignedByte": Integer,

    Duration => "duration": Text,
    DayTimeDuration => "dayTimeDuration": Text,
    YearMonthDuration => "yearMonthDuration": Text,

    DateTime => "dateTime": DateTime,
    DateTimeStamp => "dateTimeStamp": DateTime,
    Date => "date": DateTime,
    Time => "time": DateTime,
    GDay => "gDay": DateTime,
    GMonth => "gMonth": DateTime,
    GMonthDay => "gMonthDay": DateTime,
    GYear => "gYear": DateTime,
    GYearMonth => "gYearMonth": DateTime,

    HexBinary => "hexBinary": Binary,
    Base64Binary => "base64Binary": Binary,
}

impl Builtin {
    /// Looks up the built-in named by `name`. Matching is exact on both the namespace and the local
    /// name.
    pub fn parse(name: &QName) -> Option<Self> {
        if name.namespace() != Some(XS_NAMESPACE) {
            return None;
        }
        Self::from_local_name(&name.local_name)
    }

    pub fn qname(self) -> QName {
        QName::with_namespace(XS_NAMESPACE, self.local_name())
    }

    pub fn is_list(self) -> bool {
        self.kind() == BuiltinKind::List
    }
}

pub fn is_builtin_name(name: &QName) -> bool {
    Builtin::parse(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_builtins_exactly() {
        let base64 = QName::with_namespace(XS_NAMESPACE, "base64Binary");
        assert_eq!(Builtin::parse(&base64), Some(Builtin::Base64Binary));
        assert_eq!(Builtin::Base64Binary.kind(), BuiltinKind::Binary);

        // No case folding, no namespace guessing
        assert_eq!(
            Builtin::parse(&QName::with_namespace(XS_NAMESPACE, "Base64Binary")),
            None
        );
        assert_eq!(
            Builtin::parse(&QName::with_namespace("urn:other", "string")),
            None
        );
        assert_eq!(
            Builtin::parse(&QName::with_optional_namespace(None::<String>, "string")),
            None
        );
    }

    #[test]
    fn classifies_kinds() {
        let kind = |local: &str| Builtin::parse(&QName::with_namespace(XS_NAMESPACE, local)).map(Builtin::kind);
        assert_eq!(kind("string"), Some(BuiltinKind::Text));
        assert_eq!(kind("boolean"), Some(BuiltinKind::Boolean));
        assert_eq!(kind("unsignedShort"), Some(BuiltinKind::Integer));
        assert_eq!(kind("double"), Some(BuiltinKind::Decimal));
        assert_eq!(kind("gYearMonth"), Some(BuiltinKind::DateTime));
        assert_eq!(kind("hexBinary"), Some(BuiltinKind::Binary));
        assert_eq!(kind("NMTOKENS"), Some(BuiltinKind::List));
        assert_eq!(kind("NOTATION"), Some(BuiltinKind::Notation));
        assert_eq!(kind("anyType"), Some(BuiltinKind::Any));
        assert_eq!(kind("QName"), Some(BuiltinKind::Text));
        assert_eq!(kind("duration"), Some(BuiltinKind::Text));
        assert_eq!(kind("float"), Some(BuiltinKind::Decimal));
    }

    #[test]
    fn names_round_trip() {
        for builtin in Builtin::ALL.iter().copied() {
            assert_eq!(Builtin::parse(&builtin.qname()), Some(builtin));
        }
    }
}
