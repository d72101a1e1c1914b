use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Built-in ARI types from the IANA "Literal Types" and
/// "Managed Object Types" sub-registries.
///
/// Literal types occupy the negative block, object types the positive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum AriType {
    /// Reserved union of all literal types
    Literal = -256,
    Null = -255,
    Bool = -254,
    Byte = -253,
    Int = -252,
    Uint = -251,
    Vast = -250,
    Uvast = -249,
    Real32 = -248,
    Real64 = -247,
    TextStr = -246,
    ByteStr = -245,
    /// Time point relative to the DTN epoch
    Tp = -244,
    /// Time difference
    Td = -243,
    Label = -242,
    Cbor = -241,
    Aritype = -240,
    Ac = -239,
    Am = -238,
    Tbl = -237,
    ExecSet = -236,
    RptSet = -235,

    /// An object reference of any type
    Object = 1,
    Ident = 2,
    Const = 3,
    Ctrl = 4,
}

/// Name pairs for every `AriType` variant, in registry order.
const TYPE_NAMES: &[(AriType, &str)] = &[
    (AriType::Literal, "LITERAL"),
    (AriType::Null, "NULL"),
    (AriType::Bool, "BOOL"),
    (AriType::Byte, "BYTE"),
    (AriType::Int, "INT"),
    (AriType::Uint, "UINT"),
    (AriType::Vast, "VAST"),
    (AriType::Uvast, "UVAST"),
    (AriType::Real32, "REAL32"),
    (AriType::Real64, "REAL64"),
    (AriType::TextStr, "TEXTSTR"),
    (AriType::ByteStr, "BYTESTR"),
    (AriType::Tp, "TP"),
    (AriType::Td, "TD"),
    (AriType::Label, "LABEL"),
    (AriType::Cbor, "CBOR"),
    (AriType::Aritype, "ARITYPE"),
    (AriType::Ac, "AC"),
    (AriType::Am, "AM"),
    (AriType::Tbl, "TBL"),
    (AriType::ExecSet, "EXECSET"),
    (AriType::RptSet, "RPTSET"),
    (AriType::Object, "OBJECT"),
    (AriType::Ident, "IDENT"),
    (AriType::Const, "CONST"),
    (AriType::Ctrl, "CTRL"),
];

impl AriType {
    /// Canonical uppercase registry name.
    #[must_use]
    pub fn name(self) -> &'static str {
        TYPE_NAMES
            .iter()
            .find(|(ty, _)| *ty == self)
            .map(|(_, name)| *name)
            .unwrap_or("LITERAL")
    }

    /// Case-insensitive lookup by registry name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        TYPE_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(ty, _)| *ty)
    }

    /// Whether literals of this type carry nested ARI values.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Ac | Self::Am | Self::Tbl | Self::ExecSet | Self::RptSet
        )
    }

    /// Whether this is an object-reference type rather than a literal type.
    #[must_use]
    pub fn is_object(self) -> bool {
        i32::from(self) >= 0
    }
}

#[test]
fn test_name_lookup() {
    assert_eq!(AriType::Tbl.name(), "TBL");
    assert_eq!(AriType::Ctrl.name(), "CTRL");
    assert_eq!(AriType::from_name("tbl"), Some(AriType::Tbl));
    assert_eq!(AriType::from_name("Ctrl"), Some(AriType::Ctrl));
    assert_eq!(AriType::from_name("EXECSET"), Some(AriType::ExecSet));
    assert_eq!(AriType::from_name("bogus"), None);
    for (ty, name) in TYPE_NAMES {
        assert_eq!(AriType::from_name(name), Some(*ty));
        assert_eq!(ty.name(), *name);
    }
}

#[test]
fn test_primitive_conversion() {
    assert_eq!(i32::from(AriType::Ac), -239);
    assert_eq!(AriType::try_from(-237), Ok(AriType::Tbl));
    assert_eq!(AriType::try_from(4), Ok(AriType::Ctrl));
    assert!(AriType::try_from(-1000).is_err());
}
