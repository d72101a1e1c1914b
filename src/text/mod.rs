//! URI-form text codec for ARI values.

pub mod decode;
pub mod encode;
pub mod util;

pub use self::decode::decode;
pub use self::encode::{BstrForm, EncodeOpts, SchemePrefix, TypeShow, encode};
pub use self::util::{FloatForm, IntBase};

use std::{error, fmt};

/// Text codec errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Percent sign without two hex digits
    BadPercent,
    /// Unknown or truncated backslash escape
    BadEscape,
    /// Backslash at the end of input
    DanglingEscape,
    /// Unpaired or out-of-range surrogate escape
    BadSurrogate,
    /// Character outside the expected digit set
    BadDigit,
    /// Hex string with an odd number of digits
    OddHexLength,
    /// Base64 text continues after padding, or truncates a group
    BadPadding,
    /// Unparseable floating point text
    BadFloat,
    /// Unparseable UTC timestamp
    BadTimestamp,
    /// Unparseable ISO 8601 duration
    BadDuration,
    /// More than nine subsecond digits
    SubsecDigits,
    /// Payload is not valid UTF-8
    BadUtf8,
    /// Unknown ARI type name or number
    UnknownType,
    /// A required structure character is missing
    Expected(char),
    /// Token does not match any literal production
    BadValue,
    /// Table row arity differs from the declared column count
    NcolsMismatch,
    /// Value has no representation in the requested form
    Unrepresentable(&'static str),
    /// Extra text after a complete value
    TrailingGarbage,
}

impl Error {
    /// Small integer code for the error kind: 2 malformed input,
    /// 3 trailing garbage, 4 semantic constraint, 5 invalid surrogate.
    /// Argument errors (code 1) are unrepresentable here, the option
    /// enums close them off at compile time.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::BadSurrogate => 5,
            Self::SubsecDigits | Self::BadPadding | Self::NcolsMismatch => 4,
            Self::DanglingEscape | Self::TrailingGarbage => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPercent => f.write_str("percent sign without two hex digits"),
            Self::BadEscape => f.write_str("unknown or truncated escape"),
            Self::DanglingEscape => f.write_str("escape at end of input"),
            Self::BadSurrogate => f.write_str("invalid surrogate pair"),
            Self::BadDigit => f.write_str("invalid digit"),
            Self::OddHexLength => f.write_str("odd number of hex digits"),
            Self::BadPadding => f.write_str("bad base64 padding"),
            Self::BadFloat => f.write_str("invalid floating point text"),
            Self::BadTimestamp => f.write_str("invalid UTC timestamp"),
            Self::BadDuration => f.write_str("invalid time duration"),
            Self::SubsecDigits => f.write_str("more than nine subsecond digits"),
            Self::BadUtf8 => f.write_str("text is not valid UTF-8"),
            Self::UnknownType => f.write_str("unknown ARI type"),
            Self::Expected(chr) => write!(f, "expected `{chr}`"),
            Self::BadValue => f.write_str("unrecognized value text"),
            Self::NcolsMismatch => f.write_str("table row does not match column count"),
            Self::Unrepresentable(what) => write!(f, "cannot represent {what}"),
            Self::TrailingGarbage => f.write_str("extra text after value"),
        }
    }
}

impl error::Error for Error {}
