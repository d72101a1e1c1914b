//! Primitive codecs shared by the text encoder and decoder.

use bitflags::bitflags;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::Error;
use crate::ari::Timespec;

bitflags! {
    /// Byte classification for identifier and percent-encoding decisions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct CharClass: u8 {
        /// May start an identifier: `[A-Za-z_]`
        const ID_START = 1;
        /// May continue an identifier: `[A-Za-z0-9_.\-]`
        const ID_REST = 1 << 1;
        /// RFC 3986 unreserved: `[A-Za-z0-9_.\-~]`
        const UNRESERVED = 1 << 2;
    }
}

const fn class_of(byte: u8) -> CharClass {
    let mut class = CharClass::empty();
    if byte.is_ascii_alphabetic() || byte == b'_' {
        class = class.union(CharClass::ID_START);
    }
    if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-') {
        class = class.union(CharClass::ID_REST);
    }
    if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-' | b'~') {
        class = class.union(CharClass::UNRESERVED);
    }
    class
}

static CHAR_CLASS: [CharClass; 128] = {
    let mut table = [CharClass::empty(); 128];
    let mut index = 0;
    while index < 128 {
        table[index] = class_of(index as u8);
        index += 1;
    }
    table
};

/// Additional safe characters for ARI text, beyond the RFC 3986
/// unreserved set.
pub const ARI_URI_SAFE: &str = "!'+:@";

/// Whether the text matches the bare identifier grammar
/// `[A-Za-z_][A-Za-z0-9_.\-]*`.
#[must_use]
pub fn is_identity(text: &str) -> bool {
    let bytes = text.as_bytes();
    let Some((&first, rest)) = bytes.split_first() else {
        return false;
    };
    if first >= 0x80 || !CHAR_CLASS[first as usize].contains(CharClass::ID_START) {
        return false;
    }
    rest.iter()
        .all(|&byte| byte < 0x80 && CHAR_CLASS[byte as usize].contains(CharClass::ID_REST))
}

fn hex_val(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Percent-encode per RFC 3986 with an extra caller-provided safe set.
/// Safe bytes pass through verbatim, all others become uppercase `%HH`.
pub fn percent_encode(out: &mut String, input: &[u8], safe: &str) {
    for &byte in input {
        let pass = byte < 0x80
            && (CHAR_CLASS[byte as usize].contains(CharClass::UNRESERVED)
                || safe.as_bytes().contains(&byte));
        if pass {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
}

/// Invert [`percent_encode`]. The output is raw bytes, the input may
/// encode arbitrary octets.
pub fn percent_decode(input: &str) -> Result<Vec<u8>, Error> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'%' {
            if pos + 3 > bytes.len() {
                return Err(Error::BadPercent);
            }
            let high = hex_val(bytes[pos + 1]).ok_or(Error::BadPercent)?;
            let low = hex_val(bytes[pos + 2]).ok_or(Error::BadPercent)?;
            out.push((high << 4) | low);
            pos += 3;
        } else {
            out.push(bytes[pos]);
            pos += 1;
        }
    }
    Ok(out)
}

/// Backslash-escape a string for quoting with `quote`.
///
/// Printable ASCII passes through, the active quote and backslash are
/// escaped, other BMP code points become `\uXXXX` and astral code points
/// a UTF-16 surrogate pair.
pub fn slash_escape(out: &mut String, input: &str, quote: char) {
    for chr in input.chars() {
        let code = chr as u32;
        if chr == quote {
            out.push('\\');
            out.push(quote);
        } else if chr == '\\' {
            out.push_str("\\\\");
        } else if chr == '\u{8}' {
            out.push_str("\\b");
        } else if chr == '\u{c}' {
            out.push_str("\\f");
        } else if chr == '\n' {
            out.push_str("\\n");
        } else if chr == '\r' {
            out.push_str("\\r");
        } else if chr == '\t' {
            out.push_str("\\t");
        } else if (0x20..0x7F).contains(&code) {
            out.push(chr);
        } else if code <= 0xFFFF {
            out.push_str(&format!("\\u{code:04X}"));
        } else {
            // surrogate pair creation
            let prime = code - 0x10000;
            let high = 0xD800 + (prime >> 10);
            let low = 0xDC00 + (prime & 0x03FF);
            out.push_str(&format!("\\u{high:04X}\\u{low:04X}"));
        }
    }
}

fn take_hex4(rest: &mut &str) -> Result<u16, Error> {
    if rest.len() < 4 || !rest.is_char_boundary(4) {
        return Err(Error::BadEscape);
    }
    let (hex, rem) = rest.split_at(4);
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(Error::BadEscape);
    }
    let val = u16::from_str_radix(hex, 16).map_err(|_| Error::BadEscape)?;
    *rest = rem;
    Ok(val)
}

/// Invert [`slash_escape`], combining surrogate pairs back into code
/// points. Unknown escapes pass the escaped character through.
pub fn slash_unescape(input: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        let Some(chr) = rest.chars().next() else {
            return Err(Error::DanglingEscape);
        };
        match chr {
            'b' => {
                out.push('\u{8}');
                rest = &rest[1..];
            }
            'f' => {
                out.push('\u{c}');
                rest = &rest[1..];
            }
            'n' => {
                out.push('\n');
                rest = &rest[1..];
            }
            'r' => {
                out.push('\r');
                rest = &rest[1..];
            }
            't' => {
                out.push('\t');
                rest = &rest[1..];
            }
            'u' => {
                rest = &rest[1..];
                let val = take_hex4(&mut rest)?;
                if (0xD800..=0xDBFF).contains(&val) {
                    // surrogate pair removal
                    let Some(rem) = rest.strip_prefix("\\u") else {
                        return Err(Error::BadSurrogate);
                    };
                    rest = rem;
                    let low = take_hex4(&mut rest)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(Error::BadSurrogate);
                    }
                    let code =
                        0x10000 + ((u32::from(val) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                    out.push(char::from_u32(code).ok_or(Error::BadSurrogate)?);
                } else if (0xDC00..=0xDFFF).contains(&val) {
                    return Err(Error::BadSurrogate);
                } else {
                    out.push(char::from_u32(u32::from(val)).ok_or(Error::BadEscape)?);
                }
            }
            other => {
                out.push(other);
                rest = &rest[other.len_utf8()..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Integer bases for text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum IntBase {
    /// Binary with `0b` prefix
    Bin = 2,
    /// Decimal
    #[default]
    Dec = 10,
    /// Hexadecimal with `0x` prefix and uppercase digits
    Hex = 16,
}

pub fn uint64_encode(out: &mut String, value: u64, base: IntBase) {
    match base {
        IntBase::Bin => out.push_str(&format!("0b{value:b}")),
        IntBase::Dec => out.push_str(&format!("{value}")),
        IntBase::Hex => out.push_str(&format!("0x{value:X}")),
    }
}

/// Decode an unsigned integer, selecting the base from a `0b` or `0x`
/// prefix and falling back to decimal.
pub fn uint64_decode(input: &str) -> Result<u64, Error> {
    let radix_digits = input
        .strip_prefix("0b")
        .or_else(|| input.strip_prefix("0B"))
        .map(|digits| (2, digits))
        .or_else(|| {
            input
                .strip_prefix("0x")
                .or_else(|| input.strip_prefix("0X"))
                .map(|digits| (16, digits))
        });
    match radix_digits {
        Some((radix, digits)) => {
            if digits.is_empty() {
                return Err(Error::BadDigit);
            }
            u64::from_str_radix(digits, radix).map_err(|_| Error::BadDigit)
        }
        None => input.parse().map_err(|_| Error::BadDigit),
    }
}

/// Floating point output forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatForm {
    /// Fixed six-decimal notation
    Fixed,
    /// Shortest round-trip notation
    #[default]
    Auto,
    /// Scientific notation
    Sci,
    /// C `%a` hexadecimal significand notation
    Hex,
}

pub fn float64_encode(out: &mut String, value: f64, form: FloatForm) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value.is_infinite() {
        out.push(if value < 0.0 { '-' } else { '+' });
        out.push_str("Infinity");
    } else {
        match form {
            FloatForm::Fixed => out.push_str(&format!("{value:.6}")),
            FloatForm::Auto => out.push_str(&format!("{value:?}")),
            FloatForm::Sci => out.push_str(&format!("{value:e}")),
            FloatForm::Hex => hexfloat_encode(out, value),
        }
    }
}

fn hexfloat_encode(out: &mut String, value: f64) {
    let bits = value.to_bits();
    if bits >> 63 != 0 {
        out.push('-');
    }
    if value == 0.0 {
        out.push_str("0x0p+0");
        return;
    }
    let biased = ((bits >> 52) & 0x7FF) as i32;
    let frac = bits & ((1u64 << 52) - 1);
    let (lead, exponent) = if biased == 0 {
        // subnormal
        ('0', -1022)
    } else {
        ('1', biased - 1023)
    };
    out.push_str("0x");
    out.push(lead);
    if frac != 0 {
        let mut digits = format!("{frac:013X}");
        while digits.ends_with('0') {
            digits.pop();
        }
        out.push('.');
        out.push_str(&digits);
    }
    out.push_str(&format!("p{exponent:+}"));
}

fn hexfloat_decode(input: &str) -> Result<f64, Error> {
    let mut rest = input;
    let negative = rest.starts_with('-');
    if negative || rest.starts_with('+') {
        rest = &rest[1..];
    }
    rest = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .ok_or(Error::BadFloat)?;

    let mut mantissa: u64 = 0;
    let mut exp_adjust: i32 = 0;
    let mut seen = false;
    let bytes = rest.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let Some(digit) = hex_val(bytes[pos]) else {
            break;
        };
        seen = true;
        if mantissa >> 59 == 0 {
            mantissa = (mantissa << 4) | u64::from(digit);
        } else {
            exp_adjust += 4;
        }
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() {
            let Some(digit) = hex_val(bytes[pos]) else {
                break;
            };
            seen = true;
            if mantissa >> 59 == 0 {
                mantissa = (mantissa << 4) | u64::from(digit);
                exp_adjust -= 4;
            }
            pos += 1;
        }
    }
    if !seen {
        return Err(Error::BadFloat);
    }
    rest = &rest[pos..];
    let exponent: i32 = rest
        .strip_prefix(['p', 'P'])
        .ok_or(Error::BadFloat)?
        .parse()
        .map_err(|_| Error::BadFloat)?;

    let magnitude = (mantissa as f64) * 2f64.powi(exponent.saturating_add(exp_adjust));
    Ok(if negative { -magnitude } else { magnitude })
}

/// Decode a float in any of the encoder's output forms, including the
/// IEEE 754 specials and hexadecimal significand notation.
pub fn float64_decode(input: &str) -> Result<f64, Error> {
    match input {
        "NaN" => Ok(f64::NAN),
        "Infinity" | "+Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => {
            let unsigned = input.trim_start_matches(['+', '-']);
            let is_hex = unsigned.len() > 1
                && (unsigned.starts_with("0x") || unsigned.starts_with("0X"))
                && unsigned.contains(['p', 'P']);
            if is_hex {
                hexfloat_decode(input)
            } else {
                input.parse().map_err(|_| Error::BadFloat)
            }
        }
    }
}

/// Append subseconds as `.digits` with trailing zeros trimmed.
/// Zero subseconds append nothing.
fn subsec_encode(out: &mut String, nanoseconds: u32) {
    if nanoseconds == 0 {
        return;
    }
    let mut value = nanoseconds;
    let mut digits: usize = 9;
    while value % 10 == 0 {
        value /= 10;
        digits -= 1;
    }
    out.push_str(&format!(".{value:0digits$}"));
}

/// Decode a `.digits` suffix as nanoseconds, left-justified
/// (`.5` is 500ms). Up to nine digits.
fn subsec_decode(text: &str) -> Result<u32, Error> {
    let digits = text.strip_prefix('.').ok_or(Error::BadDigit)?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(Error::BadDigit);
    }
    if digits.len() > 9 {
        return Err(Error::SubsecDigits);
    }
    let value: u32 = digits.parse().map_err(|_| Error::BadDigit)?;
    Ok(value * 10u32.pow(9 - digits.len() as u32))
}

/// Encode a time value as decimal seconds with optional fraction.
pub fn decfrac_encode(out: &mut String, time: &Timespec) {
    out.push_str(&format!("{}", time.seconds));
    subsec_encode(out, time.nanoseconds);
}

/// Decode decimal seconds with optional fraction.
pub fn decfrac_decode(input: &str) -> Result<Timespec, Error> {
    let (secs, sub) = match input.find('.') {
        Some(pos) => (&input[..pos], &input[pos..]),
        None => (input, ""),
    };
    let seconds: i64 = secs.parse().map_err(|_| Error::BadDigit)?;
    let nanoseconds = if sub.is_empty() { 0 } else { subsec_decode(sub)? };
    Ok(Timespec {
        seconds,
        nanoseconds,
    })
}

/// Encode to Base16 per Section 8 of RFC 4648.
pub fn base16_encode(out: &mut String, input: &[u8], uppercase: bool) {
    for byte in input {
        if uppercase {
            out.push_str(&format!("{byte:02X}"));
        } else {
            out.push_str(&format!("{byte:02x}"));
        }
    }
}

/// Decode Base16, accepting either letter case.
pub fn base16_decode(input: &str) -> Result<Vec<u8>, Error> {
    let bytes = input.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(Error::OddHexLength);
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let high = hex_val(pair[0]).ok_or(Error::BadDigit)?;
        let low = hex_val(pair[1]).ok_or(Error::BadDigit)?;
        out.push((high << 4) | low);
    }
    Ok(out)
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const BASE64URL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Encode to Base64 per RFC 4648, standard or URL-safe alphabet, with
/// `=` padding to a multiple of four.
pub fn base64_encode(out: &mut String, input: &[u8], use_url: bool) {
    let abet = if use_url {
        BASE64URL_ALPHABET
    } else {
        BASE64_ALPHABET
    };
    for chunk in input.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();
        out.push(abet[usize::from(b0 >> 2)] as char);
        out.push(abet[usize::from(((b0 << 4) | (b1.unwrap_or(0) >> 4)) & 0x3F)] as char);
        match b1 {
            Some(b1) => {
                out.push(abet[usize::from(((b1 << 2) | (b2.unwrap_or(0) >> 6)) & 0x3F)] as char);
            }
            None => out.push('='),
        }
        match b2 {
            Some(b2) => out.push(abet[usize::from(b2 & 0x3F)] as char),
            None => out.push('='),
        }
    }
}

fn base64_val(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        // both standard and URL-safe alphabets
        b'+' | b'-' => Some(62),
        b'/' | b'_' => Some(63),
        _ => None,
    }
}

/// Decode Base64, accepting either alphabet. The first `=` terminates
/// the data and excess padding is ignored per Section 3.3 of RFC 4648.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, Error> {
    let bytes = input.as_bytes();
    let mut sextets = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos] != b'=' {
        sextets.push(base64_val(bytes[pos]).ok_or(Error::BadDigit)?);
        pos += 1;
    }
    while pos < bytes.len() && bytes[pos] == b'=' {
        pos += 1;
    }
    if pos < bytes.len() {
        return Err(Error::BadPadding);
    }

    let mut out = Vec::with_capacity(sextets.len() / 4 * 3 + 2);
    for group in sextets.chunks(4) {
        match *group {
            [s0, s1, s2, s3] => {
                out.push((s0 << 2) | (s1 >> 4));
                out.push((s1 << 4) | (s2 >> 2));
                out.push((s2 << 6) | s3);
            }
            [s0, s1, s2] => {
                out.push((s0 << 2) | (s1 >> 4));
                out.push((s1 << 4) | (s2 >> 2));
            }
            [s0, s1] => {
                out.push((s0 << 2) | (s1 >> 4));
            }
            _ => return Err(Error::BadPadding),
        }
    }
    Ok(out)
}

/// POSIX time at 2000-01-01T00:00:00Z, the zero of TP time values.
pub const DTN_EPOCH: i64 = 946_684_800;

/// Encode a DTN-epoch time as `YYYY-MM-DDTHH:MM:SS[.f]Z`, or the
/// separator-free form when `use_sep` is false.
pub fn utctime_encode(out: &mut String, time: &Timespec, use_sep: bool) -> Result<(), Error> {
    let posix = time
        .seconds
        .checked_add(DTN_EPOCH)
        .ok_or(Error::BadTimestamp)?;
    // zone-free conversion, never the ambient locale
    let moment = Utc
        .timestamp_opt(posix, 0)
        .single()
        .ok_or(Error::BadTimestamp)?;
    let fmt = if use_sep {
        "%Y-%m-%dT%H:%M:%S"
    } else {
        "%Y%m%dT%H%M%S"
    };
    out.push_str(&moment.format(fmt).to_string());
    subsec_encode(out, time.nanoseconds);
    out.push('Z');
    Ok(())
}

/// Decode a UTC timestamp with or without `-`/`:` separators into a
/// DTN-epoch time.
pub fn utctime_decode(input: &str) -> Result<Timespec, Error> {
    // remove optional separators
    let stripped: String = input
        .chars()
        .filter(|&chr| !matches!(chr, '-' | ':'))
        .collect();
    if !stripped.is_ascii() || stripped.len() < 16 || stripped.as_bytes()[8] != b'T' {
        return Err(Error::BadTimestamp);
    }
    let field = |range: std::ops::Range<usize>| -> Result<u32, Error> {
        let digits = &stripped[range];
        if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(Error::BadTimestamp);
        }
        digits.parse().map_err(|_| Error::BadTimestamp)
    };
    let year: i32 = i32::try_from(field(0..4)?).map_err(|_| Error::BadTimestamp)?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)
        .ok_or(Error::BadTimestamp)?;
    let time = NaiveTime::from_hms_opt(field(9..11)?, field(11..13)?, field(13..15)?)
        .ok_or(Error::BadTimestamp)?;

    let rest = &stripped[15..];
    let sub = rest.strip_suffix('Z').ok_or(Error::BadTimestamp)?;
    let nanoseconds = if sub.is_empty() { 0 } else { subsec_decode(sub)? };
    Ok(Timespec {
        seconds: NaiveDateTime::new(date, time).and_utc().timestamp() - DTN_EPOCH,
        nanoseconds,
    })
}

const PERIOD_DAY: u64 = 24 * 3600;
const PERIOD_HOUR: u64 = 3600;
const PERIOD_MINUTE: u64 = 60;

/// Encode a duration as ISO 8601 `[-]P[nD]T[nH][nM][n[.f]S]`.
/// Zero encodes as `PT0S`.
pub fn timeperiod_encode(out: &mut String, time: &Timespec) {
    if time.seconds == 0 && time.nanoseconds == 0 {
        out.push_str("PT0S");
        return;
    }

    if time.seconds < 0 {
        out.push('-');
    }
    let mut rem = time.seconds.unsigned_abs();

    out.push('P');
    if rem >= PERIOD_DAY {
        out.push_str(&format!("{}D", rem / PERIOD_DAY));
        rem %= PERIOD_DAY;
    }
    out.push('T');
    if rem >= PERIOD_HOUR {
        out.push_str(&format!("{}H", rem / PERIOD_HOUR));
        rem %= PERIOD_HOUR;
    }
    if rem >= PERIOD_MINUTE {
        out.push_str(&format!("{}M", rem / PERIOD_MINUTE));
        rem %= PERIOD_MINUTE;
    }
    if rem > 0 || time.nanoseconds > 0 {
        out.push_str(&format!("{rem}"));
        subsec_encode(out, time.nanoseconds);
        out.push('S');
    }
}

/// Decode an ISO 8601 duration. The sign is optional, `P` and `T` are
/// required, any subset of the `D`/`H`/`M`/`S` fields may appear in
/// order.
pub fn timeperiod_decode(input: &str) -> Result<Timespec, Error> {
    let mut rest = input;
    let negative = rest.starts_with('-');
    if negative || rest.starts_with('+') {
        rest = &rest[1..];
    }
    rest = rest.strip_prefix('P').ok_or(Error::BadDuration)?;

    let mut seconds: u64 = 0;
    let mut field = |rest: &mut &str, marker: char, scale: u64| -> Result<(), Error> {
        if let Some(pos) = rest.find(marker) {
            let value: u64 = rest[..pos].parse().map_err(|_| Error::BadDuration)?;
            seconds = value
                .checked_mul(scale)
                .and_then(|part| seconds.checked_add(part))
                .ok_or(Error::BadDuration)?;
            *rest = &rest[pos + 1..];
        }
        Ok(())
    };

    field(&mut rest, 'D', PERIOD_DAY)?;
    rest = rest.strip_prefix('T').ok_or(Error::BadDuration)?;
    field(&mut rest, 'H', PERIOD_HOUR)?;
    field(&mut rest, 'M', PERIOD_MINUTE)?;

    let mut nanoseconds = 0;
    if let Some(pos) = rest.find('S') {
        let body = &rest[..pos];
        let (secs, sub) = match body.find('.') {
            Some(dot) => (&body[..dot], &body[dot..]),
            None => (body, ""),
        };
        let value: u64 = secs.parse().map_err(|_| Error::BadDuration)?;
        seconds = seconds.checked_add(value).ok_or(Error::BadDuration)?;
        if !sub.is_empty() {
            nanoseconds = subsec_decode(sub)?;
        }
        rest = &rest[pos + 1..];
    }

    if !rest.is_empty() {
        return Err(Error::TrailingGarbage);
    }

    let mut seconds = i64::try_from(seconds).map_err(|_| Error::BadDuration)?;
    if negative {
        seconds = -seconds;
    }
    Ok(Timespec {
        seconds,
        nanoseconds,
    })
}

#[test]
fn test_identity() {
    assert!(is_identity("hello"));
    assert!(is_identity("_priv.2-x"));
    assert!(!is_identity(""));
    assert!(!is_identity("2fast"));
    assert!(!is_identity("has space"));
    assert!(!is_identity("héllo"));
}

#[test]
fn test_percent_roundtrip() {
    let mut out = String::new();
    percent_encode(&mut out, "a b!c/d".as_bytes(), ARI_URI_SAFE);
    assert_eq!(out, "a%20b!c%2Fd");
    assert_eq!(percent_decode(&out).unwrap(), b"a b!c/d");

    let mut plain = String::new();
    percent_encode(&mut plain, "a b!c".as_bytes(), "");
    assert_eq!(plain, "a%20b%21c");

    assert_eq!(percent_decode("%e9").unwrap(), vec![0xE9]);
    assert!(percent_decode("%2").is_err());
    assert!(percent_decode("%zz").is_err());
}

#[test]
fn test_slash_escape_roundtrip() {
    for text in [
        "plain",
        "with \"quotes\" and \\backslash\\",
        "tab\there\nnewline",
        "latin é and euro € signs",
        "astral \u{1D11E} pair",
    ] {
        let mut escaped = String::new();
        slash_escape(&mut escaped, text, '"');
        assert_eq!(slash_unescape(&escaped).unwrap(), text, "through {escaped}");
    }

    let mut escaped = String::new();
    slash_escape(&mut escaped, "\u{1D11E}", '"');
    assert_eq!(escaped, "\\uD834\\uDD1E");

    assert_eq!(slash_unescape("a\\'b").unwrap(), "a'b");
    assert!(slash_unescape("end\\").is_err());
    assert_eq!(
        slash_unescape("\\uD834").unwrap_err(),
        Error::BadSurrogate
    );
    assert_eq!(
        slash_unescape("\\uDD1E").unwrap_err(),
        Error::BadSurrogate
    );
    assert_eq!(
        slash_unescape("\\uD834\\u0020").unwrap_err(),
        Error::BadSurrogate
    );
}

#[test]
fn test_uint_bases() {
    let mut out = String::new();
    uint64_encode(&mut out, 0, IntBase::Bin);
    assert_eq!(out, "0b0");
    out.clear();
    uint64_encode(&mut out, 42, IntBase::Bin);
    assert_eq!(out, "0b101010");
    out.clear();
    uint64_encode(&mut out, 42, IntBase::Hex);
    assert_eq!(out, "0x2A");
    out.clear();
    uint64_encode(&mut out, 42, IntBase::Dec);
    assert_eq!(out, "42");

    assert_eq!(uint64_decode("0b101010").unwrap(), 42);
    assert_eq!(uint64_decode("0x2a").unwrap(), 42);
    assert_eq!(uint64_decode("42").unwrap(), 42);
    assert_eq!(uint64_decode(&u64::MAX.to_string()).unwrap(), u64::MAX);
    assert!(uint64_decode("0b").is_err());
    assert!(uint64_decode("0b12").is_err());
    assert!(uint64_decode("12z").is_err());
}

#[test]
fn test_float_forms() {
    let mut out = String::new();
    float64_encode(&mut out, f64::NAN, FloatForm::Auto);
    assert_eq!(out, "NaN");
    out.clear();
    float64_encode(&mut out, f64::INFINITY, FloatForm::Auto);
    assert_eq!(out, "+Infinity");
    out.clear();
    float64_encode(&mut out, f64::NEG_INFINITY, FloatForm::Auto);
    assert_eq!(out, "-Infinity");

    out.clear();
    float64_encode(&mut out, 1.5, FloatForm::Hex);
    assert_eq!(out, "0x1.8p+0");
    out.clear();
    float64_encode(&mut out, -2.0, FloatForm::Hex);
    assert_eq!(out, "-0x1p+1");
    out.clear();
    float64_encode(&mut out, 0.0, FloatForm::Hex);
    assert_eq!(out, "0x0p+0");

    assert!(float64_decode("NaN").unwrap().is_nan());
    assert_eq!(float64_decode("+Infinity").unwrap(), f64::INFINITY);
    assert_eq!(float64_decode("-Infinity").unwrap(), f64::NEG_INFINITY);
    assert_eq!(float64_decode("0x1.8p+0").unwrap(), 1.5);
    assert_eq!(float64_decode("-0x1p+1").unwrap(), -2.0);
    assert_eq!(float64_decode("1.5e3").unwrap(), 1500.0);
    assert!(float64_decode("0x1.8q0").is_err());

    // every form round-trips exactly for these values
    for value in [0.25, -10.5, 1.0e-3, 12345.678, f64::MIN_POSITIVE / 2.0] {
        for form in [FloatForm::Auto, FloatForm::Sci, FloatForm::Hex] {
            let mut text = String::new();
            float64_encode(&mut text, value, form);
            assert_eq!(float64_decode(&text).unwrap(), value, "through {text}");
        }
    }
}

#[test]
fn test_base16() {
    let mut out = String::new();
    base16_encode(&mut out, &[0xDE, 0xAD, 0xBE, 0xEF], true);
    assert_eq!(out, "DEADBEEF");
    out.clear();
    base16_encode(&mut out, &[0xDE, 0xAD], false);
    assert_eq!(out, "dead");

    assert_eq!(base16_decode("DEADbeef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(base16_decode("").unwrap(), Vec::<u8>::new());
    assert_eq!(base16_decode("ABC").unwrap_err(), Error::OddHexLength);
    assert_eq!(base16_decode("GG").unwrap_err(), Error::BadDigit);
}

#[test]
fn test_base64() {
    let mut out = String::new();
    base64_encode(&mut out, b"any carnal pleasure.", false);
    assert_eq!(out, "YW55IGNhcm5hbCBwbGVhc3VyZS4=");
    out.clear();
    base64_encode(&mut out, &[0xFB, 0xEF], true);
    assert_eq!(out, "--8=");
    out.clear();
    base64_encode(&mut out, &[0xFB, 0xEF], false);
    assert_eq!(out, "++8=");

    assert_eq!(base64_decode("YW55IGNhcm5hbCBwbGVhc3VyZS4=").unwrap(), b"any carnal pleasure.");
    // either alphabet through the same table
    assert_eq!(base64_decode("--8=").unwrap(), vec![0xFB, 0xEF]);
    assert_eq!(base64_decode("++8=").unwrap(), vec![0xFB, 0xEF]);
    // tolerated excess padding
    assert_eq!(base64_decode("QQ===").unwrap(), b"A");
    assert_eq!(base64_decode("").unwrap(), Vec::<u8>::new());
    assert_eq!(base64_decode("QQ=x").unwrap_err(), Error::BadPadding);
    assert_eq!(base64_decode("Q!").unwrap_err(), Error::BadDigit);
}

#[test]
fn test_utctime() {
    let mut out = String::new();
    utctime_encode(&mut out, &Timespec::new(0, 500_000_000), true).unwrap();
    assert_eq!(out, "2000-01-01T00:00:00.5Z");
    out.clear();
    utctime_encode(&mut out, &Timespec::new(0, 500_000_000), false).unwrap();
    assert_eq!(out, "20000101T000000.5Z");

    for text in ["2000-01-01T00:00:00.5Z", "20000101T000000.5Z"] {
        assert_eq!(utctime_decode(text).unwrap(), Timespec::new(0, 500_000_000));
    }
    assert_eq!(
        utctime_decode("2024-02-29T12:34:56Z").unwrap(),
        Timespec::new(762_525_296, 0)
    );
    // back to the POSIX epoch
    assert_eq!(
        utctime_decode("1970-01-01T00:00:00Z").unwrap(),
        Timespec::new(-DTN_EPOCH, 0)
    );
    assert!(utctime_decode("2000-01-01T00:00:00").is_err());
    assert!(utctime_decode("garbage").is_err());

    for seconds in [-DTN_EPOCH, -1, 0, 1, 762_525_296] {
        for nanos in [0, 1, 500_000_000, 999_999_999] {
            let time = Timespec::new(seconds, nanos);
            for use_sep in [false, true] {
                let mut text = String::new();
                utctime_encode(&mut text, &time, use_sep).unwrap();
                assert_eq!(utctime_decode(&text).unwrap(), time, "through {text}");
            }
        }
    }
}

#[test]
fn test_timeperiod() {
    let mut out = String::new();
    timeperiod_encode(&mut out, &Timespec::new(0, 0));
    assert_eq!(out, "PT0S");
    out.clear();
    timeperiod_encode(&mut out, &Timespec::new(3661, 0));
    assert_eq!(out, "PT1H1M1S");
    out.clear();
    timeperiod_encode(&mut out, &Timespec::new(-90061, 500_000_000));
    assert_eq!(out, "-P1DT1H1M1.5S");
    out.clear();
    timeperiod_encode(&mut out, &Timespec::new(86400, 0));
    assert_eq!(out, "P1DT");

    assert_eq!(timeperiod_decode("PT0S").unwrap(), Timespec::new(0, 0));
    assert_eq!(timeperiod_decode("PT1H1M1S").unwrap(), Timespec::new(3661, 0));
    assert_eq!(
        timeperiod_decode("-P1DT1H1M1.5S").unwrap(),
        Timespec {
            seconds: -90061,
            nanoseconds: 500_000_000
        }
    );
    assert_eq!(timeperiod_decode("P1DT").unwrap(), Timespec::new(86400, 0));
    assert_eq!(timeperiod_decode("+PT2S").unwrap(), Timespec::new(2, 0));
    assert!(timeperiod_decode("T1S").is_err());
    assert!(timeperiod_decode("P1D").is_err());
    assert_eq!(
        timeperiod_decode("PT1Sx").unwrap_err(),
        Error::TrailingGarbage
    );
}

#[test]
fn test_decfrac() {
    let mut out = String::new();
    decfrac_encode(&mut out, &Timespec::new(-3, 0));
    assert_eq!(out, "-3");
    out.clear();
    decfrac_encode(&mut out, &Timespec::new(30, 250_000_000));
    assert_eq!(out, "30.25");

    assert_eq!(decfrac_decode("-3").unwrap(), Timespec::new(-3, 0));
    assert_eq!(decfrac_decode("30.25").unwrap(), Timespec::new(30, 250_000_000));
    assert_eq!(decfrac_decode("30.000000001").unwrap(), Timespec::new(30, 1));
    assert!(decfrac_decode("30.").is_err());
    assert!(decfrac_decode("30.1234567891").is_err());
}
