//! Recursive-descent decoder for the URI text form.

use super::Error;
use super::util;
use crate::ari::{Ari, AriList, AriMap, IdSeg, ObjPath, Params, Report, RptSet, Tbl, Value};
use crate::types::AriType;

/// Decode an ARI from its text form.
///
/// The decoder accepts every variation the encoder can produce: any
/// scheme-prefix placement, any integer base, any byte-string or time
/// form. No partial value is returned on error.
pub fn decode(input: &str) -> Result<Ari, Error> {
    let mut parser = Parser { input, pos: 0 };
    let ari = parser.parse_ari()?;
    if parser.pos != input.len() {
        return Err(Error::TrailingGarbage);
    }
    Ok(ari)
}

/// Characters that end a value or separate container members.
fn is_delim(byte: u8) -> bool {
    matches!(byte, b',' | b'(' | b')' | b'=' | b';')
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

enum ListOrMap {
    List(AriList),
    Map(AriMap),
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, chr: char) -> Result<(), Error> {
        if self.eat(chr as u8) {
            Ok(())
        } else {
            Err(Error::Expected(chr))
        }
    }

    fn at_end_or_delim(&self) -> bool {
        match self.peek() {
            None => true,
            Some(byte) => is_delim(byte),
        }
    }

    /// The scheme is optional at any nesting level and case-insensitive.
    fn eat_scheme(&mut self) {
        let rest = self.rest().as_bytes();
        if rest.len() >= 4 && rest[..4].eq_ignore_ascii_case(b"ari:") {
            self.pos += 4;
        }
    }

    /// Take a path segment, up to a slash or structure character.
    fn take_seg(&mut self) -> &'a str {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() {
            let byte = bytes[self.pos];
            if byte == b'/' || is_delim(byte) {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Take one primitive token. Apostrophe-quoted forms (`'…'`, `h'…'`,
    /// `b64'…'`) run to their closing quote, anything else runs to a
    /// structure character.
    fn take_prim_token(&mut self) -> Result<&'a str, Error> {
        let bytes = self.input.as_bytes();
        let start = self.pos;

        let open = if bytes[self.pos..].starts_with(b"h'") {
            Some(1)
        } else if bytes[self.pos..].starts_with(b"b64'") {
            Some(3)
        } else if bytes.get(self.pos) == Some(&b'\'') {
            Some(0)
        } else {
            None
        };
        if let Some(open) = open {
            let mut pos = self.pos + open + 1;
            loop {
                if pos >= bytes.len() {
                    return Err(Error::Expected('\''));
                }
                if bytes[pos] == b'\'' && !escaped_quote(bytes, pos) {
                    pos += 1;
                    break;
                }
                pos += 1;
            }
            self.pos = pos;
            return Ok(&self.input[start..self.pos]);
        }

        while self.pos < bytes.len() && !is_delim(bytes[self.pos]) {
            self.pos += 1;
        }
        Ok(&self.input[start..self.pos])
    }

    fn parse_ari(&mut self) -> Result<Ari, Error> {
        self.eat_scheme();
        if self.rest().as_bytes().starts_with(b"//") {
            self.pos += 2;
            self.parse_objref()
        } else if self.eat(b'/') {
            self.parse_typed_lit()
        } else {
            self.parse_untyped()
        }
    }

    fn parse_objref(&mut self) -> Result<Ari, Error> {
        let ns_id = parse_idseg(self.take_seg())?;
        self.expect('/')?;

        if self.at_end_or_delim() {
            // namespace reference only
            return Ok(Ari::objref(ObjPath::new(ns_id, IdSeg::Null, IdSeg::Null)));
        }

        let type_id = parse_idseg(self.take_seg())?;
        self.expect('/')?;
        let obj_id = parse_idseg(self.take_seg())?;
        let path = ObjPath::new(ns_id, type_id, obj_id);

        let params = if self.peek() == Some(b'(') {
            match self.parse_ac_or_am()? {
                ListOrMap::List(items) => Params::List(items),
                ListOrMap::Map(map) => Params::Map(map),
            }
        } else {
            Params::None
        };
        Ok(Ari::objref_with_params(path, params))
    }

    fn parse_typed_lit(&mut self) -> Result<Ari, Error> {
        let ari_type = lookup_type(self.take_seg())?;
        self.expect('/')?;

        match ari_type {
            AriType::Ac => Ok(Ari::ac(self.parse_ac_list()?)),
            AriType::Am => {
                let map = match self.parse_ac_or_am()? {
                    ListOrMap::Map(map) => map,
                    ListOrMap::List(items) if items.is_empty() => AriMap::new(),
                    ListOrMap::List(_) => return Err(Error::Expected('=')),
                };
                Ok(Ari::am(map))
            }
            AriType::Tbl => self.parse_tbl(),
            AriType::ExecSet => self.parse_execset(),
            AriType::RptSet => self.parse_rptset(),
            AriType::Tp => {
                let token = self.take_prim_token()?;
                let time = if token.ends_with('Z') {
                    util::utctime_decode(token)?
                } else {
                    util::decfrac_decode(token)?
                };
                Ok(Ari::tp(time))
            }
            AriType::Td => {
                let token = self.take_prim_token()?;
                let unsigned = token.strip_prefix(['+', '-']).unwrap_or(token);
                let time = if unsigned.starts_with('P') {
                    util::timeperiod_decode(token)?
                } else {
                    util::decfrac_decode(token)?
                };
                Ok(Ari::td(time))
            }
            _ if ari_type.is_object() => Err(Error::BadValue),
            _ => {
                let token = self.take_prim_token()?;
                let value = parse_typed_prim(ari_type, token)?;
                Ok(Ari::typed_lit(ari_type, value))
            }
        }
    }

    fn parse_untyped(&mut self) -> Result<Ari, Error> {
        if self.peek() == Some(b'(') {
            // container without a tag, recover the tag from the shape
            return match self.parse_ac_or_am()? {
                ListOrMap::List(items) => Ok(Ari::ac(items)),
                ListOrMap::Map(map) => Ok(Ari::am(map)),
            };
        }
        let token = self.take_prim_token()?;
        Ok(Ari::lit(parse_generic_prim(token)?))
    }

    /// Parse `(…)` contents, deciding between list and map from the
    /// first separator.
    fn parse_ac_or_am(&mut self) -> Result<ListOrMap, Error> {
        self.expect('(')?;
        if self.eat(b')') {
            return Ok(ListOrMap::List(Vec::new()));
        }

        let first = self.parse_ari()?;
        if self.eat(b'=') {
            let mut map = AriMap::new();
            let value = self.parse_ari()?;
            map.insert(first, value);
            while self.eat(b',') {
                let key = self.parse_ari()?;
                self.expect('=')?;
                let value = self.parse_ari()?;
                map.insert(key, value);
            }
            self.expect(')')?;
            Ok(ListOrMap::Map(map))
        } else {
            let mut items = vec![first];
            while self.eat(b',') {
                items.push(self.parse_ari()?);
            }
            self.expect(')')?;
            Ok(ListOrMap::List(items))
        }
    }

    fn parse_ac_list(&mut self) -> Result<AriList, Error> {
        match self.parse_ac_or_am()? {
            ListOrMap::List(items) => Ok(items),
            ListOrMap::Map(_) => Err(Error::BadValue),
        }
    }

    fn parse_tbl(&mut self) -> Result<Ari, Error> {
        self.expect('c')?;
        self.expect('=')?;
        let ncols_token = self.take_seg();
        let ncols = usize::try_from(util::uint64_decode(ncols_token)?)
            .map_err(|_| Error::BadDigit)?;
        self.expect(';')?;

        let mut tbl = Tbl::new(ncols);
        while self.peek() == Some(b'(') {
            let row = self.parse_ac_list()?;
            if row.len() != ncols {
                return Err(Error::NcolsMismatch);
            }
            tbl.items.extend(row);
        }
        Ok(Ari::tbl(tbl))
    }

    fn parse_execset(&mut self) -> Result<Ari, Error> {
        self.expect('n')?;
        self.expect('=')?;
        let nonce = self.parse_ari()?;
        self.expect(';')?;
        let targets = self.parse_ac_list()?;
        Ok(Ari::execset(nonce, targets))
    }

    fn parse_rptset(&mut self) -> Result<Ari, Error> {
        self.expect('n')?;
        self.expect('=')?;
        let nonce = self.parse_ari()?;
        self.expect(';')?;
        self.expect('r')?;
        self.expect('=')?;
        let reftime = self.parse_ari()?;
        self.expect(';')?;

        let mut reports = Vec::new();
        while self.peek() == Some(b'(') {
            reports.push(self.parse_report()?);
        }
        Ok(Ari::rptset(RptSet {
            nonce: Box::new(nonce),
            reftime: Box::new(reftime),
            reports,
        }))
    }

    fn parse_report(&mut self) -> Result<Report, Error> {
        self.expect('(')?;
        self.expect('t')?;
        self.expect('=')?;
        let reltime = self.parse_ari()?;
        self.expect(';')?;
        self.expect('s')?;
        self.expect('=')?;
        let source = self.parse_ari()?;
        self.expect(';')?;
        let items = self.parse_ac_list()?;
        self.expect(')')?;
        Ok(Report {
            reltime,
            source,
            items,
        })
    }
}

/// Whether the apostrophe at `pos` is preceded by an odd run of
/// percent-encoded backslashes, making it content rather than a close.
fn escaped_quote(bytes: &[u8], pos: usize) -> bool {
    let mut count = 0;
    let mut at = pos;
    while at >= 3 && bytes[at - 3..at].eq_ignore_ascii_case(b"%5c") {
        count += 1;
        at -= 3;
    }
    count % 2 == 1
}

fn parse_idseg(text: &str) -> Result<IdSeg, Error> {
    if text.is_empty() {
        return Ok(IdSeg::Null);
    }
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let numeric = !unsigned.is_empty() && unsigned.bytes().all(|byte| byte.is_ascii_digit());
    if numeric {
        text.parse().map(IdSeg::Int).map_err(|_| Error::BadDigit)
    } else {
        Ok(IdSeg::Text(text.to_owned()))
    }
}

/// A type segment is a registry name or an integer enumeration.
fn lookup_type(seg: &str) -> Result<AriType, Error> {
    if seg.is_empty() {
        return Err(Error::UnknownType);
    }
    if let Some(ari_type) = AriType::from_name(seg) {
        return Ok(ari_type);
    }
    let num: i32 = seg.parse().map_err(|_| Error::UnknownType)?;
    AriType::try_from(num).map_err(|_| Error::UnknownType)
}

fn parse_int64(token: &str) -> Result<i64, Error> {
    if let Some(magnitude) = token.strip_prefix('-') {
        let magnitude = util::uint64_decode(magnitude)?;
        if magnitude > (i64::MAX as u64) + 1 {
            return Err(Error::BadDigit);
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        let token = token.strip_prefix('+').unwrap_or(token);
        i64::try_from(util::uint64_decode(token)?).map_err(|_| Error::BadDigit)
    }
}

/// Untyped integers default to signed, overflowing into unsigned.
fn parse_number(token: &str) -> Result<Value, Error> {
    if token.starts_with('-') {
        Ok(Value::Int64(parse_int64(token)?))
    } else {
        let unsigned = token.strip_prefix('+').unwrap_or(token);
        let magnitude = util::uint64_decode(unsigned)?;
        match i64::try_from(magnitude) {
            Ok(value) => Ok(Value::Int64(value)),
            Err(_) => Ok(Value::Uint64(magnitude)),
        }
    }
}

fn looks_float(token: &str) -> bool {
    matches!(token, "NaN" | "Infinity" | "+Infinity" | "-Infinity") || {
        let unsigned = token.trim_start_matches(['+', '-']);
        if unsigned.starts_with("0x") || unsigned.starts_with("0X") {
            unsigned.contains(['p', 'P']) || unsigned.contains('.')
        } else if unsigned.starts_with("0b") || unsigned.starts_with("0B") {
            false
        } else {
            unsigned.contains(['.', 'e', 'E'])
        }
    }
}

fn parse_tstr_token(token: &str) -> Result<String, Error> {
    let bytes = util::percent_decode(token)?;
    let text = String::from_utf8(bytes).map_err(|_| Error::BadUtf8)?;
    if let Some(inner) = text.strip_prefix('"') {
        let inner = inner.strip_suffix('"').ok_or(Error::Expected('"'))?;
        util::slash_unescape(inner)
    } else {
        Ok(text)
    }
}

fn parse_bstr_token(token: &str) -> Result<Vec<u8>, Error> {
    if let Some(rest) = token.strip_prefix("h'") {
        let inner = rest.strip_suffix('\'').ok_or(Error::Expected('\''))?;
        util::base16_decode(inner)
    } else if let Some(rest) = token.strip_prefix("b64'") {
        let inner = rest.strip_suffix('\'').ok_or(Error::Expected('\''))?;
        util::base64_decode(inner)
    } else {
        // quoted UTF-8 text, percent-decoded then unescaped
        let bytes = util::percent_decode(token)?;
        let text = String::from_utf8(bytes).map_err(|_| Error::BadUtf8)?;
        let inner = text
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
            .ok_or(Error::Expected('\''))?;
        Ok(util::slash_unescape(inner)?.into_bytes())
    }
}

/// Interpret a primitive token under an explicit type tag.
fn parse_typed_prim(ari_type: AriType, token: &str) -> Result<Value, Error> {
    match ari_type {
        AriType::Null => match token {
            "null" => Ok(Value::Null),
            _ => Err(Error::BadValue),
        },
        AriType::Bool => match token {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(Error::BadValue),
        },
        AriType::Byte | AriType::Int | AriType::Vast => Ok(Value::Int64(parse_int64(token)?)),
        AriType::Uint | AriType::Uvast => Ok(Value::Uint64(util::uint64_decode(token)?)),
        AriType::Real32 | AriType::Real64 => Ok(Value::Float64(util::float64_decode(token)?)),
        AriType::TextStr | AriType::Label => Ok(Value::TextStr(parse_tstr_token(token)?)),
        AriType::ByteStr | AriType::Cbor => Ok(Value::ByteStr(parse_bstr_token(token)?)),
        AriType::Aritype => {
            // a type name or its enumeration value
            if let Some(named) = AriType::from_name(token) {
                Ok(Value::Int64(i64::from(i32::from(named))))
            } else {
                Ok(Value::Int64(parse_int64(token)?))
            }
        }
        _ => parse_generic_prim(token),
    }
}

/// Interpret a primitive token with no type tag to guide it.
fn parse_generic_prim(token: &str) -> Result<Value, Error> {
    match token {
        "" => Err(Error::BadValue),
        "undefined" => Ok(Value::Undefined),
        "null" => Ok(Value::Null),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => {
            if token.starts_with("h'") || token.starts_with("b64'") || token.starts_with('\'') {
                return Ok(Value::ByteStr(parse_bstr_token(token)?));
            }
            let first = token.as_bytes()[0];
            let numeric = first.is_ascii_digit()
                || first == b'-'
                || first == b'+'
                || matches!(token, "NaN" | "Infinity");
            if numeric {
                if looks_float(token) {
                    return Ok(Value::Float64(util::float64_decode(token)?));
                }
                return parse_number(token);
            }
            if token.starts_with('%') || token.starts_with('"') {
                return Ok(Value::TextStr(parse_tstr_token(token)?));
            }
            if util::is_identity(token) {
                return Ok(Value::TextStr(token.to_owned()));
            }
            Err(Error::BadValue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_forms() {
        assert_eq!(decode("ari:undefined").unwrap(), Ari::undefined());
        assert_eq!(decode("undefined").unwrap(), Ari::undefined());
        assert_eq!(decode("null").unwrap(), Ari::null());
        assert_eq!(decode("true").unwrap(), Ari::from(true));
        assert_eq!(decode("-17").unwrap(), Ari::from(-17i64));
        assert_eq!(decode("0x2A").unwrap(), Ari::from(42i64));
        assert_eq!(decode("0b101").unwrap(), Ari::from(5i64));
        assert_eq!(
            decode("18446744073709551615").unwrap(),
            Ari::from(u64::MAX)
        );
        assert_eq!(decode("1.5").unwrap(), Ari::from(1.5));
        assert_eq!(decode("hello").unwrap(), Ari::from("hello"));
    }

    #[test]
    fn test_typed_primitives() {
        assert_eq!(
            decode("ari:/INT/0b1010").unwrap(),
            Ari::typed_lit(AriType::Int, Value::Int64(10))
        );
        assert_eq!(
            decode("ari:/UINT/42").unwrap(),
            Ari::typed_lit(AriType::Uint, Value::Uint64(42))
        );
        assert_eq!(
            decode("/REAL64/NaN").unwrap(),
            Ari::typed_lit(AriType::Real64, Value::Float64(f64::NAN))
        );
        assert_eq!(
            decode("/ARITYPE/TEXTSTR").unwrap(),
            Ari::typed_lit(AriType::Aritype, Value::Int64(-246))
        );
        assert_eq!(
            decode("/-252/7").unwrap(),
            Ari::typed_lit(AriType::Int, Value::Int64(7))
        );
        assert!(decode("/CTRL/1").is_err());
        assert!(decode("/NOSUCH/1").is_err());
    }

    #[test]
    fn test_reference_forms() {
        let full = decode("ari://example/CTRL/ping").unwrap();
        assert_eq!(
            full,
            Ari::objref(ObjPath::new("example".into(), "CTRL".into(), "ping".into()))
        );
        // lowercase names derive too
        assert_eq!(decode("ari://example/ctrl/ping").unwrap(), full);
        // integer type segment derives the same type
        assert_eq!(decode("ari://example/4/ping").unwrap(), full);

        let ns_only = decode("ari://example/").unwrap();
        assert_eq!(
            ns_only,
            Ari::objref(ObjPath::new("example".into(), IdSeg::Null, IdSeg::Null))
        );

        let numbered = decode("//65535/2/10").unwrap();
        let Ari::Reference(obj) = &numbered else {
            panic!("not a reference")
        };
        assert_eq!(obj.path.ns_id, IdSeg::Int(65535));
        assert_eq!(obj.path.obj_id, IdSeg::Int(10));
        assert_eq!(obj.path.ari_type, Some(AriType::Ident));
    }

    #[test]
    fn test_reference_params() {
        let with_list = decode("ari://adm/CTRL/add(1,2)").unwrap();
        let Ari::Reference(obj) = &with_list else {
            panic!("not a reference")
        };
        assert_eq!(
            obj.params,
            Params::List(vec![Ari::from(1i64), Ari::from(2i64)])
        );

        let with_map = decode("ari://adm/CTRL/add(k=1)").unwrap();
        let Ari::Reference(obj) = &with_map else {
            panic!("not a reference")
        };
        let Params::Map(map) = &obj.params else {
            panic!("not map params")
        };
        assert_eq!(map.get(&Ari::from("k")), Some(&Ari::from(1i64)));
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            decode("ari:/AC/(1,2,3)").unwrap(),
            Ari::ac(vec![Ari::from(1i64), Ari::from(2i64), Ari::from(3i64)])
        );
        assert_eq!(decode("/AC/()").unwrap(), Ari::ac(vec![]));
        assert_eq!(decode("/AM/()").unwrap(), Ari::am(AriMap::new()));

        let tbl = decode("ari:/TBL/c=2;(1,2)(3,4)").unwrap();
        let mut expect = Tbl::new(2);
        expect.push_row(vec![Ari::from(1i64), Ari::from(2i64)]);
        expect.push_row(vec![Ari::from(3i64), Ari::from(4i64)]);
        assert_eq!(tbl, Ari::tbl(expect));
        assert_eq!(
            decode("/TBL/c=2;(1)").unwrap_err(),
            Error::NcolsMismatch
        );

        // nested containers with scheme prefixes on members
        let nested = decode("ari:/AC/(ari:/AC/(a),b)").unwrap();
        assert_eq!(
            nested,
            Ari::ac(vec![Ari::ac(vec![Ari::from("a")]), Ari::from("b")])
        );
    }

    #[test]
    fn test_trailing_garbage() {
        assert_eq!(decode("1,2").unwrap_err(), Error::TrailingGarbage);
        assert_eq!(decode("/AC/(1)x").unwrap_err(), Error::TrailingGarbage);
        assert!(decode("").is_err());
        assert!(decode("ari:").is_err());
    }
}
