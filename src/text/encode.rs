//! Encoder producing the URI text form.

use super::Error;
use super::util::{self, FloatForm, IntBase};
use crate::ari::{Ari, AriMap, ExecSet, IdSeg, Lit, ObjRef, Params, Report, RptSet, Tbl, Value};
use crate::types::AriType;

/// Where the `ari:` scheme appears in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemePrefix {
    /// Never prefix with a scheme
    None,
    /// Prefix only the outermost value
    #[default]
    First,
    /// Prefix all values, including container contents
    All,
}

/// How explicit type tags are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeShow {
    /// Show whatever the original decoding was
    Orig,
    /// Always show the text name
    #[default]
    Text,
    /// Always show the integer enumeration
    Int,
}

/// Byte string output forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BstrForm {
    /// Attempt to output as quoted text
    Raw,
    /// Base16 per Section 8 of RFC 4648
    #[default]
    Base16,
    /// URL-safe Base64 per Section 5 of RFC 4648
    Base64Url,
}

/// Parameters for ARI text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOpts {
    pub scheme_prefix: SchemePrefix,
    pub show_ari_type: TypeShow,
    pub int_base: IntBase,
    pub float_form: FloatForm,
    /// Leave identifier-shaped text strings unquoted
    pub text_identity: bool,
    pub bstr_form: BstrForm,
    /// ISO text form for TP/TD values, decimal fraction otherwise
    pub time_text: bool,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            scheme_prefix: SchemePrefix::First,
            show_ari_type: TypeShow::Text,
            int_base: IntBase::Dec,
            float_form: FloatForm::Auto,
            text_identity: true,
            bstr_form: BstrForm::Base16,
            time_text: true,
        }
    }
}

/// Encode an ARI to text form, appending to `out`.
///
/// On error the output holds a truncated but consistent prefix.
pub fn encode(out: &mut String, ari: &Ari, opts: EncodeOpts) -> Result<(), Error> {
    let mut state = Encoder {
        out,
        depth: 0,
        opts,
    };
    state.encode_ari(ari)
}

struct Encoder<'a> {
    out: &'a mut String,
    /// Current nesting depth, the top ARI is depth zero.
    depth: usize,
    opts: EncodeOpts,
}

impl Encoder<'_> {
    fn encode_ari(&mut self, ari: &Ari) -> Result<(), Error> {
        match ari {
            Ari::Reference(obj) => self.encode_objref(obj),
            Ari::Literal(lit) => self.encode_lit(lit),
        }
    }

    fn prefix(&mut self) {
        let emit = match self.opts.scheme_prefix {
            SchemePrefix::None => false,
            SchemePrefix::First => self.depth == 0,
            SchemePrefix::All => true,
        };
        if emit {
            self.out.push_str("ari:");
        }
    }

    fn encode_idseg(&mut self, seg: &IdSeg) {
        match seg {
            IdSeg::Null => {}
            IdSeg::Text(text) => self.out.push_str(text),
            IdSeg::Int(num) => self.out.push_str(&num.to_string()),
        }
    }

    fn encode_aritype(&mut self, ari_type: AriType, orig: Option<&IdSeg>) {
        match self.opts.show_ari_type {
            TypeShow::Text => self.out.push_str(ari_type.name()),
            TypeShow::Int => self.out.push_str(&i32::from(ari_type).to_string()),
            TypeShow::Orig => match orig {
                Some(seg) => self.encode_idseg(seg),
                None => self.out.push_str(ari_type.name()),
            },
        }
    }

    fn encode_objref(&mut self, obj: &ObjRef) -> Result<(), Error> {
        self.prefix();

        self.out.push_str("//");
        self.encode_idseg(&obj.path.ns_id);

        self.out.push('/');
        if obj.path.type_id.is_null() {
            // case for a namespace reference only
            return Ok(());
        }

        match obj.path.ari_type {
            Some(ari_type) => self.encode_aritype(ari_type, Some(&obj.path.type_id)),
            None => self.encode_idseg(&obj.path.type_id),
        }
        self.out.push('/');
        self.encode_idseg(&obj.path.obj_id);

        match &obj.params {
            Params::None => Ok(()),
            Params::List(items) => self.encode_ac(items),
            Params::Map(map) => self.encode_am(map),
        }
    }

    fn encode_ac(&mut self, items: &[Ari]) -> Result<(), Error> {
        self.depth += 1;
        self.out.push('(');
        let mut sep = false;
        for item in items {
            if sep {
                self.out.push(',');
            }
            sep = true;
            self.encode_ari(item)?;
        }
        self.depth -= 1;
        self.out.push(')');
        Ok(())
    }

    fn encode_am(&mut self, map: &AriMap) -> Result<(), Error> {
        self.depth += 1;
        self.out.push('(');
        let mut sep = false;
        for (key, value) in map {
            if sep {
                self.out.push(',');
            }
            sep = true;
            self.encode_ari(key)?;
            self.out.push('=');
            self.encode_ari(value)?;
        }
        self.depth -= 1;
        self.out.push(')');
        Ok(())
    }

    fn encode_tbl(&mut self, tbl: &Tbl) -> Result<(), Error> {
        if (tbl.ncols == 0 && !tbl.items.is_empty())
            || (tbl.ncols != 0 && tbl.items.len() % tbl.ncols != 0)
        {
            return Err(Error::NcolsMismatch);
        }
        self.out.push_str(&format!("c={};", tbl.ncols));
        if tbl.ncols == 0 {
            return Ok(());
        }

        self.depth += 1;
        for row in tbl.items.chunks(tbl.ncols) {
            self.out.push('(');
            let mut sep = false;
            for item in row {
                if sep {
                    self.out.push(',');
                }
                sep = true;
                if let Err(err) = self.encode_ari(item) {
                    self.depth -= 1;
                    return Err(err);
                }
            }
            self.out.push(')');
        }
        self.depth -= 1;
        Ok(())
    }

    /// Metadata payloads never repeat the scheme, whatever the outer
    /// setting.
    fn encode_meta(&mut self, tag: char, ari: &Ari) -> Result<(), Error> {
        let saved = self.opts.scheme_prefix;
        self.opts.scheme_prefix = SchemePrefix::None;

        self.out.push(tag);
        self.out.push('=');
        let result = self.encode_ari(ari);
        self.out.push(';');

        self.opts.scheme_prefix = saved;
        result
    }

    fn encode_execset(&mut self, set: &ExecSet) -> Result<(), Error> {
        self.encode_meta('n', &set.nonce)?;
        self.encode_ac(&set.targets)
    }

    fn encode_report(&mut self, report: &Report) -> Result<(), Error> {
        self.out.push('(');
        self.encode_meta('t', &report.reltime)?;
        self.encode_meta('s', &report.source)?;
        self.encode_ac(&report.items)?;
        self.out.push(')');
        Ok(())
    }

    fn encode_rptset(&mut self, set: &RptSet) -> Result<(), Error> {
        self.depth += 1;
        let result = (|| -> Result<(), Error> {
            self.encode_meta('n', &set.nonce)?;
            self.encode_meta('r', &set.reftime)?;
            for report in &set.reports {
                self.encode_report(report)?;
            }
            Ok(())
        })();
        self.depth -= 1;
        result
    }

    fn encode_lit(&mut self, lit: &Lit) -> Result<(), Error> {
        self.prefix();

        if let Some(ari_type) = lit.ari_type {
            self.out.push('/');
            self.encode_aritype(ari_type, None);
            self.out.push('/');

            match (ari_type, &lit.value) {
                (AriType::Tp, Value::Timespec(time)) => {
                    if self.opts.time_text {
                        util::utctime_encode(self.out, time, true)?;
                    } else {
                        util::decfrac_encode(self.out, time);
                    }
                    return Ok(());
                }
                (AriType::Td, Value::Timespec(time)) => {
                    if self.opts.time_text {
                        util::timeperiod_encode(self.out, time);
                    } else {
                        util::decfrac_encode(self.out, time);
                    }
                    return Ok(());
                }
                _ => {}
            }
        }

        match &lit.value {
            Value::Ac(items) => self.encode_ac(items),
            Value::Am(map) => self.encode_am(map),
            Value::Tbl(tbl) => self.encode_tbl(tbl),
            Value::ExecSet(set) => self.encode_execset(set),
            Value::RptSet(set) => self.encode_rptset(set),
            Value::Timespec(_) => Err(Error::Unrepresentable("untagged time value")),
            Value::Undefined => {
                self.out.push_str("undefined");
                Ok(())
            }
            Value::Null => {
                self.out.push_str("null");
                Ok(())
            }
            Value::Bool(value) => {
                self.out.push_str(if *value { "true" } else { "false" });
                Ok(())
            }
            Value::Uint64(value) => {
                util::uint64_encode(self.out, *value, self.opts.int_base);
                Ok(())
            }
            Value::Int64(value) => {
                if *value < 0 {
                    self.out.push('-');
                }
                util::uint64_encode(self.out, value.unsigned_abs(), self.opts.int_base);
                Ok(())
            }
            Value::Float64(value) => {
                util::float64_encode(self.out, *value, self.opts.float_form);
                Ok(())
            }
            Value::TextStr(text) => {
                self.encode_tstr(text);
                Ok(())
            }
            Value::ByteStr(bytes) => {
                self.encode_bstr(bytes);
                Ok(())
            }
        }
    }

    fn encode_tstr(&mut self, text: &str) {
        // keywords must stay quoted or they decode as the keyword value
        let keyword = matches!(
            text,
            "undefined" | "null" | "true" | "false" | "NaN" | "Infinity"
        );
        if self.opts.text_identity && !keyword && util::is_identity(text) {
            self.out.push_str(text);
        } else {
            let mut buf = String::with_capacity(text.len() + 2);
            buf.push('"');
            util::slash_escape(&mut buf, text, '"');
            buf.push('"');
            util::percent_encode(self.out, buf.as_bytes(), util::ARI_URI_SAFE);
        }
    }

    fn encode_bstr(&mut self, bytes: &[u8]) {
        match self.opts.bstr_form {
            BstrForm::Raw => match std::str::from_utf8(bytes) {
                Ok(text) if !bytes.contains(&0) => {
                    let mut buf = String::with_capacity(bytes.len() + 2);
                    buf.push('\'');
                    util::slash_escape(&mut buf, text, '\'');
                    buf.push('\'');
                    util::percent_encode(self.out, buf.as_bytes(), util::ARI_URI_SAFE);
                }
                _ => {
                    // this value cannot be represented as text
                    self.out.push_str("h'");
                    util::base16_encode(self.out, bytes, true);
                    self.out.push('\'');
                }
            },
            BstrForm::Base16 => {
                self.out.push_str("h'");
                util::base16_encode(self.out, bytes, true);
                self.out.push('\'');
            }
            BstrForm::Base64Url => {
                self.out.push_str("b64'");
                util::base64_encode(self.out, bytes, true);
                self.out.push('\'');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ari::ObjPath;

    fn to_text(ari: &Ari, opts: EncodeOpts) -> String {
        let mut out = String::new();
        encode(&mut out, ari, opts).unwrap();
        out
    }

    #[test]
    fn test_scheme_prefix_modes() {
        let ari = Ari::ac(vec![Ari::from(1i64), Ari::from(2i64)]);
        let mut opts = EncodeOpts::default();
        assert_eq!(to_text(&ari, opts), "ari:/AC/(1,2)");
        opts.scheme_prefix = SchemePrefix::None;
        assert_eq!(to_text(&ari, opts), "/AC/(1,2)");
        opts.scheme_prefix = SchemePrefix::All;
        assert_eq!(to_text(&ari, opts), "ari:/AC/(ari:1,ari:2)");
    }

    #[test]
    fn test_type_show_modes() {
        let reference = Ari::objref(ObjPath::new("adm".into(), "CTRL".into(), "ping".into()));
        let literal = Ari::typed_lit(AriType::Int, Value::Int64(3));
        let mut opts = EncodeOpts::default();
        assert_eq!(to_text(&reference, opts), "ari://adm/CTRL/ping");
        assert_eq!(to_text(&literal, opts), "ari:/INT/3");
        opts.show_ari_type = TypeShow::Int;
        assert_eq!(to_text(&reference, opts), "ari://adm/4/ping");
        assert_eq!(to_text(&literal, opts), "ari:/-252/3");
        opts.show_ari_type = TypeShow::Orig;
        // references keep their original segment, literals have none
        let lowered = Ari::objref(ObjPath::new("adm".into(), "ctrl".into(), "ping".into()));
        assert_eq!(to_text(&lowered, opts), "ari://adm/ctrl/ping");
        assert_eq!(to_text(&literal, opts), "ari:/INT/3");
    }

    #[test]
    fn test_metadata_suppresses_scheme() {
        let set = Ari::execset(Ari::from(123u64), vec![Ari::from("tgt")]);
        let mut opts = EncodeOpts::default();
        opts.scheme_prefix = SchemePrefix::All;
        assert_eq!(to_text(&set, opts), "ari:/EXECSET/n=123;(ari:tgt)");
    }

    #[test]
    fn test_namespace_only_reference() {
        let ari = Ari::objref(ObjPath::new("example".into(), IdSeg::Null, IdSeg::Null));
        assert_eq!(to_text(&ari, EncodeOpts::default()), "ari://example/");
    }

    #[test]
    fn test_untagged_time_is_rejected() {
        let bare = Ari::lit(Value::Timespec(crate::ari::Timespec::new(1, 0)));
        let mut out = String::new();
        assert_eq!(
            encode(&mut out, &bare, EncodeOpts::default()),
            Err(Error::Unrepresentable("untagged time value"))
        );
    }

    #[test]
    fn test_tbl_shape_is_checked() {
        let broken = Ari::tbl(Tbl {
            ncols: 2,
            items: vec![Ari::from(1i64)],
        });
        let mut out = String::new();
        assert_eq!(
            encode(&mut out, &broken, EncodeOpts::default()),
            Err(Error::NcolsMismatch)
        );
    }
}
