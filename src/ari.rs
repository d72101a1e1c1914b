use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use indexmap::IndexMap;

use crate::text;
use crate::types::AriType;

/// An ordered sequence of ARI values (the AC container body).
pub type AriList = Vec<Ari>;

/// A mapping of ARI keys to ARI values (the AM container body).
///
/// Keys compare by structural equality and iteration preserves insertion
/// order. Map equality is order-independent.
pub type AriMap = IndexMap<Ari, Ari>;

/// Seconds and nanoseconds relative to an epoch (TP) or to nothing (TD).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Timespec {
    pub seconds: i64,
    /// Always within `[0, 1_000_000_000)`
    pub nanoseconds: u32,
}

impl Timespec {
    /// Construct with nanosecond overflow carried into the seconds.
    #[must_use]
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds: seconds.saturating_add(i64::from(nanoseconds / 1_000_000_000)),
            nanoseconds: nanoseconds % 1_000_000_000,
        }
    }
}

/// One segment of an object path: absent, textual identifier, or integer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum IdSeg {
    #[default]
    Null,
    Text(String),
    Int(i64),
}

impl IdSeg {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for IdSeg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<i64> for IdSeg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// The `namespace / type / object` triple naming a managed object.
#[derive(Debug, Clone, Default, Eq)]
pub struct ObjPath {
    pub ns_id: IdSeg,
    pub type_id: IdSeg,
    pub obj_id: IdSeg,
    /// Derived from `type_id` when it names a built-in ARI type.
    pub ari_type: Option<AriType>,
}

impl ObjPath {
    /// Build a path, deriving the cached `ari_type` from the type segment.
    #[must_use]
    pub fn new(ns_id: IdSeg, type_id: IdSeg, obj_id: IdSeg) -> Self {
        let ari_type = Self::derive_type(&type_id);
        Self {
            ns_id,
            type_id,
            obj_id,
            ari_type,
        }
    }

    fn derive_type(type_id: &IdSeg) -> Option<AriType> {
        match type_id {
            IdSeg::Null => None,
            IdSeg::Text(name) => AriType::from_name(name),
            IdSeg::Int(num) => i32::try_from(*num)
                .ok()
                .and_then(|num| AriType::try_from(num).ok()),
        }
    }
}

impl PartialEq for ObjPath {
    fn eq(&self, other: &Self) -> bool {
        // prefer derived values
        let type_equal = match (self.ari_type, other.ari_type) {
            (Some(left), Some(right)) => left == right,
            _ => self.type_id == other.type_id,
        };
        self.ns_id == other.ns_id && type_equal && self.obj_id == other.obj_id
    }
}

impl Hash for ObjPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns_id.hash(state);
        match self.ari_type {
            Some(ari_type) => i32::from(ari_type).hash(state),
            None => self.type_id.hash(state),
        }
        self.obj_id.hash(state);
    }
}

/// Parameters attached to an object reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Params {
    #[default]
    None,
    List(AriList),
    Map(AriMap),
}

impl Hash for Params {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::None => state.write_u8(0),
            Self::List(items) => {
                state.write_u8(1);
                items.hash(state);
            }
            Self::Map(map) => {
                state.write_u8(2);
                hash_am(map, state);
            }
        }
    }
}

/// A reference to a named management object, optionally parameterized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub path: ObjPath,
    pub params: Params,
}

/// A table literal: row-major cells with a fixed column count.
///
/// The cell count is always a multiple of `ncols`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tbl {
    pub ncols: usize,
    pub items: AriList,
}

impl Tbl {
    #[must_use]
    pub fn new(ncols: usize) -> Self {
        Self {
            ncols,
            items: Vec::new(),
        }
    }

    /// Append one row. Returns `false` and leaves the table unchanged when
    /// the row arity does not match `ncols`.
    pub fn push_row(&mut self, row: AriList) -> bool {
        if row.len() != self.ncols || self.ncols == 0 {
            return false;
        }
        self.items.extend(row);
        true
    }

    #[must_use]
    pub fn nrows(&self) -> usize {
        if self.ncols == 0 {
            0
        } else {
            self.items.len() / self.ncols
        }
    }
}

impl Hash for Tbl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.items.hash(state);
    }
}

/// An execution-set literal: a nonce and a list of target ARIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecSet {
    pub nonce: Box<Ari>,
    pub targets: AriList,
}

/// One report within a report set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Report {
    pub reltime: Ari,
    pub source: Ari,
    pub items: AriList,
}

/// A report-set literal: a nonce, a reference time, and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RptSet {
    pub nonce: Box<Ari>,
    pub reftime: Box<Ari>,
    pub reports: Vec<Report>,
}

/// Payload of a literal ARI.
///
/// Container and [`Timespec`] payloads only occur together with the
/// matching explicit type tag on the enclosing [`Lit`].
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Uint64(u64),
    Int64(i64),
    Float64(f64),
    TextStr(String),
    ByteStr(Vec<u8>),
    Timespec(Timespec),
    Ac(AriList),
    Am(AriMap),
    Tbl(Tbl),
    ExecSet(ExecSet),
    RptSet(RptSet),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;

        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Bool(left), Bool(right)) => left == right,
            (Uint64(left), Uint64(right)) => left == right,
            (Int64(left), Int64(right)) => left == right,
            (Float64(left), Float64(right)) => {
                if left.is_nan() != right.is_nan() {
                    false
                } else {
                    left.is_nan() || left == right
                }
            }
            (TextStr(left), TextStr(right)) => left == right,
            (ByteStr(left), ByteStr(right)) => left == right,
            (Timespec(left), Timespec(right)) => left == right,
            (Ac(left), Ac(right)) => left == right,
            (Am(left), Am(right)) => left == right,
            (Tbl(left), Tbl(right)) => left == right,
            (ExecSet(left), ExecSet(right)) => left == right,
            (RptSet(left), RptSet(right)) => left == right,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use Value::*;

        match self {
            Undefined => state.write_u8(0),
            Null => state.write_u8(1),
            Bool(value) => {
                state.write_u8(2);
                value.hash(state);
            }
            Uint64(value) => {
                state.write_u8(3);
                value.hash(state);
            }
            Int64(value) => {
                state.write_u8(4);
                value.hash(state);
            }
            Float64(value) => {
                state.write_u8(5);
                state.write_u64(canonical_float_bits(*value));
            }
            TextStr(value) => {
                state.write_u8(6);
                value.hash(state);
            }
            ByteStr(value) => {
                state.write_u8(7);
                value.hash(state);
            }
            Timespec(value) => {
                state.write_u8(8);
                value.hash(state);
            }
            Ac(items) => {
                state.write_u8(9);
                items.hash(state);
            }
            Am(map) => {
                state.write_u8(10);
                hash_am(map, state);
            }
            Tbl(tbl) => {
                state.write_u8(11);
                tbl.hash(state);
            }
            ExecSet(set) => {
                state.write_u8(12);
                set.hash(state);
            }
            RptSet(set) => {
                state.write_u8(13);
                set.hash(state);
            }
        }
    }
}

/// All NaNs share one bucket and negative zero folds into zero, so that
/// equal floats always hash alike.
fn canonical_float_bits(value: f64) -> u64 {
    if value.is_nan() {
        u64::MAX
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

/// Map entries are mixed commutatively so the hash is independent of
/// insertion order, matching the order-independent map equality.
fn hash_am<H: Hasher>(map: &AriMap, state: &mut H) {
    state.write_usize(map.len());
    let mut accum: u64 = 0;
    for (key, value) in map {
        let mut entry = DefaultHasher::new();
        key.hash(&mut entry);
        value.hash(&mut entry);
        accum = accum.wrapping_add(entry.finish());
    }
    state.write_u64(accum);
}

/// A typed literal value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lit {
    /// Present when the text form carries an explicit `/TYPE/` tag.
    pub ari_type: Option<AriType>,
    pub value: Value,
}

impl Hash for Lit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ari_type.is_some().hash(state);
        if let Some(ari_type) = self.ari_type {
            i32::from(ari_type).hash(state);
            if let Value::Tbl(tbl) = &self.value {
                // include metadata, contents hash on their own
                tbl.ncols.hash(state);
            }
        }
        self.value.hash(state);
    }
}

/// An ARI value: either a reference to a named management object or a
/// typed literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ari {
    Reference(ObjRef),
    Literal(Lit),
}

impl Default for Ari {
    fn default() -> Self {
        Self::undefined()
    }
}

impl Hash for Ari {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Reference(obj) => {
                state.write_u8(1);
                obj.hash(state);
            }
            Self::Literal(lit) => {
                state.write_u8(0);
                lit.hash(state);
            }
        }
    }
}

impl Ari {
    #[must_use]
    pub const fn undefined() -> Self {
        Self::Literal(Lit {
            ari_type: None,
            value: Value::Undefined,
        })
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Lit {
            ari_type: None,
            value: Value::Null,
        })
    }

    /// An untyped literal.
    #[must_use]
    pub fn lit(value: Value) -> Self {
        Self::Literal(Lit {
            ari_type: None,
            value,
        })
    }

    /// A literal with an explicit type tag.
    #[must_use]
    pub fn typed_lit(ari_type: AriType, value: Value) -> Self {
        Self::Literal(Lit {
            ari_type: Some(ari_type),
            value,
        })
    }

    #[must_use]
    pub fn ac(items: AriList) -> Self {
        Self::typed_lit(AriType::Ac, Value::Ac(items))
    }

    #[must_use]
    pub fn am(map: AriMap) -> Self {
        Self::typed_lit(AriType::Am, Value::Am(map))
    }

    #[must_use]
    pub fn tbl(tbl: Tbl) -> Self {
        Self::typed_lit(AriType::Tbl, Value::Tbl(tbl))
    }

    #[must_use]
    pub fn execset(nonce: Ari, targets: AriList) -> Self {
        Self::typed_lit(
            AriType::ExecSet,
            Value::ExecSet(ExecSet {
                nonce: Box::new(nonce),
                targets,
            }),
        )
    }

    #[must_use]
    pub fn rptset(set: RptSet) -> Self {
        Self::typed_lit(AriType::RptSet, Value::RptSet(set))
    }

    /// A time point relative to the DTN epoch.
    #[must_use]
    pub fn tp(time: Timespec) -> Self {
        Self::typed_lit(AriType::Tp, Value::Timespec(time))
    }

    /// A time difference.
    #[must_use]
    pub fn td(time: Timespec) -> Self {
        Self::typed_lit(AriType::Td, Value::Timespec(time))
    }

    /// An unparameterized object reference.
    #[must_use]
    pub fn objref(path: ObjPath) -> Self {
        Self::Reference(ObjRef {
            path,
            params: Params::None,
        })
    }

    #[must_use]
    pub fn objref_with_params(path: ObjPath, params: Params) -> Self {
        Self::Reference(ObjRef { path, params })
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(
            self,
            Self::Literal(Lit {
                value: Value::Undefined,
                ..
            })
        )
    }

    /// Reset to the undefined literal, dropping prior contents.
    pub fn reset(&mut self) {
        *self = Self::undefined();
    }

    /// If this is a literal, returns it. Returns `None` otherwise.
    #[must_use]
    pub fn as_lit(&self) -> Option<&Lit> {
        match self {
            Self::Literal(lit) => Some(lit),
            Self::Reference(_) => None,
        }
    }

    /// If this is an object reference, returns it. Returns `None` otherwise.
    #[must_use]
    pub fn as_ref_obj(&self) -> Option<&ObjRef> {
        match self {
            Self::Reference(obj) => Some(obj),
            Self::Literal(_) => None,
        }
    }

    /// Content hash over the whole value tree.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut state = DefaultHasher::new();
        self.hash(&mut state);
        state.finish()
    }
}

impl From<bool> for Ari {
    fn from(value: bool) -> Self {
        Self::lit(Value::Bool(value))
    }
}

impl From<i64> for Ari {
    fn from(value: i64) -> Self {
        Self::lit(Value::Int64(value))
    }
}

impl From<u64> for Ari {
    fn from(value: u64) -> Self {
        Self::lit(Value::Uint64(value))
    }
}

impl From<f64> for Ari {
    fn from(value: f64) -> Self {
        Self::lit(Value::Float64(value))
    }
}

impl From<&str> for Ari {
    fn from(value: &str) -> Self {
        Self::lit(Value::TextStr(value.to_owned()))
    }
}

impl From<String> for Ari {
    fn from(value: String) -> Self {
        Self::lit(Value::TextStr(value))
    }
}

impl From<Vec<u8>> for Ari {
    fn from(value: Vec<u8>) -> Self {
        Self::lit(Value::ByteStr(value))
    }
}

impl fmt::Display for Ari {
    /// URI form with default encoding options.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        text::encode(&mut buf, self, text::EncodeOpts::default()).map_err(|_| fmt::Error)?;
        f.write_str(&buf)
    }
}

impl FromStr for Ari {
    type Err = text::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        text::decode(s)
    }
}

#[test]
fn test_float_equality() {
    let nan = Ari::from(f64::NAN);
    assert_eq!(nan, nan.clone());
    assert_eq!(nan.content_hash(), nan.clone().content_hash());
    assert_ne!(Ari::from(f64::NAN), Ari::from(1.0));
    assert_eq!(Ari::from(0.0), Ari::from(-0.0));
    assert_eq!(Ari::from(0.0).content_hash(), Ari::from(-0.0).content_hash());
    assert_eq!(Ari::from(f64::INFINITY), Ari::from(f64::INFINITY));
    assert_ne!(Ari::from(f64::INFINITY), Ari::from(f64::NEG_INFINITY));
}

#[test]
fn test_objpath_derived_type_preference() {
    // same derived type through different segments
    let by_name = ObjPath::new("adm".into(), "CTRL".into(), "reset".into());
    let by_int = ObjPath::new("adm".into(), IdSeg::Int(4), "reset".into());
    assert_eq!(by_name.ari_type, Some(AriType::Ctrl));
    assert_eq!(by_int.ari_type, Some(AriType::Ctrl));
    assert_eq!(by_name, by_int);

    let mut left = DefaultHasher::new();
    let mut right = DefaultHasher::new();
    by_name.hash(&mut left);
    by_int.hash(&mut right);
    assert_eq!(left.finish(), right.finish());

    let other = ObjPath::new("adm".into(), "CONST".into(), "reset".into());
    assert_ne!(by_name, other);
}

#[test]
fn test_am_order_independence() {
    let forward: AriMap = [
        (Ari::from(1i64), Ari::from("a")),
        (Ari::from(2i64), Ari::from("b")),
        (Ari::from(3i64), Ari::from("c")),
    ]
    .into_iter()
    .collect();
    let reverse: AriMap = [
        (Ari::from(3i64), Ari::from("c")),
        (Ari::from(1i64), Ari::from("a")),
        (Ari::from(2i64), Ari::from("b")),
    ]
    .into_iter()
    .collect();

    let left = Ari::am(forward);
    let right = Ari::am(reverse);
    assert_eq!(left, right);
    assert_eq!(left.content_hash(), right.content_hash());
    // iteration still preserves insertion order
    let Ari::Literal(Lit {
        value: Value::Am(map),
        ..
    }) = &right
    else {
        unreachable!()
    };
    assert_eq!(map.first().map(|(k, _)| k), Some(&Ari::from(3i64)));
}

#[test]
fn test_tbl_rows() {
    let mut tbl = Tbl::new(2);
    assert!(tbl.push_row(vec![Ari::from(1i64), Ari::from(2i64)]));
    assert!(!tbl.push_row(vec![Ari::from(3i64)]));
    assert!(tbl.push_row(vec![Ari::from(3i64), Ari::from(4i64)]));
    assert_eq!(tbl.nrows(), 2);
    assert_eq!(tbl.items.len(), 4);
}

#[test]
fn test_clone_is_deep_and_equal() {
    let original = Ari::ac(vec![
        Ari::from(1i64),
        Ari::execset(Ari::null(), vec![Ari::from("target")]),
    ]);
    let copy = original.clone();
    assert_eq!(original, copy);
    assert_eq!(original.content_hash(), copy.content_hash());

    let mut changed = copy.clone();
    changed.reset();
    assert!(changed.is_undefined());
    assert_eq!(original, copy);
}
