//! DTNMA ARI data model and text codec in Rust
//!
//! An ARI is either a reference to a named management object or a typed
//! literal whose value may be a primitive, a time value, or a recursive
//! container. This crate holds the value model, structural equality and
//! hashing, a generic visitor and translate traversal, and the URI-form
//! text codec.

/// ARI value model definitions
pub mod ari;
/// Text codec and its primitive codecs
pub mod text;
/// Built-in ARI type enumeration
pub mod types;
/// Tree traversal and translation
pub mod visit;

pub use self::ari::{
    Ari, AriList, AriMap, ExecSet, IdSeg, Lit, ObjPath, ObjRef, Params, Report, RptSet, Tbl,
    Timespec, Value,
};
pub use self::text::{EncodeOpts, decode as text_decode, encode as text_encode};
pub use self::types::AriType;
pub use self::visit::{AriTranslator, AriVisitor, VisitCtx, translate, visit};
