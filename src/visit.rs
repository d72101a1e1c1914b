use crate::ari::{Ari, AriList, AriMap, ExecSet, Lit, ObjPath, ObjRef, Params, Report, RptSet, Tbl, Value};

/// Context handed to every visitor callback.
pub struct VisitCtx<'a> {
    /// The ARI whose contents are being visited, absent at the root.
    pub parent: Option<&'a Ari>,
    /// True while descending into a map key, false in the paired value.
    pub is_map_key: bool,
}

/// A visitor which receives callbacks while walking an ARI tree.
///
/// Visit order is pre-order at each node: [`visit_ari`] fires first, then
/// the variant-specific callbacks, then recursion into children (list in
/// order, map in insertion order, table row-major, report set in
/// insertion order). Returning an error aborts the walk and the first
/// error is returned verbatim.
///
/// [`visit_ari`]: AriVisitor::visit_ari
pub trait AriVisitor {
    type Error;

    fn visit_ari(&mut self, _ari: &Ari, _ctx: &VisitCtx) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_ref(&mut self, _obj: &ObjRef, _ctx: &VisitCtx) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_objpath(&mut self, _path: &ObjPath, _ctx: &VisitCtx) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_lit(&mut self, _lit: &Lit, _ctx: &VisitCtx) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walk an ARI tree read-only, invoking the visitor at each node.
pub fn visit<V: AriVisitor>(ari: &Ari, visitor: &mut V) -> Result<(), V::Error> {
    let ctx = VisitCtx {
        parent: None,
        is_map_key: false,
    };
    visit_ari(ari, visitor, &ctx)
}

fn visit_ari<V: AriVisitor>(ari: &Ari, visitor: &mut V, ctx: &VisitCtx) -> Result<(), V::Error> {
    // visit main ARI first
    visitor.visit_ari(ari, ctx)?;

    let sub_ctx = VisitCtx {
        parent: Some(ari),
        is_map_key: false,
    };

    // dive into contents
    match ari {
        Ari::Reference(obj) => {
            visitor.visit_ref(obj, &sub_ctx)?;
            visitor.visit_objpath(&obj.path, &sub_ctx)?;
            match &obj.params {
                Params::None => {}
                Params::List(items) => visit_list(items, visitor, &sub_ctx)?,
                Params::Map(map) => visit_map(map, visitor, &sub_ctx)?,
            }
        }
        Ari::Literal(lit) => {
            visitor.visit_lit(lit, &sub_ctx)?;
            match &lit.value {
                Value::Ac(items) => visit_list(items, visitor, &sub_ctx)?,
                Value::Am(map) => visit_map(map, visitor, &sub_ctx)?,
                Value::Tbl(tbl) => visit_list(&tbl.items, visitor, &sub_ctx)?,
                Value::ExecSet(set) => {
                    visit_ari(&set.nonce, visitor, &sub_ctx)?;
                    visit_list(&set.targets, visitor, &sub_ctx)?;
                }
                Value::RptSet(set) => {
                    visit_ari(&set.nonce, visitor, &sub_ctx)?;
                    visit_ari(&set.reftime, visitor, &sub_ctx)?;
                    for report in &set.reports {
                        visit_ari(&report.reltime, visitor, &sub_ctx)?;
                        visit_ari(&report.source, visitor, &sub_ctx)?;
                        visit_list(&report.items, visitor, &sub_ctx)?;
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn visit_list<V: AriVisitor>(
    items: &[Ari],
    visitor: &mut V,
    ctx: &VisitCtx,
) -> Result<(), V::Error> {
    for item in items {
        visit_ari(item, visitor, ctx)?;
    }
    Ok(())
}

fn visit_map<V: AriVisitor>(map: &AriMap, visitor: &mut V, ctx: &VisitCtx) -> Result<(), V::Error> {
    for (key, value) in map {
        let key_ctx = VisitCtx {
            parent: ctx.parent,
            is_map_key: true,
        };
        visit_ari(key, visitor, &key_ctx)?;

        let value_ctx = VisitCtx {
            parent: ctx.parent,
            is_map_key: false,
        };
        visit_ari(value, visitor, &value_ctx)?;
    }
    Ok(())
}

/// Node rewrites applied while copying an ARI tree.
///
/// A callback returning `Ok(None)` means "deep-copy this node". Children
/// of containers are translated recursively with the same translator.
pub trait AriTranslator {
    type Error;

    /// Whole-node rewrite; a `Some` result replaces the node and its
    /// children without further recursion.
    fn map_ari(&mut self, _ari: &Ari) -> Result<Option<Ari>, Self::Error> {
        Ok(None)
    }

    fn map_objpath(&mut self, _path: &ObjPath) -> Result<Option<ObjPath>, Self::Error> {
        Ok(None)
    }

    /// Rewrite for non-container literals.
    fn map_lit(&mut self, _lit: &Lit) -> Result<Option<Lit>, Self::Error> {
        Ok(None)
    }
}

/// Produce a new ARI shaped like the input with per-node rewrites.
/// The source tree is not consumed.
pub fn translate<T: AriTranslator>(ari: &Ari, translator: &mut T) -> Result<Ari, T::Error> {
    if let Some(mapped) = translator.map_ari(ari)? {
        return Ok(mapped);
    }

    match ari {
        Ari::Reference(obj) => {
            let path = match translator.map_objpath(&obj.path)? {
                Some(mapped) => mapped,
                None => obj.path.clone(),
            };
            let params = match &obj.params {
                Params::None => Params::None,
                Params::List(items) => Params::List(translate_list(items, translator)?),
                Params::Map(map) => Params::Map(translate_map(map, translator)?),
            };
            Ok(Ari::Reference(ObjRef { path, params }))
        }
        Ari::Literal(lit) => {
            let value = match &lit.value {
                Value::Ac(items) => Value::Ac(translate_list(items, translator)?),
                Value::Am(map) => Value::Am(translate_map(map, translator)?),
                Value::Tbl(tbl) => Value::Tbl(Tbl {
                    ncols: tbl.ncols,
                    items: translate_list(&tbl.items, translator)?,
                }),
                Value::ExecSet(set) => Value::ExecSet(ExecSet {
                    nonce: Box::new(translate(&set.nonce, translator)?),
                    targets: translate_list(&set.targets, translator)?,
                }),
                Value::RptSet(set) => {
                    let mut reports = Vec::with_capacity(set.reports.len());
                    for report in &set.reports {
                        reports.push(Report {
                            reltime: translate(&report.reltime, translator)?,
                            source: translate(&report.source, translator)?,
                            items: translate_list(&report.items, translator)?,
                        });
                    }
                    Value::RptSet(RptSet {
                        nonce: Box::new(translate(&set.nonce, translator)?),
                        reftime: Box::new(translate(&set.reftime, translator)?),
                        reports,
                    })
                }
                _ => {
                    let mapped = match translator.map_lit(lit)? {
                        Some(mapped) => mapped,
                        None => lit.clone(),
                    };
                    return Ok(Ari::Literal(mapped));
                }
            };
            Ok(Ari::Literal(Lit {
                ari_type: lit.ari_type,
                value,
            }))
        }
    }
}

fn translate_list<T: AriTranslator>(
    items: &[Ari],
    translator: &mut T,
) -> Result<AriList, T::Error> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(translate(item, translator)?);
    }
    Ok(out)
}

fn translate_map<T: AriTranslator>(map: &AriMap, translator: &mut T) -> Result<AriMap, T::Error> {
    let mut out = AriMap::with_capacity(map.len());
    for (key, value) in map {
        let key = translate(key, translator)?;
        let value = translate(value, translator)?;
        out.insert(key, value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ari::{IdSeg, Timespec};
    use crate::types::AriType;

    /// Records which callbacks fire, in order.
    struct Tracer(Vec<String>);

    impl AriVisitor for Tracer {
        type Error = ();

        fn visit_ari(&mut self, ari: &Ari, ctx: &VisitCtx) -> Result<(), ()> {
            let kind = match ari {
                Ari::Reference(_) => "ref",
                Ari::Literal(_) => "lit",
            };
            let key = if ctx.is_map_key { " key" } else { "" };
            self.0.push(format!("ari {kind}{key}"));
            Ok(())
        }

        fn visit_objpath(&mut self, path: &ObjPath, _ctx: &VisitCtx) -> Result<(), ()> {
            if let IdSeg::Text(ns) = &path.ns_id {
                self.0.push(format!("objpath {ns}"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_preorder_walk() {
        let ari = Ari::ac(vec![
            Ari::objref(ObjPath::new("adm".into(), "CTRL".into(), "ping".into())),
            Ari::from(3i64),
        ]);
        let mut tracer = Tracer(Vec::new());
        visit(&ari, &mut tracer).unwrap();
        assert_eq!(
            tracer.0,
            vec!["ari lit", "ari ref", "objpath adm", "ari lit"]
        );
    }

    #[test]
    fn test_map_key_flag() {
        let map: AriMap = [(Ari::from(1i64), Ari::from("a"))].into_iter().collect();
        let mut tracer = Tracer(Vec::new());
        visit(&Ari::am(map), &mut tracer).unwrap();
        assert_eq!(tracer.0, vec!["ari lit", "ari lit key", "ari lit"]);
    }

    #[test]
    fn test_abort_on_first_error() {
        struct FailSecond(usize);

        impl AriVisitor for FailSecond {
            type Error = i32;

            fn visit_ari(&mut self, _ari: &Ari, _ctx: &VisitCtx) -> Result<(), i32> {
                self.0 += 1;
                if self.0 == 2 { Err(42) } else { Ok(()) }
            }
        }

        let ari = Ari::ac(vec![Ari::from(1i64), Ari::from(2i64), Ari::from(3i64)]);
        let mut visitor = FailSecond(0);
        assert_eq!(visit(&ari, &mut visitor), Err(42));
        // aborted before the remaining items
        assert_eq!(visitor.0, 2);
    }

    /// Empty translator, everything deep-copied.
    struct Identity;

    impl AriTranslator for Identity {
        type Error = ();
    }

    #[test]
    fn test_translate_identity_is_deep_copy() {
        let map: AriMap = [(Ari::from(1i64), Ari::from("a"))].into_iter().collect();
        let ari = Ari::ac(vec![
            Ari::objref_with_params(
                ObjPath::new("adm".into(), "CTRL".into(), "ping".into()),
                Params::Map(map),
            ),
            Ari::tp(Timespec::new(30, 0)),
        ]);
        let copy = translate(&ari, &mut Identity).unwrap();
        assert_eq!(ari, copy);
        assert_eq!(ari.content_hash(), copy.content_hash());
    }

    #[test]
    fn test_translate_params_keep_variant() {
        // map parameters must come back as map parameters
        let map: AriMap = [(Ari::from("k"), Ari::from(7i64))].into_iter().collect();
        let ari = Ari::objref_with_params(
            ObjPath::new("adm".into(), "CONST".into(), "cfg".into()),
            Params::Map(map),
        );
        let copy = translate(&ari, &mut Identity).unwrap();
        let Ari::Reference(obj) = &copy else {
            panic!("not a reference")
        };
        assert!(matches!(obj.params, Params::Map(_)));
        assert_eq!(ari, copy);
    }

    #[test]
    fn test_translate_rewrites_literals() {
        struct Increment;

        impl AriTranslator for Increment {
            type Error = ();

            fn map_lit(&mut self, lit: &Lit) -> Result<Option<Lit>, ()> {
                if let Value::Int64(num) = lit.value {
                    Ok(Some(Lit {
                        ari_type: lit.ari_type,
                        value: Value::Int64(num + 1),
                    }))
                } else {
                    Ok(None)
                }
            }
        }

        let ari = Ari::ac(vec![
            Ari::from(1i64),
            Ari::from("text"),
            Ari::typed_lit(AriType::Int, Value::Int64(9)),
        ]);
        let out = translate(&ari, &mut Increment).unwrap();
        assert_eq!(
            out,
            Ari::ac(vec![
                Ari::from(2i64),
                Ari::from("text"),
                Ari::typed_lit(AriType::Int, Value::Int64(10)),
            ])
        );
    }
}
