use dtnma_ari::text::{self, BstrForm, EncodeOpts, FloatForm, IntBase, SchemePrefix, TypeShow};
use dtnma_ari::{
    Ari, AriMap, AriType, IdSeg, ObjPath, Params, Report, RptSet, Tbl, Timespec, Value,
};

fn encode_with(ari: &Ari, opts: EncodeOpts) -> String {
    let mut out = String::new();
    text::encode(&mut out, ari, opts).unwrap();
    out
}

fn encode_default(ari: &Ari) -> String {
    encode_with(ari, EncodeOpts::default())
}

fn int(value: i64) -> Ari {
    Ari::typed_lit(AriType::Int, Value::Int64(value))
}

#[test]
fn test_scenarios_round_trip() {
    let tbl = {
        let mut tbl = Tbl::new(2);
        tbl.push_row(vec![int(1), int(2)]);
        tbl.push_row(vec![int(3), int(4)]);
        Ari::tbl(tbl)
    };
    let am: AriMap = [(int(1), Ari::from("a"))].into_iter().collect();

    let scenarios: Vec<(Ari, &str)> = vec![
        (Ari::undefined(), "ari:undefined"),
        (
            Ari::objref(ObjPath::new("example".into(), "CTRL".into(), "ping".into())),
            "ari://example/CTRL/ping",
        ),
        (
            Ari::ac(vec![int(1), int(2), int(3)]),
            "ari:/AC/(/INT/1,/INT/2,/INT/3)",
        ),
        (Ari::am(am), "ari:/AM/(/INT/1=a)"),
        (tbl, "ari:/TBL/c=2;(/INT/1,/INT/2)(/INT/3,/INT/4)"),
        (
            Ari::tp(Timespec::new(0, 500_000_000)),
            "ari:/TP/2000-01-01T00:00:00.5Z",
        ),
        (Ari::td(Timespec::new(3661, 0)), "ari:/TD/PT1H1M1S"),
        (
            Ari::typed_lit(AriType::ByteStr, Value::ByteStr(vec![0xDE, 0xAD, 0xBE, 0xEF])),
            "ari:/BYTESTR/h'DEADBEEF'",
        ),
        (
            Ari::typed_lit(AriType::TextStr, Value::TextStr("hello world".into())),
            "ari:/TEXTSTR/%22hello%20world%22",
        ),
    ];

    for (ari, expect) in &scenarios {
        assert_eq!(&encode_default(ari), expect);
        let back = text::decode(expect).unwrap();
        assert_eq!(&back, ari, "decoding {expect}");
        assert_eq!(back.content_hash(), ari.content_hash());
    }
}

/// Values that must survive encode→decode under every option combination.
fn matrix_values() -> Vec<Ari> {
    let am: AriMap = [(int(1), Ari::from("a")), (Ari::from("k"), Ari::null())]
        .into_iter()
        .collect();
    let tbl = {
        let mut tbl = Tbl::new(2);
        tbl.push_row(vec![int(1), Ari::from("x")]);
        tbl.push_row(vec![Ari::from(true), Ari::null()]);
        Ari::tbl(tbl)
    };
    let rptset = Ari::rptset(RptSet {
        nonce: Box::new(Ari::null()),
        reftime: Box::new(Ari::tp(Timespec::new(10, 0))),
        reports: vec![Report {
            reltime: Ari::td(Timespec::new(1, 0)),
            source: Ari::objref(ObjPath::new("adm".into(), "CTRL".into(), "ping".into())),
            items: vec![Ari::from(1i64), Ari::from("ok")],
        }],
    });

    vec![
        Ari::undefined(),
        Ari::null(),
        Ari::from(true),
        Ari::from(false),
        Ari::from(-7i64),
        int(42),
        Ari::typed_lit(AriType::Uint, Value::Uint64(u64::MAX)),
        Ari::typed_lit(AriType::Vast, Value::Int64(i64::MIN)),
        Ari::typed_lit(AriType::Aritype, Value::Int64(-246)),
        Ari::from(0.25),
        Ari::from(f64::NAN),
        Ari::from(f64::INFINITY),
        Ari::from(f64::NEG_INFINITY),
        Ari::typed_lit(AriType::Real64, Value::Float64(-10.5)),
        Ari::from("hello"),
        Ari::from("hello world"),
        Ari::from("v1.2-rc.3"),
        Ari::from("h\u{e9}llo\t\u{1D11E}"),
        Ari::from("true"),
        Ari::from(vec![1u8, 2, 3]),
        Ari::from(b"it's".to_vec()),
        Ari::from(b"a\\'b".to_vec()),
        Ari::from(vec![0xFF, 0x00, 0x7F]),
        Ari::tp(Timespec::new(0, 500_000_000)),
        Ari::tp(Timespec::new(762_525_296, 0)),
        Ari::td(Timespec::new(3661, 250_000_000)),
        Ari::td(Timespec {
            seconds: -90061,
            nanoseconds: 500_000_000,
        }),
        Ari::objref(ObjPath::new("example".into(), IdSeg::Null, IdSeg::Null)),
        Ari::objref(ObjPath::new("adm".into(), "CTRL".into(), "ping".into())),
        Ari::objref(ObjPath::new("adm".into(), "custom".into(), "thing".into())),
        Ari::objref(ObjPath::new(IdSeg::Int(2), IdSeg::Int(3), IdSeg::Int(4))),
        Ari::objref_with_params(
            ObjPath::new("adm".into(), "CTRL".into(), "add".into()),
            Params::List(vec![Ari::from(1i64), Ari::from(2i64)]),
        ),
        Ari::objref_with_params(
            ObjPath::new("adm".into(), "CONST".into(), "cfg".into()),
            Params::Map([(Ari::from("k"), Ari::from("v"))].into_iter().collect()),
        ),
        Ari::ac(vec![]),
        Ari::ac(vec![int(1), Ari::from("two"), Ari::from(3.5)]),
        Ari::am(am),
        tbl,
        Ari::execset(Ari::from(123i64), vec![
            Ari::objref(ObjPath::new("adm".into(), "CTRL".into(), "reset".into())),
            Ari::from("soft"),
        ]),
        rptset,
    ]
}

#[test]
fn test_option_matrix_round_trip() {
    let values = matrix_values();
    let everything = Ari::ac(values.clone());

    for scheme_prefix in [SchemePrefix::None, SchemePrefix::First, SchemePrefix::All] {
        for show_ari_type in [TypeShow::Orig, TypeShow::Text, TypeShow::Int] {
            for int_base in [IntBase::Bin, IntBase::Dec, IntBase::Hex] {
                for float_form in [
                    FloatForm::Fixed,
                    FloatForm::Auto,
                    FloatForm::Sci,
                    FloatForm::Hex,
                ] {
                    for bstr_form in [BstrForm::Raw, BstrForm::Base16, BstrForm::Base64Url] {
                        for text_identity in [false, true] {
                            for time_text in [false, true] {
                                let opts = EncodeOpts {
                                    scheme_prefix,
                                    show_ari_type,
                                    int_base,
                                    float_form,
                                    text_identity,
                                    bstr_form,
                                    time_text,
                                };
                                let encoded = encode_with(&everything, opts);
                                let back = text::decode(&encoded).unwrap();
                                assert_eq!(back, everything, "through {encoded}");
                                assert_eq!(back.content_hash(), everything.content_hash());
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_individual_values_default_round_trip() {
    for value in matrix_values() {
        let encoded = encode_default(&value);
        let back = text::decode(&encoded).unwrap();
        assert_eq!(back, value, "through {encoded}");
        assert_eq!(back.content_hash(), value.content_hash());

        let copy = value.clone();
        assert_eq!(copy, value);
        assert_eq!(copy.content_hash(), value.content_hash());
    }
}

#[test]
fn test_float_specials_survive() {
    for (value, expect) in [
        (f64::NAN, "ari:NaN"),
        (f64::INFINITY, "ari:+Infinity"),
        (f64::NEG_INFINITY, "ari:-Infinity"),
    ] {
        let ari = Ari::from(value);
        let encoded = encode_default(&ari);
        assert_eq!(encoded, expect);
        assert_eq!(text::decode(&encoded).unwrap(), ari);
    }
}

#[test]
fn test_float_bit_exact_forms() {
    // shortest and hex forms reproduce the exact bit pattern
    let awkward = [
        0.1,
        1.0 / 3.0,
        f64::MIN_POSITIVE,
        f64::MIN_POSITIVE / 4.0,
        f64::MAX,
        -2.2250738585072014e-308,
        9007199254740993.0,
    ];
    for value in awkward {
        for float_form in [FloatForm::Auto, FloatForm::Hex] {
            let opts = EncodeOpts {
                float_form,
                ..EncodeOpts::default()
            };
            let encoded = encode_with(&Ari::from(value), opts);
            let Ari::Literal(lit) = text::decode(&encoded).unwrap() else {
                panic!("not a literal")
            };
            let Value::Float64(back) = lit.value else {
                panic!("not a float from {encoded}")
            };
            assert_eq!(back.to_bits(), value.to_bits(), "through {encoded}");
        }
    }
}

#[test]
fn test_unicode_text_strings() {
    for sample in [
        "\u{e9}\u{1D11E}\u{FFFD} mixed",
        "quotes \" and \\ slashes",
        "newline\nand\ttab",
        "\u{0}ull byte",
    ] {
        let ari = Ari::from(sample);
        let encoded = encode_default(&ari);
        assert_eq!(text::decode(&encoded).unwrap(), ari, "through {encoded}");
    }
}

#[test]
fn test_decode_accepts_every_time_form() {
    let tp = Ari::tp(Timespec::new(0, 500_000_000));
    for input in [
        "ari:/TP/2000-01-01T00:00:00.5Z",
        "ari:/TP/20000101T000000.5Z",
        "ari:/TP/0.5",
    ] {
        assert_eq!(text::decode(input).unwrap(), tp, "decoding {input}");
    }

    let td = Ari::td(Timespec::new(90, 0));
    for input in ["ari:/TD/PT1M30S", "ari:/TD/90"] {
        assert_eq!(text::decode(input).unwrap(), td, "decoding {input}");
    }
}

#[test]
fn test_decode_accepts_every_bstr_form() {
    let bytes = Ari::from(vec![0xDE, 0xAD, 0xBE, 0xEF]);
    for input in ["h'DEADBEEF'", "h'deadbeef'", "b64'3q2-7w=='", "b64'3q2+7w=='"] {
        assert_eq!(text::decode(input).unwrap(), bytes, "decoding {input}");
    }
    assert_eq!(
        text::decode("'hi'").unwrap(),
        Ari::from(b"hi".to_vec())
    );
}

#[test]
fn test_decode_errors() {
    use dtnma_ari::text::Error;

    for (input, code) in [
        ("ari:/TBL/c=2;(1)", 4),
        ("/BYTESTR/h'ABC'", 2),
        ("ari:/NOSUCH/1", 2),
        ("ari:/CTRL/1", 2),
        ("1,2", 3),
        ("%2f%", 2),
        ("ari:/AC/(1", 2),
        ("", 2),
    ] {
        let err: Error = text::decode(input).unwrap_err();
        assert_eq!(err.code(), code, "decoding {input} gave {err}");
        // the diagnostic renders
        assert!(!err.to_string().is_empty());
    }
}

#[test]
fn test_display_and_fromstr() {
    let ari = Ari::ac(vec![int(1), Ari::from("two")]);
    let shown = ari.to_string();
    assert_eq!(shown, "ari:/AC/(/INT/1,two)");
    let back: Ari = shown.parse().unwrap();
    assert_eq!(back, ari);
}

#[test]
fn test_am_insertion_permutations_agree() {
    let pairs = [
        (int(1), Ari::from("a")),
        (int(2), Ari::from("b")),
        (int(3), Ari::from("c")),
    ];
    let base: AriMap = pairs.clone().into_iter().collect();
    let base = Ari::am(base);

    let permutations: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    for order in permutations {
        let map: AriMap = order.iter().map(|&ix| pairs[ix].clone()).collect();
        let permuted = Ari::am(map);
        assert_eq!(permuted, base);
        assert_eq!(permuted.content_hash(), base.content_hash());
        // and the text forms decode back to equal values
        let back = text::decode(&encode_default(&permuted)).unwrap();
        assert_eq!(back, base);
    }
}
