use std::path::PathBuf;

use anyhow::Result;
use relic::{persist_variant, Bits, InArchive, OutArchive, Persist};

fn round_trip_text<T: Persist + Default>(value: &T) -> Result<T> {
    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("value", value)?;
    ar.finish()?;

    let mut restored = T::default();
    let mut ar = InArchive::text(out.as_slice())?;
    ar.take("value", &mut restored)?;
    Ok(restored)
}

fn round_trip_binary<T: Persist + Default>(value: &T) -> Result<T> {
    let mut out = Vec::new();
    let mut ar = OutArchive::binary(&mut out)?;
    ar.put("value", value)?;
    ar.finish()?;

    let mut restored = T::default();
    let mut ar = InArchive::binary(out.as_slice())?;
    ar.take("value", &mut restored)?;
    Ok(restored)
}

macro_rules! check_round_trip {
    ($($value:expr),+ $(,)?) => {
        $(
            let value = $value;
            assert_eq!(round_trip_text(&value)?, value);
            assert_eq!(round_trip_binary(&value)?, value);
        )+
    };
}

#[test]
fn options_round_trip_both_branches() -> Result<()> {
    check_round_trip!(Some(42i32), None::<i32>, Some(vec![1u32, 2, 3]), None::<Vec<u32>>);
    Ok(())
}

#[test]
fn results_round_trip_both_branches() -> Result<()> {
    let ok: Result<Vec<i32>, String> = Ok(vec![1, 2, 3]);
    let err: Result<Vec<i32>, String> = Err("hello".to_string());
    // `Result` defaults are not a thing, so drive the archives directly.
    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("ok", &ok)?;
    ar.put("err", &err)?;
    ar.finish()?;

    let mut ok_restored: Result<Vec<i32>, String> = Ok(Vec::new());
    let mut err_restored: Result<Vec<i32>, String> = Ok(Vec::new());
    let mut ar = InArchive::text(out.as_slice())?;
    ar.take("ok", &mut ok_restored)?;
    ar.take("err", &mut err_restored)?;
    assert_eq!(ok_restored, ok);
    assert_eq!(err_restored, err);

    let mut out = Vec::new();
    let mut ar = OutArchive::binary(&mut out)?;
    ar.put("ok", &ok)?;
    ar.put("err", &err)?;
    ar.finish()?;

    let mut ok_restored: Result<Vec<i32>, String> = Ok(Vec::new());
    let mut err_restored: Result<Vec<i32>, String> = Ok(Vec::new());
    let mut ar = InArchive::binary(out.as_slice())?;
    ar.take("ok", &mut ok_restored)?;
    ar.take("err", &mut err_restored)?;
    assert_eq!(ok_restored, ok);
    assert_eq!(err_restored, err);
    Ok(())
}

#[test]
fn tuples_round_trip_under_ordinal_names() -> Result<()> {
    check_round_trip!(
        (7u8,),
        (1i32, "pair".to_string()),
        (1u64, 2.5f64, 'x', true),
    );

    // Ordinal keys are the wire contract for tuples.
    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("value", &(10i32, "ten".to_string()))?;
    ar.finish()?;
    let tree: serde_json::Value = serde_json::from_slice(&out)?;
    assert_eq!(tree["value"]["0"], 10);
    assert_eq!(tree["value"]["1"], "ten");
    Ok(())
}

#[test]
fn paths_round_trip_as_unicode_strings() -> Result<()> {
    check_round_trip!(
        PathBuf::from("/tmp/archive/data.bin"),
        PathBuf::from("relative/dir"),
        PathBuf::new(),
    );
    Ok(())
}

#[test]
fn bit_sequences_round_trip_as_digit_strings() -> Result<()> {
    let mut bits = Bits::new(12);
    bits.set(0, true);
    bits.set(5, true);
    bits.set(11, true);
    check_round_trip!(bits.clone());

    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("value", &bits)?;
    ar.finish()?;
    let tree: serde_json::Value = serde_json::from_slice(&out)?;
    assert_eq!(tree["value"]["value"], "100000100001");
    Ok(())
}

#[cfg(feature = "complex")]
#[test]
fn complex_numbers_round_trip() -> Result<()> {
    use num_complex::Complex;

    check_round_trip!(
        Complex::new(3.14f64, 2.71),
        Complex::new(-1.5f64, 4.2),
        Complex::new(0.0f64, 0.0),
        Complex::new(5.5f64, 0.0),
        Complex::new(0.0f64, -3.3),
        Complex::new(1.5f32, -0.5),
    );
    Ok(())
}

#[cfg(feature = "bytes")]
#[test]
fn byte_buffers_round_trip() -> Result<()> {
    use bytes::Bytes;

    check_round_trip!(
        Bytes::from_static(b"raw payload \x00\x01\xff"),
        Bytes::new(),
    );

    // Text encodes byte spans as base64 string leaves.
    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("value", &Bytes::from_static(b"abc"))?;
    ar.finish()?;
    let tree: serde_json::Value = serde_json::from_slice(&out)?;
    assert_eq!(tree["value"], "YWJj");
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
enum Shape {
    #[default]
    Empty,
    Circle(f64),
    Label(String),
}
persist_variant!(Shape {
    0 => Empty,
    1 => Circle(f64),
    2 => Label(String),
});

#[test]
fn tagged_unions_round_trip_every_alternative() -> Result<()> {
    check_round_trip!(Shape::Empty, Shape::Circle(2.5), Shape::Label("disc".into()));
    Ok(())
}

#[test]
fn tagged_union_index_out_of_range_is_a_domain_error() -> Result<()> {
    let bogus = br#"{"value": {"index": 9}}"#;
    let mut shape = Shape::default();
    let mut ar = InArchive::text(&bogus[..])?;
    let err = ar
        .take("value", &mut shape)
        .expect_err("index 9 names no alternative");
    assert!(matches!(err, relic::Error::Domain(_)));
    Ok(())
}
