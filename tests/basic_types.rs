use anyhow::Result;
use relic::{InArchive, OutArchive, Persist};

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
fn integer_limits_survive_both_codecs() -> Result<()> {
    check_round_trip!(
        0u8,
        u8::MAX,
        u16::MAX,
        u32::MAX,
        u64::MAX,
        usize::MAX,
        i8::MIN,
        i8::MAX,
        i16::MIN,
        i32::MIN,
        i64::MIN,
        i64::MAX,
        isize::MIN,
        -1i32,
        42i32,
    );
    Ok(())
}

#[test]
fn floats_survive_both_codecs() -> Result<()> {
    check_round_trip!(0.0f32, -2.5f32, 3.75f32, 80.8f64, -0.125f64, f64::MAX);
    Ok(())
}

#[test]
fn bools_and_chars_survive_both_codecs() -> Result<()> {
    check_round_trip!(true, false, 'a', 'Z', '中', '\u{1F600}');
    Ok(())
}

#[test]
fn strings_survive_both_codecs() -> Result<()> {
    check_round_trip!(
        String::new(),
        String::from("hello"),
        String::from("snowman \u{2603} and \u{1F980}"),
        String::from("line\nbreaks\tand \"quotes\""),
    );
    Ok(())
}

#[test]
fn multiple_submissions_consume_in_order() -> Result<()> {
    let mut out = Vec::new();
    let mut ar = OutArchive::binary(&mut out)?;
    ar.put("first", &7u32)?;
    ar.put("second", &String::from("mid"))?;
    ar.put("third", &-1.5f64)?;
    ar.finish()?;

    let mut a = 0u32;
    let mut b = String::new();
    let mut c = 0.0f64;
    let mut ar = InArchive::binary(out.as_slice())?;
    ar.take("first", &mut a)?;
    ar.take("second", &mut b)?;
    ar.take("third", &mut c)?;
    assert_eq!(a, 7);
    assert_eq!(b, "mid");
    assert_eq!(c, -1.5);
    Ok(())
}

#[test]
fn text_rejects_out_of_range_numbers() -> Result<()> {
    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("value", &300u16)?;
    ar.finish()?;

    let mut narrow = 0u8;
    let mut ar = InArchive::text(out.as_slice())?;
    let err = ar.take("value", &mut narrow).expect_err("300 overflows u8");
    assert!(matches!(err, relic::Error::Structural(_)));
    Ok(())
}
