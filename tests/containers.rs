use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use anyhow::Result;
use relic::{InArchive, OutArchive, Persist, SeqLen};

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
fn scalar_sequences_round_trip() -> Result<()> {
    check_round_trip!(
        Vec::<u32>::new(),
        vec![1u32, 2, 3, 4, 5],
        vec![-1i64, i64::MIN, i64::MAX],
        vec![0.5f64, -0.25, 1e300],
        vec![1u8, 0, 255],
    );
    Ok(())
}

#[test]
fn element_order_is_iteration_order() -> Result<()> {
    let items = vec![
        String::from("first"),
        String::from("second"),
        String::from("third"),
    ];
    assert_eq!(round_trip_text(&items)?, items);
    assert_eq!(round_trip_binary(&items)?, items);
    Ok(())
}

#[test]
fn deques_and_fixed_arrays_round_trip() -> Result<()> {
    let mut deque = VecDeque::new();
    deque.push_back(10i32);
    deque.push_front(5);
    deque.push_back(20);
    check_round_trip!(deque, [9u16, 8, 7], [0.5f32; 4], ["a".to_string(), "b".to_string()]);
    Ok(())
}

#[test]
fn fixed_array_length_mismatch_is_structural() -> Result<()> {
    let mut out = Vec::new();
    let mut ar = OutArchive::binary(&mut out)?;
    ar.put("value", &[1u32, 2, 3])?;
    ar.finish()?;

    let mut narrow = [0u32; 2];
    let mut ar = InArchive::binary(out.as_slice())?;
    let err = ar
        .take("value", &mut narrow)
        .expect_err("stream carries three elements");
    assert!(matches!(err, relic::Error::Structural(_)));
    Ok(())
}

#[cfg(feature = "smallvec")]
#[test]
fn small_vectors_round_trip() -> Result<()> {
    use smallvec::{smallvec, SmallVec};

    let spilled: SmallVec<[u64; 2]> = smallvec![1, 2, 3, 4, 5];
    let inline: SmallVec<[u64; 2]> = smallvec![9];
    check_round_trip!(spilled, inline);
    Ok(())
}

#[test]
fn maps_round_trip() -> Result<()> {
    let mut btree = BTreeMap::new();
    btree.insert(1i32, "one".to_string());
    btree.insert(2, "two".to_string());

    let mut hash = HashMap::new();
    hash.insert("x".to_string(), vec![1u32, 2]);
    hash.insert("y".to_string(), vec![3]);

    check_round_trip!(btree, hash);
    Ok(())
}

#[test]
fn sets_round_trip() -> Result<()> {
    let btree: BTreeSet<i64> = [-5, 0, 9].into_iter().collect();
    let hash: HashSet<String> = ["red", "green", "blue"]
        .into_iter()
        .map(String::from)
        .collect();
    check_round_trip!(btree, hash);
    Ok(())
}

#[test]
fn sequences_of_maps_round_trip() -> Result<()> {
    let mut first = BTreeMap::new();
    first.insert(1i32, "one".to_string());
    first.insert(2, "two".to_string());
    let mut second = BTreeMap::new();
    second.insert(3i32, "three".to_string());

    let nested = vec![first, second];
    assert_eq!(round_trip_text(&nested)?, nested);
    assert_eq!(round_trip_binary(&nested)?, nested);
    Ok(())
}

#[test]
fn deeply_nested_containers_round_trip() -> Result<()> {
    let mut value: BTreeMap<String, Vec<BTreeMap<i32, Vec<u8>>>> = BTreeMap::new();
    let mut inner = BTreeMap::new();
    inner.insert(7, vec![1u8, 2, 3]);
    value.insert("leaf".into(), vec![inner, BTreeMap::new()]);
    value.insert("empty".into(), Vec::new());
    check_round_trip!(value);
    Ok(())
}

/// A hand-rolled sequence loader driving the length slot explicitly.
#[derive(Debug, Default, PartialEq)]
struct Tally {
    counts: Vec<u64>,
}

impl Persist for Tally {
    fn save(&self, ar: &mut OutArchive<'_>) -> relic::Result<()> {
        ar.put_len(self.counts.len() as u64)?;
        ar.seq(|ar| {
            for count in &self.counts {
                count.save(ar)?;
            }
            Ok(())
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> relic::Result<()> {
        ar.seq(|ar| {
            let mut len = SeqLen::default();
            len.load(ar)?;
            self.counts.clear();
            for _ in 0..len.0 {
                let mut count = 0u64;
                count.load(ar)?;
                self.counts.push(count);
            }
            Ok(())
        })
    }
}

#[test]
fn explicit_length_slot_round_trips() -> Result<()> {
    let tally = Tally {
        counts: vec![3, 1, 4, 1, 5],
    };
    assert_eq!(round_trip_text(&tally)?, tally);
    assert_eq!(round_trip_binary(&tally)?, tally);
    Ok(())
}
