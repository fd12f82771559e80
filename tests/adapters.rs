use std::cmp::Reverse;
use std::collections::BinaryHeap;

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

fn drain<T: Ord>(mut heap: BinaryHeap<T>) -> Vec<T> {
    let mut order = Vec::with_capacity(heap.len());
    while let Some(top) = heap.pop() {
        order.push(top);
    }
    order
}

#[test]
fn priority_queue_preserves_pop_order() -> Result<()> {
    let heap: BinaryHeap<i32> = [10, 30, 20, 5, 40].into_iter().collect();

    let text = round_trip_text(&heap)?;
    assert_eq!(drain(text), vec![40, 30, 20, 10, 5]);

    let binary = round_trip_binary(&heap)?;
    assert_eq!(drain(binary), vec![40, 30, 20, 10, 5]);
    Ok(())
}

#[test]
fn min_heap_preserves_pop_order() -> Result<()> {
    let heap: BinaryHeap<Reverse<i32>> = [10, 30, 20, 5, 40].into_iter().map(Reverse).collect();
    let expected = vec![5, 10, 20, 30, 40];

    let text = round_trip_text(&heap)?;
    assert_eq!(drain(text).into_iter().map(|r| r.0).collect::<Vec<_>>(), expected);

    let binary = round_trip_binary(&heap)?;
    assert_eq!(
        drain(binary).into_iter().map(|r| r.0).collect::<Vec<_>>(),
        expected
    );
    Ok(())
}

#[test]
fn heap_of_pairs_round_trips() -> Result<()> {
    let heap: BinaryHeap<(i32, String)> = [
        (10, "ten".to_string()),
        (40, "forty".to_string()),
        (20, "twenty".to_string()),
    ]
    .into_iter()
    .collect();

    let restored = round_trip_text(&heap)?;
    assert_eq!(
        drain(restored),
        vec![
            (40, "forty".to_string()),
            (20, "twenty".to_string()),
            (10, "ten".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn empty_heap_round_trips() -> Result<()> {
    let heap: BinaryHeap<u64> = BinaryHeap::new();
    assert!(round_trip_text(&heap)?.is_empty());
    assert!(round_trip_binary(&heap)?.is_empty());
    Ok(())
}
