use lazypipe::{Cursor, Enumerable, Iter};
use proptest::prelude::*;

proptest! {
    #[test]
    fn reset_replays_identical_sequence(data in proptest::collection::vec(any::<i32>(), 0..64), skip in 0usize..16) {
        let mut iter = Iter::from_slice(&data);
        for _ in 0..skip {
            iter.next().unwrap();
        }
        iter.reset();
        let mut replay = Vec::new();
        while let Some(value) = iter.next().unwrap() {
            replay.push(value);
        }
        drop(iter);
        prop_assert_eq!(replay, data);
    }

    #[test]
    fn index_counts_values_produced(data in proptest::collection::vec(any::<u8>(), 0..64), threshold in any::<u8>()) {
        let mut pipeline = Enumerable::from_slice(&data).filter(move |x: &u8| *x >= threshold);
        let mut produced = 0;
        prop_assert_eq!(pipeline.index(), 0);
        while pipeline.next().unwrap().is_some() {
            produced += 1;
            prop_assert_eq!(pipeline.index(), produced);
        }
        prop_assert_eq!(pipeline.index(), produced);
    }

    #[test]
    fn order_by_matches_std_sort(data in proptest::collection::vec(-1000i64..1000, 0..128)) {
        let mut sorted = Enumerable::from_slice(&data).order_by(|a: &i64, b: &i64| a < b);
        let mut expected = data.clone();
        expected.sort();
        prop_assert_eq!(sorted.to_vec().unwrap(), expected);
    }

    #[test]
    fn stages_compose_like_std_adapters(
        data in proptest::collection::vec(-500i32..500, 0..96),
        modulus in 1i32..7,
        offset in -50i32..50,
    ) {
        let mut pipeline = Enumerable::from_slice(&data)
            .filter(move |x: &i32| x.rem_euclid(modulus) == 0)
            .map(move |x| x + offset)
            .map_with_index(|x, i| (i, x));
        let expected: Vec<(usize, i32)> = data
            .iter()
            .filter(|x| x.rem_euclid(modulus) == 0)
            .map(|x| x + offset)
            .enumerate()
            .collect();
        prop_assert_eq!(pipeline.to_vec().unwrap(), expected);
    }

    #[test]
    fn duplicate_continues_from_same_position(data in proptest::collection::vec(any::<u16>(), 1..48), split in 0usize..48) {
        let split = split % data.len();
        let mut original = Enumerable::from_slice(&data).map(|x| u32::from(x) * 3);
        for _ in 0..split {
            original.next().unwrap();
        }
        let mut copy = original.dupe().unwrap();
        let mut from_original = Vec::new();
        while let Some(v) = original.next().unwrap() {
            from_original.push(v);
        }
        let mut from_copy = Vec::new();
        while let Some(v) = copy.next().unwrap() {
            from_copy.push(v);
        }
        prop_assert_eq!(from_original, from_copy);
    }
}
