//! Boxed pipelines behind a uniform type

use lazypipe::{Cursor, Enumerable, Enumerator};
mod test_helpers;
use test_helpers::*;

fn pipeline_for<'d>(kind: &str, data: &'d [i64]) -> Enumerator<'d, i64> {
    let base = Enumerable::from_slice(data);
    match kind {
        "evens" => base.filter(|x: &i64| x % 2 == 0).into_enumerator(),
        "sorted" => base.order_by(|a: &i64, b: &i64| a < b).into_enumerator(),
        "scaled" => base.map(|x| x * 100).filter(|x: &i64| *x > 100).into_enumerator(),
        _ => base.into_enumerator(),
    }
}

#[test]
fn test_pipelines_of_any_shape_share_one_type() {
    let data = [3, 1, 2];
    let mut results = Vec::new();
    for kind in ["evens", "sorted", "scaled", "plain"] {
        let mut pipeline = pipeline_for(kind, &data);
        results.push(pipeline.to_vec().unwrap());
        pipeline.dispose();
    }
    assert_eq!(
        results,
        vec![vec![2], vec![1, 2, 3], vec![300, 200], vec![3, 1, 2]]
    );
}

#[test]
fn test_boxed_copy_is_independent() {
    let data = [10, 20, 30];
    let mut staged = Enumerable::from_slice(&data).map(|x| x / 10);
    staged.next().unwrap();

    let mut boxed = staged.enumerator().unwrap();
    assert_eq!(boxed.index(), 1);
    assert_eq!(boxed.next().unwrap(), Some(2));
    assert_eq!(staged.next().unwrap(), Some(2));

    let mut again = lazypipe::Duplicate::duplicate(&boxed).unwrap();
    boxed.dispose();
    assert_eq!(again.next().unwrap(), Some(3));
    assert_eq!(again.next().unwrap(), None);
}

#[test]
fn test_unbox_borrows_and_restores() {
    let data = [1, 2, 3, 4];
    let mut boxed = pipeline_for("evens", &data);
    {
        let mut squared = boxed.unbox().map(|x| x * x);
        assert_eq!(squared.to_vec().unwrap(), vec![4, 16]);
    }
    assert_eq!(boxed.first().unwrap(), Some(2));
    assert_eq!(boxed.find_index_eql(&4).unwrap(), Some(1));
}

#[test]
fn test_enumerator_as_iterator_view() {
    let data = [5, 6, 7];
    let mut boxed = pipeline_for("plain", &data);
    let mut view = boxed.iterator();
    assert_eq!(view.next().unwrap(), Some(5));
    drop(view);
    assert_eq!(boxed.last().unwrap(), Some(7));
    assert_eq!(boxed.count().unwrap(), 3);
}

#[test]
fn test_owned_elements_released_with_boxed_pipeline() {
    let ledger = Ledger::new();
    let mut boxed = Enumerable::from_vec(ledger.track_all(&[3, 1, 2]))
        .order_by(|a: &Tracked, b: &Tracked| a.value < b.value)
        .into_enumerator();
    let first = boxed.first().unwrap().map(|t| t.value);
    assert_eq!(first, Some(1));
    // three originals plus the two values still buffered
    assert_eq!(ledger.live(), 5);
    boxed.dispose();
    assert_eq!(ledger.live(), 0);
}

#[test]
fn test_destroy_all_through_enumerator() {
    let ledger = Ledger::new();
    let boxes = vec![Box::new(ledger.track(1)), Box::new(ledger.track(2))];
    let mut boxed = Enumerable::from_vec(boxes).into_enumerator();
    boxed.destroy_all().unwrap();
    assert_eq!(ledger.disposed(), 2);
    drop(boxed);
    assert_eq!(ledger.live(), 0);
}
