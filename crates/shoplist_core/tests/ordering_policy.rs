use shoplist_core::{compare_items, order_items, Item, ItemId};
use std::cmp::Ordering;

fn item(id: &str, completed_at_ms: Option<i64>, last_updated_ms: i64) -> Item {
    Item {
        id: ItemId::from(id),
        name: format!("item {id}"),
        completed_at_ms,
        last_updated_ms,
    }
}

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

#[test]
fn open_by_recency_then_completed_by_completion_time() {
    let a = item("A", None, 5);
    let b = item("B", None, 10);
    let c = item("C", Some(3), 3);
    let d = item("D", Some(7), 7);

    let ordered = order_items(vec![c, a, d, b]);
    assert_eq!(ids(&ordered), vec!["B", "A", "D", "C"]);
}

#[test]
fn order_does_not_depend_on_input_permutation() {
    let base = vec![
        item("A", None, 5),
        item("B", None, 10),
        item("C", Some(3), 30),
        item("D", Some(7), 1),
        item("E", None, 1),
    ];

    let expected = ids(&order_items(base.clone()))
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    for rotation in 0..base.len() {
        let mut rotated = base.clone();
        rotated.rotate_left(rotation);
        rotated.reverse();
        let ordered = order_items(rotated);
        assert_eq!(ids(&ordered), expected);
    }
}

#[test]
fn comparator_is_a_strict_weak_ordering() {
    let samples = vec![
        item("a", None, 1),
        item("b", None, 5),
        item("c", None, 5),
        item("d", Some(2), 9),
        item("e", Some(2), 1),
        item("f", Some(8), 8),
    ];

    for x in &samples {
        assert_eq!(compare_items(x, x), Ordering::Equal);
        for y in &samples {
            assert_eq!(compare_items(x, y), compare_items(y, x).reverse());
            for z in &samples {
                if compare_items(x, y) == Ordering::Less && compare_items(y, z) == Ordering::Less {
                    assert_eq!(compare_items(x, z), Ordering::Less);
                }
                if compare_items(x, y) == Ordering::Equal && compare_items(y, z) == Ordering::Equal
                {
                    assert_eq!(compare_items(x, z), Ordering::Equal);
                }
            }
        }
    }
}

#[test]
fn ties_keep_both_items() {
    let ordered = order_items(vec![item("x", None, 4), item("y", None, 4)]);
    let mut got = ids(&ordered);
    got.sort_unstable();
    assert_eq!(got, vec!["x", "y"]);
}
