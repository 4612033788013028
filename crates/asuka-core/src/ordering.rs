use std::cmp::Ordering;

use serde_json::json;
use tracing::debug;

use crate::datekey::DateKey;
use crate::intent::{Collection, WriteIntent};
use crate::model::{GlobalTodo, TripTodo, WishlistItem};

/// What the todo comparator needs to know about a todo, whatever its source.
pub trait Sortable {
    fn is_done(&self) -> bool;
    fn explicit_order(&self) -> Option<i64>;
    fn due_date(&self) -> Option<DateKey>;
}

impl Sortable for GlobalTodo {
    fn is_done(&self) -> bool {
        self.done
    }

    fn explicit_order(&self) -> Option<i64> {
        self.order
    }

    fn due_date(&self) -> Option<DateKey> {
        self.due_date
    }
}

impl Sortable for TripTodo {
    fn is_done(&self) -> bool {
        self.done
    }

    fn explicit_order(&self) -> Option<i64> {
        self.order
    }

    fn due_date(&self) -> Option<DateKey> {
        self.due_date
    }
}

impl<T: Sortable + ?Sized> Sortable for &T {
    fn is_done(&self) -> bool {
        (**self).is_done()
    }

    fn explicit_order(&self) -> Option<i64> {
        (**self).explicit_order()
    }

    fn due_date(&self) -> Option<DateKey> {
        (**self).due_date()
    }
}

/// Explicit order, else the due date in epoch milliseconds, else 0.
pub fn todo_rank<T: Sortable>(todo: &T) -> i64 {
    todo.explicit_order()
        .or_else(|| todo.due_date().map(DateKey::epoch_millis))
        .unwrap_or(0)
}

/// Not-done before done, then by [`todo_rank`].
pub fn compare_todos<T: Sortable>(a: &T, b: &T) -> Ordering {
    a.is_done()
        .cmp(&b.is_done())
        .then_with(|| todo_rank(a).cmp(&todo_rank(b)))
}

/// Stable sort with [`compare_todos`].
pub fn sort_todos<T: Sortable>(todos: &mut [T]) {
    todos.sort_by(compare_todos);
}

/// Explicit order, else the creation timestamp in epoch milliseconds, else 0.
pub fn wishlist_rank(item: &WishlistItem) -> i64 {
    item.order
        .or_else(|| item.created_at.map(|ts| ts.timestamp_millis()))
        .unwrap_or(0)
}

pub fn compare_wishlist(a: &WishlistItem, b: &WishlistItem) -> Ordering {
    wishlist_rank(a).cmp(&wishlist_rank(b))
}

/// Stable sort of borrowed items with [`compare_wishlist`].
pub fn sorted_wishlist(items: &[WishlistItem]) -> Vec<&WishlistItem> {
    let mut sorted: Vec<&WishlistItem> = items.iter().collect();
    sorted.sort_by(|a, b| compare_wishlist(a, b));
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Swaps the explicit order of `id` with its neighbor in the sorted view.
///
/// When every item already has a distinct explicit order only the pair is
/// rewritten. Otherwise the whole view is renumbered `base_clock + index`
/// with the pair exchanged, so unordered items keep the position they are
/// shown in. Moving past either end, or naming an id not in the list, yields
/// no intents.
#[tracing::instrument(skip(items, base_clock), fields(count = items.len()))]
pub fn move_wishlist_item(
    items: &[WishlistItem],
    id: &str,
    direction: Direction,
    base_clock: i64,
) -> Vec<WriteIntent> {
    let sorted = sorted_wishlist(items);
    let Some(idx) = sorted.iter().position(|item| item.id == id) else {
        debug!("wishlist item not in view; nothing to move");
        return Vec::new();
    };
    let neighbor_idx = match direction {
        Direction::Up if idx > 0 => idx - 1,
        Direction::Down if idx + 1 < sorted.len() => idx + 1,
        _ => {
            debug!(idx, "wishlist item already at the edge");
            return Vec::new();
        }
    };

    let strictly_ordered = sorted.windows(2).all(|pair| {
        matches!((pair[0].order, pair[1].order), (Some(a), Some(b)) if a < b)
    });
    let (Some(current_order), Some(neighbor_order), true) =
        (sorted[idx].order, sorted[neighbor_idx].order, strictly_ordered)
    else {
        return renumber_with_swap(sorted, idx, neighbor_idx, base_clock);
    };

    debug!(
        current = current_order,
        neighbor = neighbor_order,
        "swapping wishlist order"
    );

    vec![
        WriteIntent::update(
            Collection::Wishlist,
            &sorted[idx].id,
            [("order", json!(neighbor_order))],
        ),
        WriteIntent::update(
            Collection::Wishlist,
            &sorted[neighbor_idx].id,
            [("order", json!(current_order))],
        ),
    ]
}

fn renumber_with_swap(
    mut sorted: Vec<&WishlistItem>,
    idx: usize,
    neighbor_idx: usize,
    base_clock: i64,
) -> Vec<WriteIntent> {
    sorted.swap(idx, neighbor_idx);
    let intents: Vec<WriteIntent> = sorted
        .iter()
        .zip(base_clock..)
        .filter(|(item, order)| item.order != Some(*order))
        .map(|(item, order)| {
            WriteIntent::update(Collection::Wishlist, &item.id, [("order", json!(order))])
        })
        .collect();
    debug!(rewritten = intents.len(), "renumbering wishlist order");
    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datekey::parse_date_key;

    fn todo(text: &str, due: Option<&str>, done: bool, order: Option<i64>) -> GlobalTodo {
        GlobalTodo {
            id: text.to_string(),
            text: text.to_string(),
            due_date: due.map(|raw| parse_date_key(raw).expect("key")),
            assignee: None,
            done,
            order,
            recurrence: Default::default(),
            created_at: None,
        }
    }

    fn wish(id: &str, order: Option<i64>) -> WishlistItem {
        WishlistItem {
            id: id.to_string(),
            text: id.to_string(),
            done: false,
            order,
            created_at: None,
        }
    }

    fn created_wish(id: &str, secs: i64) -> WishlistItem {
        WishlistItem {
            created_at: chrono::DateTime::from_timestamp(1_700_000_000 + secs, 0),
            ..wish(id, None)
        }
    }

    fn view_ids(items: &[WishlistItem]) -> Vec<&str> {
        sorted_wishlist(items)
            .iter()
            .map(|w| w.id.as_str())
            .collect()
    }

    fn apply_orders(items: &mut [WishlistItem], intents: &[WriteIntent]) {
        for intent in intents {
            let WriteIntent::Update { id, fields, .. } = intent else {
                panic!("expected update intent");
            };
            let item = items.iter_mut().find(|item| &item.id == id).expect("item");
            item.order = fields["order"].as_i64();
        }
    }

    #[test]
    fn done_todos_never_precede_pending() {
        let mut todos = vec![
            todo("a", Some("2024-01-01"), true, None),
            todo("b", Some("2024-05-01"), false, None),
            todo("c", None, true, Some(1)),
            todo("d", None, false, None),
            todo("e", Some("2023-12-31"), false, Some(9_999_999_999_999)),
        ];
        sort_todos(&mut todos);
        let first_done = todos.iter().position(|t| t.done).expect("a done todo");
        assert!(todos[first_done..].iter().all(|t| t.done));
        let ids: Vec<&str> = todos.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "e", "c", "a"]);
    }

    #[test]
    fn equal_ranks_keep_input_order() {
        let mut todos = vec![
            todo("first", Some("2024-02-02"), false, None),
            todo("second", Some("2024-02-02"), false, None),
            todo("third", Some("2024-02-02"), false, None),
        ];
        sort_todos(&mut todos);
        let ids: Vec<&str> = todos.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn explicit_order_overrides_due_date() {
        let early = todo("early", Some("2024-01-01"), false, None);
        let pinned = todo("pinned", Some("2030-01-01"), false, Some(0));
        assert_eq!(compare_todos(&pinned, &early), Ordering::Less);
    }

    #[test]
    fn moving_second_wish_up_swaps_orders() {
        let mut items = vec![wish("1", Some(10)), wish("2", Some(20)), wish("3", Some(30))];
        let intents = move_wishlist_item(&items, "2", Direction::Up, 0);
        assert_eq!(intents.len(), 2);
        apply_orders(&mut items, &intents);

        let orders: Vec<Option<i64>> = items.iter().map(|item| item.order).collect();
        assert_eq!(orders, vec![Some(20), Some(10), Some(30)]);
        let ids: Vec<&str> = sorted_wishlist(&items).iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn moving_past_the_edge_is_a_no_op() {
        let items = vec![wish("1", Some(10)), wish("2", Some(20))];
        assert!(move_wishlist_item(&items, "1", Direction::Up, 0).is_empty());
        assert!(move_wishlist_item(&items, "2", Direction::Down, 0).is_empty());
        assert!(move_wishlist_item(&items, "missing", Direction::Down, 0).is_empty());
    }

    #[test]
    fn unordered_neighbors_get_synthesized_orders() {
        let mut items = vec![wish("a", None), wish("b", None), wish("c", None)];
        let base = 1_700_000_000_000;
        let intents = move_wishlist_item(&items, "c", Direction::Up, base);
        apply_orders(&mut items, &intents);

        assert_eq!(items[0].order, Some(base));
        assert_eq!(items[1].order, Some(base + 2));
        assert_eq!(items[2].order, Some(base + 1));
        assert_eq!(view_ids(&items), vec!["a", "c", "b"]);
    }

    #[test]
    fn moving_first_unordered_wish_down_keeps_the_rest_in_place() {
        let mut items = vec![
            created_wish("a", 1),
            created_wish("b", 2),
            created_wish("c", 3),
        ];
        let base = 1_800_000_000_000;
        let intents = move_wishlist_item(&items, "a", Direction::Down, base);
        apply_orders(&mut items, &intents);
        assert_eq!(view_ids(&items), vec!["b", "a", "c"]);

        let intents = move_wishlist_item(&items, "c", Direction::Up, base + 50);
        assert_eq!(intents.len(), 2);
        apply_orders(&mut items, &intents);
        assert_eq!(view_ids(&items), vec!["b", "c", "a"]);
    }

    #[test]
    fn mixed_orders_are_renumbered_in_view_order() {
        let mut items = vec![
            created_wish("late", 30),
            wish("pinned", Some(5)),
            created_wish("early", 10),
        ];
        assert_eq!(view_ids(&items), vec!["pinned", "early", "late"]);

        let intents = move_wishlist_item(&items, "pinned", Direction::Down, 2_000_000_000_000);
        apply_orders(&mut items, &intents);
        assert_eq!(view_ids(&items), vec!["early", "pinned", "late"]);
    }
}
