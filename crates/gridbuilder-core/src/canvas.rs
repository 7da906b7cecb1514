//! Canvas sections and their stacking order.
//!
//! Every canvas owns a monotonic z-index counter. Stacking is decided by each
//! item's `z_index`, never by its position in `items`.

use crate::item::GridItem;
use serde::{Deserialize, Serialize};

/// A droppable page section holding grid items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    /// Items in insertion order.
    pub items: Vec<GridItem>,
    /// Last z-index handed out. Never decreases.
    pub z_index_counter: i32,
    /// Presentation only, owned by the host application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl Canvas {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a canvas from a list of items, restoring the counter from the
    /// highest z-index present.
    pub fn from_items(items: Vec<GridItem>) -> Self {
        let mut canvas = Self {
            items,
            z_index_counter: 0,
            background_color: None,
        };
        canvas.sync_counter();
        canvas
    }

    /// Consume the next z-index value.
    ///
    /// If the counter has reached `i32::MAX` the canvas is first renumbered
    /// to `1..=len`, keeping the stacking order.
    pub fn next_z_index(&mut self) -> i32 {
        self.sync_counter();
        if self.z_index_counter == i32::MAX {
            self.compact();
        }
        self.z_index_counter += 1;
        self.z_index_counter
    }

    fn compact(&mut self) {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by_key(|&idx| self.items[idx].z_index);
        for (sorted_index, idx) in order.into_iter().enumerate() {
            self.items[idx].z_index = sorted_index as i32 + 1;
        }
        self.z_index_counter = self.items.len() as i32;
        log::warn!("z-index counter exhausted, renumbered {} items", self.items.len());
    }

    /// Keep the counter at or above every z-index in use.
    fn sync_counter(&mut self) {
        if let Some(max) = self.max_z_index() {
            self.z_index_counter = self.z_index_counter.max(max);
        }
    }

    /// Add an item on top of the stack.
    pub fn push_item(&mut self, mut item: GridItem) {
        item.z_index = self.next_z_index();
        self.items.push(item);
    }

    /// Remove an item. The counter is left untouched.
    pub fn remove_item(&mut self, id: &str) -> Option<GridItem> {
        let pos = self.position(id)?;
        Some(self.items.remove(pos))
    }

    /// Look up an item by id.
    pub fn item(&self, id: &str) -> Option<&GridItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Mutable lookup. Callers must keep z-indices distinct.
    pub fn item_mut(&mut self, id: &str) -> Option<&mut GridItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Whether the item lives in this canvas.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// True if the canvas holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Lowest z-index in use, `None` when empty.
    pub fn min_z_index(&self) -> Option<i32> {
        self.items.iter().map(|item| item.z_index).min()
    }

    /// Highest z-index in use, `None` when empty.
    pub fn max_z_index(&self) -> Option<i32> {
        self.items.iter().map(|item| item.z_index).max()
    }

    /// Items in display order (back to front).
    pub fn items_by_z(&self) -> Vec<&GridItem> {
        let mut ordered: Vec<&GridItem> = self.items.iter().collect();
        ordered.sort_by_key(|item| item.z_index);
        ordered
    }

    /// True when every z-index is a distinct integer >= 1.
    pub fn has_valid_stacking(&self) -> bool {
        let mut seen: Vec<i32> = self.items.iter().map(|item| item.z_index).collect();
        seen.sort_unstable();
        let len = seen.len();
        seen.dedup();
        seen.len() == len && seen.first().is_none_or(|&z| z >= 1)
    }

    /// Bring an item above every other item in this canvas.
    /// Returns false if the item is not in this canvas.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let z = self.next_z_index();
        self.items[pos].z_index = z;
        log::debug!("bring_to_front {} -> z={}", id, z);
        true
    }

    /// Swap with the nearest item above.
    /// Returns false if the item is missing or already topmost.
    pub fn bring_forward(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let current = self.items[pos].z_index;
        let neighbor = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.z_index > current)
            .min_by_key(|(_, item)| item.z_index)
            .map(|(idx, _)| idx);

        match neighbor {
            Some(other) => {
                self.swap_z(pos, other);
                log::debug!("bring_forward {} -> z={}", id, self.items[pos].z_index);
                true
            }
            None => false,
        }
    }

    /// Swap with the nearest item below.
    /// Returns false if the item is missing or already bottommost.
    pub fn send_backward(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let current = self.items[pos].z_index;
        let neighbor = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.z_index < current)
            .max_by_key(|(_, item)| item.z_index)
            .map(|(idx, _)| idx);

        match neighbor {
            Some(other) => {
                self.swap_z(pos, other);
                log::debug!("send_backward {} -> z={}", id, self.items[pos].z_index);
                true
            }
            None => false,
        }
    }

    fn swap_z(&mut self, a: usize, b: usize) {
        let za = self.items[a].z_index;
        self.items[a].z_index = self.items[b].z_index;
        self.items[b].z_index = za;
    }

    /// Send an item below every other item in this canvas.
    ///
    /// While the floor is free (minimum z-index above 1) the item just takes
    /// `max(1, min - 1)`. Once the floor is occupied every item is renumbered:
    /// items are sorted by z-index, the target gets 1 and every other item gets
    /// its sorted index + 2. The renumbering runs even when the target already
    /// holds the floor.
    pub fn send_to_back(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let Some(min) = self.min_z_index() else {
            return false;
        };

        if min > 1 {
            let z = (min - 1).max(1);
            self.items[pos].z_index = z;
            log::debug!("send_to_back {} -> z={}", id, z);
            return true;
        }

        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by_key(|&idx| self.items[idx].z_index);
        for (sorted_index, idx) in order.into_iter().enumerate() {
            self.items[idx].z_index = if idx == pos {
                1
            } else {
                sorted_index as i32 + 2
            };
        }
        self.sync_counter();
        log::debug!("send_to_back {} reflowed {} items", id, self.items.len());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GridRect;

    fn item(id: &str, z: i32) -> GridItem {
        let mut item = GridItem::new("box", GridRect::new(0, 0, 2, 2)).with_id(id);
        item.canvas_id = "c1".to_string();
        item.z_index = z;
        item
    }

    fn canvas(zs: &[(&str, i32)]) -> Canvas {
        Canvas::from_items(zs.iter().map(|&(id, z)| item(id, z)).collect())
    }

    fn z(canvas: &Canvas, id: &str) -> i32 {
        canvas.item(id).unwrap().z_index
    }

    #[test]
    fn test_push_item_stacks_on_top() {
        let mut canvas = Canvas::new();
        canvas.push_item(item("a", 0));
        canvas.push_item(item("b", 0));
        assert_eq!(z(&canvas, "a"), 1);
        assert_eq!(z(&canvas, "b"), 2);
        assert_eq!(canvas.z_index_counter, 2);
    }

    #[test]
    fn test_counter_survives_removal() {
        let mut canvas = Canvas::new();
        canvas.push_item(item("a", 0));
        canvas.push_item(item("b", 0));
        canvas.remove_item("b");
        canvas.push_item(item("c", 0));
        assert_eq!(z(&canvas, "c"), 3);
    }

    #[test]
    fn test_bring_to_front_consumes_counter() {
        let mut canvas = canvas(&[("a", 1), ("b", 2), ("c", 3)]);
        assert!(canvas.bring_to_front("a"));
        assert_eq!(z(&canvas, "a"), 4);
        assert!(canvas.bring_to_front("b"));
        assert!(z(&canvas, "b") > z(&canvas, "a"));
        assert_eq!(z(&canvas, "c"), 3);
    }

    #[test]
    fn test_bring_forward_swaps_with_next() {
        let mut canvas = canvas(&[("a", 1), ("b", 2)]);
        assert!(canvas.bring_forward("a"));
        assert_eq!(z(&canvas, "a"), 2);
        assert_eq!(z(&canvas, "b"), 1);
    }

    #[test]
    fn test_bring_forward_skips_gaps() {
        let mut canvas = canvas(&[("a", 2), ("b", 9), ("c", 5)]);
        assert!(canvas.bring_forward("a"));
        assert_eq!(z(&canvas, "a"), 5);
        assert_eq!(z(&canvas, "c"), 2);
        assert_eq!(z(&canvas, "b"), 9);
    }

    #[test]
    fn test_bring_forward_topmost_is_noop() {
        let mut canvas = canvas(&[("a", 1), ("b", 2)]);
        let before = canvas.clone();
        assert!(!canvas.bring_forward("b"));
        assert_eq!(canvas, before);
    }

    #[test]
    fn test_send_backward() {
        let mut canvas = canvas(&[("a", 1), ("b", 4), ("c", 7)]);
        assert!(canvas.send_backward("c"));
        assert_eq!(z(&canvas, "c"), 4);
        assert_eq!(z(&canvas, "b"), 7);

        let before = canvas.clone();
        assert!(!canvas.send_backward("a"));
        assert_eq!(canvas, before);
    }

    #[test]
    fn test_send_to_back_cheap_path() {
        let mut canvas = canvas(&[("a", 3), ("b", 4), ("c", 5)]);
        assert!(canvas.send_to_back("c"));
        assert_eq!(z(&canvas, "c"), 2);
        assert_eq!(z(&canvas, "a"), 3);
        assert_eq!(z(&canvas, "b"), 4);
    }

    #[test]
    fn test_send_to_back_reflow() {
        let mut canvas = canvas(&[("a", 1), ("b", 2), ("c", 3)]);
        assert!(canvas.send_to_back("c"));
        assert_eq!(z(&canvas, "a"), 2);
        assert_eq!(z(&canvas, "b"), 3);
        assert_eq!(z(&canvas, "c"), 1);
    }

    #[test]
    fn test_send_to_back_reflow_when_target_on_floor() {
        let mut canvas = canvas(&[("a", 1), ("b", 2), ("c", 3)]);
        assert!(canvas.send_to_back("a"));
        assert_eq!(z(&canvas, "a"), 1);
        assert_eq!(z(&canvas, "b"), 3);
        assert_eq!(z(&canvas, "c"), 4);
        assert!(canvas.has_valid_stacking());

        // Counter must stay above the renumbered values.
        assert!(canvas.bring_to_front("b"));
        assert_eq!(z(&canvas, "b"), 5);
        assert!(canvas.has_valid_stacking());
    }

    #[test]
    fn test_unknown_item_is_noop() {
        let mut canvas = canvas(&[("a", 1)]);
        let before = canvas.clone();
        assert!(!canvas.bring_to_front("zzz"));
        assert!(!canvas.bring_forward("zzz"));
        assert!(!canvas.send_backward("zzz"));
        assert!(!canvas.send_to_back("zzz"));
        assert_eq!(canvas, before);
    }

    #[test]
    fn test_items_by_z_ignores_insertion_order() {
        let canvas = canvas(&[("a", 3), ("b", 1), ("c", 2)]);
        let ids: Vec<&str> = canvas.items_by_z().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_stacking_stays_distinct_under_mixed_operations() {
        let mut canvas = canvas(&[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
        let ops: [(&str, fn(&mut Canvas, &str) -> bool); 8] = [
            ("c", Canvas::send_to_back),
            ("a", Canvas::bring_forward),
            ("d", Canvas::send_backward),
            ("b", Canvas::bring_to_front),
            ("b", Canvas::send_to_back),
            ("c", Canvas::send_to_back),
            ("a", Canvas::send_backward),
            ("d", Canvas::bring_forward),
        ];
        for (id, op) in ops {
            op(&mut canvas, id);
            assert!(canvas.has_valid_stacking(), "after op on {}: {:?}", id, canvas.items_by_z());
        }
    }

    #[test]
    fn test_counter_exhaustion_renumbers() {
        let mut canvas = canvas(&[("a", i32::MAX), ("b", 7)]);
        assert!(canvas.bring_to_front("b"));
        assert_eq!(z(&canvas, "a"), 2);
        assert_eq!(z(&canvas, "b"), 3);
        assert_eq!(canvas.z_index_counter, 3);
        assert!(canvas.has_valid_stacking());
    }
}
