//! The slot array: id-addressed storage with holes.
//!
//! Position `i` holds the live object whose id is `i`, or a hole. Position 0
//! is the null sentinel and is always a hole. The array owns the objects;
//! secondary indices only hold ids and resolve them here.

use slotdb_index::Resolve;
use slotdb_types::Oid;

/// Growable array of optional objects, addressed by id.
pub struct SlotArray<V> {
    slots: Vec<Option<V>>,
    live: usize,
}

impl<V> SlotArray<V> {
    /// An array holding only the null sentinel.
    pub fn new() -> Self {
        Self {
            slots: vec![None],
            live: 0,
        }
    }

    /// Number of positions, sentinel included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always `false`: the sentinel is never removed.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of live objects.
    pub fn live_len(&self) -> usize {
        self.live
    }

    /// The id of the last position.
    pub fn tail(&self) -> usize {
        self.slots.len() - 1
    }

    /// The live object at `id`, or `None` for a hole or an out-of-range id.
    pub fn get(&self, id: Oid<V>) -> Option<&V> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns `true` if `id` is in range and holds no object.
    pub fn is_hole(&self, id: Oid<V>) -> bool {
        matches!(self.slots.get(id.index()), Some(None))
    }

    /// Returns `true` if `id` can take a new object: an in-range hole
    /// other than the sentinel, or the position just past the tail.
    pub fn accepts(&self, id: Oid<V>) -> bool {
        !id.is_null() && (self.is_hole(id) || id.index() == self.slots.len())
    }

    /// Place `value` at `id`, filling a hole or extending the array by one.
    /// Returns `false` (and stores nothing) if `id` is not
    /// [`accepts`](Self::accepts)-able.
    pub fn set(&mut self, id: Oid<V>, value: V) -> bool {
        if !self.accepts(id) {
            return false;
        }
        if id.index() == self.slots.len() {
            self.slots.push(Some(value));
        } else {
            self.slots[id.index()] = Some(value);
        }
        self.live += 1;
        true
    }

    /// Replace the live object at `id`, returning the previous one.
    pub fn replace(&mut self, id: Oid<V>, value: V) -> Option<V> {
        let slot = self.slots.get_mut(id.index())?;
        let previous = slot.take()?;
        *slot = Some(value);
        Some(previous)
    }

    /// Turn `id` into a hole, returning the object it held.
    pub fn clear(&mut self, id: Oid<V>) -> Option<V> {
        let value = self.slots.get_mut(id.index())?.take()?;
        self.live -= 1;
        Some(value)
    }

    /// Remove the last position, returning its object. The sentinel is
    /// never popped.
    pub fn pop_tail(&mut self) -> Option<V> {
        if self.slots.len() <= 1 {
            return None;
        }
        let value = self.slots.pop().flatten();
        if value.is_some() {
            self.live -= 1;
        }
        value
    }

    /// Resize to exactly `len` positions (sentinel included). Positions
    /// cut off must be holes; the caller checks.
    pub fn resize(&mut self, len: usize) {
        let len = len.max(1);
        debug_assert!(self.slots[len.min(self.slots.len())..]
            .iter()
            .all(Option::is_none));
        self.slots.resize_with(len, || None);
    }

    /// Drop everything but the sentinel.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.slots.push(None);
        self.live = 0;
    }

    /// Live objects in ascending id order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.slots.iter().skip(1).filter_map(Option::as_ref)
    }
}

impl<V> Default for SlotArray<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Resolve<V> for SlotArray<V> {
    fn resolve(&self, id: Oid<V>) -> Option<&V> {
        self.get(id)
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn live_count(&self) -> usize {
        self.live
    }
}

impl<V> std::fmt::Debug for SlotArray<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotArray")
            .field("len", &self.slots.len())
            .field("live", &self.live)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> Oid<&'static str> {
        Oid::new(raw)
    }

    #[test]
    fn starts_with_sentinel_only() {
        let slots = SlotArray::<&str>::new();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.live_len(), 0);
        assert!(slots.is_hole(id(0)));
        assert!(slots.get(id(0)).is_none());
    }

    #[test]
    fn set_and_get() {
        let mut slots = SlotArray::new();
        assert!(slots.set(id(1), "a"));
        assert!(slots.get(Oid::MAX).is_none());
        assert_eq!(slots.get(id(1)), Some(&"a"));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.live_len(), 1);
    }

    #[test]
    fn set_refuses_sentinel_and_occupied() {
        let mut slots = SlotArray::new();
        assert!(!slots.set(id(0), "x"));
        assert!(slots.set(id(1), "a"));
        assert!(!slots.set(id(1), "b"));
        assert_eq!(slots.get(id(1)), Some(&"a"));
    }

    #[test]
    fn out_of_range_is_not_found() {
        let slots = SlotArray::<&str>::new();
        assert!(slots.get(id(99)).is_none());
        assert!(!slots.is_hole(id(99)));
    }

    #[test]
    fn set_extends_by_one_at_most() {
        let mut slots = SlotArray::new();
        assert!(!slots.accepts(id(2)));
        assert!(!slots.set(id(2), "b"));
        assert!(!slots.set(Oid::MAX, "z"));
        assert_eq!(slots.len(), 1);

        assert!(slots.set(id(1), "a"));
        assert!(slots.set(id(2), "b"));
        slots.clear(id(1));
        assert!(slots.accepts(id(1)));
        assert!(slots.accepts(id(3)));
        assert!(!slots.accepts(id(0)));
        assert!(!slots.accepts(id(4)));
        assert!(slots.is_hole(id(1)));
        assert!(!slots.is_hole(id(3)));
    }

    #[test]
    fn clear_makes_hole() {
        let mut slots = SlotArray::new();
        slots.set(id(1), "a");
        slots.set(id(2), "b");
        assert_eq!(slots.clear(id(1)), Some("a"));
        assert!(slots.is_hole(id(1)));
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.live_len(), 1);
        assert_eq!(slots.clear(id(1)), None);
    }

    #[test]
    fn pop_tail_keeps_sentinel() {
        let mut slots = SlotArray::new();
        slots.set(id(1), "a");
        assert_eq!(slots.pop_tail(), Some("a"));
        assert_eq!(slots.pop_tail(), None);
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn replace_only_live() {
        let mut slots = SlotArray::new();
        assert_eq!(slots.replace(id(1), "x"), None);
        slots.set(id(1), "a");
        assert_eq!(slots.replace(id(1), "b"), Some("a"));
        assert_eq!(slots.get(id(1)), Some(&"b"));
        assert_eq!(slots.live_len(), 1);
    }

    #[test]
    fn iter_skips_holes() {
        let mut slots = SlotArray::new();
        slots.set(id(1), "a");
        slots.set(id(2), "b");
        slots.set(id(3), "c");
        slots.clear(id(2));
        let values: Vec<&&str> = slots.iter().collect();
        assert_eq!(values, vec![&"a", &"c"]);
        let reversed: Vec<&&str> = slots.iter().rev().collect();
        assert_eq!(reversed, vec![&"c", &"a"]);
    }

    #[test]
    fn reset_and_resize() {
        let mut slots = SlotArray::new();
        slots.set(id(1), "a");
        slots.reset();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.live_len(), 0);

        slots.resize(6);
        assert_eq!(slots.len(), 6);
        slots.resize(0);
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn resolves_like_get() {
        let mut slots = SlotArray::new();
        slots.set(id(1), "a");
        slots.set(id(2), "b");
        slots.clear(id(1));
        assert_eq!(slots.resolve(id(2)), Some(&"b"));
        assert_eq!(slots.slot_count(), 3);
        assert_eq!(slots.live_count(), 1);
    }
}
