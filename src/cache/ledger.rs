//! Recency Ledger Module
//!
//! Orders cache entries from least to most recently used.

use crate::cache::Entry;

// == Handle ==
/// Stable position of an entry inside a [`RecencyLedger`].
///
/// A handle stays valid until its entry is removed. After removal the slot
/// may be reused, so a stale handle must not be kept around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

#[derive(Debug)]
struct Slot<V> {
    entry: Entry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency Ledger ==
/// Doubly linked list of entries stored in an arena.
///
/// - Front = Least recently used
/// - Back = Most recently used
///
/// Links are slot indices rather than pointers; removed slots go on a free
/// list and are reused by later appends, so moving an entry never allocates.
#[derive(Debug)]
pub struct RecencyLedger<V> {
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<V> Default for RecencyLedger<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RecencyLedger<V> {
    // == Constructor ==
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty ledger with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Append ==
    /// Inserts an entry at the most recently used end.
    pub fn append(&mut self, entry: Entry<V>) -> Handle {
        let slot = Slot {
            entry,
            prev: None,
            next: None,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        self.link_back(idx);
        self.len += 1;
        Handle(idx)
    }

    // == Move To Most Recent ==
    /// Marks an entry as most recently used.
    pub fn move_to_most_recent(&mut self, handle: Handle) {
        let idx = handle.0;
        if self.slot(idx).is_none() || self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_back(idx);
    }

    // == Remove ==
    /// Detaches the entry behind `handle`.
    ///
    /// Returns None if the handle does not point at a live entry.
    pub fn remove(&mut self, handle: Handle) -> Option<Entry<V>> {
        let idx = handle.0;
        self.slot(idx)?;
        self.unlink(idx);

        let slot = self.slots[idx].take()?;
        self.free.push(idx);
        self.len -= 1;
        Some(slot.entry)
    }

    // == Remove Least Recent ==
    /// Detaches and returns the least recently used entry.
    ///
    /// Returns None if the ledger is empty.
    pub fn remove_least_recent(&mut self) -> Option<Entry<V>> {
        let head = self.head?;
        self.remove(Handle(head))
    }

    // == Peek Least Recent ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_least_recent(&self) -> Option<&Entry<V>> {
        self.head.and_then(|idx| self.slot(idx)).map(|slot| &slot.entry)
    }

    // == Access ==
    pub fn get(&self, handle: Handle) -> Option<&Entry<V>> {
        self.slot(handle.0).map(|slot| &slot.entry)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Entry<V>> {
        self.slot_mut(handle.0).map(|slot| &mut slot.entry)
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every entry. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Iter ==
    /// Iterates entries from least to most recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            ledger: self,
            cursor: self.head,
        }
    }

    fn slot(&self, idx: usize) -> Option<&Slot<V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, idx: usize) -> Option<&mut Slot<V>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.slot(idx).map(|slot| (slot.prev, slot.next)) else {
            return;
        };

        match prev.and_then(|p| self.slot_mut(p)) {
            Some(prev_slot) => prev_slot.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.slot_mut(n)) {
            Some(next_slot) => next_slot.prev = prev,
            None => self.tail = prev,
        }

        if let Some(slot) = self.slot_mut(idx) {
            slot.prev = None;
            slot.next = None;
        }
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(slot) = self.slot_mut(idx) {
            slot.prev = old_tail;
            slot.next = None;
        }

        match old_tail.and_then(|t| self.slot_mut(t)) {
            Some(tail_slot) => tail_slot.next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

// == Iterator ==
/// Iterator over ledger entries, least recently used first.
pub struct Iter<'a, V> {
    ledger: &'a RecencyLedger<V>,
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.ledger.slot(self.cursor?)?;
        self.cursor = slot.next;
        Some(&slot.entry)
    }
}
