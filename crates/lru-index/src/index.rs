//! The LRU index proper
//!
//! A `HashMap` resolves keys to slots in a `Vec` arena; the slots form a
//! doubly-linked list through index-based links (head = most recently used,
//! tail = least recently used). Every promoting operation relinks exactly one
//! slot at the head, so all single-entry operations are O(1) amortized
//! without any unsafe pointer juggling.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::InvalidCapacity;

/// Callback invoked with each entry that leaves the index.
///
/// Runs synchronously inside the operation that removed the entry. It must
/// not call back into the same index.
pub type EvictCallback<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// Marks an absent link in the arena list.
const NIL: usize = usize::MAX;

struct Slot<K, V> {
    key: K,
    // Taken out when the entry leaves the index, so the slot can sit on the
    // free list without a stale value.
    value: Option<V>,
    prev: usize,
    next: usize,
}

/// Fixed-capacity map from keys to values, ordered by recency of access.
///
/// `get` promotes the entry it finds; `peek` and `contains` leave the order
/// untouched. Inserting past capacity evicts the least-recently-used entry
/// and hands it to the eviction callback, if one was supplied.
pub struct LruIndex<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    arena: Vec<Slot<K, V>>,
    head: usize,
    tail: usize,
    free: usize,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> fmt::Debug for LruIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruIndex")
            .field("capacity", &self.capacity)
            .field("len", &self.map.len())
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruIndex<K, V> {
    /// Create an index without an eviction callback.
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        Self::build(capacity, None)
    }

    /// Create an index that passes each departing entry to `on_evict`.
    pub fn with_evict(
        capacity: usize,
        on_evict: EvictCallback<K, V>,
    ) -> Result<Self, InvalidCapacity> {
        Self::build(capacity, Some(on_evict))
    }

    fn build(
        capacity: usize,
        on_evict: Option<EvictCallback<K, V>>,
    ) -> Result<Self, InvalidCapacity> {
        if capacity == 0 {
            return Err(InvalidCapacity);
        }
        Ok(Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            arena: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free: NIL,
            on_evict,
        })
    }

    /// Insert `value` under `key`, promoting the entry to most recently used.
    ///
    /// Overwriting an existing key never evicts and never fires the callback.
    /// Returns whether the insert pushed out the least-recently-used entry.
    pub fn add(&mut self, key: K, value: V) -> bool {
        if let Some(&slot) = self.map.get(&key) {
            self.arena[slot].value = Some(value);
            self.promote(slot);
            return false;
        }

        let evicted = self.map.len() >= self.capacity && self.evict_tail().is_some();

        let slot = self.claim_slot(key.clone(), value);
        self.attach_head(slot);
        self.map.insert(key, slot);
        evicted
    }

    /// Look up `key` and promote the entry to most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(&slot) = self.map.get(key) {
            self.promote(slot);
            self.arena[slot].value.as_ref()
        } else {
            None
        }
    }

    /// Look up `key` without touching the recency order.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map
            .get(key)
            .and_then(|&slot| self.arena[slot].value.as_ref())
    }

    /// Whether `key` is present; no recency side effect.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Insert only if `key` is absent. A hit neither promotes nor overwrites.
    ///
    /// Returns `(existed, evicted)`.
    pub fn contains_or_add(&mut self, key: K, value: V) -> (bool, bool) {
        if self.map.contains_key(&key) {
            (true, false)
        } else {
            (false, self.add(key, value))
        }
    }

    /// Insert only if `key` is absent, returning the current value on a hit
    /// without promoting it.
    ///
    /// `Some` means the key already existed; the flag reports whether the
    /// insert evicted an older entry.
    pub fn peek_or_add(&mut self, key: K, value: V) -> (Option<&V>, bool) {
        if let Some(&slot) = self.map.get(&key) {
            return (self.arena[slot].value.as_ref(), false);
        }
        let evicted = self.add(key, value);
        (None, evicted)
    }

    /// Remove `key`, handing the entry to the eviction callback.
    ///
    /// Returns whether anything was removed; removing an absent key is a
    /// no-op and does not fire the callback.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (key, slot) = match self.map.remove_entry(key) {
            Some(entry) => entry,
            None => return false,
        };
        self.unlink(slot);
        let value = self.arena[slot].value.take();
        self.release_slot(slot);
        if let Some(value) = value {
            self.notify(&key, &value);
        }
        true
    }

    /// Remove and return the least-recently-used entry, firing the callback.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        self.evict_tail()
    }

    /// The least-recently-used entry, left in place.
    pub fn get_oldest(&self) -> Option<(&K, &V)> {
        if self.tail == NIL {
            return None;
        }
        let slot = &self.arena[self.tail];
        slot.value.as_ref().map(|v| (&slot.key, v))
    }

    /// All keys, oldest to newest.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.tail;
        while cursor != NIL {
            keys.push(self.arena[cursor].key.clone());
            cursor = self.arena[cursor].prev;
        }
        keys
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The fixed capacity this index was constructed with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every entry, firing the callback once per entry.
    ///
    /// Callback order follows map iteration and is unspecified. The index
    /// stays usable afterwards.
    pub fn purge(&mut self) {
        let drained: Vec<(K, usize)> = self.map.drain().collect();
        for (key, slot) in drained {
            if let Some(value) = self.arena[slot].value.take() {
                self.notify(&key, &value);
            }
        }
        self.arena.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
    }

    fn notify(&mut self, key: &K, value: &V) {
        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(key, value);
        }
    }

    /// Drop the tail entry, fire the callback, and return the pair.
    fn evict_tail(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let slot = self.tail;
        self.unlink(slot);
        let key = self.arena[slot].key.clone();
        let value = self.arena[slot].value.take();
        self.map.remove(&key);
        self.release_slot(slot);

        let value = value?;
        self.notify(&key, &value);
        Some((key, value))
    }

    /// Take a slot off the free list, or grow the arena.
    fn claim_slot(&mut self, key: K, value: V) -> usize {
        let slot = Slot {
            key,
            value: Some(value),
            prev: NIL,
            next: NIL,
        };
        if self.free != NIL {
            let idx = self.free;
            self.free = self.arena[idx].next;
            self.arena[idx] = slot;
            idx
        } else {
            self.arena.push(slot);
            self.arena.len() - 1
        }
    }

    /// Return an unlinked slot to the free list; `next` threads the list.
    fn release_slot(&mut self, slot: usize) {
        self.arena[slot].next = self.free;
        self.free = slot;
    }

    /// Detach `slot` from the recency list, patching neighbours and ends.
    fn unlink(&mut self, slot: usize) {
        let prev = self.arena[slot].prev;
        let next = self.arena[slot].next;

        if prev == NIL {
            self.head = next;
        } else {
            self.arena[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.arena[next].prev = prev;
        }

        self.arena[slot].prev = NIL;
        self.arena[slot].next = NIL;
    }

    /// Link a detached `slot` in as the new head.
    fn attach_head(&mut self, slot: usize) {
        self.arena[slot].prev = NIL;
        self.arena[slot].next = self.head;
        if self.head != NIL {
            self.arena[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    fn promote(&mut self, slot: usize) {
        if self.head == slot {
            return;
        }
        self.unlink(slot);
        self.attach_head(slot);
    }
}
