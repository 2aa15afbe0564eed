//! The semispace heap: two equally-sized word arenas, a bump allocator, and
//! the driver for the Cheney collection implemented in `core::gc`.
//!
//! Addressing is by word index into the active arena rather than by raw
//! pointer — the same choice `sarnowski-lona/crates/lona-vm/src/heap/mod.rs`
//! makes for its bump heap, and it keeps this module free of `unsafe`: every
//! access is a bounds-checked slice index.

use crate::core::gc::{self, ObjectKind};
use crate::core::value::Handle;

/// Root frames are bounded at compile time; larger sets require multiple
/// frames (`SPEC_FULL.md` §4.2).
pub const MAX_FRAME_SLOTS: usize = 10;

/// Header(1) + next_frame(1) + slot_count(1) + MAX_FRAME_SLOTS handle slots:
/// the largest a root frame can ever be. The allocator keeps this much
/// headroom free at all times so that `push_root_frame` never needs to
/// trigger a collection mid-registration.
const RESERVE_WORDS: usize = 3 + MAX_FRAME_SLOTS;

type RootHook = Box<dyn FnMut(&mut dyn FnMut(Handle) -> Handle)>;

pub struct Heap {
    to_space: Vec<u64>,
    from_space: Vec<u64>,
    bump: usize,
    capacity: usize,
    root_frame_head: Handle,
    root_hooks: Vec<RootHook>,
    true_handle: Handle,
    false_handle: Handle,
    collections: usize,
}

impl Heap {
    /// Builds a heap with `capacity_words` per arena (so `2 * capacity_words`
    /// words of backing storage total).
    pub fn new(capacity_words: usize) -> Heap {
        let capacity = capacity_words.max(RESERVE_WORDS + 16);
        let mut heap = Heap {
            to_space: vec![0u64; capacity],
            from_space: vec![0u64; capacity],
            bump: 0,
            capacity,
            root_frame_head: Handle::NIL,
            root_hooks: Vec::new(),
            true_handle: Handle::NIL,
            false_handle: Handle::NIL,
            collections: 0,
        };
        heap.true_handle = heap.alloc_raw(ObjectKind::Boolean, 2);
        let idx = heap.true_handle.as_pointer().unwrap();
        heap.write_word(idx + 1, 1);
        heap.false_handle = heap.alloc_raw(ObjectKind::Boolean, 2);
        let idx = heap.false_handle.as_pointer().unwrap();
        heap.write_word(idx + 1, 0);
        heap
    }

    pub fn true_handle(&self) -> Handle {
        self.true_handle
    }

    pub fn false_handle(&self) -> Handle {
        self.false_handle
    }

    pub fn bool_handle(&self, b: bool) -> Handle {
        if b { self.true_handle } else { self.false_handle }
    }

    // -- public allocation contract (SPEC_FULL.md §4.1) --------------------

    /// `alloc(kind, n_words) -> handle`. Collects (and grows, if needed) on
    /// exhaustion; never fails while the live set fits in system memory.
    /// Callers must initialize every handle-typed slot of the returned
    /// object before making any further allocation.
    pub fn alloc(&mut self, kind: ObjectKind, n_words: usize) -> Handle {
        if !self.has_room(n_words) {
            self.collect();
            if !self.has_room(n_words) {
                self.grow(n_words);
            }
        }
        self.alloc_raw(kind, n_words)
    }

    fn alloc_raw(&mut self, kind: ObjectKind, n_words: usize) -> Handle {
        assert!(
            self.bump + n_words <= self.capacity,
            "out of memory: arena growth failed to secure {n_words} words"
        );
        let idx = self.bump;
        self.to_space[idx] = kind.tag();
        self.bump += n_words;
        Handle::pointer(idx)
    }

    fn has_room(&self, n_words: usize) -> bool {
        self.bump + n_words + RESERVE_WORDS <= self.capacity
    }

    fn grow(&mut self, min_extra_words: usize) {
        let needed = self.bump + min_extra_words + RESERVE_WORDS;
        let new_capacity = self.capacity.max(needed).saturating_mul(2).max(needed);
        self.to_space.resize(new_capacity, 0);
        self.from_space = vec![0u64; new_capacity];
        self.capacity = new_capacity;
    }

    /// Words still available for allocation without triggering a collection
    /// (`gc_free_mem`). Monotonically non-decreasing across a collection in
    /// the size of the garbage it reclaimed.
    pub fn free_words(&self) -> usize {
        self.capacity.saturating_sub(self.bump)
    }

    pub fn collections(&self) -> usize {
        self.collections
    }

    // -- Cheney scan (SPEC_FULL.md §4.1) -----------------------------------

    pub fn collect(&mut self) {
        std::mem::swap(&mut self.to_space, &mut self.from_space);
        self.bump = 0;

        // The one mandatory, built-in hook: the root-frame stack itself.
        let mut head = self.root_frame_head;
        gc::relocate(self, &mut head);
        self.root_frame_head = head;

        let mut hooks = std::mem::take(&mut self.root_hooks);
        for hook in hooks.iter_mut() {
            hook(&mut |mut h| {
                gc::relocate(self, &mut h);
                h
            });
        }
        self.root_hooks = hooks;

        let mut scan = 0;
        while scan < self.bump {
            let n = gc::size_words(&self.to_space, scan);
            gc::relocate_children(self, scan);
            scan += n;
        }
        debug_assert_eq!(scan, self.bump, "internal GC inconsistency: scan overran bump pointer");
        self.collections += 1;
    }

    /// Registers a root hook: a callback invoked at the start of every
    /// collection with a `relocate` closure it must call on every handle it
    /// owns outside the heap (`SPEC_FULL.md` §4.2/§9).
    pub fn register_gc_root_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut dyn FnMut(Handle) -> Handle) + 'static,
    {
        self.root_hooks.push(Box::new(hook));
    }

    // -- root frames (SPEC_FULL.md §4.2) -----------------------------------

    /// Pushes a new root frame holding `handles`, chained to the previous
    /// frame head. Bypasses the normal collecting allocation path: the
    /// allocator's reserved headroom guarantees this never needs to collect,
    /// so no handle can be read before it is safely rooted.
    pub fn push_root_frame(&mut self, handles: &[Handle]) -> Handle {
        assert!(
            handles.len() <= MAX_FRAME_SLOTS,
            "root frame of {} handles exceeds the compile-time bound of {MAX_FRAME_SLOTS}; use multiple frames",
            handles.len()
        );
        let n = 3 + handles.len();
        assert!(
            self.bump + n <= self.capacity,
            "internal GC inconsistency: reserved headroom insufficient for a root frame"
        );
        let idx = self.bump;
        self.to_space[idx] = ObjectKind::RootsFrame.tag();
        self.to_space[idx + 1] = self.root_frame_head.0;
        self.to_space[idx + 2] = handles.len() as u64;
        for (i, h) in handles.iter().enumerate() {
            self.to_space[idx + 3 + i] = h.0;
        }
        self.bump += n;
        let frame = Handle::pointer(idx);
        self.root_frame_head = frame;
        frame
    }

    /// Pops the most recently pushed root frame. Frames must be popped in
    /// reverse registration order (LIFO).
    pub fn pop_root_frame(&mut self) {
        let idx = self
            .root_frame_head
            .as_pointer()
            .expect("pop_roots called with an empty root-frame stack");
        self.root_frame_head = Handle(self.to_space[idx + 1]);
    }

    /// Reads slot `i` of root frame `frame` (as returned by
    /// `push_root_frame`), re-fetched through the live frame chain so it
    /// reflects the handle's current (possibly relocated) value.
    pub fn root_frame_slot(&self, frame: Handle, i: usize) -> Handle {
        let idx = frame.as_pointer().expect("not a root frame handle");
        let count = self.to_space[idx + 2] as usize;
        assert!(i < count, "root frame slot {i} out of range (len {count})");
        Handle(self.to_space[idx + 3 + i])
    }

    pub fn set_root_frame_slot(&mut self, frame: Handle, i: usize, value: Handle) {
        let idx = frame.as_pointer().expect("not a root frame handle");
        let count = self.to_space[idx + 2] as usize;
        assert!(i < count, "root frame slot {i} out of range (len {count})");
        self.to_space[idx + 3 + i] = value.0;
    }

    // -- raw word access, used by core::gc and core::objects ---------------

    pub(crate) fn to_space_word(&self, idx: usize) -> u64 {
        self.to_space[idx]
    }

    pub(crate) fn from_space_word(&self, idx: usize) -> u64 {
        self.from_space[idx]
    }

    pub(crate) fn set_from_space_word(&mut self, idx: usize, v: u64) {
        self.from_space[idx] = v;
    }

    pub(crate) fn from_space_slice(&self) -> &[u64] {
        &self.from_space
    }

    pub(crate) fn from_space_len(&self) -> usize {
        self.from_space.len()
    }

    pub(crate) fn copy_from_from_space(&mut self, idx: usize, n: usize) -> usize {
        let new_idx = self.bump;
        self.to_space[new_idx..new_idx + n].copy_from_slice(&self.from_space[idx..idx + n]);
        self.bump += n;
        new_idx
    }

    pub(crate) fn relocate_to_space_slot(&mut self, idx: usize) {
        let mut h = Handle(self.to_space[idx]);
        gc::relocate(self, &mut h);
        self.to_space[idx] = h.0;
    }

    pub(crate) fn read_handle(&self, idx: usize) -> Handle {
        Handle(self.to_space[idx])
    }

    pub(crate) fn write_handle(&mut self, idx: usize, h: Handle) {
        self.to_space[idx] = h.0;
    }

    pub(crate) fn read_word(&self, idx: usize) -> u64 {
        self.to_space[idx]
    }

    pub(crate) fn write_word(&mut self, idx: usize, w: u64) {
        self.to_space[idx] = w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_singletons_are_distinct_and_stable() {
        let heap = Heap::new(256);
        assert_ne!(heap.true_handle(), heap.false_handle());
        assert_eq!(heap.bool_handle(true), heap.true_handle());
        assert_eq!(heap.bool_handle(false), heap.false_handle());
    }

    #[test]
    fn alloc_advances_bump_and_reduces_free_words() {
        let mut heap = Heap::new(256);
        let before = heap.free_words();
        let _ = heap.alloc(ObjectKind::Pair, 3);
        assert_eq!(heap.free_words(), before - 3);
    }

    #[test]
    fn root_frame_push_pop_is_lifo() {
        let mut heap = Heap::new(256);
        let f1 = heap.push_root_frame(&[Handle::int(1)]);
        let f2 = heap.push_root_frame(&[Handle::int(2)]);
        assert_eq!(heap.root_frame_slot(f2, 0), Handle::int(2));
        heap.pop_root_frame();
        assert_eq!(heap.root_frame_slot(f1, 0), Handle::int(1));
        heap.pop_root_frame();
    }

    #[test]
    #[should_panic(expected = "exceeds the compile-time bound")]
    fn root_frame_over_max_slots_panics() {
        let mut heap = Heap::new(256);
        let handles = [Handle::int(0); MAX_FRAME_SLOTS + 1];
        heap.push_root_frame(&handles);
    }

    #[test]
    fn growth_preserves_live_data_across_many_allocations() {
        let mut heap = Heap::new(64);
        for _ in 0..2000 {
            let _ = heap.alloc(ObjectKind::Pair, 3);
        }
        assert!(heap.collections() > 0);
    }
}
