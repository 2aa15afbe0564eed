//! Copying (Cheney-style) garbage collection over a semispace heap.
//!
//! ## Architecture
//!
//! - `Heap` (in `core::heap`): owns the two word arenas and the bump pointer.
//! - `ObjectKind`: a tagged discriminant recorded in every object's header,
//!   standing in for a per-kind ops vtable (see `DESIGN.md` for why a tagged
//!   discriminant was chosen over an actual vtable pointer).
//! - `relocate`/`collect`: the traversal that moves the live set from
//!   from-space to to-space each time the heap runs out of room.
//!
//! A heap object is a contiguous run of `u64` words: a header word encoding
//! its `ObjectKind`, followed by a kind-specific payload. During collection,
//! a from-space object is copied into to-space at most once; subsequent
//! references follow a "broken heart" forwarding sentinel left behind in its
//! old header.
//!
//! ## References
//!
//! - Cheney, "A Nonrecursive List Compacting Algorithm" (1970) — the scan
//!   algorithm this module implements almost verbatim.
//! - `examples/salewski-oxischeme/src/heap.rs` — precise-rooting GC over a
//!   Rust arena, consulted for the `Rooted`-guard idea generalized in
//!   `core::roots`.

use crate::core::value::Handle;

/// Sentinel header value marking a from-space object that has already been
/// copied into to-space. The object's first payload word then holds the
/// forwarding handle.
const BROKEN_HEART: u64 = u64::MAX;

/// Discriminant identifying a heap object's kind. Recorded as the first
/// word of every object. Dispatch on this tag is the stand-in for the
/// per-kind ops vtable the spec describes; see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum ObjectKind {
    Pair = 1,
    String = 2,
    Symbol = 3,
    Vector = 4,
    Boolean = 5,
    Environment = 6,
    Closure = 7,
    BuiltIn = 8,
    RootsFrame = 9,
}

impl ObjectKind {
    pub fn tag(self) -> u64 {
        self as u64
    }

    /// Recovers a kind from a header word. Any value that is not a
    /// recognized tag and not the broken-heart sentinel is an internal GC
    /// inconsistency: the header was corrupted or never initialized.
    pub fn from_header(word: u64) -> ObjectKind {
        match word {
            1 => ObjectKind::Pair,
            2 => ObjectKind::String,
            3 => ObjectKind::Symbol,
            4 => ObjectKind::Vector,
            5 => ObjectKind::Boolean,
            6 => ObjectKind::Environment,
            7 => ObjectKind::Closure,
            8 => ObjectKind::BuiltIn,
            9 => ObjectKind::RootsFrame,
            other => panic!("internal GC inconsistency: unknown object kind tag {other}"),
        }
    }
}

/// Number of words needed to round up `byte_len` bytes of inline payload.
pub(crate) fn words_for_bytes(byte_len: usize) -> usize {
    byte_len.div_ceil(8)
}

/// `size_words(obj) -> N`: total words including the header, read from a
/// word array that already holds the object (either space works, since this
/// never follows pointers beyond the object itself).
pub(crate) fn size_words(space: &[u64], idx: usize) -> usize {
    match ObjectKind::from_header(space[idx]) {
        ObjectKind::Pair => 3,
        ObjectKind::String | ObjectKind::Symbol => {
            let len = space[idx + 1] as usize;
            2 + words_for_bytes(len)
        }
        ObjectKind::Vector => {
            let len = space[idx + 1] as usize;
            2 + len
        }
        ObjectKind::Boolean => 2,
        ObjectKind::Environment => {
            let slot_count = space[idx + 3] as usize;
            4 + slot_count
        }
        ObjectKind::Closure => 4,
        ObjectKind::BuiltIn => 3,
        ObjectKind::RootsFrame => {
            let slot_count = space[idx + 2] as usize;
            3 + slot_count
        }
    }
}

/// Relocates a single handle in place. No-op for integer and external
/// (code-address) tags and for NIL, per the tag discipline in
/// `core::value`.
pub(crate) fn relocate(heap: &mut super::heap::Heap, h: &mut Handle) {
    let Some(idx) = h.as_pointer() else {
        return;
    };
    if idx >= heap.from_space_len() {
        // Not an address inside the space currently being collected: a
        // freshly-written to-space pointer revisited during scan, or (in
        // principle) a foreign/static address. Leave it alone.
        return;
    }
    let header = heap.from_space_word(idx);
    if header == BROKEN_HEART {
        let forwarded = heap.from_space_word(idx + 1);
        *h = Handle(forwarded);
        return;
    }
    let n = size_words(heap.from_space_slice(), idx);
    let new_idx = heap.copy_from_from_space(idx, n);
    heap.set_from_space_word(idx, BROKEN_HEART);
    heap.set_from_space_word(idx + 1, Handle::pointer(new_idx).0);
    *h = Handle::pointer(new_idx);
}

/// `relocate_children(obj)`: for every handle slot inside the to-space copy
/// at `idx`, relocate it in place. Dispatches on the header's `ObjectKind`
/// exactly as `size_words` does, giving O(1) dispatch per the "tagged
/// discriminant is an equivalent implementation" design note.
pub(crate) fn relocate_children(heap: &mut super::heap::Heap, idx: usize) {
    match ObjectKind::from_header(heap.to_space_word(idx)) {
        ObjectKind::Pair => {
            heap.relocate_to_space_slot(idx + 1);
            heap.relocate_to_space_slot(idx + 2);
        }
        ObjectKind::String | ObjectKind::Symbol | ObjectKind::Boolean | ObjectKind::BuiltIn => {
            // No handle-typed fields.
        }
        ObjectKind::Vector => {
            let len = heap.to_space_word(idx + 1) as usize;
            for i in 0..len {
                heap.relocate_to_space_slot(idx + 2 + i);
            }
        }
        ObjectKind::Environment => {
            heap.relocate_to_space_slot(idx + 1); // parent
            heap.relocate_to_space_slot(idx + 2); // names vector
            let slot_count = heap.to_space_word(idx + 3) as usize;
            for i in 0..slot_count {
                heap.relocate_to_space_slot(idx + 4 + i);
            }
        }
        ObjectKind::Closure => {
            heap.relocate_to_space_slot(idx + 1); // captured env; entry/arity are plain words
        }
        ObjectKind::RootsFrame => {
            heap.relocate_to_space_slot(idx + 1); // next_frame
            let slot_count = heap.to_space_word(idx + 2) as usize;
            for i in 0..slot_count {
                heap.relocate_to_space_slot(idx + 3 + i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::heap::Heap;
    use crate::core::objects;

    #[test]
    fn broken_heart_is_never_a_public_kind() {
        // The sentinel must not collide with any real tag value.
        for kind in [
            ObjectKind::Pair,
            ObjectKind::String,
            ObjectKind::Symbol,
            ObjectKind::Vector,
            ObjectKind::Boolean,
            ObjectKind::Environment,
            ObjectKind::Closure,
            ObjectKind::BuiltIn,
            ObjectKind::RootsFrame,
        ] {
            assert_ne!(kind.tag(), BROKEN_HEART);
        }
    }

    #[test]
    fn collect_unreachable_pair_is_freed() {
        let mut heap = Heap::new(1024);
        let _garbage = objects::cons(&mut heap, Handle::int(1), Handle::int(2));
        let before = heap.free_words();
        heap.collect();
        assert!(heap.free_words() > before);
    }

    #[test]
    fn collect_preserves_reachable_cycle() {
        let mut heap = Heap::new(1024);
        let p = objects::cons(&mut heap, Handle::NIL, Handle::NIL);
        objects::set_car(&mut heap, p, p).unwrap();
        objects::set_cdr(&mut heap, p, p).unwrap();
        let frame = heap.push_root_frame(&[p]);

        heap.collect();
        heap.collect();

        let p2 = heap.root_frame_slot(frame, 0);
        assert_eq!(objects::car(&heap, p2).unwrap(), p2);
        assert_eq!(objects::cdr(&heap, p2).unwrap(), p2);
        heap.pop_root_frame();
    }

    #[test]
    fn collect_traces_through_vectors() {
        let mut heap = Heap::new(1024);
        let inner = objects::cons(&mut heap, Handle::int(99), Handle::NIL);
        let frame = heap.push_root_frame(&[inner]);
        let inner = heap.root_frame_slot(frame, 0);

        let v = objects::alloc_vector(&mut heap, 1);
        let frame2 = heap.push_root_frame(&[v]);
        objects::vector_set(&mut heap, heap.root_frame_slot(frame2, 0), 0, inner).unwrap();

        heap.collect();

        let v2 = heap.root_frame_slot(frame2, 0);
        let elem = objects::vector_ref(&heap, v2, 0).unwrap();
        assert_eq!(objects::car(&heap, elem).unwrap(), Handle::int(99));

        heap.pop_root_frame();
        heap.pop_root_frame();
    }
}
