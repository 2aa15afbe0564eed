//! Symbol interner (the obarray, `SPEC_FULL.md` §4.4).
//!
//! Symbol identity is handle identity: two occurrences of the same name must
//! produce the same `Handle`, so `eq?` on symbols is a pointer (word index)
//! compare, not a byte compare. The table itself is plain Rust state, not a
//! heap object — modeled on `examples/sarnowski-lona/crates/lona-vm`'s
//! `Process::alloc_symbol`, which keeps its intern table as ordinary
//! `Vec`/`HashMap` fields external to the GC heap it manages.
//!
//! Because the table holds heap handles outside the heap, it must register
//! itself as a root hook (`core::heap::Heap::register_gc_root_hook`). A hook
//! closure cannot own `&mut Heap` (the heap is what's calling it), so the
//! table's state lives behind an `Rc<RefCell<_>>` shared between the
//! `Interner` handle callers hold and the closure installed at construction
//! time.

use crate::core::heap::Heap;
use crate::core::objects;
use crate::core::value::Symbol;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
struct Obarray {
    map: HashMap<Vec<u8>, usize>,
    handles: Vec<Symbol>,
}

/// A symbol table bound to one heap. Cloning an `Interner` clones the shared
/// handle, not the table — both clones see the same symbols.
#[derive(Clone)]
pub struct Interner {
    inner: Rc<RefCell<Obarray>>,
}

impl Interner {
    /// Builds a fresh, empty table and registers its root hook on `heap`.
    pub fn new(heap: &mut Heap) -> Interner {
        let inner = Rc::new(RefCell::new(Obarray::default()));
        let hook_state = Rc::clone(&inner);
        heap.register_gc_root_hook(move |relocate| {
            let mut table = hook_state.borrow_mut();
            for h in table.handles.iter_mut() {
                *h = relocate(*h);
            }
        });
        Interner { inner }
    }

    /// Interns `name`, allocating a fresh symbol object only on first sight.
    pub fn intern(&self, heap: &mut Heap, name: &[u8]) -> Symbol {
        if let Some(&i) = self.inner.borrow().map.get(name) {
            return self.inner.borrow().handles[i];
        }
        let sym = objects::alloc_symbol(heap, name);
        let mut table = self.inner.borrow_mut();
        let i = table.handles.len();
        table.handles.push(sym);
        table.map.insert(name.to_vec(), i);
        sym
    }

    pub fn find(&self, name: &[u8]) -> Option<Symbol> {
        let table = self.inner.borrow();
        table.map.get(name).map(|&i| table.handles[i])
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::heap::Heap;

    #[test]
    fn interning_the_same_name_twice_returns_the_same_handle() {
        let mut heap = Heap::new(256);
        let interner = Interner::new(&mut heap);
        let a = interner.intern(&mut heap, b"foo");
        let b = interner.intern(&mut heap, b"foo");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_names_intern_to_distinct_handles() {
        let mut heap = Heap::new(256);
        let interner = Interner::new(&mut heap);
        let a = interner.intern(&mut heap, b"foo");
        let b = interner.intern(&mut heap, b"bar");
        assert_ne!(a, b);
    }

    #[test]
    fn symbol_identity_survives_collection() {
        let mut heap = Heap::new(256);
        let interner = Interner::new(&mut heap);
        let _ = interner.intern(&mut heap, b"rooted-through-obarray");
        heap.collect();
        // The obarray's own handle was relocated by its root hook during
        // the collection above; interning the same name again must still
        // resolve to that (now-relocated) handle rather than allocating a
        // second symbol object.
        let before = heap.free_words();
        let again = interner.intern(&mut heap, b"rooted-through-obarray");
        assert_eq!(heap.free_words(), before, "must not reallocate an already-interned name");
        assert_eq!(
            objects::symbol_name(&heap, again).unwrap(),
            b"rooted-through-obarray"
        );
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn find_without_interning_does_not_allocate() {
        let mut heap = Heap::new(256);
        let interner = Interner::new(&mut heap);
        assert_eq!(interner.find(b"unseen"), None);
        let before = heap.free_words();
        let _ = interner.find(b"still-unseen");
        assert_eq!(heap.free_words(), before);
    }
}
